use serde::{Deserialize, Serialize};

use crate::holdings::Holding;
use crate::money::Money;

/// Persisted form of one holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSnapshot {
    pub symbol: String,
    pub quantity: u64,
    pub principle: Money,
    pub total_value: Money,
    pub net: Money,
}

impl From<&Holding> for HoldingSnapshot {
    fn from(holding: &Holding) -> Self {
        HoldingSnapshot {
            symbol: holding.symbol().to_string(),
            quantity: holding.quantity(),
            principle: holding.principle(),
            total_value: holding.total_value(),
            net: holding.net(),
        }
    }
}

/// Plain, storage-agnostic copy of a portfolio for an external DAO.
///
/// Derived totals are written for readers that only display them; on
/// restore they are recomputed from cash and holdings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub name: String,
    #[serde(default = "default_initialized")]
    pub initialized: bool,
    pub cash_balance: Money,
    pub initial_value: Money,
    pub total_stock_value: Money,
    pub net_worth: Money,
    pub change_in_net_worth: Money,
    #[serde(default)]
    pub holdings: Vec<HoldingSnapshot>,
}

fn default_initialized() -> bool {
    true
}
