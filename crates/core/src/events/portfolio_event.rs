//! Portfolio change events.

use serde::{Deserialize, Serialize};

use crate::holdings::Holding;
use crate::money::Money;

/// Observable fields of a portfolio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortfolioField {
    Name,
    CashBalance,
    Holdings,
    TotalStockValue,
    NetWorth,
    ChangeInNetWorth,
}

impl PortfolioField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioField::Name => "name",
            PortfolioField::CashBalance => "cashBalance",
            PortfolioField::Holdings => "holdings",
            PortfolioField::TotalStockValue => "totalStockValue",
            PortfolioField::NetWorth => "netWorth",
            PortfolioField::ChangeInNetWorth => "changeInNetWorth",
        }
    }
}

/// One field change with its previous and new value.
///
/// Holdings changes carry whole-list copies, not per-element diffs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum PortfolioChange {
    Name { old: String, new: String },
    CashBalance { old: Money, new: Money },
    Holdings { old: Vec<Holding>, new: Vec<Holding> },
    TotalStockValue { old: Money, new: Money },
    NetWorth { old: Money, new: Money },
    ChangeInNetWorth { old: Money, new: Money },
}

impl PortfolioChange {
    pub fn field(&self) -> PortfolioField {
        match self {
            PortfolioChange::Name { .. } => PortfolioField::Name,
            PortfolioChange::CashBalance { .. } => PortfolioField::CashBalance,
            PortfolioChange::Holdings { .. } => PortfolioField::Holdings,
            PortfolioChange::TotalStockValue { .. } => PortfolioField::TotalStockValue,
            PortfolioChange::NetWorth { .. } => PortfolioField::NetWorth,
            PortfolioChange::ChangeInNetWorth { .. } => PortfolioField::ChangeInNetWorth,
        }
    }
}

/// A change published by a portfolio after the mutation that caused it has
/// completed and the portfolio lock has been released.
///
/// `version` increases by one per event of a given portfolio and is assigned
/// while the lock is held, so listeners receiving events from several threads
/// can restore mutation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEvent {
    pub portfolio: String,
    pub version: u64,
    pub change: PortfolioChange,
}

impl PortfolioEvent {
    pub fn field(&self) -> PortfolioField {
        self.change.field()
    }

    /// Field name as published to listeners, e.g. `"netWorth"`.
    pub fn field_name(&self) -> &'static str {
        self.field().as_str()
    }
}
