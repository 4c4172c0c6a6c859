//! Unsynchronized portfolio state and its recomputation cascade.
//!
//! [`PortfolioState`] is only ever touched through
//! [`Portfolio`](super::Portfolio), which serializes access and turns the
//! observable differences of each mutation into change events.

use std::collections::HashMap;

use log::{debug, warn};

use crate::errors::{Result, TradeError, ValidationError};
use crate::events::PortfolioChange;
use crate::holdings::Holding;
use crate::money::Money;
use crate::quotes::{normalize_symbol, Quote};

use super::portfolio_snapshot::{HoldingSnapshot, PortfolioSnapshot};

#[derive(Debug, Clone)]
pub(crate) struct PortfolioState {
    name: String,
    initialized: bool,
    cash_balance: Money,
    initial_value: Money,
    holdings: Vec<Holding>,
    quotes: HashMap<String, Quote>,
    total_stock_value: Money,
    net_worth: Money,
    change_in_net_worth: Money,
}

/// Values of the observable fields at one point in time.
#[derive(Debug, Clone)]
pub(crate) struct Observed {
    name: String,
    cash_balance: Money,
    holdings: Vec<Holding>,
    total_stock_value: Money,
    net_worth: Money,
    change_in_net_worth: Money,
}

impl Observed {
    /// Changes from `self` to `after`, in cascade order. Unchanged fields
    /// produce nothing.
    pub(crate) fn diff(self, after: Observed) -> Vec<PortfolioChange> {
        let mut changes = Vec::new();
        if self.name != after.name {
            changes.push(PortfolioChange::Name {
                old: self.name,
                new: after.name,
            });
        }
        if self.cash_balance != after.cash_balance {
            changes.push(PortfolioChange::CashBalance {
                old: self.cash_balance,
                new: after.cash_balance,
            });
        }
        if self.holdings != after.holdings {
            changes.push(PortfolioChange::Holdings {
                old: self.holdings,
                new: after.holdings,
            });
        }
        if self.total_stock_value != after.total_stock_value {
            changes.push(PortfolioChange::TotalStockValue {
                old: self.total_stock_value,
                new: after.total_stock_value,
            });
        }
        if self.net_worth != after.net_worth {
            changes.push(PortfolioChange::NetWorth {
                old: self.net_worth,
                new: after.net_worth,
            });
        }
        if self.change_in_net_worth != after.change_in_net_worth {
            changes.push(PortfolioChange::ChangeInNetWorth {
                old: self.change_in_net_worth,
                new: after.change_in_net_worth,
            });
        }
        changes
    }
}

impl PortfolioState {
    pub(crate) fn new(name: &str) -> Self {
        PortfolioState {
            name: name.trim().to_string(),
            initialized: false,
            cash_balance: Money::ZERO,
            initial_value: Money::ZERO,
            holdings: Vec::new(),
            quotes: HashMap::new(),
            total_stock_value: Money::ZERO,
            net_worth: Money::ZERO,
            change_in_net_worth: Money::ZERO,
        }
    }

    pub(crate) fn from_snapshot(snapshot: &PortfolioSnapshot) -> Result<Self> {
        let mut state = PortfolioState::new(&snapshot.name);
        state.initialized = snapshot.initialized;
        state.cash_balance = snapshot.cash_balance;
        state.initial_value = snapshot.initial_value;

        for saved in &snapshot.holdings {
            if saved.quantity == 0 {
                continue;
            }
            let holding = Holding::restore(
                &saved.symbol,
                saved.quantity,
                saved.principle,
                saved.total_value,
            )?;
            if state.position_of(holding.symbol()).is_some() {
                return Err(ValidationError::InvalidInput(format!(
                    "snapshot lists {} more than once",
                    holding.symbol()
                ))
                .into());
            }
            state.holdings.push(holding);
        }
        state.recompute()?;

        if state.net_worth != snapshot.net_worth
            || state.total_stock_value != snapshot.total_stock_value
        {
            warn!(
                "Snapshot totals for '{}' were stale (net worth {} recomputed as {})",
                state.name, snapshot.net_worth, state.net_worth
            );
        }
        Ok(state)
    }

    pub(crate) fn to_snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            name: self.name.clone(),
            initialized: self.initialized,
            cash_balance: self.cash_balance,
            initial_value: self.initial_value,
            total_stock_value: self.total_stock_value,
            net_worth: self.net_worth,
            change_in_net_worth: self.change_in_net_worth,
            holdings: self.holdings.iter().map(HoldingSnapshot::from).collect(),
        }
    }

    pub(crate) fn observe(&self) -> Observed {
        Observed {
            name: self.name.clone(),
            cash_balance: self.cash_balance,
            holdings: self.holdings.clone(),
            total_stock_value: self.total_stock_value,
            net_worth: self.net_worth,
            change_in_net_worth: self.change_in_net_worth,
        }
    }

    // ==================== Reads ====================

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn cash_balance(&self) -> Money {
        self.cash_balance
    }

    pub(crate) fn initial_value(&self) -> Money {
        self.initial_value
    }

    pub(crate) fn total_stock_value(&self) -> Money {
        self.total_stock_value
    }

    pub(crate) fn net_worth(&self) -> Money {
        self.net_worth
    }

    pub(crate) fn change_in_net_worth(&self) -> Money {
        self.change_in_net_worth
    }

    pub(crate) fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub(crate) fn holding(&self, symbol: &str) -> Option<&Holding> {
        let symbol = normalize_symbol(symbol);
        self.holdings.iter().find(|h| h.symbol() == symbol)
    }

    pub(crate) fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(&normalize_symbol(symbol))
    }

    pub(crate) fn symbols(&self) -> Vec<String> {
        self.holdings
            .iter()
            .map(|h| h.symbol().to_string())
            .collect()
    }

    // ==================== Mutations ====================

    pub(crate) fn initialize(&mut self, starting_cash: Money) -> Result<()> {
        if self.initialized {
            warn!(
                "Re-initializing portfolio '{}'; change in net worth is re-baselined to {}",
                self.name, starting_cash
            );
        }
        self.initialized = true;
        self.initial_value = starting_cash;
        self.cash_balance = starting_cash;
        self.recompute()
    }

    pub(crate) fn set_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidInput("portfolio name is empty".to_string()).into());
        }
        self.name = name.to_string();
        Ok(())
    }

    pub(crate) fn set_cash_balance(&mut self, balance: Money) -> Result<()> {
        self.warn_if_uninitialized("set cash balance");
        self.cash_balance = balance;
        self.recompute()
    }

    pub(crate) fn upsert_holding(&mut self, holding: Holding) -> Result<()> {
        self.remember_quote(&holding);
        match self.position_of(holding.symbol()) {
            Some(index) if holding.quantity() == 0 => {
                self.holdings.remove(index);
            }
            Some(index) => self.holdings[index] = holding,
            None if holding.quantity() == 0 => {
                debug!("Not adding empty holding {}", holding.symbol());
            }
            None => self.holdings.push(holding),
        }
        self.recompute()
    }

    pub(crate) fn set_holdings(&mut self, holdings: Vec<Holding>) -> Result<()> {
        let mut replacement: Vec<Holding> = Vec::with_capacity(holdings.len());
        for holding in holdings {
            self.remember_quote(&holding);
            if holding.quantity() == 0 {
                continue;
            }
            match replacement.iter().position(|h| h.is_same_position(&holding)) {
                Some(index) => replacement[index] = holding,
                None => replacement.push(holding),
            }
        }
        self.holdings = replacement;
        self.recompute()
    }

    /// Buys shares and debits their cost from cash. Returns the cost.
    pub(crate) fn buy_shares(&mut self, symbol: &str, quantity: u64) -> Result<Money> {
        if quantity == 0 {
            return Ok(Money::ZERO);
        }
        self.warn_if_uninitialized("buy shares");
        let symbol = normalize_symbol(symbol);

        let index = self.position_of(&symbol);
        let mut holding = match index {
            Some(index) => self.holdings[index].clone(),
            None => {
                let quote = self
                    .quotes
                    .get(&symbol)
                    .ok_or_else(|| TradeError::StaleQuote(symbol.clone()))?;
                Holding::from_quote(quote)
            }
        };

        let price = holding
            .price()
            .ok_or_else(|| TradeError::StaleQuote(symbol.clone()))?;
        let cost = price.times(quantity)?;
        if cost > self.cash_balance {
            return Err(TradeError::InsufficientFunds {
                symbol,
                required: cost,
                available: self.cash_balance,
            }
            .into());
        }

        holding.buy(quantity)?;
        self.cash_balance = self.cash_balance.try_sub(cost)?;
        match index {
            Some(index) => self.holdings[index] = holding,
            None => self.holdings.push(holding),
        }
        self.recompute()?;
        Ok(cost)
    }

    /// Sells shares and credits the proceeds to cash. Returns the proceeds.
    pub(crate) fn sell_shares(&mut self, symbol: &str, quantity: u64) -> Result<Money> {
        if quantity == 0 {
            return Ok(Money::ZERO);
        }
        self.warn_if_uninitialized("sell shares");
        let symbol = normalize_symbol(symbol);

        let Some(index) = self.position_of(&symbol) else {
            return Err(TradeError::InsufficientShares {
                symbol,
                requested: quantity,
                held: 0,
            }
            .into());
        };

        let mut holding = self.holdings[index].clone();
        let proceeds = holding.sell(quantity)?;
        self.cash_balance = self.cash_balance.try_add(proceeds)?;
        if holding.quantity() == 0 {
            self.holdings.remove(index);
        } else {
            self.holdings[index] = holding;
        }
        self.recompute()?;
        Ok(proceeds)
    }

    pub(crate) fn apply_quote(&mut self, quote: &Quote) -> Result<()> {
        self.quotes
            .insert(quote.symbol().to_string(), quote.clone());
        if let Some(index) = self.position_of(quote.symbol()) {
            self.holdings[index].apply_quote(quote)?;
        }
        self.recompute()
    }

    pub(crate) fn apply_quotes(&mut self, quotes: &[Quote]) -> Result<()> {
        for quote in quotes {
            self.apply_quote(quote)?;
        }
        Ok(())
    }

    // ==================== Internals ====================

    fn position_of(&self, symbol: &str) -> Option<usize> {
        self.holdings.iter().position(|h| h.symbol() == symbol)
    }

    fn remember_quote(&mut self, holding: &Holding) {
        if let Some(quote) = holding.quote() {
            self.quotes
                .insert(holding.symbol().to_string(), quote.clone());
        }
    }

    fn warn_if_uninitialized(&self, operation: &str) {
        if !self.initialized {
            warn!(
                "Attempt to {} on uninitialized portfolio '{}'",
                operation, self.name
            );
        }
    }

    /// stock value ← Σ holdings → net worth ← cash + stock value →
    /// change in net worth ← net worth − initial value.
    fn recompute(&mut self) -> Result<()> {
        self.total_stock_value = Money::try_sum(self.holdings.iter().map(Holding::total_value))?;
        self.net_worth = self.cash_balance.try_add(self.total_stock_value)?;
        self.change_in_net_worth = self.net_worth.try_sub(self.initial_value)?;
        debug!(
            "Portfolio '{}' recomputed: stock value {}, net worth {}, change {}",
            self.name, self.total_stock_value, self.net_worth, self.change_in_net_worth
        );
        Ok(())
    }
}
