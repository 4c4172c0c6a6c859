use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::errors::{Error, Result};
use crate::events::{NoOpPortfolioEventSink, PortfolioEvent, PortfolioEventSink};
use crate::holdings::Holding;
use crate::money::Money;
use crate::quotes::Quote;

use super::portfolio_snapshot::PortfolioSnapshot;
use super::portfolio_state::PortfolioState;

struct PortfolioInner {
    state: PortfolioState,
    version: u64,
}

/// A user's simulated portfolio: cash, holdings and derived totals.
///
/// The portfolio is the unit of mutual exclusion. Every operation runs under
/// one lock, including the recomputation cascade, so readers never observe a
/// holding updated while net worth is not. Mutations work on a draft of the
/// state that is committed only on success, so a failed call leaves the
/// portfolio untouched.
///
/// Change events are handed to the sink after the lock is released.
/// Reads return owned copies; nothing hands out references into the
/// portfolio's storage.
pub struct Portfolio {
    inner: Mutex<PortfolioInner>,
    event_sink: Arc<dyn PortfolioEventSink>,
}

impl Portfolio {
    /// Creates an empty, uninitialized portfolio.
    pub fn new(name: &str) -> Self {
        Self::from_state(PortfolioState::new(name))
    }

    /// Rebuilds a portfolio from persisted state, recomputing derived totals.
    pub fn restore(snapshot: &PortfolioSnapshot) -> Result<Self> {
        Ok(Self::from_state(PortfolioState::from_snapshot(snapshot)?))
    }

    fn from_state(state: PortfolioState) -> Self {
        Portfolio {
            inner: Mutex::new(PortfolioInner { state, version: 0 }),
            event_sink: Arc::new(NoOpPortfolioEventSink),
        }
    }

    /// Sets the event sink for this portfolio.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn PortfolioEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, PortfolioInner>> {
        self.inner.lock().map_err(|e| Error::Lock(e.to_string()))
    }

    fn read<T>(&self, f: impl FnOnce(&PortfolioState) -> T) -> Result<T> {
        let inner = self.lock()?;
        Ok(f(&inner.state))
    }

    /// Runs `op` against a draft of the state under the lock, commits the
    /// draft on success and emits the resulting events once unlocked.
    fn mutate<T>(&self, op: impl FnOnce(&mut PortfolioState) -> Result<T>) -> Result<T> {
        let (value, events) = {
            let mut inner = self.lock()?;
            let before = inner.state.observe();
            let mut draft = inner.state.clone();
            let value = op(&mut draft)?;

            let changes = before.diff(draft.observe());
            let portfolio = draft.name().to_string();
            inner.state = draft;

            let mut events = Vec::with_capacity(changes.len());
            for change in changes {
                inner.version += 1;
                events.push(PortfolioEvent {
                    portfolio: portfolio.clone(),
                    version: inner.version,
                    change,
                });
            }
            (value, events)
        };

        // Unlocked: concurrent batches may be delivered out of version order.
        if !events.is_empty() {
            debug!("Emitting {} portfolio change event(s)", events.len());
            self.event_sink.emit_batch(events);
        }
        Ok(value)
    }

    // ==================== Mutations ====================

    /// Sets initial value, cash balance and net worth to `starting_cash`.
    ///
    /// Calling this again is allowed and re-baselines change in net worth.
    pub fn initialize(&self, starting_cash: Money) -> Result<()> {
        self.mutate(|state| state.initialize(starting_cash))
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.mutate(|state| state.set_name(name))
    }

    pub fn set_cash_balance(&self, balance: Money) -> Result<()> {
        self.mutate(|state| state.set_cash_balance(balance))
    }

    /// Replaces the holding with the same symbol (removing it when the
    /// incoming quantity is zero) or appends a new one.
    pub fn upsert_holding(&self, holding: Holding) -> Result<()> {
        self.mutate(|state| state.upsert_holding(holding))
    }

    /// Replaces all holdings with a copy of `holdings`.
    pub fn set_holdings(&self, holdings: &[Holding]) -> Result<()> {
        let holdings = holdings.to_vec();
        self.mutate(|state| state.set_holdings(holdings))
    }

    /// Buys shares at the latest known price and debits the cost from cash.
    /// Returns the cost.
    ///
    /// Fails with `InsufficientFunds` when the cost exceeds the cash balance
    /// and `StaleQuote` when no price is known for the symbol.
    pub fn buy_shares(&self, symbol: &str, quantity: u64) -> Result<Money> {
        self.mutate(|state| state.buy_shares(symbol, quantity))
    }

    /// Sells shares at the latest known price and credits the proceeds to
    /// cash. A holding sold down to zero shares is removed. Returns the
    /// proceeds.
    pub fn sell_shares(&self, symbol: &str, quantity: u64) -> Result<Money> {
        self.mutate(|state| state.sell_shares(symbol, quantity))
    }

    /// Records the latest quote for a symbol and revalues its holding.
    pub fn apply_quote(&self, quote: &Quote) -> Result<()> {
        self.mutate(|state| state.apply_quote(quote))
    }

    /// Applies a batch of quotes in one critical section.
    pub fn apply_quotes(&self, quotes: &[Quote]) -> Result<()> {
        self.mutate(|state| state.apply_quotes(quotes))
    }

    // ==================== Reads ====================

    pub fn name(&self) -> Result<String> {
        self.read(|state| state.name().to_string())
    }

    pub fn is_initialized(&self) -> Result<bool> {
        self.read(PortfolioState::is_initialized)
    }

    pub fn cash_balance(&self) -> Result<Money> {
        self.read(PortfolioState::cash_balance)
    }

    pub fn initial_value(&self) -> Result<Money> {
        self.read(PortfolioState::initial_value)
    }

    pub fn total_stock_value(&self) -> Result<Money> {
        self.read(PortfolioState::total_stock_value)
    }

    pub fn net_worth(&self) -> Result<Money> {
        self.read(PortfolioState::net_worth)
    }

    pub fn change_in_net_worth(&self) -> Result<Money> {
        self.read(PortfolioState::change_in_net_worth)
    }

    /// Copy of the holdings, in insertion order.
    pub fn holdings(&self) -> Result<Vec<Holding>> {
        self.read(|state| state.holdings().to_vec())
    }

    pub fn holding(&self, symbol: &str) -> Result<Option<Holding>> {
        self.read(|state| state.holding(symbol).cloned())
    }

    /// Latest quote seen for a symbol, held or not.
    pub fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        self.read(|state| state.quote(symbol).cloned())
    }

    /// Symbols of all held positions, in holding order.
    pub fn symbols(&self) -> Result<Vec<String>> {
        self.read(PortfolioState::symbols)
    }

    /// Consistent copy of the whole portfolio for persistence or display.
    pub fn snapshot(&self) -> Result<PortfolioSnapshot> {
        self.read(PortfolioState::to_snapshot)
    }
}

impl std::fmt::Debug for Portfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.snapshot() {
            Ok(snapshot) => f.debug_tuple("Portfolio").field(&snapshot).finish(),
            Err(_) => f.write_str("Portfolio(<poisoned>)"),
        }
    }
}
