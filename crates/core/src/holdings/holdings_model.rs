use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, TradeError, ValidationError};
use crate::money::Money;
use crate::quotes::{normalize_symbol, Quote};

/// A position in one stock symbol.
///
/// Cost basis follows the average-cost method: `principle` is the total
/// amount paid for the shares currently held, and a partial sell shrinks it
/// proportionally rather than retiring specific lots.
///
/// Invariant: `quantity == 0 ⇒ principle == total_value == net == 0`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "HoldingRecord")]
pub struct Holding {
    symbol: String,
    quote: Option<Quote>,
    quantity: u64,
    principle: Money,
    total_value: Money,
    net: Money,
}

impl Holding {
    /// An empty, unpriced position.
    pub fn new(symbol: &str) -> Self {
        Holding {
            symbol: normalize_symbol(symbol),
            quote: None,
            quantity: 0,
            principle: Money::ZERO,
            total_value: Money::ZERO,
            net: Money::ZERO,
        }
    }

    /// An empty position priced by `quote`.
    pub fn from_quote(quote: &Quote) -> Self {
        let mut holding = Holding::new(quote.symbol());
        holding.quote = Some(quote.clone());
        holding
    }

    /// Rebuilds a persisted position. Until a quote is applied the last
    /// known `total_value` stands in for the market value.
    pub fn restore(
        symbol: &str,
        quantity: u64,
        principle: Money,
        total_value: Money,
    ) -> Result<Self> {
        if normalize_symbol(symbol).is_empty() {
            return Err(ValidationError::InvalidInput("holding has no symbol".to_string()).into());
        }
        if principle.is_negative() || total_value.is_negative() {
            return Err(ValidationError::InvalidAmount(format!(
                "holding {} has negative principle or value",
                symbol
            ))
            .into());
        }
        if quantity == 0 && (!principle.is_zero() || !total_value.is_zero()) {
            return Err(ValidationError::InvalidInput(format!(
                "holding {} has no shares but carries a cost basis or value",
                symbol
            ))
            .into());
        }
        let mut holding = Holding::new(symbol);
        holding.quantity = quantity;
        holding.principle = principle;
        holding.total_value = total_value;
        holding.recompute()?;
        Ok(holding)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    /// Current market price, if the position has been quoted.
    pub fn price(&self) -> Option<Money> {
        self.quote.as_ref().map(Quote::price)
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn principle(&self) -> Money {
        self.principle
    }

    pub fn total_value(&self) -> Money {
        self.total_value
    }

    pub fn net(&self) -> Money {
        self.net
    }

    /// Average cost per share, rounded half-even. `None` when nothing is held.
    pub fn average_cost(&self) -> Option<Money> {
        if self.quantity == 0 {
            return None;
        }
        self.principle.prorate(1, self.quantity).ok()
    }

    /// Two holdings describe the same position when their symbols match.
    pub fn is_same_position(&self, other: &Holding) -> bool {
        self.symbol == other.symbol
    }

    /// Replaces market data. A full quote replaces everything; a partial one
    /// updates price and name and keeps previously known statistics.
    /// Quantity and principle are untouched. Fails only when the new market
    /// value is out of range, leaving the holding as it was.
    pub fn apply_quote(&mut self, quote: &Quote) -> Result<()> {
        if quote.symbol() != self.symbol {
            warn!(
                "Ignoring quote for {} applied to holding {}",
                quote.symbol(),
                self.symbol
            );
            return Ok(());
        }
        let merged = match &self.quote {
            Some(previous) if !quote.is_full() => quote
                .clone()
                .with_statistics(previous.statistics().clone()),
            _ => quote.clone(),
        };
        let mut next = self.clone();
        next.quote = Some(merged);
        next.recompute()?;
        *self = next;
        Ok(())
    }

    /// Buys `quantity` shares at the current price and returns their cost,
    /// which the caller debits from cash. Buying zero shares is a no-op.
    pub fn buy(&mut self, quantity: u64) -> Result<Money> {
        if quantity == 0 {
            return Ok(Money::ZERO);
        }
        let price = self
            .price()
            .ok_or_else(|| TradeError::StaleQuote(self.symbol.clone()))?;

        let cost = price.times(quantity)?;
        let held = self.quantity.checked_add(quantity).ok_or_else(|| {
            ValidationError::InvalidInput(format!(
                "buying {} {} would exceed the largest share count",
                quantity, self.symbol
            ))
        })?;
        let mut next = self.clone();
        next.principle = self.principle.try_add(cost)?;
        next.quantity = held;
        next.recompute()?;
        *self = next;

        debug!(
            "Bought {} {} @ {} (cost {}, principle {})",
            quantity, self.symbol, price, cost, self.principle
        );
        Ok(cost)
    }

    /// Sells `quantity` shares at the current price and returns the proceeds,
    /// which the caller credits to cash. Principle shrinks by
    /// `principle × quantity / held`, rounded once. Selling zero shares is a
    /// no-op.
    pub fn sell(&mut self, quantity: u64) -> Result<Money> {
        if quantity == 0 {
            return Ok(Money::ZERO);
        }
        if quantity > self.quantity {
            return Err(TradeError::InsufficientShares {
                symbol: self.symbol.clone(),
                requested: quantity,
                held: self.quantity,
            }
            .into());
        }
        let price = self
            .price()
            .ok_or_else(|| TradeError::StaleQuote(self.symbol.clone()))?;

        let proceeds = price.times(quantity)?;
        let released_basis = self.principle.prorate(quantity, self.quantity)?;
        let mut next = self.clone();
        next.principle = self.principle - released_basis;
        next.quantity = self.quantity - quantity;
        next.recompute()?;
        *self = next;

        debug!(
            "Sold {} {} @ {} (proceeds {}, basis released {})",
            quantity, self.symbol, price, proceeds, released_basis
        );
        Ok(proceeds)
    }

    /// Reconciles a saved position with freshly downloaded data for the same
    /// symbol: takes `other`'s market data and keeps this position's shares
    /// and cost basis.
    pub fn merge_from_refresh(&mut self, other: &Holding) -> Result<()> {
        if !self.is_same_position(other) {
            return Err(TradeError::SymbolMismatch {
                expected: self.symbol.clone(),
                actual: other.symbol.clone(),
            }
            .into());
        }
        match &other.quote {
            Some(quote) => self.apply_quote(quote),
            None => Ok(()),
        }
    }

    fn recompute(&mut self) -> Result<()> {
        if self.quantity == 0 {
            self.principle = Money::ZERO;
            self.total_value = Money::ZERO;
            self.net = Money::ZERO;
            return Ok(());
        }
        if let Some(price) = self.price() {
            self.total_value = price.times(self.quantity)?;
        }
        self.net = self.total_value - self.principle;
        debug_assert!(
            !self.principle.is_negative(),
            "principle of {} went negative",
            self.symbol
        );
        Ok(())
    }
}

/// Wire form of a [`Holding`]. Deserialized holdings are rebuilt through
/// [`Holding::restore`] so the symbol is normalized and the cost basis is
/// validated; `net` is always recomputed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldingRecord {
    symbol: String,
    #[serde(default)]
    quote: Option<Quote>,
    quantity: u64,
    principle: Money,
    total_value: Money,
}

impl TryFrom<HoldingRecord> for Holding {
    type Error = Error;

    fn try_from(record: HoldingRecord) -> Result<Self> {
        let mut holding = Holding::restore(
            &record.symbol,
            record.quantity,
            record.principle,
            record.total_value,
        )?;
        if let Some(quote) = record.quote {
            if quote.symbol() != holding.symbol {
                return Err(TradeError::SymbolMismatch {
                    expected: holding.symbol,
                    actual: quote.symbol().to_string(),
                }
                .into());
            }
            holding.apply_quote(&quote)?;
        }
        Ok(holding)
    }
}
