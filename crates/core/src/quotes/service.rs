//! Quote service.
//!
//! Bridges a [`QuoteProvider`] and the portfolio: converts downloaded records
//! into domain quotes, fetches price history, and refreshes every held
//! position in one batch.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use stockfolio_market_data::{MarketDataError, QuoteProvider};

use crate::constants::{DEFAULT_HISTORY_MONTHS, DEFAULT_REFRESH_CONCURRENCY};
use crate::errors::{Error, Result};
use crate::money::Money;
use crate::portfolio::Portfolio;

use super::model::{normalize_symbol, HistoricalQuote, Quote};

/// A symbol whose quote could not be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFailure {
    pub symbol: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: MarketDataError,
}

fn serialize_error<S: serde::Serializer>(
    error: &MarketDataError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// Outcome of [`QuoteService::refresh_portfolio`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    /// Symbols whose new quote was applied, in holding order.
    pub updated: Vec<String>,
    /// Symbols left at their previous price, in holding order.
    pub failed: Vec<RefreshFailure>,
}

impl RefreshSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Refreshed {} symbol(s), {} failed",
            self.updated.len(),
            self.failed.len()
        )
    }
}

pub struct QuoteService {
    provider: Arc<dyn QuoteProvider>,
    refresh_concurrency: usize,
    history_months: u32,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            refresh_concurrency: DEFAULT_REFRESH_CONCURRENCY,
            history_months: DEFAULT_HISTORY_MONTHS,
        }
    }

    /// Caps the number of quote downloads in flight during a refresh.
    pub fn with_refresh_concurrency(mut self, refresh_concurrency: usize) -> Self {
        self.refresh_concurrency = refresh_concurrency.max(1);
        self
    }

    /// Sets the window used by [`get_recent_history`](Self::get_recent_history).
    pub fn with_history_months(mut self, history_months: u32) -> Self {
        self.history_months = history_months;
        self
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    /// Downloads and converts the latest quote for `symbol`.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol);
        let raw = self.provider.fetch_quote(&symbol).await?;
        let quote = Quote::try_from(&raw)?;
        if quote.symbol() != symbol {
            warn!(
                "{} answered a request for {} with {}",
                self.provider.id(),
                symbol,
                quote.symbol()
            );
        }
        Ok(quote)
    }

    /// Daily closes covering the last `months` months, oldest first, with
    /// exact duplicates removed.
    pub async fn get_history(&self, symbol: &str, months: u32) -> Result<Vec<HistoricalQuote>> {
        let symbol = normalize_symbol(symbol);
        let rows = self.provider.fetch_history(&symbol, months).await?;

        let mut history = rows
            .iter()
            .map(HistoricalQuote::try_from)
            .collect::<Result<Vec<_>>>()?;
        history.sort();
        history.dedup();

        debug!(
            "Loaded {} historical close(s) for {} over {} month(s)",
            history.len(),
            symbol,
            months
        );
        Ok(history)
    }

    /// History over the configured window.
    pub async fn get_recent_history(&self, symbol: &str) -> Result<Vec<HistoricalQuote>> {
        self.get_history(symbol, self.history_months).await
    }

    /// Fetches a quote for every held symbol and applies all successful ones
    /// to `portfolio` in a single update. Symbols that fail keep their
    /// previous price and are reported in the summary.
    pub async fn refresh_portfolio(&self, portfolio: &Portfolio) -> Result<RefreshSummary> {
        let symbols = portfolio.symbols()?;
        if symbols.is_empty() {
            debug!("Nothing to refresh");
            return Ok(RefreshSummary::default());
        }

        let mut results: Vec<(usize, std::result::Result<Quote, MarketDataError>)> =
            stream::iter(symbols.iter().enumerate())
                .map(|(index, symbol)| async move {
                    let result = self.fetch_for_refresh(symbol).await;
                    (index, result)
                })
                .buffer_unordered(self.refresh_concurrency)
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);

        let mut quotes = Vec::with_capacity(results.len());
        let mut summary = RefreshSummary::default();
        for (index, result) in results {
            let symbol = symbols[index].clone();
            match result {
                Ok(quote) => {
                    summary.updated.push(symbol);
                    quotes.push(quote);
                }
                Err(error) => summary.failed.push(RefreshFailure { symbol, error }),
            }
        }

        portfolio.apply_quotes(&quotes)?;

        if summary.is_success() {
            info!("{}", summary.summary());
        } else {
            warn!("{}: {:?}", summary.summary(), summary.failed);
        }
        Ok(summary)
    }

    /// Fetches the latest quote for `symbol`, applies it and buys `quantity`
    /// shares at that price. Returns the cost.
    ///
    /// The quote is applied as its own update before the buy. If the buy then
    /// fails (for example with `InsufficientFunds`), the new price stays in
    /// the portfolio and any held position is already revalued at it.
    pub async fn buy_at_market(
        &self,
        portfolio: &Portfolio,
        symbol: &str,
        quantity: u64,
    ) -> Result<Money> {
        let quote = self.get_quote(symbol).await?;
        portfolio.apply_quote(&quote)?;
        portfolio.buy_shares(quote.symbol(), quantity)
    }

    async fn fetch_for_refresh(&self, symbol: &str) -> std::result::Result<Quote, MarketDataError> {
        let raw = self.provider.fetch_quote(symbol).await?;
        let quote = Quote::try_from(&raw).map_err(|e| match e {
            Error::MarketData(inner) => inner,
            other => MarketDataError::ParseFailure(other.to_string()),
        })?;
        if quote.symbol() != symbol {
            return Err(MarketDataError::ParseFailure(format!(
                "expected a quote for {}, got {}",
                symbol,
                quote.symbol()
            )));
        }
        Ok(quote)
    }
}
