//! In-memory quote provider.
//!
//! Serves pre-loaded records without touching the network. Used for offline
//! sessions and as the provider behind service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Months;
use log::{debug, info};

use crate::errors::MarketDataError;
use crate::models::{HistoricalPrice, RawQuote};

use super::traits::QuoteProvider;

const PROVIDER_ID: &str = "STATIC";

#[derive(Default)]
pub struct StaticQuoteProvider {
    quotes: RwLock<HashMap<String, RawQuote>>,
    history: RwLock<HashMap<String, Vec<HistoricalPrice>>>,
    offline: AtomicBool,
}

impl StaticQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the record served for `symbol`.
    pub fn set_quote(&self, symbol: &str, quote: RawQuote) {
        self.quotes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol.to_uppercase(), quote);
    }

    pub fn set_history(&self, symbol: &str, rows: Vec<HistoricalPrice>) {
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol.to_uppercase(), rows);
    }

    /// While offline every fetch fails with `NetworkUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        if self.offline.swap(offline, Ordering::SeqCst) != offline {
            let state = if offline { "offline" } else { "online" };
            info!("{} provider is now {}", PROVIDER_ID, state);
        }
    }

    fn ensure_online(&self) -> Result<(), MarketDataError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(MarketDataError::NetworkUnavailable(format!(
                "{} provider is offline",
                PROVIDER_ID
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
        self.ensure_online()?;
        let key = symbol.to_uppercase();
        debug!("{}: serving quote for {}", PROVIDER_ID, key);
        self.quotes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or(MarketDataError::InvalidSymbol(key))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        months: u32,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError> {
        self.ensure_online()?;
        let key = symbol.to_uppercase();
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        let rows = history
            .get(&key)
            .ok_or_else(|| MarketDataError::InvalidSymbol(key.clone()))?;

        let Some(latest) = rows.iter().map(|row| row.date).max() else {
            return Ok(Vec::new());
        };
        let cutoff = latest.checked_sub_months(Months::new(months));

        Ok(rows
            .iter()
            .filter(|row| cutoff.map_or(true, |cutoff| row.date > cutoff))
            .cloned()
            .collect())
    }
}
