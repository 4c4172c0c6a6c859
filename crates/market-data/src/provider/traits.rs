//! Downloader trait definition.
//!
//! This module defines the `QuoteProvider` trait that every quote source
//! implements.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{HistoricalPrice, RawQuote};

/// Trait for quote download sources.
///
/// Providers own transport concerns: timeouts, retries, CSV or JSON decoding.
/// They hand back raw records and a typed error; the engine never interprets
/// transport failures.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use stockfolio_market_data::{HistoricalPrice, MarketDataError, QuoteProvider, RawQuote};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     // ... implement fetch methods
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote record for a symbol.
    ///
    /// # Returns
    ///
    /// The raw record on success. Unknown symbols yield
    /// `MarketDataError::InvalidSymbol`.
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, MarketDataError>;

    /// Fetch daily closes covering the last `months` months.
    ///
    /// Rows may arrive in any order; consumers sort them.
    async fn fetch_history(
        &self,
        symbol: &str,
        months: u32,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError>;
}
