//! Stockfolio Core - Portfolio valuation and share-transaction engine.
//!
//! This crate holds the domain model of a simulated stock portfolio: money,
//! quotes, holdings with average-cost basis, and the portfolio aggregate that
//! keeps its derived totals consistent and publishes change events. Quote
//! downloading lives in the `market-data` crate behind the
//! [`QuoteProvider`](stockfolio_market_data::QuoteProvider) trait.

pub mod constants;
pub mod errors;
pub mod events;
pub mod holdings;
pub mod money;
pub mod portfolio;
pub mod quotes;
pub mod settings;

pub use events::{PortfolioChange, PortfolioEvent, PortfolioEventSink, PortfolioField};
pub use holdings::Holding;
pub use money::Money;
pub use portfolio::*;
pub use quotes::{HistoricalQuote, Quote, QuoteService, QuoteStatistics, RefreshSummary};
pub use settings::Settings;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
