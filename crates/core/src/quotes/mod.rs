//! Quote management module.
//!
//! - [`model`] - Domain quotes, statistics and daily closes
//! - [`service`] - Fetching quotes and history from a provider and
//!   refreshing a portfolio
//!
//! ```text
//! QuoteService → QuoteProvider (market-data crate)
//!       ↓
//!   Portfolio
//! ```

pub mod model;
pub mod service;


pub use model::{normalize_symbol, HistoricalQuote, Quote, QuoteStatistics};
pub use service::{QuoteService, RefreshFailure, RefreshSummary};
