//! Stockfolio Market Data Crate
//!
//! Provider-agnostic quote download contract for the Stockfolio engine.
//!
//! # Overview
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |  QuoteProvider   | --> |    RawQuote      | --> |  core::Quote     |
//! | (network, CSV)   |     | (field -> text)  |     | (typed, Money)   |
//! +------------------+     +------------------+     +------------------+
//! ```
//!
//! Providers own transport, timeouts and retries. They return raw records
//! and a [`MarketDataError`]; parsing into typed values happens in the core
//! crate so precision rules live in one place.
//!
//! # Core Types
//!
//! - [`QuoteProvider`] - Download contract
//! - [`RawQuote`] / [`QuoteField`] - Raw quote record keyed by typed columns
//! - [`HistoricalPrice`] - One daily close
//! - [`MarketDataError`] / [`RetryClass`] - Typed download failures

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::{HistoricalPrice, QuoteField, RawQuote, NOT_AVAILABLE};
pub use provider::{QuoteProvider, StaticQuoteProvider};
