//! Market data models
//!
//! - `quote` - Raw quote records (RawQuote, QuoteField) and daily closes (HistoricalPrice)

mod quote;

pub use quote::{HistoricalPrice, QuoteField, RawQuote, NOT_AVAILABLE};
