//! Quote provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that all download sources implement
//! - `StaticQuoteProvider`, an in-memory source for offline use and tests

mod static_provider;
mod traits;

pub use static_provider::StaticQuoteProvider;
pub use traits::QuoteProvider;
