//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The error enum returned by every provider call
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while downloading quotes or price history.
///
/// The engine surfaces these unchanged to its caller; it never interprets
/// or retries them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// The provider does not know the requested symbol.
    /// This is a terminal error - retrying won't help.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The provider could not be reached (DNS, connection refused, timeout).
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The provider answered but the payload could not be understood.
    #[error("Failed to parse provider response: {0}")]
    ParseFailure(String),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use stockfolio_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::NetworkUnavailable("connection reset".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::InvalidSymbol("ZZZZ".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::InvalidSymbol(_) | Self::ParseFailure(_) => RetryClass::Never,
            Self::NetworkUnavailable(_) => RetryClass::WithBackoff,
        }
    }

    /// Returns true if this error is terminal (retrying won't help).
    pub fn is_terminal(&self) -> bool {
        self.retry_class() == RetryClass::Never
    }
}
