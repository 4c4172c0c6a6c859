//! Core error types for the Stockfolio engine.
//!
//! Every public engine operation returns [`Result`]. None of these conditions
//! corrupts engine state: a failed call leaves the portfolio exactly as it was.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use crate::money::Money;
use stockfolio_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Trade rejected: {0}")]
    Trade(#[from] TradeError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Portfolio lock poisoned: {0}")]
    Lock(String),
}

/// Expected, recoverable outcomes of buying and selling shares.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("Insufficient funds to buy {symbol}: cost {required}, cash balance {available}")]
    InsufficientFunds {
        symbol: String,
        required: Money,
        available: Money,
    },

    #[error("Insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("No current price for {0}; refresh quotes first")]
    StaleQuote(String),

    #[error("Symbol mismatch: expected {expected}, got {actual}")]
    SymbolMismatch { expected: String, actual: String },
}

/// Validation errors for monetary input and quote parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl Error {
    /// Returns the trade error if this is a rejected trade.
    pub fn as_trade_error(&self) -> Option<&TradeError> {
        match self {
            Error::Trade(err) => Some(err),
            _ => None,
        }
    }
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
