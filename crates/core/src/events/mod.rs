//! Portfolio change notification.
//!
//! Provides the typed change events a portfolio publishes and the sink trait
//! through which they reach listeners (GUI, persistence layer). Events are
//! always emitted after the mutation has completed and the portfolio lock has
//! been released.

mod portfolio_event;
mod sink;

pub use portfolio_event::*;
pub use sink::*;
