//! Portfolio module - the aggregate root and its valuation cascade.
//!
//! - [`Portfolio`] - thread-safe handle; every operation is atomic
//! - [`PortfolioSnapshot`] - serializable copy for persistence

mod portfolio_model;
mod portfolio_snapshot;
mod portfolio_state;

pub use portfolio_model::Portfolio;
pub use portfolio_snapshot::{HoldingSnapshot, PortfolioSnapshot};
