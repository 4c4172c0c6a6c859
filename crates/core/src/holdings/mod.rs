//! Holdings module - per-symbol positions and average-cost accounting.

mod holdings_model;

pub use holdings_model::Holding;

#[cfg(test)]
mod holdings_model_tests;
