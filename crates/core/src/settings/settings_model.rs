//! Application settings loaded from the environment.

use std::str::FromStr;
use std::sync::Arc;

use log::debug;

use crate::constants::{
    DEFAULT_HISTORY_MONTHS, DEFAULT_PORTFOLIO_NAME, DEFAULT_REFRESH_CONCURRENCY,
    DEFAULT_STARTING_CASH,
};
use crate::errors::{Error, Result};
use crate::events::PortfolioEventSink;
use crate::money::Money;
use crate::portfolio::Portfolio;
use crate::quotes::QuoteService;
use stockfolio_market_data::QuoteProvider;

pub const ENV_PORTFOLIO_NAME: &str = "STOCKFOLIO_PORTFOLIO_NAME";
pub const ENV_STARTING_CASH: &str = "STOCKFOLIO_STARTING_CASH";
pub const ENV_HISTORY_MONTHS: &str = "STOCKFOLIO_HISTORY_MONTHS";
pub const ENV_REFRESH_CONCURRENCY: &str = "STOCKFOLIO_REFRESH_CONCURRENCY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub portfolio_name: String,
    pub starting_cash: Money,
    pub history_months: u32,
    pub refresh_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            portfolio_name: DEFAULT_PORTFOLIO_NAME.to_string(),
            starting_cash: Money::from_major(DEFAULT_STARTING_CASH),
            history_months: DEFAULT_HISTORY_MONTHS,
            refresh_concurrency: DEFAULT_REFRESH_CONCURRENCY,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment, loading `.env` first
    /// when present. Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let portfolio_name = match lookup(ENV_PORTFOLIO_NAME) {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::InvalidConfigValue(format!(
                    "{} must not be empty",
                    ENV_PORTFOLIO_NAME
                )))
            }
            Some(name) => name.trim().to_string(),
            None => defaults.portfolio_name,
        };

        let starting_cash: Money =
            parse_var(&lookup, ENV_STARTING_CASH)?.unwrap_or(defaults.starting_cash);
        if starting_cash.is_negative() {
            return Err(Error::InvalidConfigValue(format!(
                "{} must not be negative, got {}",
                ENV_STARTING_CASH, starting_cash
            )));
        }

        let history_months =
            parse_var(&lookup, ENV_HISTORY_MONTHS)?.unwrap_or(defaults.history_months);

        let refresh_concurrency: usize = parse_var(&lookup, ENV_REFRESH_CONCURRENCY)?
            .unwrap_or(defaults.refresh_concurrency);
        if refresh_concurrency == 0 {
            return Err(Error::InvalidConfigValue(format!(
                "{} must be at least 1",
                ENV_REFRESH_CONCURRENCY
            )));
        }

        let settings = Self {
            portfolio_name,
            starting_cash,
            history_months,
            refresh_concurrency,
        };
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Creates a portfolio named and funded from these settings.
    pub fn create_portfolio(&self, event_sink: Arc<dyn PortfolioEventSink>) -> Result<Portfolio> {
        let portfolio = Portfolio::new(&self.portfolio_name).with_event_sink(event_sink);
        portfolio.initialize(self.starting_cash)?;
        Ok(portfolio)
    }

    /// Creates a quote service using the configured history window and
    /// refresh concurrency.
    pub fn create_quote_service(&self, provider: Arc<dyn QuoteProvider>) -> QuoteService {
        QuoteService::new(provider)
            .with_refresh_concurrency(self.refresh_concurrency)
            .with_history_months(self.history_months)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::InvalidConfigValue(format!("{}='{}': {}", key, raw, e)))
        })
        .transpose()
}
