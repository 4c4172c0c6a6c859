/// Decimal places of the currency's minor unit. Every `Money` is held at this scale.
pub const MONEY_SCALE: u32 = 2;

/// Name given to a portfolio when none is configured.
pub const DEFAULT_PORTFOLIO_NAME: &str = "My Portfolio";

/// Starting cash used when none is configured, in whole currency units.
pub const DEFAULT_STARTING_CASH: i64 = 10_000;

/// Default price-history window, in months.
pub const DEFAULT_HISTORY_MONTHS: u32 = 12;

/// Default number of quote downloads in flight during a refresh.
pub const DEFAULT_REFRESH_CONCURRENCY: usize = 4;
