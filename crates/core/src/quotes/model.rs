//! Quote domain models.
//!
//! [`Quote`] is a snapshot of a stock's market attributes; [`HistoricalQuote`]
//! is one daily close. Both are immutable once built. Conversion from the
//! provider's raw records lives here so precision rules are applied in one
//! place.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockfolio_market_data::{HistoricalPrice, QuoteField, RawQuote};

use crate::constants::MONEY_SCALE;
use crate::errors::{Error, Result, ValidationError};
use crate::money::Money;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%I:%M%P"];

/// Canonical form of a ticker symbol: trimmed and upper-cased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

// =============================================================================
// Quote
// =============================================================================

/// Optional market statistics carried by a full quote.
///
/// Every field may be absent; a partial quote has none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatistics {
    pub open: Option<Money>,
    pub previous_close: Option<Money>,
    pub day_low: Option<Money>,
    pub day_high: Option<Money>,
    pub year_low: Option<Money>,
    pub year_high: Option<Money>,
    pub change_from_year_low: Option<Money>,
    pub percent_change_from_year_low: Option<Decimal>,
    pub change_from_year_high: Option<Money>,
    pub percent_change_from_year_high: Option<Decimal>,
    pub fifty_day_average: Option<Money>,
    pub change_from_fifty_day_average: Option<Money>,
    pub percent_change_from_fifty_day_average: Option<Decimal>,
    pub two_hundred_day_average: Option<Money>,
    pub change_from_two_hundred_day_average: Option<Money>,
    pub percent_change_from_two_hundred_day_average: Option<Decimal>,
    pub volume: Option<u64>,
    pub last_trade_date: Option<NaiveDate>,
    pub last_trade_time: Option<NaiveTime>,
}

impl QuoteStatistics {
    /// True when every statistic is present.
    pub fn is_complete(&self) -> bool {
        self.open.is_some()
            && self.previous_close.is_some()
            && self.day_low.is_some()
            && self.day_high.is_some()
            && self.year_low.is_some()
            && self.year_high.is_some()
            && self.change_from_year_low.is_some()
            && self.percent_change_from_year_low.is_some()
            && self.change_from_year_high.is_some()
            && self.percent_change_from_year_high.is_some()
            && self.fifty_day_average.is_some()
            && self.change_from_fifty_day_average.is_some()
            && self.percent_change_from_fifty_day_average.is_some()
            && self.two_hundred_day_average.is_some()
            && self.change_from_two_hundred_day_average.is_some()
            && self.percent_change_from_two_hundred_day_average.is_some()
            && self.volume.is_some()
            && self.last_trade_date.is_some()
            && self.last_trade_time.is_some()
    }

    /// Statistics are informational: one that cannot be read is dropped
    /// with a warning instead of failing the whole quote. Amounts finer than
    /// the minor unit are rounded half-even.
    fn from_raw(raw: &RawQuote) -> Self {
        let money = |field| lenient(raw, field, parse_statistic(raw, field));
        let percent = |field| lenient(raw, field, parse_percent(raw, field));
        Self {
            open: money(QuoteField::Open),
            previous_close: money(QuoteField::PreviousClose),
            day_low: money(QuoteField::DayLow),
            day_high: money(QuoteField::DayHigh),
            year_low: money(QuoteField::YearLow),
            year_high: money(QuoteField::YearHigh),
            change_from_year_low: money(QuoteField::ChangeFromYearLow),
            percent_change_from_year_low: percent(QuoteField::PercentChangeFromYearLow),
            change_from_year_high: money(QuoteField::ChangeFromYearHigh),
            percent_change_from_year_high: percent(QuoteField::PercentChangeFromYearHigh),
            fifty_day_average: money(QuoteField::FiftyDayAverage),
            change_from_fifty_day_average: money(QuoteField::ChangeFromFiftyDayAverage),
            percent_change_from_fifty_day_average: percent(
                QuoteField::PercentChangeFromFiftyDayAverage,
            ),
            two_hundred_day_average: money(QuoteField::TwoHundredDayAverage),
            change_from_two_hundred_day_average: money(
                QuoteField::ChangeFromTwoHundredDayAverage,
            ),
            percent_change_from_two_hundred_day_average: percent(
                QuoteField::PercentChangeFromTwoHundredDayAverage,
            ),
            volume: lenient(raw, QuoteField::Volume, parse_volume(raw)),
            last_trade_date: lenient(raw, QuoteField::LastTradeDate, parse_date(raw)),
            last_trade_time: lenient(raw, QuoteField::LastTradeTime, parse_time(raw)),
        }
    }
}

/// A market quote for one symbol at a point in time.
///
/// A quote with only symbol, name and price is *partial* (used for light
/// refreshes); one whose [`QuoteStatistics`] are complete is *full*.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    symbol: String,
    name: String,
    price: Money,
    #[serde(default)]
    statistics: QuoteStatistics,
}

impl Quote {
    /// Build a partial quote. Fails when the price is negative.
    pub fn partial(symbol: &str, name: &str, price: Money) -> Result<Self> {
        if price.is_negative() {
            return Err(ValidationError::InvalidAmount(format!(
                "negative price {} for {}",
                price, symbol
            ))
            .into());
        }
        Ok(Self {
            symbol: normalize_symbol(symbol),
            name: name.trim().to_string(),
            price,
            statistics: QuoteStatistics::default(),
        })
    }

    /// Attach market statistics.
    pub fn with_statistics(mut self, statistics: QuoteStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn statistics(&self) -> &QuoteStatistics {
        &self.statistics
    }

    pub fn is_full(&self) -> bool {
        self.statistics.is_complete()
    }

    /// Date and time of the last trade, when both are known.
    pub fn last_trade(&self) -> Option<NaiveDateTime> {
        match (self.statistics.last_trade_date, self.statistics.last_trade_time) {
            (Some(date), Some(time)) => Some(date.and_time(time)),
            _ => None,
        }
    }
}

impl TryFrom<&RawQuote> for Quote {
    type Error = Error;

    fn try_from(raw: &RawQuote) -> Result<Self> {
        let symbol = required(raw, QuoteField::Symbol)?;
        let name = raw.get(QuoteField::Name).unwrap_or(symbol);
        let price = parse_money(raw, QuoteField::Price)?
            .ok_or_else(|| ValidationError::MissingField(QuoteField::Price.as_str().to_string()))?;

        let quote = Quote::partial(symbol, name, price)?;
        Ok(quote.with_statistics(QuoteStatistics::from_raw(raw)))
    }
}

// =============================================================================
// Historical Quote
// =============================================================================

/// One daily close.
///
/// Ordered by date ascending; ties are broken by close so ordering agrees
/// with equality on the `(date, close)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalQuote {
    pub date: NaiveDate,
    pub close: Money,
}

impl HistoricalQuote {
    pub fn new(date: NaiveDate, close: Money) -> Self {
        Self { date, close }
    }
}

impl TryFrom<&HistoricalPrice> for HistoricalQuote {
    type Error = Error;

    fn try_from(row: &HistoricalPrice) -> Result<Self> {
        Ok(Self {
            date: row.date,
            close: Money::new(row.close)?,
        })
    }
}

// =============================================================================
// Raw field parsing
// =============================================================================

fn required(raw: &RawQuote, field: QuoteField) -> Result<&str> {
    raw.get(field)
        .ok_or_else(|| ValidationError::MissingField(field.as_str().to_string()).into())
}

fn strip_sign(value: &str) -> &str {
    value.strip_prefix('+').unwrap_or(value)
}

fn parse_money(raw: &RawQuote, field: QuoteField) -> Result<Option<Money>> {
    raw.get(field)
        .map(|value| Money::from_str(strip_sign(value)))
        .transpose()
}

fn parse_statistic(raw: &RawQuote, field: QuoteField) -> Result<Option<Money>> {
    let Some(value) = raw.get(field) else {
        return Ok(None);
    };
    let amount = Decimal::from_str(strip_sign(value))?;
    if amount.normalize().scale() > MONEY_SCALE {
        debug!("Rounding {} '{}' to {} decimal places", field.as_str(), value, MONEY_SCALE);
    }
    Money::rounded(amount).map(Some)
}

/// Drops a statistic that failed to parse, logging what was discarded.
fn lenient<T>(raw: &RawQuote, field: QuoteField, parsed: Result<Option<T>>) -> Option<T> {
    parsed.unwrap_or_else(|e| {
        warn!(
            "Ignoring {} '{}' for {}: {}",
            field.as_str(),
            raw.get(field).unwrap_or_default(),
            raw.get(QuoteField::Symbol).unwrap_or_default(),
            e
        );
        None
    })
}

fn parse_percent(raw: &RawQuote, field: QuoteField) -> Result<Option<Decimal>> {
    raw.get(field)
        .map(|value| {
            let value = strip_sign(value.trim_end_matches('%').trim());
            Decimal::from_str(value).map_err(Error::from)
        })
        .transpose()
}

fn parse_volume(raw: &RawQuote) -> Result<Option<u64>> {
    raw.get(QuoteField::Volume)
        .map(|value| {
            value.replace(',', "").parse::<u64>().map_err(|e| {
                ValidationError::InvalidInput(format!("volume '{}': {}", value, e)).into()
            })
        })
        .transpose()
}

fn parse_date(raw: &RawQuote) -> Result<Option<NaiveDate>> {
    let Some(value) = raw.get(QuoteField::LastTradeDate) else {
        return Ok(None);
    };
    let mut last_err = None;
    for format in DATE_FORMATS {
        match NaiveDate::parse_from_str(value, format) {
            Ok(date) => return Ok(Some(date)),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.map(Error::from).unwrap_or_else(|| {
        ValidationError::InvalidInput(format!("last trade date '{}'", value)).into()
    }))
}

fn parse_time(raw: &RawQuote) -> Result<Option<NaiveTime>> {
    let Some(value) = raw.get(QuoteField::LastTradeTime) else {
        return Ok(None);
    };
    let normalized = value.to_lowercase();
    let mut last_err = None;
    for format in TIME_FORMATS {
        match NaiveTime::parse_from_str(&normalized, format) {
            Ok(time) => return Ok(Some(time)),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.map(Error::from).unwrap_or_else(|| {
        ValidationError::InvalidInput(format!("last trade time '{}'", value)).into()
    }))
}
