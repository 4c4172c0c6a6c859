use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder some providers send instead of leaving a column empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// A column of a provider's quote response.
///
/// Providers deliver quotes as flat records (one value per column). The
/// keys are typed so consumers never look fields up by free-form strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteField {
    Symbol,
    Name,
    Price,
    Open,
    PreviousClose,
    DayLow,
    DayHigh,
    YearLow,
    YearHigh,
    ChangeFromYearLow,
    PercentChangeFromYearLow,
    ChangeFromYearHigh,
    PercentChangeFromYearHigh,
    FiftyDayAverage,
    ChangeFromFiftyDayAverage,
    PercentChangeFromFiftyDayAverage,
    TwoHundredDayAverage,
    ChangeFromTwoHundredDayAverage,
    PercentChangeFromTwoHundredDayAverage,
    Volume,
    LastTradeDate,
    LastTradeTime,
}

impl QuoteField {
    /// Fields present in every quote, partial or full.
    pub const REQUIRED: [QuoteField; 3] = [QuoteField::Symbol, QuoteField::Name, QuoteField::Price];

    /// Optional market statistics. A quote carrying all of them is a full quote.
    pub const STATISTICS: [QuoteField; 19] = [
        QuoteField::Open,
        QuoteField::PreviousClose,
        QuoteField::DayLow,
        QuoteField::DayHigh,
        QuoteField::YearLow,
        QuoteField::YearHigh,
        QuoteField::ChangeFromYearLow,
        QuoteField::PercentChangeFromYearLow,
        QuoteField::ChangeFromYearHigh,
        QuoteField::PercentChangeFromYearHigh,
        QuoteField::FiftyDayAverage,
        QuoteField::ChangeFromFiftyDayAverage,
        QuoteField::PercentChangeFromFiftyDayAverage,
        QuoteField::TwoHundredDayAverage,
        QuoteField::ChangeFromTwoHundredDayAverage,
        QuoteField::PercentChangeFromTwoHundredDayAverage,
        QuoteField::Volume,
        QuoteField::LastTradeDate,
        QuoteField::LastTradeTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteField::Symbol => "symbol",
            QuoteField::Name => "name",
            QuoteField::Price => "price",
            QuoteField::Open => "open",
            QuoteField::PreviousClose => "previousClose",
            QuoteField::DayLow => "dayLow",
            QuoteField::DayHigh => "dayHigh",
            QuoteField::YearLow => "yearLow",
            QuoteField::YearHigh => "yearHigh",
            QuoteField::ChangeFromYearLow => "changeFromYearLow",
            QuoteField::PercentChangeFromYearLow => "percentChangeFromYearLow",
            QuoteField::ChangeFromYearHigh => "changeFromYearHigh",
            QuoteField::PercentChangeFromYearHigh => "percentChangeFromYearHigh",
            QuoteField::FiftyDayAverage => "fiftyDayAverage",
            QuoteField::ChangeFromFiftyDayAverage => "changeFromFiftyDayAverage",
            QuoteField::PercentChangeFromFiftyDayAverage => "percentChangeFromFiftyDayAverage",
            QuoteField::TwoHundredDayAverage => "twoHundredDayAverage",
            QuoteField::ChangeFromTwoHundredDayAverage => "changeFromTwoHundredDayAverage",
            QuoteField::PercentChangeFromTwoHundredDayAverage => {
                "percentChangeFromTwoHundredDayAverage"
            }
            QuoteField::Volume => "volume",
            QuoteField::LastTradeDate => "lastTradeDate",
            QuoteField::LastTradeTime => "lastTradeTime",
        }
    }
}

/// Raw quote record as delivered by a provider: column -> unparsed value.
///
/// Values are kept as strings; turning them into typed prices is the
/// consumer's job so that precision rules live in one place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuote {
    fields: BTreeMap<QuoteField, String>,
}

impl RawQuote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record carrying only the required columns.
    pub fn partial(symbol: &str, name: &str, price: &str) -> Self {
        Self::new()
            .with(QuoteField::Symbol, symbol)
            .with(QuoteField::Name, name)
            .with(QuoteField::Price, price)
    }

    /// Builder-style insert.
    pub fn with(mut self, field: QuoteField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: QuoteField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    /// Returns the trimmed value of a column, or `None` when the column is
    /// absent, blank, or the provider's `N/A` placeholder.
    pub fn get(&self, field: QuoteField) -> Option<&str> {
        self.fields
            .get(&field)
            .map(|value| value.trim().trim_matches('"').trim())
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(NOT_AVAILABLE))
    }

    pub fn symbol(&self) -> Option<&str> {
        self.get(QuoteField::Symbol)
    }

    /// True when every statistics column carries a value.
    pub fn is_full(&self) -> bool {
        QuoteField::STATISTICS
            .iter()
            .all(|field| self.get(*field).is_some())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(QuoteField, String)> for RawQuote {
    fn from_iter<I: IntoIterator<Item = (QuoteField, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// One daily close from a provider's price history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPrice {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl HistoricalPrice {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}
