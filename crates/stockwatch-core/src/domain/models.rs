use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// Trading session state derived from the quote's Pacific timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Open,
    Closed,
}

impl MarketStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl Display for MarketStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized point-in-time quote for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub company_name: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub last_refreshed: String,
    pub latest_time_eastern: String,
    pub latest_time_pacific: String,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub market_status: MarketStatus,
}

impl Quote {
    /// Absolute and percentage move from open to close, rounded to cents and
    /// hundredths of a percent. Percent is zero when open is not positive.
    pub fn price_change_from(open: f64, close: f64) -> (f64, f64) {
        let change = close - open;
        let percent = if open > 0.0 {
            change / open * 100.0
        } else {
            0.0
        };
        (round2(change), round2(percent))
    }
}

/// Decimal number kept in its textual form, e.g. `"189.98"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DecimalString(String);

impl DecimalString {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidDecimal {
                value: input.to_owned(),
            })?;
        validate_non_negative("last_known_price", value)?;
        Ok(Self(trimmed.to_owned()))
    }

    pub fn from_f64(value: f64) -> Result<Self, ValidationError> {
        validate_non_negative("last_known_price", value)?;
        Ok(Self(format!("{value:.2}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_f64(&self) -> f64 {
        // Construction guarantees the text parses.
        self.0.parse().unwrap_or_default()
    }
}

impl Display for DecimalString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DecimalString {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DecimalString> for String {
    fn from(value: DecimalString) -> Self {
        value.0
    }
}

/// One watched instrument. Never mutated in place; remove and re-add to refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: Symbol,
    pub company_name: String,
    pub last_known_price: DecimalString,
    pub added_at: UtcDateTime,
}

impl WatchlistEntry {
    pub fn new(
        symbol: Symbol,
        company_name: impl Into<String>,
        last_known_price: DecimalString,
        added_at: UtcDateTime,
    ) -> Self {
        Self {
            symbol,
            company_name: company_name.into(),
            last_known_price,
            added_at,
        }
    }

    /// Entry for `symbol` priced from `quote`. The requested symbol is kept
    /// even if the quote reports another one.
    pub fn from_quote(
        symbol: Symbol,
        quote: &Quote,
        added_at: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(
            symbol,
            quote.company_name.clone(),
            DecimalString::from_f64(quote.close)?,
            added_at,
        ))
    }
}

/// Ordered, duplicate-free sequence of watchlist entries.
///
/// Only [`WatchlistStore`](crate::WatchlistStore) mutates a watchlist; everyone
/// else sees it read-only.
///
/// Serializes as a plain JSON array. Deserializing rejects repeated symbols;
/// use [`Watchlist::from_entries`] to repair a snapshot instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WatchlistEntry>", into = "Vec<WatchlistEntry>")]
pub struct Watchlist(Vec<WatchlistEntry>);

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw entries, keeping the first occurrence of each symbol.
    /// Returns the watchlist and the symbols that were dropped as duplicates.
    pub fn from_entries(entries: Vec<WatchlistEntry>) -> (Self, Vec<Symbol>) {
        let mut kept: Vec<WatchlistEntry> = Vec::with_capacity(entries.len());
        let mut dropped = Vec::new();
        for entry in entries {
            if kept.iter().any(|existing| existing.symbol == entry.symbol) {
                dropped.push(entry.symbol);
            } else {
                kept.push(entry);
            }
        }
        (Self(kept), dropped)
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WatchlistEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.0.iter().any(|entry| &entry.symbol == symbol)
    }

    pub fn symbols(&self) -> Vec<&Symbol> {
        self.0.iter().map(|entry| &entry.symbol).collect()
    }

    pub(crate) fn push(&mut self, entry: WatchlistEntry) {
        self.0.push(entry);
    }

    /// Removes every entry with `symbol`, returning how many were removed.
    pub(crate) fn remove_symbol(&mut self, symbol: &Symbol) -> usize {
        let before = self.0.len();
        self.0.retain(|entry| &entry.symbol != symbol);
        before - self.0.len()
    }
}

impl TryFrom<Vec<WatchlistEntry>> for Watchlist {
    type Error = ValidationError;

    fn try_from(entries: Vec<WatchlistEntry>) -> Result<Self, Self::Error> {
        let (watchlist, dropped) = Self::from_entries(entries);
        match dropped.into_iter().next() {
            Some(symbol) => Err(ValidationError::DuplicateSymbol {
                symbol: symbol.as_str().to_owned(),
            }),
            None => Ok(watchlist),
        }
    }
}

impl From<Watchlist> for Vec<WatchlistEntry> {
    fn from(watchlist: Watchlist) -> Self {
        watchlist.0
    }
}

impl<'a> IntoIterator for &'a Watchlist {
    type Item = &'a WatchlistEntry;
    type IntoIter = std::slice::Iter<'a, WatchlistEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Render-ready chart row for one watched symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub symbol: Symbol,
    pub company_name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
}

impl From<Quote> for ChartPoint {
    fn from(quote: Quote) -> Self {
        Self {
            symbol: quote.symbol,
            company_name: quote.company_name,
            price: quote.close,
            change: quote.price_change,
            change_percent: quote.price_change_percent,
            volume: quote.volume,
        }
    }
}

/// Chart rows in watchlist order, minus symbols whose fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub points: Vec<ChartPoint>,
}

impl ChartDataset {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.points.iter().map(|point| point.symbol.as_str()).collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
