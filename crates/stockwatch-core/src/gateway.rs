//! Quote gateway contract.
//!
//! A [`QuoteGateway`] turns a [`Symbol`] into a normalized [`Quote`] or a typed
//! [`FetchError`]. The chart aggregator treats every error kind the same way
//! (the entry is omitted); the single-symbol lookup flow surfaces the kind to
//! the user through [`FetchError::user_message`].
//!
//! | Kind | Code | Typical cause |
//! |------|------|---------------|
//! | [`FetchErrorKind::NotFound`] | `SYMBOL_NOT_FOUND` | unknown ticker, no time series |
//! | [`FetchErrorKind::RateLimited`] | `RATE_LIMIT_EXCEEDED` | provider quota or local budget |
//! | [`FetchErrorKind::Network`] | `CONNECTION_ERROR` | transport failure, HTTP error |
//! | [`FetchErrorKind::Network`] | `REQUEST_TIMEOUT` | request or chart fetch timed out |
//! | [`FetchErrorKind::Malformed`] | `INVALID_API_RESPONSE` | unexpected payload |
//! | [`FetchErrorKind::Configuration`] | `API_KEY_MISSING` | no API key configured |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::{Quote, Symbol};

/// Classification of a failed quote fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    NotFound,
    RateLimited,
    Network,
    Malformed,
    /// The gateway cannot issue requests at all, e.g. without an API key.
    Configuration,
}

impl FetchErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "SYMBOL_NOT_FOUND",
            Self::RateLimited => "RATE_LIMIT_EXCEEDED",
            Self::Network => "CONNECTION_ERROR",
            Self::Malformed => "INVALID_API_RESPONSE",
            Self::Configuration => "API_KEY_MISSING",
        }
    }
}

/// Structured fetch failure for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    symbol: Symbol,
    message: String,
    timed_out: bool,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, symbol: &Symbol, message: impl Into<String>) -> Self {
        Self {
            kind,
            symbol: symbol.clone(),
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn not_found(symbol: &Symbol, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotFound, symbol, message)
    }

    pub fn rate_limited(symbol: &Symbol, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, symbol, message)
    }

    pub fn network(symbol: &Symbol, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, symbol, message)
    }

    pub fn malformed(symbol: &Symbol, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Malformed, symbol, message)
    }

    pub fn missing_api_key(symbol: &Symbol) -> Self {
        Self::new(
            FetchErrorKind::Configuration,
            symbol,
            "ALPHA_VANTAGE_API_KEY is not set",
        )
    }

    /// A network failure that is known to be a timeout.
    pub fn timeout(symbol: &Symbol, message: impl Into<String>) -> Self {
        Self {
            timed_out: true,
            ..Self::network(symbol, message)
        }
    }

    pub fn timed_out(symbol: &Symbol, after: Duration) -> Self {
        Self::timeout(
            symbol,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Diagnostic detail, suitable for logs.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_timeout(&self) -> bool {
        self.timed_out
    }

    pub const fn code(&self) -> &'static str {
        if self.timed_out {
            "REQUEST_TIMEOUT"
        } else {
            self.kind.code()
        }
    }

    /// Message phrased for the person who asked for the quote.
    pub fn user_message(&self) -> String {
        match self.kind {
            FetchErrorKind::NotFound => format!(
                "Stock symbol \"{}\" not found. Please check the symbol and try again.",
                self.symbol
            ),
            FetchErrorKind::RateLimited => {
                String::from("API rate limit reached. Please try again later.")
            }
            FetchErrorKind::Network if self.timed_out => {
                String::from("Request timeout. Please try again.")
            }
            FetchErrorKind::Network => String::from(
                "Network connection error. Please check your internet connection.",
            ),
            FetchErrorKind::Malformed => {
                String::from("Invalid API response format. Please try again.")
            }
            FetchErrorKind::Configuration => String::from(
                "API configuration error. Set ALPHA_VANTAGE_API_KEY and try again.",
            ),
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.symbol, self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Quote, FetchError>> + Send + 'a>>;

/// Source of quotes for single lookups and chart refreshes.
///
/// Implementations must be `Send + Sync`; the chart aggregator issues many
/// fetches against one gateway at the same time.
pub trait QuoteGateway: Send + Sync {
    /// Fetches the latest quote for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the symbol is unknown to the provider, the
    /// request budget is exhausted, the transport fails, or the payload cannot
    /// be understood.
    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a>;
}
