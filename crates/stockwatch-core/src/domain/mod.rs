//! # Domain Models
//!
//! Canonical domain types for stockwatch.
//!
//! ## Overview
//!
//! All models validate at construction time and serialize with serde:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker, 1-5 uppercase letters |
//! | [`Quote`] | Latest intraday bar reshaped into a quote |
//! | [`WatchlistEntry`] | One watched instrument |
//! | [`Watchlist`] | Ordered, duplicate-free entries |
//! | [`ChartPoint`] / [`ChartDataset`] | Render-ready comparison rows |
//! | [`DecimalString`] | Price kept in textual decimal form |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ## Validation
//!
//! ```rust
//! use stockwatch_core::{Symbol, ValidationError};
//!
//! assert_eq!(Symbol::parse(" tsla ").unwrap().as_str(), "TSLA");
//! assert!(matches!(
//!     Symbol::parse("GOOGLE"),
//!     Err(ValidationError::InvalidSymbol { .. })
//! ));
//! ```

pub mod company;
pub mod market_time;
mod models;
mod symbol;
mod timestamp;

pub use models::{
    ChartDataset, ChartPoint, DecimalString, MarketStatus, Quote, Watchlist, WatchlistEntry,
};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
