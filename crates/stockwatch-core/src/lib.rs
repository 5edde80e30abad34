//! # Stockwatch Core
//!
//! Domain types and services behind the `stockwatch` stock watchlist tool.
//!
//! ## Overview
//!
//! - **Validated domain models** for symbols, quotes, watchlist entries and chart rows
//! - **Quote gateway trait** with an Alpha Vantage implementation
//! - **Watchlist store** persisted as a JSON snapshot through a blob store
//! - **Chart aggregator** that fans out concurrent quote fetches and keeps partial results
//! - **Session** routing named commands to the pieces above
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider gateways (Alpha Vantage) |
//! | [`chart`] | Concurrent chart refresh |
//! | [`config`] | Environment-driven configuration |
//! | [`domain`] | Domain models (Symbol, Quote, Watchlist, ChartDataset) |
//! | [`error`] | Core error types |
//! | [`gateway`] | Quote gateway trait and fetch errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`session`] | Command dispatch |
//! | [`storage`] | Blob storage backends |
//! | [`throttling`] | Local request budget |
//! | [`watchlist`] | Durable watchlist state |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockwatch_core::{
//!     AlphaVantageGateway, AppConfig, Command, FileBlobStore, Session, Symbol, WatchlistStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env();
//!     let store = WatchlistStore::load(Arc::new(FileBlobStore::new(config.storage_dir())));
//!     let mut session = Session::new(store, Arc::new(AlphaVantageGateway::from_config(&config)));
//!
//!     let output = session.dispatch(Command::Add(Symbol::parse("aapl")?)).await?;
//!     println!("{output:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │ Command
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │    Session      │────▶│ WatchlistStore   │──▶ BlobStore
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ ChartAggregator │────▶│ QuoteGateway     │──▶ HttpClient
//! │ (join-all)      │     │ (Alpha Vantage)  │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables only and redacted from logs

pub mod adapters;
pub mod chart;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod http_client;
pub mod session;
pub mod storage;
pub mod throttling;
pub mod watchlist;

// Gateways
pub use adapters::AlphaVantageGateway;
pub use gateway::{FetchError, FetchErrorKind, FetchFuture, QuoteGateway};

// Chart
pub use chart::{ChartAggregator, ChartError};

// Configuration
pub use config::AppConfig;

// Domain models
pub use domain::{
    ChartDataset, ChartPoint, DecimalString, MarketStatus, Quote, Symbol, UtcDateTime, Watchlist,
    WatchlistEntry,
};

// Error types
pub use error::{CoreError, StorageError, ValidationError};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient};

// Session
pub use session::{Command, CommandError, CommandOutput, Session};

// Storage
pub use storage::{BlobStore, FileBlobStore, MemoryBlobStore};

// Throttling
pub use throttling::RequestBudget;

// Watchlist
pub use watchlist::{AlreadyExists, WatchlistStore, WATCHLIST_STORAGE_KEY};
