//! Named commands routed to the watchlist store, gateway and chart aggregator.
//!
//! | Command | Touches | Output |
//! |---------|---------|--------|
//! | [`Command::Lookup`] | gateway | [`CommandOutput::Quote`] |
//! | [`Command::Add`] | gateway, store, aggregator | [`CommandOutput::WatchlistChanged`] |
//! | [`Command::Remove`] | store, aggregator | [`CommandOutput::WatchlistChanged`] |
//! | [`Command::List`] | store | [`CommandOutput::Watchlist`] |
//! | [`Command::Chart`] | aggregator | [`CommandOutput::Chart`] |

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::chart::{ChartAggregator, ChartError};
use crate::gateway::{FetchError, QuoteGateway};
use crate::watchlist::WatchlistStore;
use crate::{ChartDataset, Quote, Symbol, UtcDateTime, Watchlist, WatchlistEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lookup(Symbol),
    Add(Symbol),
    Remove(Symbol),
    List,
    Chart,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Lookup(_) => "lookup",
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::List => "list",
            Self::Chart => "chart",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Quote(Quote),
    Watchlist(Watchlist),
    /// The mutation succeeded; the chart outcome is reported but never fails the command.
    WatchlistChanged {
        watchlist: Watchlist,
        chart: Result<ChartDataset, ChartError>,
    },
    Chart(ChartDataset),
}

/// Command failures, phrased in terms of the attempted action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{}", .0.user_message())]
    Lookup(FetchError),

    #[error("could not add {symbol}: it is already in the watchlist")]
    AlreadyWatched { symbol: Symbol },

    #[error("could not add {symbol}: {reason}")]
    AddFailed { symbol: Symbol, reason: String },

    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// One user's interactive state: a loaded watchlist plus the quote source.
///
/// `dispatch` takes `&mut self`, so at most one command runs at a time.
pub struct Session {
    store: WatchlistStore,
    gateway: Arc<dyn QuoteGateway>,
    aggregator: ChartAggregator,
}

impl Session {
    /// Lookups and chart refreshes share `gateway`.
    pub fn new(store: WatchlistStore, gateway: Arc<dyn QuoteGateway>) -> Self {
        let aggregator = ChartAggregator::new(Arc::clone(&gateway));
        Self::with_aggregator(store, gateway, aggregator)
    }

    pub fn with_aggregator(
        store: WatchlistStore,
        gateway: Arc<dyn QuoteGateway>,
        aggregator: ChartAggregator,
    ) -> Self {
        Self {
            store,
            gateway,
            aggregator,
        }
    }

    pub fn store(&self) -> &WatchlistStore {
        &self.store
    }

    pub fn watchlist(&self) -> &Watchlist {
        self.store.watchlist()
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<CommandOutput, CommandError> {
        debug!(command = command.name(), "dispatching command");
        match command {
            Command::Lookup(symbol) => self.lookup(&symbol).await,
            Command::Add(symbol) => self.add(symbol).await,
            Command::Remove(symbol) => Ok(self.remove(&symbol).await),
            Command::List => Ok(CommandOutput::Watchlist(self.store.watchlist().clone())),
            Command::Chart => Ok(CommandOutput::Chart(
                self.aggregator.refresh(self.store.watchlist()).await?,
            )),
        }
    }

    async fn lookup(&self, symbol: &Symbol) -> Result<CommandOutput, CommandError> {
        self.gateway
            .fetch_quote(symbol)
            .await
            .map(CommandOutput::Quote)
            .map_err(CommandError::Lookup)
    }

    async fn add(&mut self, symbol: Symbol) -> Result<CommandOutput, CommandError> {
        if self.store.contains(&symbol) {
            return Err(CommandError::AlreadyWatched { symbol });
        }

        let quote = self
            .gateway
            .fetch_quote(&symbol)
            .await
            .map_err(|error| CommandError::AddFailed {
                symbol: symbol.clone(),
                reason: error.user_message(),
            })?;
        let entry = WatchlistEntry::from_quote(symbol.clone(), &quote, UtcDateTime::now())
            .map_err(|error| CommandError::AddFailed {
                symbol: symbol.clone(),
                reason: error.to_string(),
            })?;

        self.store
            .add(entry)
            .map_err(|exists| CommandError::AlreadyWatched {
                symbol: exists.symbol,
            })?;
        info!(%symbol, "added to watchlist");

        Ok(self.changed().await)
    }

    async fn remove(&mut self, symbol: &Symbol) -> CommandOutput {
        self.store.remove(symbol);
        info!(%symbol, "removed from watchlist");
        self.changed().await
    }

    async fn changed(&self) -> CommandOutput {
        let watchlist = self.store.watchlist().clone();
        let chart = self.aggregator.refresh(&watchlist).await;
        CommandOutput::WatchlistChanged { watchlist, chart }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}
