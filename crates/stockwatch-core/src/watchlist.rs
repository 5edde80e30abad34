//! Durable watchlist state.
//!
//! [`WatchlistStore`] is the only owner allowed to mutate a [`Watchlist`]. Every
//! mutation is followed by a synchronous [`persist`](WatchlistStore::persist);
//! when persistence fails the in-memory list stays authoritative and
//! [`is_synced`](WatchlistStore::is_synced) reports `false` until a later
//! write succeeds.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::storage::BlobStore;
use crate::{Symbol, Watchlist, WatchlistEntry};

/// Blob key holding the JSON array snapshot.
pub const WATCHLIST_STORAGE_KEY: &str = "watchlist";

/// Returned by [`WatchlistStore::add`] when the symbol is already watched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{symbol} is already in the watchlist")]
pub struct AlreadyExists {
    pub symbol: Symbol,
}

pub struct WatchlistStore {
    blob_store: Arc<dyn BlobStore>,
    watchlist: Watchlist,
    synced: bool,
}

impl WatchlistStore {
    /// Reads the persisted snapshot. Never fails: missing, unreadable or
    /// malformed data yields an empty watchlist.
    pub fn load(blob_store: Arc<dyn BlobStore>) -> Self {
        let (watchlist, synced) = match blob_store.get(WATCHLIST_STORAGE_KEY) {
            Ok(None) => {
                debug!("no watchlist snapshot found; starting empty");
                (Watchlist::new(), true)
            }
            Ok(Some(bytes)) => decode_snapshot(&bytes),
            Err(error) => {
                warn!(%error, "failed to read watchlist snapshot; starting empty");
                (Watchlist::new(), false)
            }
        };

        info!(entries = watchlist.len(), "watchlist loaded");
        Self {
            blob_store,
            watchlist,
            synced,
        }
    }

    /// Appends `entry` and persists.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyExists`] without touching state when the symbol is
    /// already present.
    pub fn add(&mut self, entry: WatchlistEntry) -> Result<&Watchlist, AlreadyExists> {
        if self.watchlist.contains(&entry.symbol) {
            return Err(AlreadyExists {
                symbol: entry.symbol,
            });
        }

        debug!(symbol = %entry.symbol, "adding watchlist entry");
        self.watchlist.push(entry);
        self.persist();
        Ok(&self.watchlist)
    }

    /// Removes every entry for `symbol`. Removing an absent symbol is a no-op.
    pub fn remove(&mut self, symbol: &Symbol) -> &Watchlist {
        let removed = self.watchlist.remove_symbol(symbol);
        debug!(%symbol, removed, "removing watchlist entry");
        self.persist();
        &self.watchlist
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.watchlist.contains(symbol)
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    /// Whether the last persist (or the initial load) matched the snapshot.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Overwrites the snapshot with the in-memory list; failures are logged.
    pub fn persist(&mut self) {
        match self.try_persist() {
            Ok(()) => {
                if !self.synced {
                    info!("watchlist snapshot back in sync");
                }
                self.synced = true;
            }
            Err(error) => {
                warn!(%error, "failed to persist watchlist; keeping in-memory state");
                self.synced = false;
            }
        }
    }

    fn try_persist(&self) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(&self.watchlist)?;
        self.blob_store.set(WATCHLIST_STORAGE_KEY, &bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for WatchlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistStore")
            .field("watchlist", &self.watchlist)
            .field("synced", &self.synced)
            .finish_non_exhaustive()
    }
}

fn decode_snapshot(bytes: &[u8]) -> (Watchlist, bool) {
    match serde_json::from_slice::<Vec<WatchlistEntry>>(bytes) {
        Ok(entries) => {
            let (watchlist, dropped) = Watchlist::from_entries(entries);
            if dropped.is_empty() {
                (watchlist, true)
            } else {
                let dropped: Vec<&str> = dropped.iter().map(Symbol::as_str).collect();
                warn!(?dropped, "watchlist snapshot had duplicate symbols; kept first occurrence");
                (watchlist, false)
            }
        }
        Err(error) => {
            warn!(%error, "watchlist snapshot is malformed; starting empty");
            (Watchlist::new(), false)
        }
    }
}
