//! Concurrent chart refresh over the watchlist.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::gateway::{FetchError, QuoteGateway};
use crate::{ChartDataset, ChartPoint, Watchlist};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a refresh produced no dataset.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChartError {
    #[error("Watchlist is empty. Add a symbol to see the chart.")]
    EmptyWatchlist,
    #[error("No data available for the watchlist. Please try again later.")]
    NoData,
}

/// Fans out one quote fetch per watchlist entry and joins the survivors.
#[derive(Clone)]
pub struct ChartAggregator {
    gateway: Arc<dyn QuoteGateway>,
    fetch_timeout: Duration,
}

impl ChartAggregator {
    pub fn new(gateway: Arc<dyn QuoteGateway>) -> Self {
        Self {
            gateway,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Fetches every entry concurrently and waits for all of them to settle.
    ///
    /// Failed or timed-out entries are left out; the remaining points keep
    /// watchlist order.
    ///
    /// # Errors
    ///
    /// [`ChartError::EmptyWatchlist`] without any fetch when `watchlist` is
    /// empty, [`ChartError::NoData`] when every fetch failed.
    pub async fn refresh(&self, watchlist: &Watchlist) -> Result<ChartDataset, ChartError> {
        debug!(entries = watchlist.len(), "chart refresh: idle");
        if watchlist.is_empty() {
            debug!("chart refresh: failed, watchlist empty");
            return Err(ChartError::EmptyWatchlist);
        }

        debug!(entries = watchlist.len(), "chart refresh: fan-out");
        let fetches = watchlist.iter().map(|entry| {
            let symbol = &entry.symbol;
            async move {
                match tokio::time::timeout(self.fetch_timeout, self.gateway.fetch_quote(symbol))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::timed_out(symbol, self.fetch_timeout)),
                }
            }
        });
        let outcomes = join_all(fetches).await;

        debug!(settled = outcomes.len(), "chart refresh: collecting");
        let mut points = Vec::with_capacity(outcomes.len());
        for (entry, outcome) in watchlist.iter().zip(outcomes) {
            match outcome {
                Ok(quote) => points.push(ChartPoint {
                    symbol: entry.symbol.clone(),
                    ..ChartPoint::from(quote)
                }),
                Err(error) => warn!(
                    symbol = %error.symbol(),
                    code = error.code(),
                    message = error.message(),
                    "omitting symbol from chart"
                ),
            }
        }

        if points.is_empty() {
            debug!("chart refresh: failed, no data");
            return Err(ChartError::NoData);
        }

        debug!(points = points.len(), "chart refresh: succeeded");
        Ok(ChartDataset { points })
    }
}

impl std::fmt::Debug for ChartAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartAggregator")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}
