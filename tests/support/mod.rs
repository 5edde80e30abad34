//! Scripted quote gateways shared by the behaviour tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockwatch_core::{
    DecimalString, FetchError, FetchErrorKind, FetchFuture, MarketStatus, Quote, QuoteGateway,
    Symbol, UtcDateTime, WatchlistEntry,
};
use tokio::sync::Barrier;

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("test symbol should be valid")
}

pub fn quote(raw: &str, close: f64) -> Quote {
    let open = close - 1.0;
    let (price_change, price_change_percent) = Quote::price_change_from(open, close);
    Quote {
        symbol: symbol(raw),
        company_name: format!("{raw} Holdings"),
        open,
        high: close + 0.5,
        low: open - 0.5,
        close,
        volume: 1_000,
        last_refreshed: String::from("2024-01-05 16:00:00"),
        latest_time_eastern: String::from("2024-01-05 16:00:00"),
        latest_time_pacific: String::from("2024-01-05 13:00:00 PST"),
        price_change,
        price_change_percent,
        market_status: MarketStatus::Open,
    }
}

pub fn entry(raw: &str) -> WatchlistEntry {
    WatchlistEntry::new(
        symbol(raw),
        format!("{raw} Holdings"),
        DecimalString::parse("100.00").expect("valid price"),
        UtcDateTime::parse("2024-01-05T21:00:00Z").expect("valid timestamp"),
    )
}

#[derive(Debug, Clone)]
enum Script {
    Price(f64),
    Fail(FetchErrorKind),
    Slow(Duration, f64),
    Misreport(String, f64),
}

/// Gateway answering from a per-symbol script; unscripted symbols are `NotFound`.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, raw: &str, close: f64) -> Self {
        self.scripts.insert(raw.to_owned(), Script::Price(close));
        self
    }

    pub fn with_failure(mut self, raw: &str, kind: FetchErrorKind) -> Self {
        self.scripts.insert(raw.to_owned(), Script::Fail(kind));
        self
    }

    pub fn with_delay(mut self, raw: &str, delay: Duration, close: f64) -> Self {
        self.scripts.insert(raw.to_owned(), Script::Slow(delay, close));
        self
    }

    /// Answers for `raw` with a quote that names `reported` instead.
    pub fn with_misreported(mut self, raw: &str, reported: &str, close: f64) -> Self {
        self.scripts
            .insert(raw.to_owned(), Script::Misreport(reported.to_owned(), close));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("not poisoned").clone()
    }
}

impl QuoteGateway for ScriptedGateway {
    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .expect("not poisoned")
            .push(symbol.as_str().to_owned());
        let script = self.scripts.get(symbol.as_str()).cloned();

        Box::pin(async move {
            match script {
                Some(Script::Price(close)) => Ok(quote(symbol.as_str(), close)),
                Some(Script::Slow(delay, close)) => {
                    tokio::time::sleep(delay).await;
                    Ok(quote(symbol.as_str(), close))
                }
                Some(Script::Misreport(reported, close)) => Ok(quote(&reported, close)),
                Some(Script::Fail(kind)) => Err(FetchError::new(kind, symbol, "scripted failure")),
                None => Err(FetchError::not_found(symbol, "unscripted symbol")),
            }
        })
    }
}

/// Gateway whose fetches only complete once `parties` of them are in flight together.
pub struct BarrierGateway {
    barrier: Arc<Barrier>,
}

impl BarrierGateway {
    pub fn new(parties: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

impl QuoteGateway for BarrierGateway {
    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a> {
        let barrier = Arc::clone(&self.barrier);
        Box::pin(async move {
            barrier.wait().await;
            Ok(quote(symbol.as_str(), 10.0))
        })
    }
}
