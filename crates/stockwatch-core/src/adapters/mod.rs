//! Provider-backed [`QuoteGateway`](crate::QuoteGateway) implementations.

pub mod alphavantage;

pub use alphavantage::AlphaVantageGateway;
