use std::sync::Arc;
use std::time::Duration;

use stockwatch_core::{
    AlphaVantageGateway, AppConfig, ChartAggregator, Command as SessionCommand, CommandOutput,
    FileBlobStore, QuoteGateway, Session, Symbol, WatchlistStore,
};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::from_env();
    if let Some(home) = &cli.home {
        config = config.with_home(home.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms.filter(|ms| *ms > 0) {
        config = config.with_request_timeout(Duration::from_millis(timeout_ms));
    }
    config
}

/// Converts parsed arguments into a session command, validating the symbol.
pub fn to_session_command(command: &Command) -> Result<SessionCommand, CliError> {
    Ok(match command {
        Command::Quote(args) => SessionCommand::Lookup(Symbol::parse(&args.symbol)?),
        Command::Add(args) => SessionCommand::Add(Symbol::parse(&args.symbol)?),
        Command::Remove(args) => SessionCommand::Remove(Symbol::parse(&args.symbol)?),
        Command::List => SessionCommand::List,
        Command::Chart => SessionCommand::Chart,
    })
}

pub fn open_session(config: &AppConfig) -> Session {
    let store = WatchlistStore::load(Arc::new(FileBlobStore::new(config.storage_dir())));
    let gateway: Arc<dyn QuoteGateway> = Arc::new(AlphaVantageGateway::from_config(config));
    let aggregator =
        ChartAggregator::new(Arc::clone(&gateway)).with_fetch_timeout(config.request_timeout);
    Session::with_aggregator(store, gateway, aggregator)
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    // Validate before touching storage or the network.
    let command = to_session_command(&cli.command)?;
    let config = resolve_config(cli);
    debug!(?config, "resolved configuration");

    let mut session = open_session(&config);
    Ok(session.dispatch(command).await?)
}
