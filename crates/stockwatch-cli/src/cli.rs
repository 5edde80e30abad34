//! CLI argument definitions for stockwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Look up the latest quote for one symbol |
//! | `add` | Add a symbol to the watchlist and refresh the chart |
//! | `remove` | Remove a symbol from the watchlist and refresh the chart |
//! | `list` | Show the watchlist |
//! | `chart` | Fetch chart data for every watched symbol |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--home` | `$STOCKWATCH_HOME` | Data directory override |
//! | `--timeout-ms` | `$STOCKWATCH_REQUEST_TIMEOUT_MS` | Per-request timeout override |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! stockwatch quote aapl --format table
//! stockwatch add TSLA
//! stockwatch chart --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Stock quotes and a persistent watchlist from the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stockwatch",
    author,
    version,
    about = "Stock quote lookup and watchlist CLI",
    long_about = "stockwatch looks up intraday stock quotes from Alpha Vantage and keeps a \
local watchlist whose members can be compared side by side.\n\
\n\
Set ALPHA_VANTAGE_API_KEY (or STOCKWATCH_ALPHAVANTAGE_API_KEY) in the environment or a .env file.\n\
\n\
Use 'stockwatch <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Data directory (overrides STOCKWATCH_HOME).
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Per-request timeout in milliseconds (overrides STOCKWATCH_REQUEST_TIMEOUT_MS).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log at debug level on stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text for terminal display.
    Table,
    /// Single JSON document.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up the latest quote for a symbol.
    ///
    ///   stockwatch quote AAPL
    ///   stockwatch quote msft --format table
    Quote(SymbolArgs),

    /// Add a symbol to the watchlist.
    Add(SymbolArgs),

    /// Remove a symbol from the watchlist.
    Remove(SymbolArgs),

    /// Show the watchlist.
    List,

    /// Fetch chart data for every watched symbol.
    Chart,
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    /// Ticker symbol, 1-5 letters (case-insensitive).
    pub symbol: String,
}
