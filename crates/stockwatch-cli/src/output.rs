use std::fmt::Write as _;
use std::io::{self, Write as _};

use serde::Serialize;
use stockwatch_core::{ChartDataset, ChartError, CommandOutput, Quote, Watchlist};

use crate::cli::OutputFormat;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ChartFailure {
    code: &'static str,
    message: String,
}

impl From<&ChartError> for ChartFailure {
    fn from(error: &ChartError) -> Self {
        let code = match error {
            ChartError::EmptyWatchlist => "EMPTY_WATCHLIST",
            ChartError::NoData => "NO_DATA",
        };
        Self {
            code,
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OutputDocument<'a> {
    Quote {
        quote: &'a Quote,
    },
    Watchlist {
        watchlist: &'a Watchlist,
    },
    Changed {
        watchlist: &'a Watchlist,
        #[serde(skip_serializing_if = "Option::is_none")]
        chart: Option<&'a ChartDataset>,
        #[serde(skip_serializing_if = "Option::is_none")]
        chart_error: Option<ChartFailure>,
    },
    Chart {
        chart: &'a ChartDataset,
    },
}

impl<'a> From<&'a CommandOutput> for OutputDocument<'a> {
    fn from(output: &'a CommandOutput) -> Self {
        match output {
            CommandOutput::Quote(quote) => Self::Quote { quote },
            CommandOutput::Watchlist(watchlist) => Self::Watchlist { watchlist },
            CommandOutput::WatchlistChanged { watchlist, chart } => Self::Changed {
                watchlist,
                chart: chart.as_ref().ok(),
                chart_error: chart.as_ref().err().map(ChartFailure::from),
            },
            CommandOutput::Chart(chart) => Self::Chart { chart },
        }
    }
}

pub fn render(
    output: &CommandOutput,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            let document = OutputDocument::from(output);
            let payload = if pretty {
                serde_json::to_string_pretty(&document)?
            } else {
                serde_json::to_string(&document)?
            };
            Ok(payload)
        }
        OutputFormat::Table => Ok(render_table(output)),
    }
}

/// Writes one rendered document and flushes, so a closed pipe surfaces as an error.
pub fn emit<W: io::Write>(writer: &mut W, rendered: &str) -> Result<(), CliError> {
    writeln!(writer, "{rendered}")?;
    writer.flush()?;
    Ok(())
}

fn render_table(output: &CommandOutput) -> String {
    let mut out = String::new();
    match output {
        CommandOutput::Quote(quote) => write_quote(&mut out, quote),
        CommandOutput::Watchlist(watchlist) => write_watchlist(&mut out, watchlist),
        CommandOutput::WatchlistChanged { watchlist, chart } => {
            write_watchlist(&mut out, watchlist);
            out.push('\n');
            match chart {
                Ok(dataset) => write_chart(&mut out, dataset),
                Err(error) => {
                    let _ = writeln!(out, "chart: {error}");
                }
            }
        }
        CommandOutput::Chart(dataset) => write_chart(&mut out, dataset),
    }
    out.truncate(out.trim_end().len());
    out
}

fn write_quote(out: &mut String, quote: &Quote) {
    let _ = writeln!(out, "{}  {}", quote.symbol, quote.company_name);
    let _ = writeln!(out, "price     : {:.2}", quote.close);
    let _ = writeln!(
        out,
        "change    : {}",
        signed_change(quote.price_change, quote.price_change_percent)
    );
    let _ = writeln!(out, "open      : {:.2}", quote.open);
    let _ = writeln!(out, "high/low  : {:.2} / {:.2}", quote.high, quote.low);
    let _ = writeln!(out, "volume    : {}", quote.volume);
    let _ = writeln!(out, "time      : {}", quote.latest_time_pacific);
    let _ = writeln!(out, "market    : {}", quote.market_status);
}

fn write_watchlist(out: &mut String, watchlist: &Watchlist) {
    if watchlist.is_empty() {
        let _ = writeln!(out, "watchlist is empty");
        return;
    }

    let _ = writeln!(out, "{:<6} {:<32} {:>10}  ADDED", "SYMBOL", "COMPANY", "LAST");
    for entry in watchlist {
        let _ = writeln!(
            out,
            "{:<6} {:<32} {:>10}  {}",
            entry.symbol.as_str(),
            truncate(&entry.company_name, 32),
            entry.last_known_price.as_str(),
            entry.added_at
        );
    }
}

fn write_chart(out: &mut String, dataset: &ChartDataset) {
    let _ = writeln!(
        out,
        "{:<6} {:<32} {:>10} {:>18} {:>12}",
        "SYMBOL", "COMPANY", "PRICE", "CHANGE", "VOLUME"
    );
    for point in &dataset.points {
        let _ = writeln!(
            out,
            "{:<6} {:<32} {:>10.2} {:>18} {:>12}",
            point.symbol.as_str(),
            truncate(&point.company_name, 32),
            point.price,
            signed_change(point.change, point.change_percent),
            point.volume
        );
    }
}

/// `+1.23 (+0.45%)`
fn signed_change(change: f64, percent: f64) -> String {
    format!("{change:+.2} ({percent:+.2}%)")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_owned()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}
