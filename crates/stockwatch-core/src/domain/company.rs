use crate::Symbol;

const KNOWN_COMPANIES: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("TSLA", "Tesla, Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("AMZN", "Amazon.com, Inc."),
    ("META", "Meta Platforms, Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("NFLX", "Netflix, Inc."),
    ("SPY", "SPDR S&P 500 ETF Trust"),
    ("QQQ", "Invesco QQQ Trust"),
    ("IWM", "iShares Russell 2000 ETF"),
    ("VTI", "Vanguard Total Stock Market ETF"),
    ("VOO", "Vanguard S&P 500 ETF"),
    ("ARKK", "ARK Innovation ETF"),
    ("BTC", "Bitcoin"),
    ("ETH", "Ethereum"),
    ("COIN", "Coinbase Global, Inc."),
    ("SQ", "Block, Inc."),
    ("PYPL", "PayPal Holdings, Inc."),
    ("ADBE", "Adobe Inc."),
    ("CRM", "Salesforce, Inc."),
    ("ORCL", "Oracle Corporation"),
    ("IBM", "International Business Machines Corporation"),
    ("INTC", "Intel Corporation"),
    ("AMD", "Advanced Micro Devices, Inc."),
];

/// Display name for a symbol; unknown symbols fall back to the ticker itself.
pub fn company_name(symbol: &Symbol) -> &str {
    KNOWN_COMPANIES
        .iter()
        .find(|(ticker, _)| *ticker == symbol.as_str())
        .map(|(_, name)| *name)
        .unwrap_or_else(|| symbol.as_str())
}

/// Whether the symbol is in the bundled company directory.
pub fn is_known(symbol: &Symbol) -> bool {
    KNOWN_COMPANIES
        .iter()
        .any(|(ticker, _)| *ticker == symbol.as_str())
}
