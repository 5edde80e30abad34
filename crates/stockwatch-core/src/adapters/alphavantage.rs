use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::domain::company;
use crate::domain::market_time::{self, US_PACIFIC};
use crate::gateway::{FetchError, FetchFuture, QuoteGateway};
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest, ReqwestHttpClient};
use crate::throttling::RequestBudget;
use crate::{Quote, Symbol};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

const INTRADAY_INTERVAL: &str = "5min";
const TIME_SERIES_KEY: &str = "Time Series (5min)";
const API_KEY_PARAM: &str = "apikey";

/// Alpha Vantage quote gateway built on the `TIME_SERIES_INTRADAY` endpoint.
///
/// The newest 5-minute bar becomes the quote; open-to-close movement, the
/// Pacific timestamp and the market status are derived from it.
#[derive(Clone)]
pub struct AlphaVantageGateway {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    budget: RequestBudget,
}

impl AlphaVantageGateway {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self::with_optional_key(http_client, Some(api_key.into()))
    }

    /// Without a key every fetch fails with `API_KEY_MISSING` before any request.
    fn with_optional_key(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        let defaults = AppConfig::default();
        Self {
            http_client,
            api_key,
            base_url: defaults.base_url,
            timeout: defaults.request_timeout,
            budget: RequestBudget::new(defaults.rate_limit_window, defaults.rate_limit_requests),
        }
    }

    /// Production gateway with a reqwest transport and settings from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.api_key.is_none() {
            warn!("ALPHA_VANTAGE_API_KEY not set; quote requests will fail");
        }
        Self::with_optional_key(Arc::new(ReqwestHttpClient::new()), config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.request_timeout)
            .with_budget(RequestBudget::new(
                config.rate_limit_window,
                config.rate_limit_requests,
            ))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_budget(mut self, budget: RequestBudget) -> Self {
        self.budget = budget;
        self
    }

    fn intraday_request(&self, symbol: &Symbol, api_key: &str) -> HttpRequest {
        HttpRequest::get(&self.base_url)
            .with_query("function", "TIME_SERIES_INTRADAY")
            .with_query("symbol", symbol.as_str())
            .with_query("interval", INTRADAY_INTERVAL)
            .with_query(API_KEY_PARAM, api_key)
            .with_timeout(self.timeout)
    }

    async fn fetch_intraday(&self, symbol: &Symbol) -> Result<Quote, FetchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(FetchError::missing_api_key(symbol));
        };
        if let Err(delay) = self.budget.acquire() {
            warn!(%symbol, "local request budget exhausted");
            return Err(FetchError::rate_limited(
                symbol,
                format!(
                    "local request budget exhausted; retry in {:.0}s",
                    delay.as_secs_f64().ceil()
                ),
            ));
        }

        let request = self.intraday_request(symbol, api_key);
        debug!(url = %request.redacted_url(API_KEY_PARAM), "requesting intraday series");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| match error.kind() {
                HttpErrorKind::Timeout => FetchError::timeout(
                    symbol,
                    format!("alphavantage request timed out: {}", error.message()),
                ),
                HttpErrorKind::Connect | HttpErrorKind::Other => FetchError::network(
                    symbol,
                    format!("alphavantage transport error: {}", error.message()),
                ),
            })?;

        if response.status == 429 {
            return Err(FetchError::rate_limited(
                symbol,
                "alphavantage returned status 429",
            ));
        }
        if !response.is_success() {
            return Err(FetchError::network(
                symbol,
                format!("alphavantage returned status {}", response.status),
            ));
        }

        parse_intraday(symbol, &response.body)
    }
}

impl QuoteGateway for AlphaVantageGateway {
    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a> {
        Box::pin(self.fetch_intraday(symbol))
    }
}

impl std::fmt::Debug for AlphaVantageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageGateway")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct MetaData {
    #[serde(rename = "2. Symbol")]
    symbol: String,
    #[serde(rename = "3. Last Refreshed")]
    last_refreshed: String,
}

#[derive(Debug, Deserialize)]
struct IntradayBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Reshape a `TIME_SERIES_INTRADAY` body into a [`Quote`].
///
/// Provider notices are checked before the data keys, in the order the API
/// uses them: `Information`, `Error Message`, `Note`.
pub(crate) fn parse_intraday(symbol: &Symbol, body: &str) -> Result<Quote, FetchError> {
    let payload: Value = serde_json::from_str(body).map_err(|e| {
        FetchError::malformed(symbol, format!("response is not valid JSON: {e}"))
    })?;
    let Some(object) = payload.as_object() else {
        return Err(FetchError::malformed(symbol, "response is not a JSON object"));
    };

    if let Some(information) = object.get("Information").and_then(Value::as_str) {
        if information.to_ascii_lowercase().contains("rate limit") {
            warn!(%symbol, "alphavantage rate limit reached");
            return Err(FetchError::rate_limited(symbol, information));
        }
        return Err(FetchError::malformed(
            symbol,
            format!("API Information: {information}"),
        ));
    }

    if let Some(message) = object.get("Error Message").and_then(Value::as_str) {
        return Err(FetchError::not_found(symbol, message));
    }

    if let Some(note) = object.get("Note").and_then(Value::as_str) {
        warn!(%symbol, "alphavantage note received, treating as rate limit");
        return Err(FetchError::rate_limited(symbol, note));
    }

    let meta: MetaData = object
        .get("Meta Data")
        .cloned()
        .ok_or_else(|| FetchError::malformed(symbol, "missing Meta Data"))
        .and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| FetchError::malformed(symbol, format!("invalid Meta Data: {e}")))
        })?;

    let series: BTreeMap<String, IntradayBar> = match object.get(TIME_SERIES_KEY) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            FetchError::malformed(symbol, format!("invalid time series: {e}"))
        })?,
        None => {
            let keys = object.keys().cloned().collect::<Vec<_>>().join(", ");
            return Err(FetchError::not_found(
                symbol,
                format!("no time series data available (keys: {keys})"),
            ));
        }
    };

    let Some((latest_time, bar)) = series.last_key_value() else {
        return Err(FetchError::not_found(symbol, "time series is empty"));
    };

    let eastern = market_time::parse_eastern(latest_time).ok_or_else(|| {
        FetchError::malformed(symbol, format!("unparsable bar timestamp '{latest_time}'"))
    })?;
    let pacific = US_PACIFIC.from_instant(eastern.local);

    let open = parse_decimal(symbol, "open", &bar.open)?;
    let high = parse_decimal(symbol, "high", &bar.high)?;
    let low = parse_decimal(symbol, "low", &bar.low)?;
    let close = parse_decimal(symbol, "close", &bar.close)?;
    let volume = bar.volume.trim().parse::<u64>().map_err(|_| {
        FetchError::malformed(symbol, format!("invalid volume '{}'", bar.volume))
    })?;

    // The quote always answers for the requested ticker, whatever the payload echoes.
    if !meta.symbol.trim().eq_ignore_ascii_case(symbol.as_str()) {
        warn!(%symbol, echoed = %meta.symbol, "alphavantage echoed a different symbol");
    }
    if !company::is_known(symbol) {
        debug!(%symbol, "no company name on file, using ticker");
    }
    let (price_change, price_change_percent) = Quote::price_change_from(open, close);

    Ok(Quote {
        company_name: company::company_name(symbol).to_owned(),
        symbol: symbol.clone(),
        open,
        high,
        low,
        close,
        volume,
        last_refreshed: meta.last_refreshed,
        latest_time_eastern: latest_time.clone(),
        latest_time_pacific: pacific.format(),
        price_change,
        price_change_percent,
        market_status: market_time::market_status(&pacific),
    })
}

fn parse_decimal(symbol: &Symbol, field: &str, raw: &str) -> Result<f64, FetchError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| FetchError::malformed(symbol, format!("invalid {field} '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FetchErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::MarketStatus;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    const AAPL_BODY: &str = r#"{
        "Meta Data": {
            "1. Information": "Intraday (5min) open, high, low, close prices and volume",
            "2. Symbol": "AAPL",
            "3. Last Refreshed": "2024-01-05 16:00:00",
            "4. Interval": "5min",
            "5. Output Size": "Compact",
            "6. Time Zone": "US/Eastern"
        },
        "Time Series (5min)": {
            "2024-01-05 15:55:00": {
                "1. open": "181.5000",
                "2. high": "181.9000",
                "3. low": "181.4000",
                "4. close": "181.9900",
                "5. volume": "900000"
            },
            "2024-01-05 16:00:00": {
                "1. open": "181.9900",
                "2. high": "182.1000",
                "3. low": "181.0500",
                "4. close": "181.1800",
                "5. volume": "1234567"
            }
        }
    }"#;

    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn replying(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    async fn fetch_with(body: Result<HttpResponse, HttpError>) -> Result<Quote, FetchError> {
        let gateway = AlphaVantageGateway::new(RecordingHttpClient::replying(body), "alpha-key");
        gateway.fetch_quote(&symbol("AAPL")).await
    }

    #[tokio::test]
    async fn reshapes_latest_bar_into_quote() {
        let quote = fetch_with(Ok(HttpResponse::ok_json(AAPL_BODY)))
            .await
            .expect("quote should parse");

        assert_eq!(quote.symbol.as_str(), "AAPL");
        assert_eq!(quote.company_name, "Apple Inc.");
        assert_eq!(quote.open, 181.99);
        assert_eq!(quote.close, 181.18);
        assert_eq!(quote.volume, 1_234_567);
        assert_eq!(quote.latest_time_eastern, "2024-01-05 16:00:00");
        assert_eq!(quote.latest_time_pacific, "2024-01-05 13:00:00 PST");
        assert_eq!(quote.last_refreshed, "2024-01-05 16:00:00");
        assert!((quote.price_change - -0.81).abs() < 1e-9);
        assert!((quote.price_change_percent - -0.45).abs() < 1e-9);
        assert_eq!(quote.market_status, MarketStatus::Open);
    }

    #[tokio::test]
    async fn quote_keeps_the_requested_symbol_when_meta_data_disagrees() {
        let body = AAPL_BODY.replace("\"2. Symbol\": \"AAPL\"", "\"2. Symbol\": \"MSFT\"");
        assert!(body.contains("MSFT"));

        let quote = fetch_with(Ok(HttpResponse::ok_json(body)))
            .await
            .expect("quote should parse");

        assert_eq!(quote.symbol.as_str(), "AAPL");
        assert_eq!(quote.company_name, "Apple Inc.");
    }

    #[tokio::test]
    async fn request_carries_intraday_parameters() {
        let client = RecordingHttpClient::replying(Ok(HttpResponse::ok_json(AAPL_BODY)));
        let gateway = AlphaVantageGateway::new(client.clone(), "alpha-key")
            .with_base_url("https://example.test/query")
            .with_timeout(Duration::from_millis(1_500));

        gateway
            .fetch_quote(&symbol("AAPL"))
            .await
            .expect("quote should parse");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].timeout, Duration::from_millis(1_500));
        assert_eq!(
            requests[0].full_url(),
            "https://example.test/query?function=TIME_SERIES_INTRADAY&symbol=AAPL&interval=5min&apikey=alpha-key"
        );
    }

    #[tokio::test]
    async fn error_message_maps_to_not_found() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        let error = fetch_with(Ok(HttpResponse::ok_json(body)))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rate_limit_notices_map_to_rate_limited() {
        for body in [
            r#"{"Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#,
            r#"{"Note": "Thank you for using Alpha Vantage! Please consider spreading out your free API requests."}"#,
        ] {
            let error = fetch_with(Ok(HttpResponse::ok_json(body)))
                .await
                .expect_err("must fail");
            assert_eq!(error.kind(), FetchErrorKind::RateLimited, "{body}");
        }

        let error = fetch_with(Ok(HttpResponse::with_status(429, "")))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn other_information_is_malformed() {
        let body = r#"{"Information": "This is a premium endpoint."}"#;
        let error = fetch_with(Ok(HttpResponse::ok_json(body)))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::Malformed);
        assert!(error.message().contains("premium"));
    }

    #[tokio::test]
    async fn missing_sections_are_classified() {
        let error = fetch_with(Ok(HttpResponse::ok_json("{}")))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::Malformed);

        let body = r#"{"Meta Data": {"2. Symbol": "AAPL", "3. Last Refreshed": "2024-01-05 16:00:00"}}"#;
        let error = fetch_with(Ok(HttpResponse::ok_json(body)))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::NotFound);
    }

    #[tokio::test]
    async fn garbage_fields_are_malformed() {
        let body = AAPL_BODY.replace("\"1234567\"", "\"lots\"");
        let error = fetch_with(Ok(HttpResponse::ok_json(body)))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::Malformed);

        let error = fetch_with(Ok(HttpResponse::ok_json("<html>")))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::Malformed);
    }

    #[tokio::test]
    async fn transport_failures_are_network_errors() {
        for failure in [
            Err(HttpError::timeout("deadline exceeded")),
            Err(HttpError::connect("refused")),
            Ok(HttpResponse::with_status(503, "")),
        ] {
            let error = fetch_with(failure).await.expect_err("must fail");
            assert_eq!(error.kind(), FetchErrorKind::Network);
        }
    }

    #[tokio::test]
    async fn transport_timeout_keeps_its_own_message() {
        let error = fetch_with(Err(HttpError::timeout("deadline exceeded")))
            .await
            .expect_err("must fail");

        assert!(error.is_timeout());
        assert_eq!(error.code(), "REQUEST_TIMEOUT");
        assert_eq!(error.user_message(), "Request timeout. Please try again.");

        let error = fetch_with(Err(HttpError::connect("refused")))
            .await
            .expect_err("must fail");
        assert!(!error.is_timeout());
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = RecordingHttpClient::replying(Ok(HttpResponse::ok_json(AAPL_BODY)));
        let gateway = AlphaVantageGateway::with_optional_key(client.clone(), None);

        let error = gateway
            .fetch_quote(&symbol("MSFT"))
            .await
            .expect_err("no key configured");

        assert_eq!(error.kind(), FetchErrorKind::Configuration);
        assert_eq!(error.code(), "API_KEY_MISSING");
        assert!(client.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn exhausted_budget_skips_the_network() {
        let client = RecordingHttpClient::replying(Ok(HttpResponse::ok_json(AAPL_BODY)));
        let gateway = AlphaVantageGateway::new(client.clone(), "alpha-key")
            .with_budget(RequestBudget::new(Duration::from_secs(3600), 1));

        assert!(gateway.fetch_quote(&symbol("AAPL")).await.is_ok());
        let error = gateway
            .fetch_quote(&symbol("AAPL"))
            .await
            .expect_err("second call exceeds budget");

        assert_eq!(error.kind(), FetchErrorKind::RateLimited);
        assert_eq!(client.recorded_requests().len(), 1);
    }
}
