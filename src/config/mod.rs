use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::error::{AppError, Context, Result};
use crate::fetch::decode::is_truthy;
use crate::fetch::Params;

pub mod endpoint;
pub mod loader;
pub mod validator;

pub use endpoint::Endpoint;

pub const DEFAULT_BASE_URL: &str = "https://api.tokenmetrics.com/v2";
pub const API_KEY_ENV: &str = "TOKEN_METRICS_API_KEY";
pub const BASE_URL_ENV: &str = "TMAI_BASE_URL";
pub const TIMEOUT_ENV: &str = "TMAI_TIMEOUT_SECS";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BUILTIN_CATALOG: &str = include_str!("../../assets/endpoints.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            _ => Err(AppError::construction(format!(
                "Unsupported HTTP method: {value}"
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// How an endpoint is invoked: a single request, or one request per date chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Single,
    Chunked { max_days: u32 },
}

/// Per-endpoint defaults resolved once and passed to the fetch layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointContract {
    pub name: String,
    pub path: String,
    pub method: HttpMethod,
    pub mode: CallMode,
    /// Overrides the page-size lookup when set.
    pub page_size: Option<u32>,
    pub required: Vec<String>,
    pub defaults: Params,
}

impl EndpointContract {
    /// Fail before any request when a required parameter is absent or falsy.
    pub fn validate_params(&self, params: &Params) -> Result<()> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|field| !params.get(field.as_str()).is_some_and(is_truthy))
            .map(String::as_str)
            .collect();

        match missing.as_slice() {
            [] => Ok(()),
            [single] => Err(AppError::validation(format!(
                "{single} parameter is required for {}",
                self.name
            ))),
            many => Err(AppError::validation(format!(
                "{} parameters are required for {}",
                many.join(" and "),
                self.name
            ))),
        }
    }

    /// Lay caller parameters over the endpoint defaults; the caller wins.
    pub fn resolve_params(&self, params: Params) -> Params {
        let mut resolved = self.defaults.clone();
        for (key, value) in params {
            resolved.insert(key, value);
        }
        resolved
    }
}

/// Ordered set of endpoint contracts addressable by name.
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    entries: Vec<EndpointContract>,
    index: HashMap<String, usize>,
}

impl EndpointCatalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let catalog =
            loader::parse_catalog(BUILTIN_CATALOG).context("built-in endpoint catalog is invalid")?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        loader::load_catalog(path.as_ref())
    }

    pub(crate) fn from_contracts(entries: Vec<EndpointContract>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(idx, contract)| (catalog_key(&contract.name), idx))
            .collect();
        Self { entries, index }
    }

    /// Look up a contract by name, ignoring case and `-`/`_` spelling.
    pub fn get(&self, name: &str) -> Option<&EndpointContract> {
        self.index
            .get(&catalog_key(name))
            .and_then(|idx| self.entries.get(*idx))
    }

    pub fn require(&self, name: &str) -> Result<&EndpointContract> {
        self.get(name)
            .ok_or_else(|| AppError::message(format!("Unknown endpoint `{name}`")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointContract> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup key for endpoint names: `Daily-OHLCV` and `daily_ohlcv` are the same endpoint.
pub(crate) fn catalog_key(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

/// Connection settings for the HTTP transport.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the API key, base URL and timeout from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("Environment variable {API_KEY_ENV} is not set"))?;
        let mut config = Self::new(api_key);

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV} must be a whole number of seconds"))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Join the base URL and an endpoint path with exactly one slash.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Convenience for building parameter maps from literal pairs.
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_catalog_loads_every_endpoint() {
        let catalog = EndpointCatalog::builtin().expect("builtin catalog");
        assert_eq!(catalog.len(), Endpoint::ALL.len());
        for endpoint in Endpoint::ALL {
            assert!(
                catalog.get(endpoint.name()).is_some(),
                "missing contract for {}",
                endpoint.name()
            );
        }

        let daily = catalog.require("daily_ohlcv").expect("daily contract");
        assert_eq!(daily.path, "daily-ohlcv");
        assert_eq!(daily.mode, CallMode::Chunked { max_days: 29 });

        let sentiment = catalog.require("SENTIMENT").expect("lookup ignores case");
        assert_eq!(sentiment.path, "sentiments");

        let grades = catalog.require("Trader-Grades").expect("dashes match underscores");
        assert_eq!(grades.name, "trader_grades");
    }

    #[test]
    fn unknown_endpoint_is_reported() {
        let catalog = EndpointCatalog::builtin().expect("builtin catalog");
        let err = catalog.require("weather").expect_err("unknown endpoint");
        assert!(err.to_string().contains("weather"));
    }

    #[test]
    fn parses_http_methods() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        let err = "patch".parse::<HttpMethod>().expect_err("unsupported");
        assert!(matches!(err, AppError::RequestConstruction(_)));
    }

    #[test]
    fn validates_required_parameters() {
        let catalog = EndpointCatalog::builtin().expect("builtin catalog");
        let correlation = catalog.require("correlation").unwrap();

        let err = correlation
            .validate_params(&params([("base_symbol", "BTC")]))
            .expect_err("quote_symbol missing");
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("quote_symbol parameter is required"));

        let err = correlation
            .validate_params(&Params::new())
            .expect_err("both missing");
        assert!(err
            .to_string()
            .contains("base_symbol and quote_symbol parameters are required"));

        let price = catalog.require("price").unwrap();
        assert!(price.validate_params(&params([("symbol", "")])).is_err());
        assert!(price.validate_params(&params([("symbol", "BTC")])).is_ok());
    }

    #[test]
    fn caller_parameters_override_defaults() {
        let catalog = EndpointCatalog::builtin().expect("builtin catalog");
        let top = catalog.require("top_market_cap_tokens").unwrap();
        let resolved = top.resolve_params(params([("top_k", json!(5))]));
        assert_eq!(resolved.get("top_k"), Some(&json!(5)));
        assert_eq!(resolved.get("page"), Some(&json!(0)));
    }

    #[test]
    fn joins_endpoint_urls() {
        let config = ClientConfig::new("key").with_base_url("http://localhost:8080/v2/");
        assert_eq!(
            config.endpoint_url("/daily-ohlcv"),
            "http://localhost:8080/v2/daily-ohlcv"
        );
        assert_eq!(
            ClientConfig::new("key").endpoint_url("tokens"),
            "https://api.tokenmetrics.com/v2/tokens"
        );
    }

    #[test]
    fn timeout_can_be_overridden() {
        let config = ClientConfig::new("key");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        let config = config.with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = ClientConfig::new("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
