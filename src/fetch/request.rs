use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::config::{ClientConfig, HttpMethod};
use crate::error::AppError;

use super::decode::value_to_string;
use super::{FetchResult, Params};

const API_KEY_HEADER: &str = "api_key";

/// Query parameters for GET, or a JSON body for POST.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Query(Params),
    Body(Value),
}

/// One call against the API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub payload: Payload,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>, params: Params) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            payload: Payload::Query(params),
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            payload: Payload::Body(body),
        }
    }

    pub fn query(&self) -> Option<&Params> {
        match &self.payload {
            Payload::Query(params) => Some(params),
            Payload::Body(_) => None,
        }
    }
}

/// A single-attempt request executor. Retries belong to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> FetchResult<Value>;
}

/// reqwest-backed transport that authenticates with the `api_key` header.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> FetchResult<Self> {
        let headers = build_headers(&config.api_key)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                AppError::construction(format!("failed to construct HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            config,
            headers,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> FetchResult<Value> {
        let url = self.config.endpoint_url(&request.path);
        debug!("{} {}", request.method, url);

        let builder = match (request.method, &request.payload) {
            (HttpMethod::Get, Payload::Query(params)) => {
                self.client.get(&url).query(&query_pairs(params))
            }
            (HttpMethod::Get, Payload::Body(_)) => {
                return Err(AppError::construction(format!(
                    "GET {} cannot carry a JSON body",
                    request.path
                )))
            }
            (HttpMethod::Post, Payload::Body(body)) => self.client.post(&url).json(body),
            (HttpMethod::Post, Payload::Query(params)) => {
                self.client.post(&url).json(&Value::Object(params.clone()))
            }
        };

        let response = builder
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(remote_error(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|err| AppError::Unreachable(format!("failed to read response body: {err}")))?;

        Ok(serde_json::from_str(&body)?)
    }
}

fn build_headers(api_key: &str) -> FetchResult<HeaderMap> {
    let mut map = HeaderMap::new();
    map.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut value = HeaderValue::from_str(api_key)
        .map_err(|_| AppError::construction("API key is not a valid header value"))?;
    value.set_sensitive(true);
    map.insert(HeaderName::from_static(API_KEY_HEADER), value);
    Ok(map)
}

fn query_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value_to_string(value)))
        .collect()
}

fn classify_send_error(err: reqwest::Error) -> AppError {
    if err.is_builder() {
        AppError::construction(err.to_string())
    } else {
        AppError::Unreachable(err.to_string())
    }
}

async fn remote_error(status: StatusCode, response: Response) -> AppError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| status.as_str().to_string());

    AppError::Remote {
        status: status.as_u16(),
        message,
    }
}
