use std::sync::Arc;

use log::debug;
use serde_json::{json, Value};

use crate::config::{CallMode, ClientConfig, Endpoint, EndpointCatalog, EndpointContract};
use crate::error::Result;
use crate::fetch::{
    Aggregation, ApiRequest, ChunkedRequest, HttpTransport, Params, Payload, ResultAggregator,
    Transport,
};

const AGENT_PATH: &str = "tmai";

/// Result of calling a catalog endpoint in either mode.
#[derive(Debug)]
pub enum EndpointResponse {
    Single(Value),
    Aggregated(Aggregation),
}

impl EndpointResponse {
    pub fn aggregation(&self) -> Option<&Aggregation> {
        match self {
            EndpointResponse::Aggregated(aggregation) => Some(aggregation),
            EndpointResponse::Single(_) => None,
        }
    }

    /// Records in response order: the `data` field, a bare array, or the value itself.
    pub fn records(&self) -> Vec<Value> {
        match self {
            EndpointResponse::Aggregated(aggregation) => aggregation.result.records().to_vec(),
            EndpointResponse::Single(Value::Array(items)) => items.clone(),
            EndpointResponse::Single(value) => match value.get("data") {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::Null) | None => vec![value.clone()],
                Some(other) => vec![other.clone()],
            },
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            EndpointResponse::Single(value) => value,
            EndpointResponse::Aggregated(aggregation) => aggregation.into_value(),
        }
    }
}

/// Typed entry point to the Token Metrics API.
#[derive(Clone)]
pub struct TokenMetricsClient {
    transport: Arc<dyn Transport>,
    catalog: Arc<EndpointCatalog>,
}

impl TokenMetricsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(
            Arc::new(transport),
            EndpointCatalog::builtin()?,
        ))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, catalog: EndpointCatalog) -> Self {
        Self {
            transport,
            catalog: Arc::new(catalog),
        }
    }

    pub fn with_catalog(mut self, catalog: EndpointCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    /// One request, no chunking; every failure goes back to the caller.
    pub async fn request(&self, request: ApiRequest) -> Result<Value> {
        self.transport.send(request).await
    }

    pub async fn aggregate(&self, request: ChunkedRequest) -> Result<Aggregation> {
        ResultAggregator::new(self.transport.as_ref())
            .aggregate(request)
            .await
    }

    /// Call a catalog endpoint and return the merged JSON body.
    pub async fn fetch(&self, endpoint: Endpoint, params: Params) -> Result<Value> {
        Ok(self.call(endpoint.name(), params).await?.into_value())
    }

    /// Like [`fetch`](Self::fetch) but keeps per-chunk diagnostics.
    pub async fn call(&self, name: &str, params: Params) -> Result<EndpointResponse> {
        let contract = self.catalog.require(name)?;
        contract.validate_params(&params)?;
        self.dispatch(contract, params).await
    }

    async fn dispatch(&self, contract: &EndpointContract, params: Params) -> Result<EndpointResponse> {
        let params = contract.resolve_params(params);
        match contract.mode {
            CallMode::Single => {
                debug!("{} -> single request to {}", contract.name, contract.path);
                let request = ApiRequest {
                    method: contract.method,
                    path: contract.path.clone(),
                    payload: Payload::Query(params),
                };
                Ok(EndpointResponse::Single(self.request(request).await?))
            }
            CallMode::Chunked { max_days } => {
                let request = ChunkedRequest::new(contract.path.clone(), params)
                    .with_method(contract.method)
                    .with_max_days(max_days)
                    .with_page_size(contract.page_size);
                Ok(EndpointResponse::Aggregated(self.aggregate(request).await?))
            }
        }
    }

    pub async fn chat(&self, messages: Vec<Value>) -> Result<Value> {
        self.request(ApiRequest::post(AGENT_PATH, json!({ "messages": messages })))
            .await
    }

    pub async fn ask(&self, question: &str) -> Result<Value> {
        self.chat(vec![json!({ "user": question })]).await
    }

    /// The agent's `answer` text, or an empty string when it has none.
    pub async fn answer_text(&self, question: &str) -> Result<String> {
        let response = self.ask(question).await?;
        Ok(response
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{params, HttpMethod};
    use crate::error::AppError;
    use crate::fetch::testing::ScriptedTransport;

    fn client_with(responses: Vec<Result<Value>>) -> (TokenMetricsClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        let client = TokenMetricsClient::with_transport(
            transport.clone(),
            EndpointCatalog::builtin().expect("builtin catalog"),
        );
        (client, transport)
    }

    #[tokio::test]
    async fn missing_required_parameter_fails_before_any_request() {
        let (client, transport) = client_with(vec![]);

        let err = client
            .fetch(Endpoint::Price, params([("startDate", "2023-01-01")]))
            .await
            .expect_err("symbol is required");

        assert!(matches!(err, AppError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn single_endpoints_apply_defaults_and_propagate_errors() {
        let (client, transport) = client_with(vec![
            Ok(json!({ "data": [{ "TOKEN_SYMBOL": "BTC" }] })),
            Err(AppError::Remote {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);

        let body = client
            .fetch(Endpoint::IndexHoldings, params([("index_id", 3)]))
            .await
            .expect("first call succeeds");
        assert_eq!(body["data"][0]["TOKEN_SYMBOL"], json!("BTC"));

        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].path, "index-holdings");
        assert_eq!(
            requests[0].query().cloned().unwrap(),
            params([("index_id", json!(3)), ("limit", json!(1000)), ("page", json!(0))])
        );

        let err = client
            .fetch(Endpoint::IndexHoldings, params([("index_id", 3)]))
            .await
            .expect_err("single calls propagate failures");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn chunked_endpoints_aggregate_and_report_failures() {
        let (client, transport) = client_with(vec![
            Ok(json!({ "success": true, "data": [{ "DATE": "2023-01-01" }] })),
            Err(AppError::Unreachable("timeout".to_string())),
        ]);

        let response = client
            .call(
                "daily_ohlcv",
                params([
                    ("symbol", "BTC"),
                    ("startDate", "2023-01-01"),
                    ("endDate", "2023-02-15"),
                ]),
            )
            .await
            .expect("aggregated calls do not fail on chunk errors");

        let aggregation = response.aggregation().expect("chunked response");
        assert_eq!(
            aggregation.failed_ranges(),
            vec![crate::fetch::DateRange::new(
                Some("2023-01-31"),
                Some("2023-02-15")
            )]
        );
        assert_eq!(response.records().len(), 1);
        assert_eq!(
            response.into_value(),
            json!({ "success": true, "data": [{ "DATE": "2023-01-01" }] })
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests
            .iter()
            .all(|r| r.query().unwrap().get("limit") == Some(&json!(100))));
    }

    #[tokio::test]
    async fn catalog_page_size_overrides_lookup() {
        let catalog = crate::config::loader::parse_catalog(
            r#"{ "endpoints": [ { "name": "signals", "path": "trading-signals",
                 "page_size": 25, "mode": { "type": "chunked", "max_days": 10 } } ] }"#,
        )
        .expect("catalog");
        let (client, transport) = client_with(vec![Ok(json!([])), Ok(json!([]))]);
        let client = client.with_catalog(catalog);

        let body = client
            .call(
                "signals",
                params([("startDate", "2023-01-01"), ("endDate", "2023-01-15")]),
            )
            .await
            .expect("call succeeds")
            .into_value();

        assert_eq!(body, json!({ "data": [] }));
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query().unwrap().get("limit"), Some(&json!(25)));
        assert_eq!(
            requests[0].query().unwrap().get("endDate"),
            Some(&json!("2023-01-11"))
        );
    }

    #[tokio::test]
    async fn agent_questions_are_posted_as_messages() {
        let (client, transport) = client_with(vec![
            Ok(json!({ "answer": "Bitcoin looks bullish." })),
            Ok(json!({ "success": true })),
        ]);

        let answer = client
            .answer_text("What is the outlook for BTC?")
            .await
            .expect("agent answers");
        assert_eq!(answer, "Bitcoin looks bullish.");

        let empty = client.answer_text("Anything?").await.expect("agent answers");
        assert_eq!(empty, "");

        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "tmai");
        assert_eq!(
            requests[0].payload,
            Payload::Body(json!({
                "messages": [{ "user": "What is the outlook for BTC?" }]
            }))
        );
    }

    #[test]
    fn single_response_records_unwrap_data() {
        let keyed = EndpointResponse::Single(json!({ "data": [{ "a": 1 }, { "a": 2 }] }));
        assert_eq!(keyed.records().len(), 2);

        let bare = EndpointResponse::Single(json!([{ "a": 1 }]));
        assert_eq!(bare.records(), vec![json!({ "a": 1 })]);

        let object = EndpointResponse::Single(json!({ "answer": "x" }));
        assert_eq!(object.records(), vec![json!({ "answer": "x" })]);
    }
}
