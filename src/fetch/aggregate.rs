use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::config::HttpMethod;
use crate::error::AppError;

use super::chunk::{chunk_date_range, DateRange, DEFAULT_MAX_DAYS};
use super::decode::{is_truthy, RawResponse};
use super::request::{ApiRequest, Payload, Transport};
use super::{FetchResult, Params};

/// Page size used when neither the caller nor the lookup table names one.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

const PAGE_SIZES: &[(&str, u32)] = &[
    ("daily-ohlcv", 100),
    ("hourly-ohlcv", 1000),
    ("trader-grades", 1000),
    ("investor-grades", 1000),
    ("market-metrics", 1000),
    ("trader-indices", 1000),
    ("trading-signals", 1000),
];

pub fn page_size_for(path: &str) -> u32 {
    let path = path.trim_start_matches('/');
    PAGE_SIZES
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, size)| *size)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// A date-bounded request to be split into one call per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub params: Params,
    pub max_days: u32,
    pub page_size: Option<u32>,
}

impl ChunkedRequest {
    pub fn new(path: impl Into<String>, params: Params) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            params,
            max_days: DEFAULT_MAX_DAYS,
            page_size: None,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = max_days;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }
}

#[derive(Debug)]
pub enum ChunkStatus {
    Fetched { records: usize },
    Failed(AppError),
}

/// What happened to one chunk of an aggregated request.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub range: DateRange,
    pub status: ChunkStatus,
}

impl ChunkOutcome {
    pub fn error(&self) -> Option<&AppError> {
        match &self.status {
            ChunkStatus::Failed(err) => Some(err),
            ChunkStatus::Fetched { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error().is_some()
    }
}

/// Merged records plus the endpoint-level metadata seen along the way.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregatedResult {
    /// Serialised as `{ ...meta, "data": [...] }`.
    Keyed {
        meta: Map<String, Value>,
        data: Vec<Value>,
    },
    /// Serialised as a bare array.
    Records(Vec<Value>),
}

impl AggregatedResult {
    pub fn empty() -> Self {
        AggregatedResult::Keyed {
            meta: Map::new(),
            data: Vec::new(),
        }
    }

    pub fn records(&self) -> &[Value] {
        match self {
            AggregatedResult::Keyed { data, .. } => data,
            AggregatedResult::Records(records) => records,
        }
    }

    pub fn meta(&self) -> Option<&Map<String, Value>> {
        match self {
            AggregatedResult::Keyed { meta, .. } => Some(meta),
            AggregatedResult::Records(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            AggregatedResult::Keyed { mut meta, data } => {
                meta.insert("data".to_string(), Value::Array(data));
                Value::Object(meta)
            }
            AggregatedResult::Records(records) => Value::Array(records),
        }
    }
}

impl From<AggregatedResult> for Value {
    fn from(result: AggregatedResult) -> Self {
        result.into_value()
    }
}

/// The merged result together with the per-chunk diagnostics.
#[derive(Debug)]
pub struct Aggregation {
    pub result: AggregatedResult,
    pub outcomes: Vec<ChunkOutcome>,
}

impl Aggregation {
    pub fn failures(&self) -> impl Iterator<Item = &ChunkOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_failure())
    }

    pub fn failed_ranges(&self) -> Vec<DateRange> {
        self.failures().map(|outcome| outcome.range.clone()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn into_value(self) -> Value {
        self.result.into_value()
    }
}

#[derive(Default)]
struct Accumulator {
    records: Vec<Value>,
    meta: Map<String, Value>,
}

impl Accumulator {
    /// Fold one response in, returning how many records it contributed.
    fn absorb(&mut self, response: RawResponse) -> usize {
        let before = self.records.len();
        match response {
            RawResponse::Keyed { data, meta } => {
                match data {
                    Some(Value::Array(items)) => self.records.extend(items),
                    Some(value) if is_truthy(&value) => self.records.push(value),
                    _ => {}
                }
                // Last chunk wins for repeated metadata keys.
                for (key, value) in meta {
                    self.meta.insert(key, value);
                }
            }
            RawResponse::Sequence(items) => self.records.extend(items),
            RawResponse::Scalar(value) => {
                if is_truthy(&value) {
                    self.records.push(value);
                }
            }
        }
        self.records.len() - before
    }

    fn finish(self) -> AggregatedResult {
        if self.records.is_empty() {
            return AggregatedResult::empty();
        }
        if !self.meta.is_empty() {
            return AggregatedResult::Keyed {
                meta: self.meta,
                data: self.records,
            };
        }
        if self.records[0].is_object() {
            return AggregatedResult::Keyed {
                meta: Map::new(),
                data: self.records,
            };
        }
        AggregatedResult::Records(self.records)
    }
}

/// Issues one request per date chunk, in order, and merges the responses.
pub struct ResultAggregator<'a> {
    transport: &'a dyn Transport,
}

impl<'a> ResultAggregator<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Remote and connectivity failures are recorded per chunk and skipped;
    /// only a request that cannot be constructed aborts the run.
    pub async fn aggregate(&self, request: ChunkedRequest) -> FetchResult<Aggregation> {
        let ChunkedRequest {
            method,
            path,
            mut params,
            max_days,
            page_size,
        } = request;

        let page_size = page_size.unwrap_or_else(|| page_size_for(&path));
        params.remove("page");

        let chunks = chunk_date_range(
            date_param(&params, "startDate"),
            date_param(&params, "endDate"),
            max_days,
        );

        info!("Fetching {path} data...");

        let mut accumulator = Accumulator::default();
        let mut outcomes = Vec::with_capacity(chunks.len());

        for (idx, range) in chunks.into_iter().enumerate() {
            let chunk_params = chunk_params(&params, &range, page_size);
            debug!(
                "Requesting {path} chunk {} ({}) with limit {page_size}",
                idx + 1,
                range.label()
            );

            let status = match self
                .transport
                .send(ApiRequest {
                    method,
                    path: path.clone(),
                    payload: Payload::Query(chunk_params),
                })
                .await
            {
                Ok(body) => ChunkStatus::Fetched {
                    records: accumulator.absorb(RawResponse::from(body)),
                },
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("Error fetching chunk {}: {err}", range.label());
                    ChunkStatus::Failed(err)
                }
            };

            info!("Processed chunk: {}", range.label());
            outcomes.push(ChunkOutcome { range, status });
        }

        Ok(Aggregation {
            result: accumulator.finish(),
            outcomes,
        })
    }
}

fn date_param<'p>(params: &'p Params, key: &str) -> Option<&'p str> {
    params.get(key).and_then(Value::as_str)
}

fn chunk_params(base: &Params, range: &DateRange, page_size: u32) -> Params {
    let mut params = base.clone();
    if let Some(start) = range.start.as_deref().filter(|s| !s.is_empty()) {
        params.insert("startDate".to_string(), Value::from(start));
    }
    if let Some(end) = range.end.as_deref().filter(|s| !s.is_empty()) {
        params.insert("endDate".to_string(), Value::from(end));
    }
    params.insert("limit".to_string(), Value::from(page_size));
    params.insert("page".to_string(), Value::from(0));
    params
}
