use crate::error::Result;

pub mod aggregate;
pub mod chunk;
pub mod decode;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{
    AggregatedResult, Aggregation, ChunkOutcome, ChunkStatus, ChunkedRequest, ResultAggregator,
};
pub use chunk::{chunk_date_range, DateRange};
pub use decode::RawResponse;
pub use request::{ApiRequest, HttpTransport, Payload, Transport};

/// Request parameters keyed by name, in insertion order.
pub type Params = serde_json::Map<String, serde_json::Value>;

pub type FetchResult<T> = Result<T>;
