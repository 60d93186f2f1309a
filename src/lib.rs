pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod records;

pub use client::{EndpointResponse, TokenMetricsClient};
pub use config::{params, ClientConfig, Endpoint, EndpointCatalog};
pub use error::{AppError, Result};
pub use fetch::{chunk_date_range, AggregatedResult, Aggregation, DateRange, Params};
