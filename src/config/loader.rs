use std::{fs, path::Path};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Context, Result};
use crate::fetch::chunk::DEFAULT_MAX_DAYS;
use crate::fetch::Params;

use super::{validator, CallMode, EndpointCatalog, EndpointContract, HttpMethod};

/// Read and validate an endpoint catalog JSON file.
pub fn load_catalog(path: &Path) -> Result<EndpointCatalog> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read endpoint catalog at {}", path.display()))?;

    let catalog = parse_catalog(&json)
        .with_context(|| format!("failed to load endpoint catalog at {}", path.display()))?;
    Ok(catalog)
}

/// Parse a catalog document and run the validator over the result.
pub fn parse_catalog(json: &str) -> Result<EndpointCatalog> {
    let raw: RawCatalog = serde_json::from_str(json)?;

    let contracts = raw
        .endpoints
        .into_iter()
        .map(RawEndpoint::into_contract)
        .collect::<Result<Vec<_>>>()?;

    validator::validate_contracts(&contracts)?;
    Ok(EndpointCatalog::from_contracts(contracts))
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    endpoints: Vec<RawEndpoint>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    name: String,
    path: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    mode: RawMode,
    #[serde(default)]
    page_size: Option<u32>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    defaults: Value,
}

impl RawEndpoint {
    fn into_contract(self) -> Result<EndpointContract> {
        let method: HttpMethod = self.method.parse()?;

        let defaults: Params = match self.defaults {
            Value::Null => Params::new(),
            Value::Object(map) => map,
            other => {
                return Err(AppError::message(format!(
                    "endpoint `{}`: defaults must be a JSON object, found {}",
                    self.name, other
                )))
            }
        };

        Ok(EndpointContract {
            name: self.name,
            path: self.path,
            method,
            mode: self.mode.into_mode(),
            page_size: self.page_size,
            required: self.required,
            defaults,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawMode {
    #[default]
    Single,
    Chunked {
        #[serde(default = "default_max_days")]
        max_days: u32,
    },
}

impl RawMode {
    fn into_mode(self) -> CallMode {
        match self {
            RawMode::Single => CallMode::Single,
            RawMode::Chunked { max_days } => CallMode::Chunked { max_days },
        }
    }
}

fn default_method() -> String {
    "get".to_string()
}

fn default_max_days() -> u32 {
    DEFAULT_MAX_DAYS
}
