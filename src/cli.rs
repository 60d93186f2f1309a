use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use tmai_client::config::CallMode;
use tmai_client::fetch::chunk::DEFAULT_MAX_DAYS;
use tmai_client::records::RecordTable;
use tmai_client::{
    chunk_date_range, EndpointCatalog, EndpointResponse, Params, Result, TokenMetricsClient,
};

#[derive(Parser)]
#[command(name = "tmai")]
#[command(about = "Query the Token Metrics API with automatic date-range chunking")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Endpoint catalog JSON replacing the built-in one
    #[arg(long, global = true, env = "TMAI_ENDPOINTS_FILE")]
    pub endpoints: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Call an endpoint and print the merged response
    Fetch {
        /// Endpoint name, e.g. daily_ohlcv or trader-grades
        endpoint: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask the AI agent a question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// List the endpoints in the catalog
    Endpoints,

    /// Print how a date range would be split, without calling the API
    Chunks {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value_t = DEFAULT_MAX_DAYS)]
        max_days: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Chunks {
            ref start,
            ref end,
            max_days,
        } => {
            for range in chunk_date_range(Some(start.as_str()), Some(end.as_str()), max_days) {
                println!(
                    "{}\t{}",
                    range.start.unwrap_or_default(),
                    range.end.unwrap_or_default()
                );
            }
        }
        Commands::Endpoints => {
            let catalog = load_catalog(cli.endpoints.as_deref())?;
            for contract in catalog.iter() {
                let mode = match contract.mode {
                    CallMode::Single => "single".to_string(),
                    CallMode::Chunked { max_days } => format!("chunked/{max_days}d"),
                };
                println!(
                    "{:<28} {:<5} {:<28} {:<12} {}",
                    contract.name,
                    contract.method,
                    contract.path,
                    mode,
                    contract.required.join(",")
                );
            }
        }
        Commands::Fetch {
            ref endpoint,
            ref params,
            format,
            ref output,
        } => {
            let catalog = load_catalog(cli.endpoints.as_deref())?;
            let client = TokenMetricsClient::from_env()?.with_catalog(catalog);
            let params: Params = params.iter().cloned().collect();

            let response = client.call(endpoint, params).await?;
            report_failures(&response);
            write_response(response, format, output.as_deref())?;
        }
        Commands::Ask { ref question } => {
            let client = TokenMetricsClient::from_env()?;
            let answer = client.answer_text(&question.join(" ")).await?;
            println!("{answer}");
        }
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<EndpointCatalog> {
    match path {
        Some(path) => EndpointCatalog::load(path),
        None => EndpointCatalog::builtin(),
    }
}

fn report_failures(response: &EndpointResponse) {
    let Some(aggregation) = response.aggregation() else {
        return;
    };
    for outcome in aggregation.failures() {
        if let Some(err) = outcome.error() {
            eprintln!("warning: chunk {} skipped: {err}", outcome.range.label());
        }
    }
}

fn write_response(
    response: EndpointResponse,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let table = RecordTable::from_records(&response.records());
            match output {
                Some(path) => table.save_to_csv(path),
                None => table.write_to(io::stdout().lock()),
            }
        }
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&response.into_value())?;
            match output {
                Some(path) => std::fs::write(path, rendered + "\n")?,
                None => {
                    let mut out = io::stdout().lock();
                    writeln!(out, "{rendered}")?;
                }
            }
            Ok(())
        }
    }
}

fn parse_param(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("parameter name missing in `{raw}`"));
    }
    Ok((key.to_string(), parse_param_value(value.trim())))
}

/// Integers, floats and booleans keep their JSON type; everything else is a string.
fn parse_param_value(raw: &str) -> Value {
    let has_leading_zero = raw.len() > 1 && raw.starts_with('0') && !raw.starts_with("0.");
    if !has_leading_zero {
        if let Ok(int) = raw.parse::<i64>() {
            return Value::from(int);
        }
        if let Some(number) = raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(serde_json::Number::from_f64)
        {
            return Value::Number(number);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}
