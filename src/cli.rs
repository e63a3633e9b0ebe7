use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::LoggerConfig;
use crate::error::BoxError;
use crate::logging::{Field, LogLevel, Logger};
use crate::pipeline::{Branches, Ingests, Pipeline};

#[derive(Subcommand)]
#[command(version, about, long_about = None)]
pub enum Commands {
    /// Publish one log line through the configured sink
    Log {
        /// Message text
        message: String,
        /// Logger config file (JSON); console sink when omitted
        #[clap(short, long)]
        config: Option<PathBuf>,
        /// Log level: info, success, error or warning
        #[clap(short, long, default_value = "info")]
        level: LogLevel,
        /// Extra `key=value` fields appended to the line
        #[clap(short = 'f', long = "field")]
        fields: Vec<String>,
    },

    /// Categorize a column-oriented JSON dataset as High or Low by a column sum
    Demo {
        /// Input JSON object of equally long column arrays
        #[clap(short, long)]
        input: PathBuf,
        /// Column whose sum is compared against the threshold
        #[clap(long, default_value = "A")]
        column: String,
        /// Sums strictly above this value are High
        #[clap(long, default_value_t = 50.0)]
        threshold: f64,
        /// Logger config file (JSON); console sink when omitted
        #[clap(short, long)]
        config: Option<PathBuf>,
    },
}

/// simple-pipelines command
#[derive(Parser)]
#[command(about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

fn load_logger(config: Option<&Path>) -> Result<Logger, BoxError> {
    let config = match config {
        Some(path) => LoggerConfig::from_file(path)?,
        None => LoggerConfig::default(),
    };
    debug!("Logger config: {:?}", config);
    Ok(Logger::from_config(&config)?)
}

fn parse_field(raw: &str) -> Result<(String, String), BoxError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("field '{raw}' is not in key=value form"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

pub fn log_command(
    message: String,
    config: Option<PathBuf>,
    level: LogLevel,
    fields: Vec<String>,
) -> Result<(), BoxError> {
    let logger = load_logger(config.as_deref())?;
    let pairs = fields
        .iter()
        .map(|raw| parse_field(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let fields: Vec<Field<'_>> = pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value as &dyn std::fmt::Display))
        .collect();

    logger.try_log(level, &message, &fields)?;
    Ok(())
}

fn columns(data: &Value) -> Result<&Map<String, Value>, BoxError> {
    data.as_object()
        .ok_or_else(|| "dataset must be a JSON object of columns".into())
}

/// Sum of a numeric column
pub fn column_sum(data: &Value, column: &str) -> Result<f64, BoxError> {
    let values = columns(data)?
        .get(column)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("column '{column}' is missing or not an array"))?;

    values.iter().try_fold(0.0, |sum, value| {
        value
            .as_f64()
            .map(|v| sum + v)
            .ok_or_else(|| format!("column '{column}' holds a non-numeric value: {value}").into())
    })
}

/// Add (or overwrite) a column holding `value` in every row
pub fn with_constant_column(mut data: Value, column: &str, value: Value) -> Result<Value, BoxError> {
    let rows = columns(&data)?
        .values()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    let object = data
        .as_object_mut()
        .ok_or("dataset must be a JSON object of columns")?;
    object.insert(column.to_string(), Value::Array(vec![value; rows]));
    Ok(data)
}

/// Build the `demo` pipeline: ingest the file, categorize, print
pub fn demo_pipeline(
    input: PathBuf,
    column: String,
    threshold: f64,
    logger: Logger,
) -> Result<Pipeline<Value>, BoxError> {
    let check_name = format!("Check {column} sum");
    let branches = Branches::new()
        .when(
            "high",
            move |data: &Value, _: &Ingests<Value>| Ok(column_sum(data, &column)? > threshold),
            |data, _| with_constant_column(data, "Category", Value::from("High")),
        )
        .otherwise(|data: Value, _: &Ingests<Value>| {
            with_constant_column(data, "Category", Value::from("Low"))
        });

    let pipeline = Pipeline::new("demo", logger)
        .create_ingest("input", move || {
            let content = std::fs::read_to_string(&input)?;
            let data: Value = serde_json::from_str(&content)?;
            Ok(data)
        })?
        .condition(check_name, branches)?
        .output("Print result", |data| {
            println!("{}", serde_json::to_string_pretty(data)?);
            Ok(())
        });
    Ok(pipeline)
}

pub fn demo_command(
    input: PathBuf,
    column: String,
    threshold: f64,
    config: Option<PathBuf>,
) -> Result<(), BoxError> {
    let logger = load_logger(config.as_deref())?;
    info!("Running demo pipeline on {}", input.display());

    let pipeline = demo_pipeline(input, column, threshold, logger)?;
    pipeline
        .execute()
        .map(|_| ())
        .ok_or_else(|| "pipeline produced no result".into())
}
