//! dataset parser registry - parse uploaded files into observations

pub mod csv;
pub mod json;

pub use self::csv::CsvParser;
pub use self::json::JsonParser;

use crate::{sort_by_timestamp, Observation, RawObservation};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

// ingestion error type
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Row {row}: unparseable timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("Row {row}: temperature {value} is not a finite number")]
    InvalidTemperature { row: usize, value: f64 },

    #[error("Row {row}: unknown season '{value}'")]
    InvalidSeason { row: usize, value: String },

    #[error("Unknown format: {0}")]
    UnknownFormat(String),
}

// Parser trait - every dataset format implements this

pub trait DatasetParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, input: &str) -> Result<Vec<RawObservation>, IngestError>;
}

// Registry to hold all parsers

pub struct ParserRegistry {
    parsers: HashMap<String, Box<dyn DatasetParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self { parsers: HashMap::new() }
    }

    /// Registry with the csv and json parsers already registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CsvParser::new()));
        registry.register(Box::new(JsonParser::new()));
        registry
    }

    // register a parser
    pub fn register(&mut self, parser: Box<dyn DatasetParser>) {
        self.parsers.insert(parser.name().to_string(), parser);
    }

    // Get parser by name
    pub fn get(&self, name: &str) -> Option<&dyn DatasetParser> {
        self.parsers.get(name).map(|p| p.as_ref())
    }

    //parse using specified format
    pub fn parse(&self, format: &str, input: &str) -> Result<Vec<RawObservation>, IngestError> {
        match self.get(format) {
            Some(parser) => parser.parse(input),
            None => Err(IngestError::UnknownFormat(format.to_string())),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Convert raw rows into observations, stable-sorted by timestamp.
/// Row numbers in errors are 1-based data rows (header excluded).
pub fn into_observations(rows: Vec<RawObservation>) -> Result<Vec<Observation>, IngestError> {
    let mut observations = rows
        .into_iter()
        .enumerate()
        .map(|(i, raw)| Observation::from_raw(raw, i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    sort_by_timestamp(&mut observations);
    Ok(observations)
}

/// Read and parse a dataset file. `format` is a registered parser name
/// ("csv" or "json").
pub fn load_dataset<P: AsRef<Path>>(path: P, format: &str) -> Result<Vec<Observation>, IngestError> {
    let content = fs::read_to_string(path)?;
    let rows = ParserRegistry::with_defaults().parse(format, &content)?;
    into_observations(rows)
}
