// JSON dataset parser

use super::{DatasetParser, IngestError};
use crate::RawObservation;

/// Reads either a top-level array of records or `{"data": [...]}`
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, input: &str) -> Result<Vec<RawObservation>, IngestError> {
        let value: serde_json::Value = serde_json::from_str(input)?;

        // unwrap the common envelope
        let records = match value {
            serde_json::Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(serde_json::Value::Null)
            }
            other => other,
        };

        Ok(serde_json::from_value(records)?)
    }
}
