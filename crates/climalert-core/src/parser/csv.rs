// CSV dataset parser

use super::{DatasetParser, IngestError};
use crate::RawObservation;

/// Reads a headered CSV with at least `city,timestamp,temperature`.
/// A `season` column is picked up when present; other columns are ignored.
pub struct CsvParser {
    delimiter: u8,
}

impl CsvParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetParser for CsvParser {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn parse(&self, input: &str) -> Result<Vec<RawObservation>, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(input.as_bytes());

        let mut rows = Vec::new();
        for record in reader.deserialize::<RawObservation>() {
            rows.push(record?);
        }
        Ok(rows)
    }
}
