//! Fixtures
//!
//! YAML transaction fixtures. A fixture lists purchase records, pre-grouped baskets, or both,
//! and may carry the analysis parameters to run with:
//!
//! ```yaml
//! parameters:
//!   min_support: 0.5
//!   min_confidence: 0.6
//! transactions:
//!   - { transaction: "536365", item: milk, quantity: 2, price: 1.25 }
//! baskets:
//!   T1: [milk, bread]
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    analysis::AnalysisParameters,
    transactions::{OccurrenceMatrix, TransactionEncoder, TransactionRecord},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Transaction fixture from YAML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionFixture {
    /// Analysis parameters to run the fixture with
    #[serde(default)]
    pub parameters: Option<AnalysisParameters>,

    /// Raw purchase records
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,

    /// Map of transaction id -> items, each counted once
    #[serde(default)]
    pub baskets: BTreeMap<String, Vec<String>>,
}

impl TransactionFixture {
    /// Load a fixture from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse a fixture from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid fixture.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// All records of the fixture, with baskets expanded to one unit per item.
    pub fn records(&self) -> Vec<TransactionRecord> {
        let baskets = self.baskets.iter().flat_map(|(transaction, items)| {
            items
                .iter()
                .map(|item| TransactionRecord::new(transaction.as_str(), item.as_str(), 1))
        });

        self.transactions.iter().cloned().chain(baskets).collect()
    }

    /// Encode the fixture into an occurrence matrix.
    pub fn to_matrix(&self) -> OccurrenceMatrix {
        TransactionEncoder::encode(&self.records())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    const FIXTURE: &str = "
parameters:
  min_support: 0.5
  min_confidence: 0.6
transactions:
  - { transaction: A1, item: milk, quantity: 2, price: 1.25 }
  - { transaction: A1, item: bread, quantity: 1 }
  - { transaction: A2, item: milk, quantity: -1, price: 1.25 }
baskets:
  B1: [milk, eggs, milk]
";

    #[test]
    fn parses_records_and_baskets() -> TestResult {
        let fixture = TransactionFixture::from_yaml(FIXTURE)?;

        assert_eq!(fixture.transactions.len(), 3);
        assert_eq!(
            fixture.transactions.first().and_then(|record| record.price),
            Some(Decimal::new(125, 2))
        );
        assert_eq!(fixture.baskets.get("B1").map(Vec::len), Some(3));
        assert_eq!(
            fixture.parameters,
            Some(AnalysisParameters::new(0.5, 0.6))
        );

        Ok(())
    }

    #[test]
    fn to_matrix_filters_and_collapses() -> TestResult {
        let matrix = TransactionFixture::from_yaml(FIXTURE)?.to_matrix();

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.transaction_id(0), Some("A1"));
        assert_eq!(matrix.transaction_id(1), Some("B1"));
        assert_eq!(matrix.row(1).map(<[_]>::len), Some(2));

        Ok(())
    }

    #[test]
    fn loads_from_path() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(FIXTURE.as_bytes())?;

        let fixture = TransactionFixture::from_path(file.path())?;

        assert_eq!(fixture.records().len(), 6);

        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = TransactionFixture::from_path("does/not/exist.yml");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = TransactionFixture::from_yaml("customers: []\n");

        assert!(matches!(result, Err(FixtureError::Yaml(_))));
    }
}
