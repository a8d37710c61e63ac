//! Reference dataset of historical deliveries
//!
//! Loaded once at startup and only used to derive the categorical domains of
//! the feature schema. Rows with any missing value are dropped on load.

use crate::{DeliveryError, Result};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Cell values treated as missing, matching the usual pandas NA tokens
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Check whether a raw cell counts as a missing value
///
/// Cells are matched verbatim: padded tokens such as `" NaN"` or `"  "` are
/// ordinary values.
pub fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Tabular reference data with complete rows only
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    dropped_rows: usize,
}

impl ReferenceDataset {
    /// Load a CSV file with a header row
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            DeliveryError::Dataset(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(file)?;

        log::info!(
            "Loaded reference dataset {} ({} rows kept, {} dropped for missing values)",
            path.display(),
            dataset.len(),
            dataset.dropped_rows()
        );

        Ok(dataset)
    }

    /// Load CSV data from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DeliveryError::Dataset("dataset has no header row".to_string()));
        }

        let mut seen = HashSet::new();
        for h in &headers {
            if !seen.insert(h.as_str()) {
                return Err(DeliveryError::Dataset(format!("duplicate column '{}'", h)));
            }
        }

        let mut rows = Vec::new();
        let mut dropped_rows = 0;

        for record in reader.records() {
            let record = record?;

            // Short rows have missing trailing cells
            let complete =
                record.len() >= headers.len() && record.iter().take(headers.len()).all(|c| !is_missing(c));

            // Cells are kept verbatim
            if complete {
                rows.push(record.iter().take(headers.len()).map(str::to_string).collect());
            } else {
                dropped_rows += 1;
            }
        }

        Ok(ReferenceDataset {
            headers,
            rows,
            dropped_rows,
        })
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Number of complete rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows dropped because a cell was missing
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Iterate over the values of one column
    pub fn column<'a>(&'a self, name: &str) -> Result<impl Iterator<Item = &'a str> + 'a> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DeliveryError::Dataset(format!("missing column '{}'", name)))?;

        Ok(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Distinct values of a column, in order of first appearance
    pub fn distinct_values(&self, name: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut values = Vec::new();

        for value in self.column(name)? {
            if seen.insert(value) {
                values.push(value.to_string());
            }
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
age,weather,traffic,time_taken
30,Sunny,Low,25
22,Stormy,High,41
,Sunny,Low,19
35,NaN,Medium,30
28,Sunny,Jam,33
";

    #[test]
    fn test_drops_incomplete_rows() {
        let ds = ReferenceDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.dropped_rows(), 2);
        assert_eq!(ds.headers(), &["age", "weather", "traffic", "time_taken"]);
    }

    #[test]
    fn test_distinct_values_first_seen_order() {
        let ds = ReferenceDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.distinct_values("weather").unwrap(), vec!["Sunny", "Stormy"]);

        // Medium only appears on a dropped row
        assert_eq!(ds.distinct_values("traffic").unwrap(), vec!["Low", "High", "Jam"]);
    }

    #[test]
    fn test_missing_column() {
        let ds = ReferenceDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(matches!(
            ds.distinct_values("city_name"),
            Err(DeliveryError::Dataset(_))
        ));
    }

    #[test]
    fn test_short_rows_are_dropped() {
        let data = "a,b,c\n1,2,3\n4,5\n";
        let ds = ReferenceDataset::from_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped_rows(), 1);
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let data = "a,b,a\n1,2,3\n";
        assert!(ReferenceDataset::from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(""));
        assert!(is_missing("nan"));
        assert!(is_missing("NULL"));
        assert!(!is_missing("0"));
        assert!(!is_missing("No"));
        assert!(!is_missing("  "));
        assert!(!is_missing(" NaN"));
    }

    #[test]
    fn test_padded_values_kept_verbatim() {
        let data = "traffic,weather\nLow ,Sunny\nJam,  \n";
        let ds = ReferenceDataset::from_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows(), 0);
        assert_eq!(ds.distinct_values("traffic").unwrap(), vec!["Low ", "Jam"]);
        assert_eq!(ds.distinct_values("weather").unwrap(), vec!["Sunny", "  "]);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let data = " age , weather\n30,Sunny\n";
        let ds = ReferenceDataset::from_reader(data.as_bytes()).unwrap();
        assert!(ds.has_column("age"));
        assert!(ds.has_column("weather"));
    }
}
