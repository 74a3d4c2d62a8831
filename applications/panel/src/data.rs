//! Panel data: the series delivered by the host's query
//!
//! Only row counts matter for alerting, so rows are kept as raw JSON.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelData {
    #[serde(default)]
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub rows: Vec<Value>,
}

impl Series {
    pub fn new(name: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            name: Some(name.into()),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl PanelData {
    pub fn new(series: Vec<Series>) -> Self {
        Self { series }
    }

    /// Parse the host's JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON data file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// No series at all (as opposed to series without rows).
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Any series with at least one row.
    pub fn has_alert(&self) -> bool {
        self.series.iter().any(|series| !series.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alert_when_any_series_has_rows() {
        let data = PanelData::new(vec![
            Series::new("quiet", vec![]),
            Series::new("firing", vec![json!({"tenant": "acme"})]),
        ]);
        assert!(data.has_alert());
    }

    #[test]
    fn no_alert_when_all_series_empty() {
        let data = PanelData::new(vec![Series::new("a", vec![]), Series::new("b", vec![])]);
        assert!(!data.has_alert());
        assert!(!data.is_empty());
    }

    #[test]
    fn parses_host_json() {
        let data = PanelData::from_json(
            r#"{"series":[{"name":"alerts","rows":[{"a":1},{"a":2},{"a":3}]},{"rows":[]}]}"#,
        )
        .unwrap();
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.series[0].len(), 3);
        assert_eq!(data.series[1].name, None);
    }

    #[test]
    fn missing_series_is_empty() {
        let data = PanelData::from_json("{}").unwrap();
        assert!(data.is_empty());
        assert!(!data.has_alert());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(PanelData::from_json("{\"series\": 3}").is_err());
    }
}
