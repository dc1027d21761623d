//! Shared types
//!
//! Types shared by the CLI and the extraction/scoring core:
//! - CellValue: one worksheet cell, independent of the spreadsheet reader
//! - WorkItem: a priced row extracted from a BOQ worksheet
//! - Prediction: a WorkItem labelled with a canonical trade (persisted format)

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Worksheet cell value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Dates, durations and cell errors, kept as their display text
    Other(String),
}

impl CellValue {
    /// Numeric coercion used for quantity cells.
    ///
    /// Numbers pass through, text is parsed after trimming, booleans become 1/0.
    /// Anything else is not a quantity.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Empty | CellValue::Other(_) => None,
        }
    }

    /// Display text of the cell, untrimmed. Empty cells yield an empty string.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) | CellValue::Other(s) => s.clone(),
            CellValue::Number(v) => format!("{}", v),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }

    /// Trimmed text, `None` when blank
    pub fn trimmed_text(&self) -> Option<String> {
        let text = self.to_text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trimmed_text().is_none()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

/// One row of actual work in a BOQ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Source document name
    pub file: String,
    pub sheet: String,
    /// 1-indexed physical row
    pub row: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Composed description, never empty
    pub description: String,
    pub qty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A work item labelled with its predicted trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub file: String,
    pub sheet: String,
    pub row: u32,
    /// The composed item description
    pub item: String,
    pub predicted_tag: String,
}

impl Prediction {
    pub fn from_item(item: &WorkItem, predicted_tag: impl Into<String>) -> Self {
        Self {
            file: item.file.clone(),
            sheet: item.sheet.clone(),
            row: item.row,
            item: item.description.clone(),
            predicted_tag: predicted_tag.into(),
        }
    }
}

/// Parse a persisted predictions document
pub fn parse_predictions(json: &str) -> Result<Vec<Prediction>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_number_numeric_cells() {
        assert_eq!(CellValue::Number(5.0).as_number(), Some(5.0));
        assert_eq!(CellValue::Text(" 12.5 ".into()).as_number(), Some(12.5));
        assert_eq!(CellValue::Bool(true).as_number(), Some(1.0));
    }

    #[test]
    fn test_as_number_rejects_non_numeric() {
        assert_eq!(CellValue::Empty.as_number(), None);
        assert_eq!(CellValue::Text("Item".into()).as_number(), None);
        assert_eq!(CellValue::Text("1,000".into()).as_number(), None);
        assert_eq!(CellValue::Other("2024-01-01".into()).as_number(), None);
    }

    #[test]
    fn test_trimmed_text() {
        assert_eq!(CellValue::Text("  Excavation ".into()).trimmed_text(), Some("Excavation".into()));
        assert_eq!(CellValue::Text("   ".into()).trimmed_text(), None);
        assert_eq!(CellValue::Number(3.0).trimmed_text(), Some("3".into()));
        assert!(CellValue::Empty.is_empty());
    }

    #[test]
    fn test_prediction_from_item() {
        let item = WorkItem {
            file: "a.xlsx".into(),
            sheet: "BOQ".into(),
            row: 7,
            code: Some("1.1".into()),
            description: "EARTHWORKS | Excavate".into(),
            qty: 10.0,
            unit: Some("m3".into()),
        };
        let prediction = Prediction::from_item(&item, "Groundworks");
        assert_eq!(prediction.item, "EARTHWORKS | Excavate");
        assert_eq!(prediction.row, 7);
        assert_eq!(prediction.predicted_tag, "Groundworks");
    }

    #[test]
    fn test_prediction_json_field_names() {
        let prediction = Prediction {
            file: "a.xlsx".into(),
            sheet: "BOQ".into(),
            row: 3,
            item: "Supply CONC-100".into(),
            predicted_tag: "Masonry".into(),
        };
        let json = serde_json::to_string(&prediction).unwrap();
        for field in ["\"file\"", "\"sheet\"", "\"row\"", "\"item\"", "\"predicted_tag\""] {
            assert!(json.contains(field), "missing {field} in {json}");
        }

        let parsed = parse_predictions(&format!("[{}]", json)).unwrap();
        assert_eq!(parsed, vec![prediction]);
    }

    #[test]
    fn test_parse_predictions_error() {
        assert!(parse_predictions("not json").is_err());
    }
}
