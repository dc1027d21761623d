//! Accuracy scoring against the reference tag map
//!
//! A prediction is scored only when its item text contains a known raw tag.
//! The first raw tag in map order wins; when several tags occur in the same
//! text the result depends on that order.

use crate::tag_map::TagMap;
use crate::types::Prediction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scored prediction whose trade differs from the mapped one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub file: String,
    pub sheet: String,
    pub row: u32,
    pub item: String,
    pub predicted_tag: String,
    pub raw_tag: String,
    pub mapped_trade: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Predictions whose item contains a mapped raw tag
    pub total: usize,
    pub correct: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ScoreResult {
    /// `correct / total`, 0 when nothing was scored
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total Trades: {}, Correctly Classified: {}, Accuracy: {:.2}%",
            self.total,
            self.correct,
            self.accuracy() * 100.0
        )
    }
}

/// Score predictions against the tag map
pub fn score_predictions(predictions: &[Prediction], tag_map: &TagMap) -> ScoreResult {
    let mut result = ScoreResult::default();

    for prediction in predictions {
        let Some((raw_tag, trade)) = tag_map.find_in(&prediction.item) else {
            continue;
        };

        result.total += 1;
        if prediction.predicted_tag == trade {
            result.correct += 1;
        } else {
            result.mismatches.push(Mismatch {
                file: prediction.file.clone(),
                sheet: prediction.sheet.clone(),
                row: prediction.row,
                item: prediction.item.clone(),
                predicted_tag: prediction.predicted_tag.clone(),
                raw_tag: raw_tag.to_string(),
                mapped_trade: trade.to_string(),
            });
        }
    }

    result
}
