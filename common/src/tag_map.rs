//! Reference tag mapping
//!
//! Maps raw vendor tags (e.g. `CONC-100`) to canonical trade categories.
//! Loaded from a CSV with `raw_tag` and `suggested_allowed_trade` columns.

use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use std::io::Read;

pub const RAW_TAG_COLUMN: &str = "raw_tag";
pub const TRADE_COLUMN: &str = "suggested_allowed_trade";

/// Raw tag → canonical trade, in insertion order
#[derive(Debug, Clone, Default)]
pub struct TagMap {
    entries: IndexMap<String, String>,
    /// Lower-cased keys, parallel to `entries`
    lowered: Vec<String>,
    trades: IndexSet<String>,
}

impl TagMap {
    /// Build from `(raw_tag, trade)` pairs.
    ///
    /// Both sides are trimmed and pairs with a blank side are dropped. A
    /// repeated raw tag keeps its first position and takes the later trade.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = IndexMap::new();
        let mut trades = IndexSet::new();

        for (raw, trade) in pairs {
            let raw = raw.as_ref().trim();
            let trade = trade.as_ref().trim();
            if raw.is_empty() || trade.is_empty() {
                continue;
            }
            trades.insert(trade.to_string());
            entries.insert(raw.to_string(), trade.to_string());
        }

        let lowered = entries.keys().map(|k| k.to_lowercase()).collect();
        Self { entries, lowered, trades }
    }

    /// Load from CSV.
    ///
    /// # Errors
    /// * `MalformedReferenceData` when `raw_tag` or `suggested_allowed_trade` is missing
    /// * `Csv` when the source cannot be read
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let (raw_idx, trade_idx) = match (position(RAW_TAG_COLUMN), position(TRADE_COLUMN)) {
            (Some(raw), Some(trade)) => (raw, trade),
            (raw, trade) => {
                let missing: Vec<&str> = [(RAW_TAG_COLUMN, raw), (TRADE_COLUMN, trade)]
                    .into_iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| name)
                    .collect();
                return Err(Error::MalformedReferenceData(format!(
                    "missing column(s): {}",
                    missing.join(", ")
                )));
            }
        };

        let mut pairs = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let raw = record.get(raw_idx).unwrap_or_default().to_string();
            let trade = record.get(trade_idx).unwrap_or_default().to_string();
            pairs.push((raw, trade));
        }

        Ok(Self::from_pairs(pairs))
    }

    pub fn get(&self, raw_tag: &str) -> Option<&str> {
        self.entries.get(raw_tag).map(String::as_str)
    }

    /// Entries in map order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct trades in first-seen order
    pub fn trades(&self) -> impl Iterator<Item = &str> {
        self.trades.iter().map(String::as_str)
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Trades offered to the oracle: the map's trades, plus `fallback` when absent
    pub fn allowed_labels(&self, fallback: &str) -> Vec<String> {
        let mut labels: Vec<String> = self.trades.iter().cloned().collect();
        if !self.trades.contains(fallback) {
            labels.push(fallback.to_string());
        }
        labels
    }

    /// First raw tag (map order) contained in `text`, case-insensitively.
    /// Returns `(raw_tag, trade)`.
    pub fn find_in(&self, text: &str) -> Option<(&str, &str)> {
        let haystack = text.to_lowercase();
        self.lowered
            .iter()
            .position(|key| haystack.contains(key.as_str()))
            .and_then(|idx| self.entries.get_index(idx))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
