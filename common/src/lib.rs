//! BOQ Tagger Common Library
//!
//! Spreadsheet-independent core shared by the CLI: work-item extraction,
//! reference tag map, tag normalization and accuracy scoring.

pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod prompts;
pub mod scorer;
pub mod tag_map;
pub mod types;

pub use error::{Error, Result};
pub use extractor::{
    extract_positional, extract_sheet, extract_with_header, find_header_columns, scan_header,
    ExtractionStrategy, HeaderColumns, HeaderScan, SectionAccumulator, Sheet, SheetExtraction,
};
pub use normalizer::{match_allowed, normalize_tag, resolve_tag};
pub use prompts::{build_classification_prompt, DEFAULT_TRADES, FALLBACK_TAG, UNMAPPED_TAG};
pub use scorer::{score_predictions, Mismatch, ScoreResult};
pub use tag_map::TagMap;
pub use types::{parse_predictions, CellValue, Prediction, WorkItem};
