//! BOQ work-item extraction
//!
//! Two heuristics for turning a worksheet grid into work items:
//!
//! - Positional (sticky-heading) mode: columns A-F are code, description,
//!   qty, unit, rate and total. Upper-case rows without a quantity become a
//!   section heading that qualifies every following item, other rows without
//!   a quantity are buffered as context, and a row with a quantity emits an
//!   item whose description is heading + context + own text.
//! - Header mode: a `DESCRIPTION` / `QTY` header row is located in the top
//!   left corner of the sheet and every row below it with a numeric quantity
//!   is an item.
//!
//! `ExtractionStrategy::Auto` picks header mode when both header cells are
//! present and positional mode otherwise.

use crate::error::Error;
use crate::types::{CellValue, WorkItem};
use std::fmt;
use std::str::FromStr;

/// Separator between heading, context lines and the item's own text
pub const DESCRIPTION_SEPARATOR: &str = " | ";

/// Rows inspected when looking for a header row
pub const HEADER_SCAN_ROWS: usize = 10;
/// Columns inspected when looking for a header row
pub const HEADER_SCAN_COLS: usize = 15;

const MIN_HEADING_CHARS: usize = 4;

/// A worksheet as a dense grid. `rows[0]` is physical row 1, `rows[r][0]` is column A.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { name: name.into(), rows }
    }
}

// =============================================
// Strategy selection
// =============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionStrategy {
    Positional,
    Header,
    /// Header mode when both header cells are found, positional otherwise
    #[default]
    Auto,
}

impl FromStr for ExtractionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positional" | "sticky" => Ok(ExtractionStrategy::Positional),
            "header" => Ok(ExtractionStrategy::Header),
            "auto" => Ok(ExtractionStrategy::Auto),
            _ => Err(Error::Parse(format!(
                "Unknown strategy: {}. Use positional, header, or auto",
                s
            ))),
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::Positional => write!(f, "positional"),
            ExtractionStrategy::Header => write!(f, "header"),
            ExtractionStrategy::Auto => write!(f, "auto"),
        }
    }
}

/// Result of extracting one sheet
#[derive(Debug, Clone)]
pub struct SheetExtraction {
    pub sheet: String,
    /// Mode actually used (never `Auto`)
    pub strategy: ExtractionStrategy,
    /// Only one of the two header cells was found, so the layout is unclear
    pub ambiguous: bool,
    pub items: Vec<WorkItem>,
}

/// Extract the work items of one sheet
pub fn extract_sheet(file: &str, sheet: &Sheet, strategy: ExtractionStrategy) -> SheetExtraction {
    let scan = scan_header(&sheet.rows);

    let (used, ambiguous) = match strategy {
        ExtractionStrategy::Positional => (ExtractionStrategy::Positional, false),
        ExtractionStrategy::Header => (ExtractionStrategy::Header, false),
        ExtractionStrategy::Auto => match scan.columns() {
            Some(_) => (ExtractionStrategy::Header, false),
            None => (ExtractionStrategy::Positional, scan.is_partial()),
        },
    };

    let items = match used {
        ExtractionStrategy::Header => match scan.columns() {
            Some(columns) => extract_with_header(file, sheet, &columns),
            None => Vec::new(),
        },
        _ => extract_positional(file, sheet),
    };

    SheetExtraction {
        sheet: sheet.name.clone(),
        strategy: used,
        ambiguous,
        items,
    }
}

// =============================================
// Positional (sticky-heading) mode
// =============================================

/// The six positional fields of a row (columns A-F)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionalRow {
    pub code: Option<String>,
    /// Trimmed description, possibly empty
    pub description: String,
    pub qty: Option<f64>,
    pub unit: Option<String>,
    pub rate: Option<f64>,
    pub total: Option<f64>,
}

impl PositionalRow {
    /// Read columns A-F; missing trailing cells count as empty
    pub fn from_cells(cells: &[CellValue]) -> Self {
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();

        Self {
            code: cell(0).trimmed_text(),
            description: cell(1).trimmed_text().unwrap_or_default(),
            qty: cell(2).as_number(),
            unit: cell(3).trimmed_text(),
            rate: cell(4).as_number(),
            total: cell(5).as_number(),
        }
    }
}

/// How a row participates in the sticky-heading state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Blank description, no state change
    Skip,
    /// Upper-case section heading without a quantity
    Heading,
    /// Descriptive line without a quantity
    Context,
    /// Priced row
    Item,
}

pub fn classify_row(row: &PositionalRow) -> RowKind {
    if row.description.is_empty() {
        RowKind::Skip
    } else if row.qty.is_some() {
        RowKind::Item
    } else if is_heading_text(&row.description) {
        RowKind::Heading
    } else {
        RowKind::Context
    }
}

/// At least one cased character, no lower-case ones, and longer than 3 characters
pub fn is_heading_text(text: &str) -> bool {
    let has_cased = text.chars().any(|c| c.is_uppercase() || c.is_lowercase());
    let has_lower = text.chars().any(char::is_lowercase);
    has_cased && !has_lower && text.chars().count() >= MIN_HEADING_CHARS
}

/// Per-sheet state of the sticky-heading scanner
#[derive(Debug, Clone, Default)]
pub struct SectionAccumulator {
    sticky_heading: Option<String>,
    context_lines: Vec<String>,
}

impl SectionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sticky_heading(&self) -> Option<&str> {
        self.sticky_heading.as_deref()
    }

    pub fn context_lines(&self) -> &[String] {
        &self.context_lines
    }

    /// Replace the heading. Buffered context is kept.
    pub fn apply_heading(&mut self, heading: impl Into<String>) {
        self.sticky_heading = Some(heading.into());
    }

    pub fn push_context(&mut self, line: impl Into<String>) {
        self.context_lines.push(line.into());
    }

    /// Compose the item description and clear the context buffer.
    /// The heading stays until the next heading row.
    pub fn emit_item(&mut self, own_description: &str) -> String {
        let parts: Vec<&str> = self
            .sticky_heading
            .as_deref()
            .into_iter()
            .chain(self.context_lines.iter().map(String::as_str))
            .chain(std::iter::once(own_description))
            .collect();
        let composed = parts.join(DESCRIPTION_SEPARATOR);
        self.context_lines.clear();
        composed
    }
}

/// Sticky-heading extraction over columns A-F
pub fn extract_positional(file: &str, sheet: &Sheet) -> Vec<WorkItem> {
    let mut state = SectionAccumulator::new();
    let mut items = Vec::new();

    for (idx, cells) in sheet.rows.iter().enumerate() {
        let row = PositionalRow::from_cells(cells);

        match classify_row(&row) {
            RowKind::Skip => {}
            RowKind::Heading => state.apply_heading(row.description),
            RowKind::Context => state.push_context(row.description),
            RowKind::Item => {
                let Some(qty) = row.qty else { continue };
                let description = state.emit_item(&row.description);
                items.push(WorkItem {
                    file: file.to_string(),
                    sheet: sheet.name.clone(),
                    row: physical_row(idx),
                    code: row.code,
                    description,
                    qty,
                    unit: row.unit,
                });
            }
        }
    }

    items
}

// =============================================
// Header mode
// =============================================

/// Header cells found in the scan window (0-based `(row, col)`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderScan {
    pub description: Option<(usize, usize)>,
    pub qty: Option<(usize, usize)>,
    pub unit: Option<(usize, usize)>,
    pub code: Option<(usize, usize)>,
}

impl HeaderScan {
    /// Column roles, when both required header cells were found
    pub fn columns(&self) -> Option<HeaderColumns> {
        let (header_row, description_col) = self.description?;
        let (_, qty_col) = self.qty?;
        Some(HeaderColumns {
            header_row,
            description_col,
            qty_col,
            unit_col: self.unit.map(|(_, c)| c),
            code_col: self.code.map(|(_, c)| c),
        })
    }

    /// Exactly one of `DESCRIPTION` / `QTY` was found
    pub fn is_partial(&self) -> bool {
        self.description.is_some() != self.qty.is_some()
    }
}

/// Column roles of a header-driven sheet (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderColumns {
    /// Row holding the `DESCRIPTION` cell
    pub header_row: usize,
    pub description_col: usize,
    pub qty_col: usize,
    pub unit_col: Option<usize>,
    pub code_col: Option<usize>,
}

/// Scan the top-left window for header cells. Later matches override earlier ones.
pub fn scan_header(rows: &[Vec<CellValue>]) -> HeaderScan {
    let mut scan = HeaderScan::default();

    for (r, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        for (c, cell) in row.iter().take(HEADER_SCAN_COLS).enumerate() {
            let Some(text) = cell.trimmed_text() else { continue };
            match text.to_uppercase().as_str() {
                "DESCRIPTION" => scan.description = Some((r, c)),
                "QTY" => scan.qty = Some((r, c)),
                "UNIT" => scan.unit = Some((r, c)),
                "CODE" | "ITEM NO" | "ITEM NO." | "REF" => scan.code = Some((r, c)),
                _ => {}
            }
        }
    }

    scan
}

/// Column roles of `rows`, if it has a `DESCRIPTION` / `QTY` header
pub fn find_header_columns(rows: &[Vec<CellValue>]) -> Option<HeaderColumns> {
    scan_header(rows).columns()
}

/// Header-driven extraction: every row below the header with a numeric quantity
pub fn extract_with_header(file: &str, sheet: &Sheet, columns: &HeaderColumns) -> Vec<WorkItem> {
    let cell_at = |cells: &[CellValue], col: usize| cells.get(col).cloned().unwrap_or_default();

    sheet
        .rows
        .iter()
        .enumerate()
        .skip(columns.header_row + 1)
        .filter_map(|(idx, cells)| {
            let qty = cell_at(cells, columns.qty_col).as_number()?;
            let description = cell_at(cells, columns.description_col).trimmed_text()?;
            Some(WorkItem {
                file: file.to_string(),
                sheet: sheet.name.clone(),
                row: physical_row(idx),
                code: columns.code_col.and_then(|c| cell_at(cells, c).trimmed_text()),
                description,
                qty,
                unit: columns.unit_col.and_then(|c| cell_at(cells, c).trimmed_text()),
            })
        })
        .collect()
}

fn physical_row(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}
