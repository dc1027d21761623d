//! Workbook reading
//!
//! Converts calamine ranges into the dense `Sheet` grids used by the
//! extractor. Grids are anchored at A1 so row and column indices match the
//! physical sheet even when the used range starts further down or right.

use crate::error::{BoqError, Result};
use boq_tagger_common::{extract_sheet, CellValue, ExtractionStrategy, Sheet, SheetExtraction, WorkItem};
use calamine::{open_workbook_auto, Data, Range, Reader};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

/// Header cell marking the raw vendor tag column
pub const TAG_HEADER: &str = "TAG";
const TAG_SCAN_ROWS: usize = 10;

/// Read every worksheet of a workbook. Unreadable sheets are skipped.
pub fn load_sheets(path: &Path) -> Result<Vec<Sheet>> {
    if !path.exists() {
        return Err(BoqError::FileNotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| BoqError::Workbook(format!("{}: {}", path.display(), e)))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        match workbook.worksheet_range(&name) {
            Ok(range) => sheets.push(Sheet::new(name, range_to_rows(&range))),
            Err(e) => tracing::warn!("skipping sheet {:?} in {}: {}", name, path.display(), e),
        }
    }

    Ok(sheets)
}

/// Extract every sheet of a workbook, in sheet order
pub fn extract_workbook(path: &Path, strategy: ExtractionStrategy) -> Result<Vec<SheetExtraction>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let sheets = load_sheets(path)?;

    let extractions: Vec<SheetExtraction> = sheets
        .par_iter()
        .map(|sheet| extract_sheet(&file_name, sheet, strategy))
        .collect();

    for extraction in &extractions {
        if extraction.ambiguous {
            tracing::warn!(
                "{} / {}: only one of DESCRIPTION/QTY found in the header window; used {} mode",
                file_name,
                extraction.sheet,
                extraction.strategy
            );
        }
        tracing::debug!(
            "{} / {}: {} items ({} mode)",
            file_name,
            extraction.sheet,
            extraction.items.len(),
            extraction.strategy
        );
    }

    Ok(extractions)
}

/// All work items of a workbook
pub fn extract_items(path: &Path, strategy: ExtractionStrategy) -> Result<Vec<WorkItem>> {
    Ok(extract_workbook(path, strategy)?
        .into_iter()
        .flat_map(|e| e.items)
        .collect())
}

/// Distinct raw tags found below a `TAG` header cell, sorted
pub fn collect_tags(path: &Path) -> Result<BTreeSet<String>> {
    let mut tags = BTreeSet::new();

    for sheet in load_sheets(path)? {
        let Some((header_row, tag_col)) = find_tag_column(&sheet.rows) else {
            tracing::debug!("{}: no {} column", sheet.name, TAG_HEADER);
            continue;
        };

        for row in sheet.rows.iter().skip(header_row + 1) {
            if let Some(tag) = row.get(tag_col).and_then(CellValue::trimmed_text) {
                tags.insert(tag);
            }
        }
    }

    Ok(tags)
}

/// First `TAG` cell in the top rows, scanning row by row
fn find_tag_column(rows: &[Vec<CellValue>]) -> Option<(usize, usize)> {
    rows.iter().take(TAG_SCAN_ROWS).enumerate().find_map(|(r, row)| {
        row.iter()
            .position(|cell| {
                cell.trimmed_text()
                    .map(|t| t.to_uppercase() == TAG_HEADER)
                    .unwrap_or(false)
            })
            .map(|c| (r, c))
    })
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_value));
        rows.push(cells);
    }
    rows
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_conversion() {
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
        assert_eq!(cell_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_value(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(cell_value(&Data::String("x".into())), CellValue::Text("x".into()));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Bool(true));
    }

    #[test]
    fn test_range_anchored_at_a1() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("DESCRIPTION".into()));
        range.set_value((3, 2), Data::Float(4.0));

        let rows = range_to_rows(&range);
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_empty());
        assert_eq!(rows[2][1], CellValue::Text("DESCRIPTION".into()));
        assert_eq!(rows[3][2], CellValue::Number(4.0));
        assert_eq!(rows[3][0], CellValue::Empty);
    }

    #[test]
    fn test_empty_range() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_rows(&range).is_empty());
    }

    #[test]
    fn test_find_tag_column() {
        let rows = vec![
            vec![CellValue::Text("Project".into())],
            vec![CellValue::Text("Description".into()), CellValue::Text(" tag ".into())],
        ];
        assert_eq!(find_tag_column(&rows), Some((1, 1)));
        assert_eq!(find_tag_column(&rows[..1]), None);
    }

    #[test]
    fn test_load_missing_workbook() {
        let result = load_sheets(Path::new("/nonexistent/boq.xlsx"));
        assert!(matches!(result, Err(BoqError::FileNotFound(_))));
    }
}
