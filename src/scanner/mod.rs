use crate::error::{BoqError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct WorkbookInfo {
    pub path: PathBuf,
    pub file_name: String,
}

impl WorkbookInfo {
    /// File name up to the first `.`, used to name per-file outputs
    pub fn stem(&self) -> &str {
        self.file_name.split('.').next().unwrap_or(&self.file_name)
    }
}

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls"];

pub fn scan_folder(folder: &Path) -> Result<Vec<WorkbookInfo>> {
    if !folder.exists() {
        return Err(BoqError::FolderNotFound(folder.display().to_string()));
    }

    let mut workbooks = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Excel lock files (~$book.xlsx)
        if file_name.starts_with("~$") {
            continue;
        }

        if let Some(ext) = path.extension() {
            if is_workbook_extension(&ext.to_string_lossy()) {
                workbooks.push(WorkbookInfo {
                    path: path.to_path_buf(),
                    file_name,
                });
            }
        }
    }

    workbooks.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(workbooks)
}

fn is_workbook_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    WORKBOOK_EXTENSIONS.contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    #[test]
    fn test_is_workbook_extension() {
        assert!(is_workbook_extension("xlsx"));
        assert!(is_workbook_extension("XLSX"));
        assert!(is_workbook_extension("xls"));
        assert!(is_workbook_extension("xlsm"));
        assert!(!is_workbook_extension("csv"));
        assert!(!is_workbook_extension("json"));
    }

    #[test]
    fn test_stem_stops_at_first_dot() {
        let info = WorkbookInfo {
            path: PathBuf::from("a/Tower.v2.xlsx"),
            file_name: "Tower.v2.xlsx".into(),
        };
        assert_eq!(info.stem(), "Tower");
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(BoqError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let temp_dir = std::env::temp_dir().join("boq-tagger-test-scan");
        fs::create_dir_all(&temp_dir).unwrap();

        File::create(temp_dir.join("c.xlsx")).unwrap();
        File::create(temp_dir.join("a.XLSX")).unwrap();
        File::create(temp_dir.join("b.xls")).unwrap();
        File::create(temp_dir.join("~$c.xlsx")).unwrap();
        File::create(temp_dir.join("notes.txt")).unwrap();

        let result = scan_folder(&temp_dir).unwrap();
        let names: Vec<&str> = result.iter().map(|w| w.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.XLSX", "b.xls", "c.xlsx"]);

        fs::remove_dir_all(&temp_dir).ok();
    }
}
