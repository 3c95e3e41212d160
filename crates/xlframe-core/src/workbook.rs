//! Workbook references and the calamine-backed workbook handle.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Sheets, Xls, XlsError, Xlsx, XlsxError};
use tracing::debug;

use crate::error::{Result, XlError};

/// Spreadsheet container formats accepted by the readers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Office Open XML workbook (`.xlsx`)
    Xlsx,
    /// Legacy BIFF workbook (`.xls`)
    Xls,
}

impl WorkbookFormat {
    /// Detect the format from a path's extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(WorkbookFormat::Xlsx),
            "xls" => Some(WorkbookFormat::Xls),
            _ => None,
        }
    }
}

/// A caller-supplied workbook path that passed the existence and extension checks.
///
/// Checks run in order (existence first) and are repeated on every call;
/// nothing about the file is remembered between operations.
#[derive(Debug, Clone)]
pub struct WorkbookPath {
    raw: String,
    path: PathBuf,
    format: WorkbookFormat,
}

impl WorkbookPath {
    /// Validate a raw path string
    pub fn validate(raw: &str) -> Result<Self> {
        let path = PathBuf::from(raw);

        if !path.exists() {
            return Err(XlError::FileNotFound(raw.to_string()));
        }

        let format = WorkbookFormat::from_path(&path)
            .ok_or_else(|| XlError::UnsupportedExtension(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            path,
            format,
        })
    }

    /// The path exactly as the caller supplied it
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> WorkbookFormat {
        self.format
    }
}

/// An open workbook.
///
/// Opening only parses workbook metadata; cell data is materialized per sheet
/// by [`Workbook::sheet_range`]. The underlying file handle is released when
/// the value is dropped.
pub struct Workbook {
    inner: Sheets<BufReader<File>>,
}

impl Workbook {
    /// Open a validated workbook path with the reader matching its format
    pub fn open(path: WorkbookPath) -> Result<Self> {
        debug!(path = path.as_str(), format = ?path.format(), "Opening workbook");

        let inner = match path.format() {
            WorkbookFormat::Xlsx => {
                let workbook: Xlsx<_> = open_workbook(path.as_path())
                    .map_err(|e: XlsxError| XlError::WorkbookOpen(e.to_string()))?;
                Sheets::Xlsx(workbook)
            }
            WorkbookFormat::Xls => {
                let workbook: Xls<_> = open_workbook(path.as_path())
                    .map_err(|e: XlsError| XlError::WorkbookOpen(e.to_string()))?;
                Sheets::Xls(workbook)
            }
        };

        Ok(Self { inner })
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    /// First sheet in workbook order
    pub fn default_sheet(&self) -> Option<String> {
        self.sheet_names().into_iter().next()
    }

    /// Resolve an optional selector to a concrete sheet name
    pub fn resolve_sheet(&self, selector: Option<&str>) -> Result<String> {
        match selector {
            Some(name) => {
                if self.sheet_names().iter().any(|s| s == name) {
                    Ok(name.to_string())
                } else {
                    Err(XlError::SheetNotFound(name.to_string()))
                }
            }
            None => self.default_sheet().ok_or(XlError::NoSheets),
        }
    }

    /// Materialize the used range of a sheet
    pub fn sheet_range(&mut self, sheet: &str) -> Result<Range<Data>> {
        if !self.sheet_names().iter().any(|s| s == sheet) {
            return Err(XlError::SheetNotFound(sheet.to_string()));
        }

        let range = self.inner.worksheet_range(sheet)?;
        debug!(
            sheet,
            rows = range.height(),
            cols = range.width(),
            "Loaded sheet range"
        );
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            WorkbookFormat::from_path(Path::new("data.xlsx")),
            Some(WorkbookFormat::Xlsx)
        );
        assert_eq!(
            WorkbookFormat::from_path(Path::new("legacy.xls")),
            Some(WorkbookFormat::Xls)
        );
        assert_eq!(WorkbookFormat::from_path(Path::new("data.csv")), None);
        assert_eq!(WorkbookFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_format_case_insensitive() {
        assert_eq!(
            WorkbookFormat::from_path(Path::new("REPORT.XLSX")),
            Some(WorkbookFormat::Xlsx)
        );
        assert_eq!(
            WorkbookFormat::from_path(Path::new("Old.Xls")),
            Some(WorkbookFormat::Xls)
        );
    }

    #[test]
    fn test_validate_missing_file_checked_first() {
        // Missing file wins over a bad extension
        let err = WorkbookPath::validate("/nonexistent/path/file.txt").unwrap_err();
        assert!(matches!(err, XlError::FileNotFound(_)));
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_validate_rejects_other_extensions() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let raw = file.path().to_str().unwrap();

        let err = WorkbookPath::validate(raw).unwrap_err();
        assert!(matches!(err, XlError::UnsupportedExtension(_)));
        assert!(err.to_string().contains("Excel file"));
    }

    #[test]
    fn test_validate_accepts_existing_xlsx() {
        let file = tempfile::Builder::new().suffix(".XLSX").tempfile().unwrap();
        let raw = file.path().to_str().unwrap();

        let path = WorkbookPath::validate(raw).unwrap();
        assert_eq!(path.format(), WorkbookFormat::Xlsx);
        assert_eq!(path.as_str(), raw);
    }

    #[test]
    fn test_open_garbage_fails() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        std::fs::write(file.path(), b"this is not a zip archive").unwrap();

        let path = WorkbookPath::validate(file.path().to_str().unwrap()).unwrap();
        assert!(matches!(
            Workbook::open(path),
            Err(XlError::WorkbookOpen(_))
        ));
    }
}
