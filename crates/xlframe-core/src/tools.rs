//! The three workbook operations.
//!
//! Each operation re-validates its input, touches the file system read-only,
//! and converts every failure into an [`ErrorResult`] at its own boundary.
//! Operations share no state and may be called in any order.

use tracing::{debug, warn};

use crate::error::{Result, XlError};
use crate::frame::{Frame, ReadOptions};
use crate::request::{ListSheetsArgs, ReadExcelArgs, ReadExcelSheetArgs, ReadRequest};
use crate::response::{Outcome, SheetList, TableResult};
use crate::workbook::{Workbook, WorkbookPath};

/// Tool name for [`list_sheets`]
pub const LIST_SHEETS: &str = "list_sheets";
/// Tool name for [`read_excel`]
pub const READ_EXCEL: &str = "read_excel";
/// Tool name for [`read_excel_sheet`]
pub const READ_EXCEL_SHEET: &str = "read_excel_sheet";

/// List all sheet names in a workbook, in workbook order
pub fn list_sheets(args: &ListSheetsArgs) -> Outcome<SheetList> {
    let result = args.validate().and_then(|file_path| {
        let path = WorkbookPath::validate(file_path)?;
        enumerate_sheets(path).map(|sheets| SheetList {
            sheets,
            file_path: file_path.to_string(),
        })
    });

    finish(LIST_SHEETS, result, |e| format!("Failed to list sheets: {}", e))
}

/// Read a workbook's default sheet, or the sheet named in `args`
pub fn read_excel(args: &ReadExcelArgs, defaults: &ReadOptions) -> Outcome<TableResult> {
    let result = args.resolve(defaults).and_then(|request| read_table(&request));
    finish(READ_EXCEL, result, |e| {
        format!("Failed to read Excel file: {}", e)
    })
}

/// Read one specific sheet of a workbook
pub fn read_excel_sheet(args: &ReadExcelSheetArgs, defaults: &ReadOptions) -> Outcome<TableResult> {
    let result = args.resolve(defaults).and_then(|request| read_table(&request));
    finish(READ_EXCEL_SHEET, result, |e| {
        format!("Failed to read Excel sheet '{}': {}", args.sheet_name, e)
    })
}

/// Open the workbook just long enough to take its sheet names
pub fn enumerate_sheets(path: WorkbookPath) -> Result<Vec<String>> {
    let workbook = Workbook::open(path)?;
    Ok(workbook.sheet_names())
}

/// Read a validated request into a frame, returning the sheet actually read
pub fn read_frame(request: &ReadRequest) -> Result<(String, Frame)> {
    let path = WorkbookPath::validate(&request.file_path)?;
    let mut workbook = Workbook::open(path)?;

    let sheet = workbook.resolve_sheet(request.sheet_name.as_deref())?;
    let range = workbook.sheet_range(&sheet)?;
    drop(workbook);

    let frame = Frame::from_range(&range, &request.options)?;
    debug!(
        sheet = sheet.as_str(),
        rows = frame.height(),
        cols = frame.width(),
        "Read sheet into frame"
    );
    Ok((sheet, frame))
}

fn read_table(request: &ReadRequest) -> Result<TableResult> {
    let (_, frame) = read_frame(request)?;
    Ok(TableResult::from_frame(frame, request.sheet_name.clone()))
}

/// Convert an operation result into an outcome.
///
/// Precondition failures keep their own message; everything else is wrapped
/// by `describe` so the caller can tell which operation failed.
fn finish<T>(
    tool: &str,
    result: Result<T>,
    describe: impl FnOnce(&XlError) -> String,
) -> Outcome<T> {
    match result {
        Ok(payload) => Outcome::Success(payload),
        Err(err) => {
            let message = if err.is_precondition() {
                err.to_string()
            } else {
                describe(&err)
            };
            warn!(tool, error = %message, "Tool call failed");
            Outcome::failure(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_for_every_operation() {
        let path = "/nonexistent/dir/book.xlsx";

        let listed = list_sheets(&ListSheetsArgs::new(path));
        let read = read_excel(&ReadExcelArgs::new(path), &ReadOptions::default());
        let sheet = read_excel_sheet(
            &ReadExcelSheetArgs::new(path, "Sheet1"),
            &ReadOptions::default(),
        );

        for message in [
            listed.error_message(),
            read.error_message(),
            sheet.error_message(),
        ] {
            assert_eq!(message, Some("File not found: /nonexistent/dir/book.xlsx"));
        }
    }

    #[test]
    fn test_wrong_extension_never_reaches_reader() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        std::fs::write(file.path(), b"a,b\n1,2\n").unwrap();
        let path = file.path().to_str().unwrap();

        let read = read_excel(&ReadExcelArgs::new(path), &ReadOptions::default());
        assert_eq!(
            read.error_message(),
            Some("File must be an Excel file (.xlsx or .xls)")
        );

        let listed = list_sheets(&ListSheetsArgs::new(path));
        assert!(listed.error_message().unwrap().contains("Excel file"));
    }

    #[test]
    fn test_library_failures_are_wrapped() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        std::fs::write(file.path(), b"not a workbook").unwrap();
        let path = file.path().to_str().unwrap();

        let listed = list_sheets(&ListSheetsArgs::new(path));
        assert!(listed
            .error_message()
            .unwrap()
            .starts_with("Failed to list sheets: "));

        let read = read_excel(&ReadExcelArgs::new(path), &ReadOptions::default());
        assert!(read
            .error_message()
            .unwrap()
            .starts_with("Failed to read Excel file: "));

        let sheet = read_excel_sheet(&ReadExcelSheetArgs::new(path, "Data"), &ReadOptions::default());
        assert!(sheet
            .error_message()
            .unwrap()
            .starts_with("Failed to read Excel sheet 'Data': "));
    }

    #[test]
    fn test_legacy_extension_surfaces_read_errors() {
        let file = tempfile::Builder::new().suffix(".xls").tempfile().unwrap();
        std::fs::write(file.path(), b"not a compound document").unwrap();

        let listed = list_sheets(&ListSheetsArgs::new(file.path().to_str().unwrap()));
        assert!(!listed.is_success());
        assert!(listed
            .error_message()
            .unwrap()
            .starts_with("Failed to list sheets: "));
    }

    #[test]
    fn test_invalid_arguments() {
        let read = read_excel(&ReadExcelArgs::new(""), &ReadOptions::default());
        assert_eq!(
            read.error_message(),
            Some("Invalid argument 'file_path': must not be empty")
        );
    }
}
