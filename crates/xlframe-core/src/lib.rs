//! # xlframe-core
//!
//! Read Excel workbooks into typed, column-ordered tables and return them in
//! a transport-safe shape.
//!
//! ## Features
//!
//! - **Workbook tools**: `list_sheets`, `read_excel` and `read_excel_sheet`,
//!   each validating its own arguments and returning an [`Outcome`]
//! - **Excel Support**: `.xlsx` and `.xls` via `calamine`
//! - **Type inference**: polars-style column types from a sample of rows
//! - **Export**: CSV, JSON records, schema reports and `.xlsx` output
//!
//! ## Example
//!
//! ```rust,ignore
//! use xlframe_core::{read_excel, ReadExcelArgs, ReadOptions};
//!
//! let outcome = read_excel(&ReadExcelArgs::new("data.xlsx"), &ReadOptions::default());
//! let json = serde_json::to_string(&outcome)?;
//! ```

pub mod error;
pub mod export;
pub mod frame;
pub mod request;
pub mod response;
pub mod stats;
pub mod tools;
pub mod workbook;
pub mod writer;

// Re-exports
pub use error::{Result, XlError};
pub use frame::{CellValue, Column, DataType, Frame, ReadOptions};
pub use request::{ListSheetsArgs, ReadExcelArgs, ReadExcelSheetArgs, ReadRequest};
pub use response::{ErrorResult, Outcome, SheetList, TableResult};
pub use tools::{list_sheets, read_excel, read_excel_sheet};
pub use workbook::{Workbook, WorkbookFormat, WorkbookPath};
pub use writer::XlsxWriter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Verify all exports are accessible
        let _: fn(&ListSheetsArgs) -> Outcome<SheetList> = list_sheets;
        let _: fn(&ReadExcelArgs, &ReadOptions) -> Outcome<TableResult> = read_excel;
        let _: fn(&ReadExcelSheetArgs, &ReadOptions) -> Outcome<TableResult> = read_excel_sheet;
        let _: ReadOptions = ReadOptions::default();
    }
}
