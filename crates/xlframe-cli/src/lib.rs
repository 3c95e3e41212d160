//! xlframe CLI - Command-line interface library
//!
//! This library provides the CLI functionality for xlframe, including:
//! - Sheets / Read / Read-sheet: the workbook tools, as text or JSON
//! - View: an overview of every sheet
//! - Convert: export every sheet to CSV, JSON and schema reports
//! - Copy: rewrite typed sheets into a new .xlsx file
//!
//! # Library Usage
//!
//! ```ignore
//! use xlframe_cli::{run_cli, OutputFormat};
//!
//! // Run the full CLI
//! run_cli();
//!
//! // Or use individual commands programmatically
//! sheets_command("book.xlsx", OutputFormat::Json)?;
//! convert_command("book.xlsx", Path::new("output"), &flags)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # List sheets
//! xlframe sheets book.xlsx
//!
//! # Read a sheet as the JSON payload
//! xlframe read book.xlsx --sheet Employees --format json
//!
//! # Export every sheet
//! xlframe convert book.xlsx --output result/
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    convert_command, copy_command, read_command, read_sheet_command, sheets_command, view_command,
};
pub use app::{render_overview, render_sheet_list, render_table, run_cli, OutputFormat, ReadFlags};
