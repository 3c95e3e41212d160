//! xlframe Model Context Protocol server
//!
//! Exposes the workbook tools of `xlframe-core` over newline-delimited
//! JSON-RPC 2.0 on stdin/stdout:
//! - `list_sheets`: sheet names in workbook order
//! - `read_excel`: the first (or a named) sheet as typed columns
//! - `read_excel_sheet`: one named sheet as typed columns
//!
//! # Library Usage
//!
//! ```ignore
//! use xlframe_mcp::{config::Settings, run_server};
//!
//! run_server(Settings::default()).await?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Start the server (typically launched by an MCP client)
//! xlframe-mcp --config xlframe.toml
//!
//! # With debug logging
//! RUST_LOG=debug xlframe-mcp
//! ```

pub mod config;
pub mod protocol;
pub mod server;
pub mod tools;

// Re-export main entry point
pub use server::{run_server, McpServer};

pub use config::Settings;
pub use tools::WorkbookTools;
