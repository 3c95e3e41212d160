//! Argument records for the workbook tools.
//!
//! The `*Args` types are what callers send; every field except the path is
//! optional on the wire. [`ReadExcelArgs::resolve`] and friends check the
//! field-level constraints and fill omitted fields from a set of defaults,
//! producing a [`ReadRequest`] the readers can trust.

use serde::{Deserialize, Serialize};

use crate::error::{Result, XlError};
use crate::frame::ReadOptions;

/// Arguments for listing the sheets of a workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSheetsArgs {
    /// Path to the workbook
    pub file_path: String,
}

impl ListSheetsArgs {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Check field constraints, returning the path to enumerate
    pub fn validate(&self) -> Result<&str> {
        check_file_path(&self.file_path)?;
        Ok(&self.file_path)
    }
}

/// Arguments for reading a workbook, optionally one named sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadExcelArgs {
    /// Path to the workbook
    pub file_path: String,
    /// Sheet to read; the first sheet when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    /// Whether the first row holds column names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_header: Option<bool>,
    /// Rows sampled for type inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infer_schema_length: Option<usize>,
}

impl ReadExcelArgs {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn with_sheet(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Validate and fill omitted fields from `defaults`
    pub fn resolve(&self, defaults: &ReadOptions) -> Result<ReadRequest> {
        check_file_path(&self.file_path)?;
        if let Some(sheet) = &self.sheet_name {
            check_sheet_name(sheet)?;
        }

        Ok(ReadRequest {
            file_path: self.file_path.clone(),
            sheet_name: self.sheet_name.clone(),
            options: merge_options(self.has_header, self.infer_schema_length, defaults),
        })
    }
}

/// Arguments for reading one specific sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadExcelSheetArgs {
    /// Path to the workbook
    pub file_path: String,
    /// Sheet to read
    pub sheet_name: String,
    /// Whether the first row holds column names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_header: Option<bool>,
    /// Rows sampled for type inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infer_schema_length: Option<usize>,
}

impl ReadExcelSheetArgs {
    pub fn new(file_path: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            sheet_name: sheet_name.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Validate and fill omitted fields from `defaults`
    pub fn resolve(&self, defaults: &ReadOptions) -> Result<ReadRequest> {
        check_file_path(&self.file_path)?;
        check_sheet_name(&self.sheet_name)?;

        Ok(ReadRequest {
            file_path: self.file_path.clone(),
            sheet_name: Some(self.sheet_name.clone()),
            options: merge_options(self.has_header, self.infer_schema_length, defaults),
        })
    }
}

/// A validated read, with every option decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub file_path: String,
    pub sheet_name: Option<String>,
    pub options: ReadOptions,
}

fn merge_options(
    has_header: Option<bool>,
    infer_schema_length: Option<usize>,
    defaults: &ReadOptions,
) -> ReadOptions {
    ReadOptions {
        has_header: has_header.unwrap_or(defaults.has_header),
        infer_schema_length: infer_schema_length.unwrap_or(defaults.infer_schema_length),
    }
}

fn check_file_path(file_path: &str) -> Result<()> {
    if file_path.trim().is_empty() {
        return Err(XlError::invalid_argument("file_path", "must not be empty"));
    }
    Ok(())
}

fn check_sheet_name(sheet_name: &str) -> Result<()> {
    if sheet_name.is_empty() {
        return Err(XlError::invalid_argument("sheet_name", "must not be empty"));
    }
    Ok(())
}
