//! Result records returned by the workbook tools.
//!
//! Every tool returns an [`Outcome`]: either its success payload, serialized
//! with a leading `"success": true`, or an [`ErrorResult`] carrying only a
//! message. The two never mix.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::frame::{CellValue, DataType, Frame};

/// Success payload or error message
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(ErrorResult),
}

impl<T> Outcome<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure(ErrorResult::new(message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Outcome::Success(payload) => Some(payload),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err.message()),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorResult> {
        match self {
            Outcome::Success(payload) => Ok(payload),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, ErrorResult>> for Outcome<T> {
    fn from(result: Result<T, ErrorResult>) -> Self {
        match result {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => Outcome::Failure(err),
        }
    }
}

#[derive(Serialize)]
struct SuccessEnvelope<'a, T> {
    success: bool,
    #[serde(flatten)]
    payload: &'a T,
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Success(payload) => SuccessEnvelope {
                success: true,
                payload,
            }
            .serialize(serializer),
            Outcome::Failure(err) => err.serialize(serializer),
        }
    }
}

/// A failed tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    error: String,
}

impl ErrorResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.error
    }
}

impl fmt::Display for ErrorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

impl std::error::Error for ErrorResult {}

/// Sheet names of a workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetList {
    /// Sheet names in workbook order
    pub sheets: Vec<String>,
    /// The path as the caller supplied it
    pub file_path: String,
}

/// Column name to column values, serialized as an ordered JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData(Vec<(String, Vec<CellValue>)>);

impl TableData {
    pub fn get(&self, column: &str) -> Option<&[CellValue]> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CellValue])> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TableData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, values) in &self.0 {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Column name to type tag, serialized as an ordered JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema(Vec<(String, DataType)>);

impl Schema {
    pub fn get(&self, column: &str) -> Option<DataType> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, dtype)| *dtype)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.0.iter().map(|(n, d)| (n.as_str(), *d))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&Frame> for Schema {
    fn from(frame: &Frame) -> Self {
        Schema(frame.schema())
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, dtype) in &self.0 {
            map.serialize_entry(name, dtype.as_str())?;
        }
        map.end()
    }
}

/// A sheet normalized for transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableResult {
    /// Column name to full column values, in column order
    pub data: TableData,
    /// Column name to type tag
    pub schema: Schema,
    /// `(rows, columns)`
    pub shape: (usize, usize),
    /// The sheet the caller asked for; `None` when the default sheet was read
    pub sheet_name: Option<String>,
    /// Column names in order
    pub columns: Vec<String>,
}

impl TableResult {
    /// Normalize a frame, consuming it
    pub fn from_frame(frame: Frame, sheet_name: Option<String>) -> Self {
        let shape = frame.shape();
        let mut data = Vec::with_capacity(frame.width());
        let mut schema = Vec::with_capacity(frame.width());
        let mut columns = Vec::with_capacity(frame.width());

        for column in frame.into_columns() {
            let (name, dtype, values) = column.into_parts();
            schema.push((name.clone(), dtype));
            columns.push(name.clone());
            data.push((name, values));
        }

        Self {
            data: TableData(data),
            schema: Schema(schema),
            shape,
            sheet_name,
            columns,
        }
    }
}
