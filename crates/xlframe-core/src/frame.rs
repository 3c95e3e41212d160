//! Columnar frames built from worksheet ranges.
//!
//! A [`Frame`] is the normalized form of one sheet: named, typed columns in
//! worksheet order. Column types are inferred from a leading sample of the
//! data rows; every remaining row must then fit the inferred type.

use std::collections::HashSet;
use std::fmt;

use calamine::{Data, Range};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XlError};

/// Number of data rows sampled for type inference unless told otherwise
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 100;

/// Largest magnitude at which every integer is exactly representable in an f64
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Options controlling how a sheet range becomes a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Treat the first row of the used range as column names
    pub has_header: bool,

    /// Data rows sampled per column for type inference; `0` types every column as `String`
    pub infer_schema_length: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
        }
    }
}

impl ReadOptions {
    /// Options for a sheet without a header row
    pub fn without_header() -> Self {
        Self {
            has_header: false,
            ..Default::default()
        }
    }
}

/// Column type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Float64,
    Boolean,
    String,
    Datetime,
    Duration,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Int64 => "Int64",
            DataType::Float64 => "Float64",
            DataType::Boolean => "Boolean",
            DataType::String => "String",
            DataType::Datetime => "Datetime",
            DataType::Duration => "Duration",
        }
    }

    /// True for `Int64` and `Float64`
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Smallest type holding values of both `self` and `other`
    fn unify(self, other: DataType) -> DataType {
        match (self, other) {
            (a, b) if a == b => a,
            (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
                DataType::Float64
            }
            _ => DataType::String,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value after conversion to its column's type.
///
/// Datetimes and durations are carried as ISO-8601 text; the column's
/// [`DataType`] records what the text means.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => f.write_str(&format_float(*v)),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DataType,
    values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DataType, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn into_parts(self) -> (String, DataType, Vec<CellValue>) {
        (self.name, self.dtype, self.values)
    }
}

/// An ordered set of equal-length columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Assemble a frame from columns, checking names are unique and lengths agree
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(XlError::invalid_argument(
                    "columns",
                    format!("duplicate column name '{}'", column.name),
                ));
            }
        }

        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(XlError::invalid_argument(
                    "columns",
                    format!(
                        "column '{}' has {} values, expected {}",
                        bad.name,
                        bad.len(),
                        first.len()
                    ),
                ));
            }
        }

        Ok(Self { columns })
    }

    /// Build a frame from a worksheet range
    pub fn from_range(range: &Range<Data>, options: &ReadOptions) -> Result<Self> {
        let width = range.width();
        let rows: Vec<&[Data]> = range.rows().collect();

        if width == 0 || rows.is_empty() {
            return Ok(Self::default());
        }

        let (names, body) = if options.has_header {
            (header_names(rows[0]), &rows[1..])
        } else {
            ((1..=width).map(|i| format!("column_{}", i)).collect(), &rows[..])
        };

        let mut columns = Vec::with_capacity(width);
        for (col_idx, name) in names.into_iter().enumerate() {
            let dtype = if options.infer_schema_length == 0 {
                DataType::String
            } else {
                infer_dtype(
                    body.iter()
                        .take(options.infer_schema_length)
                        .map(|row| &row[col_idx]),
                )
            };

            let mut values = Vec::with_capacity(body.len());
            for (row_idx, row) in body.iter().enumerate() {
                let cell = &row[col_idx];
                let value = convert_cell(cell, dtype).ok_or_else(|| XlError::SchemaInference {
                    column: name.clone(),
                    row: row_idx,
                    expected: dtype.to_string(),
                    found: describe_cell(cell).to_string(),
                })?;
                values.push(value);
            }

            columns.push(Column::new(name, dtype, values));
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Column name and type pairs in order
    pub fn schema(&self) -> Vec<(String, DataType)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.dtype))
            .collect()
    }

    /// Values of row `index`, one per column
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.height() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Iterate rows as vectors of borrowed values
    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.height()).filter_map(move |i| self.row(i))
    }

    /// A copy of the first `n` rows
    pub fn head(&self, n: usize) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Column::new(
                    c.name.clone(),
                    c.dtype,
                    c.values.iter().take(n).cloned().collect(),
                )
            })
            .collect();
        Frame { columns }
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

/// Column names from a header row, with blanks filled in and repeats suffixed
fn header_names(header: &[Data]) -> Vec<String> {
    let raw = header.iter().enumerate().map(|(idx, cell)| {
        let name = cell_to_string(cell);
        if name.trim().is_empty() {
            format!("__UNNAMED__{}", idx)
        } else {
            name
        }
    });

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(header.len());
    for name in raw {
        let mut candidate = name.clone();
        let mut n = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{}_{}", name, n);
            n += 1;
        }
        names.push(candidate);
    }
    names
}

fn is_integral(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER
}

/// The type a single cell would have on its own; `None` for blanks and error cells
fn natural_type(cell: &Data) -> Option<DataType> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Bool(_) => Some(DataType::Boolean),
        Data::Int(_) => Some(DataType::Int64),
        Data::Float(f) if is_integral(*f) => Some(DataType::Int64),
        Data::Float(_) => Some(DataType::Float64),
        Data::String(_) => Some(DataType::String),
        Data::DateTime(dt) if dt.is_duration() => Some(DataType::Duration),
        Data::DateTime(_) | Data::DateTimeIso(_) => Some(DataType::Datetime),
        Data::DurationIso(_) => Some(DataType::Duration),
    }
}

fn describe_cell(cell: &Data) -> &'static str {
    match cell {
        Data::Error(_) => "error",
        Data::DateTime(dt) if dt.is_duration() && dt.as_duration().is_none() => {
            "out-of-range duration"
        }
        Data::DateTime(dt) if !dt.is_duration() && dt.as_datetime().is_none() => {
            "out-of-range date"
        }
        other => natural_type(other).map_or("null", DataType::as_str),
    }
}

fn infer_dtype<'a>(cells: impl Iterator<Item = &'a Data>) -> DataType {
    let mut inferred: Option<DataType> = None;
    for cell in cells {
        let Some(dtype) = natural_type(cell) else {
            continue;
        };
        let merged = inferred.map_or(dtype, |prev| prev.unify(dtype));
        if merged == DataType::String {
            return merged;
        }
        inferred = Some(merged);
    }
    inferred.unwrap_or(DataType::String)
}

/// Convert a raw cell into `dtype`; `None` when the cell does not fit
fn convert_cell(cell: &Data, dtype: DataType) -> Option<CellValue> {
    if matches!(cell, Data::Empty | Data::Error(_)) {
        return Some(CellValue::Null);
    }

    match dtype {
        DataType::String => Some(CellValue::Text(cell_to_string(cell))),
        DataType::Int64 => match cell {
            Data::Int(i) => Some(CellValue::Int(*i)),
            Data::Float(f) if is_integral(*f) => Some(CellValue::Int(*f as i64)),
            _ => None,
        },
        DataType::Float64 => match cell {
            Data::Int(i) => Some(CellValue::Float(*i as f64)),
            Data::Float(f) => Some(CellValue::Float(*f)),
            _ => None,
        },
        DataType::Boolean => match cell {
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            _ => None,
        },
        DataType::Datetime => match cell {
            Data::DateTime(dt) if !dt.is_duration() => {
                dt.as_datetime().map(|d| CellValue::Text(format_datetime(&d)))
            }
            Data::DateTimeIso(s) => Some(CellValue::Text(s.clone())),
            _ => None,
        },
        DataType::Duration => match cell {
            Data::DateTime(dt) if dt.is_duration() => {
                dt.as_duration().map(|d| CellValue::Text(d.to_string()))
            }
            Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
            _ => None,
        },
    }
}

fn format_datetime(dt: &chrono::NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn format_float(f: f64) -> String {
    if is_integral(f) {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

/// Render any raw cell as text
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) if dt.is_duration() => dt
            .as_duration()
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| format_datetime(&d))
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
