//! Exporters: write frames to CSV, JSON and summary documents.
//!
//! [`convert_workbook`] runs every exporter over every sheet of a workbook
//! and writes a Markdown summary of what it produced.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{Result, XlError};
use crate::frame::{CellValue, Frame, ReadOptions};
use crate::response::Schema;
use crate::stats::{frame_stats, ColumnStats};
use crate::workbook::{Workbook, WorkbookPath};

/// Rows included as `sample_data` in a schema report
pub const SAMPLE_ROWS: usize = 3;

/// File name of the Markdown summary written by [`convert_workbook`]
pub const SUMMARY_FILE: &str = "conversion_summary.md";

/// Write a frame as CSV with a header row; nulls become empty fields
pub fn write_csv(frame: &Frame, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(frame.column_names())?;
    for row in frame.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Row objects keyed by column name, in column order
pub fn to_records(frame: &Frame) -> Vec<Map<String, Value>> {
    let names = frame.column_names();
    frame
        .rows()
        .map(|row| {
            names
                .iter()
                .cloned()
                .zip(row.into_iter().map(cell_to_json))
                .collect()
        })
        .collect()
}

/// Write a frame as a JSON array of row objects
pub fn write_json(frame: &Frame, path: impl AsRef<Path>) -> Result<()> {
    write_pretty_json(&to_records(frame), path.as_ref())
}

fn cell_to_json(value: &CellValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn write_pretty_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Shape, types, sample rows and statistics of one sheet
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub sheet_name: String,
    pub shape: (usize, usize),
    pub columns: Vec<String>,
    pub dtypes: Schema,
    pub sample_data: Vec<Map<String, Value>>,
    pub statistics: Map<String, Value>,
}

impl SchemaReport {
    pub fn new(sheet_name: impl Into<String>, frame: &Frame) -> Self {
        let statistics = frame_stats(frame)
            .into_iter()
            .map(|(name, stats): (String, ColumnStats)| {
                let value = serde_json::to_value(stats).unwrap_or(Value::Null);
                (name, value)
            })
            .collect();

        Self {
            sheet_name: sheet_name.into(),
            shape: frame.shape(),
            columns: frame.column_names(),
            dtypes: Schema::from(frame),
            sample_data: to_records(&frame.head(SAMPLE_ROWS)),
            statistics,
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        write_pretty_json(self, path.as_ref())
    }
}

/// Files written for one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetExport {
    pub sheet_name: String,
    pub shape: (usize, usize),
    pub csv: PathBuf,
    pub json: PathBuf,
    pub schema: PathBuf,
}

/// Result of converting one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    Exported(SheetExport),
    Failed { sheet_name: String, error: String },
}

impl SheetOutcome {
    pub fn sheet_name(&self) -> &str {
        match self {
            SheetOutcome::Exported(export) => &export.sheet_name,
            SheetOutcome::Failed { sheet_name, .. } => sheet_name,
        }
    }
}

/// Everything [`convert_workbook`] produced
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub source: String,
    pub output_dir: PathBuf,
    pub sheets: Vec<SheetOutcome>,
    pub summary: PathBuf,
}

impl ConversionReport {
    pub fn exported(&self) -> impl Iterator<Item = &SheetExport> {
        self.sheets.iter().filter_map(|s| match s {
            SheetOutcome::Exported(export) => Some(export),
            SheetOutcome::Failed { .. } => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.sheets
            .iter()
            .filter(|s| matches!(s, SheetOutcome::Failed { .. }))
            .count()
    }
}

/// Export every sheet of a workbook into `output_dir`.
///
/// A sheet that cannot be read or written is recorded as failed and the
/// remaining sheets are still converted. Opening the workbook itself, or
/// creating the output directory, fails the whole conversion.
pub fn convert_workbook(
    file_path: &str,
    output_dir: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<ConversionReport> {
    let output_dir = output_dir.as_ref();
    let path = WorkbookPath::validate(file_path)?;
    let mut workbook = Workbook::open(path)?;
    ensure_output_dir(output_dir)?;
    fs::create_dir_all(output_dir)?;

    let sheet_names = workbook.sheet_names();
    info!(
        file = file_path,
        sheets = sheet_names.len(),
        "Converting workbook"
    );

    let mut outcomes = Vec::with_capacity(sheet_names.len());
    let mut used_stems = HashSet::new();
    for (idx, sheet) in sheet_names.iter().enumerate() {
        let stem = claim_stem(file_stem_for_sheet(sheet, idx), &mut used_stems);
        let outcome = match export_sheet(&mut workbook, sheet, &stem, output_dir, options) {
            Ok(export) => SheetOutcome::Exported(export),
            Err(err) => {
                warn!(sheet = sheet.as_str(), error = %err, "Sheet conversion failed");
                SheetOutcome::Failed {
                    sheet_name: sheet.clone(),
                    error: err.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }
    drop(workbook);

    let summary = output_dir.join(SUMMARY_FILE);
    let markdown = render_summary(
        file_path,
        output_dir,
        &outcomes,
        &chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    fs::write(&summary, markdown)?;

    Ok(ConversionReport {
        source: file_path.to_string(),
        output_dir: output_dir.to_path_buf(),
        sheets: outcomes,
        summary,
    })
}

fn export_sheet(
    workbook: &mut Workbook,
    sheet: &str,
    stem: &str,
    output_dir: &Path,
    options: &ReadOptions,
) -> Result<SheetExport> {
    let range = workbook.sheet_range(sheet)?;
    let frame = Frame::from_range(&range, options)?;

    let csv = output_dir.join(format!("{}.csv", stem));
    let json = output_dir.join(format!("{}.json", stem));
    let schema = output_dir.join(format!("{}_schema.json", stem));

    write_csv(&frame, &csv)?;
    write_json(&frame, &json)?;
    SchemaReport::new(sheet, &frame).write(&schema)?;

    Ok(SheetExport {
        sheet_name: sheet.to_string(),
        shape: frame.shape(),
        csv,
        json,
        schema,
    })
}

/// Lowercased, file-system safe name for a sheet's output files
pub fn file_stem_for_sheet(sheet: &str, index: usize) -> String {
    let stem: String = sheet
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.chars().all(|c| c == '_') {
        format!("sheet_{}", index + 1)
    } else {
        stem
    }
}

/// Suffix `stem` with `_2`, `_3`, ... until it is not in `used`, then record it
fn claim_stem(stem: String, used: &mut HashSet<String>) -> String {
    let mut candidate = stem.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{}_{}", stem, n);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Markdown summary of a conversion
pub fn render_summary(
    source: &str,
    output_dir: &Path,
    outcomes: &[SheetOutcome],
    timestamp: &str,
) -> String {
    let mut md = String::new();

    md.push_str("# Workbook Conversion Summary\n\n");
    md.push_str(&format!("**Conversion Date:** {}\n\n", timestamp));
    md.push_str(&format!("**Source:** {}\n", source));
    md.push_str(&format!("**Output Directory:** {}\n\n", output_dir.display()));

    md.push_str("## Sheets Processed\n\n");
    for outcome in outcomes {
        match outcome {
            SheetOutcome::Exported(export) => {
                md.push_str(&format!("### {}\n", export.sheet_name));
                md.push_str(&format!(
                    "- **Shape:** {} rows x {} columns\n",
                    export.shape.0, export.shape.1
                ));
                md.push_str(&format!("- **CSV:** `{}`\n", file_name(&export.csv)));
                md.push_str(&format!("- **JSON:** `{}`\n", file_name(&export.json)));
                md.push_str(&format!("- **Schema:** `{}`\n\n", file_name(&export.schema)));
            }
            SheetOutcome::Failed { sheet_name, error } => {
                md.push_str(&format!("### {}\n", sheet_name));
                md.push_str(&format!("- **Failed:** {}\n\n", error));
            }
        }
    }

    md.push_str("## File Formats\n\n");
    md.push_str("- **CSV:** Human-readable, compatible with Excel and other tools\n");
    md.push_str("- **JSON:** Array of row objects, keys in column order\n");
    md.push_str("- **Schema:** Column types, sample rows and basic statistics\n");
    md
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Fail with a helpful message if `dir` exists and is not a directory
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(XlError::invalid_argument(
            "output_dir",
            format!("{} exists and is not a directory", dir.display()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Column, DataType};

    fn frame() -> Frame {
        Frame::new(vec![
            Column::new(
                "Policy_ID",
                DataType::String,
                vec![
                    CellValue::Text("P-1".into()),
                    CellValue::Text("P-2, rider".into()),
                ],
            ),
            Column::new(
                "Premium",
                DataType::Float64,
                vec![CellValue::Float(1200.5), CellValue::Null],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_write_csv_quotes_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&frame(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Policy_ID,Premium\nP-1,1200.5\n\"P-2, rider\",\n");
    }

    #[test]
    fn test_records_keep_column_order() {
        let records = to_records(&frame());
        let json = serde_json::to_string(&records[0]).unwrap();
        assert_eq!(json, r#"{"Policy_ID":"P-1","Premium":1200.5}"#);
        assert!(records[1]["Premium"].is_null());
    }

    #[test]
    fn test_schema_report() {
        let report = SchemaReport::new("Policies", &frame());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["sheet_name"], "Policies");
        assert_eq!(value["shape"], serde_json::json!([2, 2]));
        assert_eq!(value["dtypes"]["Premium"], "Float64");
        assert_eq!(value["sample_data"].as_array().unwrap().len(), 2);
        assert_eq!(value["statistics"]["Premium"]["null_count"], 1);
        assert_eq!(value["statistics"]["Policy_ID"]["unique_count"], 2);
    }

    #[test]
    fn test_file_stem_for_sheet() {
        assert_eq!(file_stem_for_sheet("Life_Table", 0), "life_table");
        assert_eq!(file_stem_for_sheet("Q1 / Q2", 0), "q1___q2");
        assert_eq!(file_stem_for_sheet("///", 4), "sheet_5");
    }

    #[test]
    fn test_claim_stem_suffixes_collisions() {
        let mut used = HashSet::new();

        assert_eq!(claim_stem("sales_2024".into(), &mut used), "sales_2024");
        assert_eq!(claim_stem("sales_2024".into(), &mut used), "sales_2024_2");
        assert_eq!(claim_stem("sales_2024".into(), &mut used), "sales_2024_3");
        assert_eq!(claim_stem("sales_2024_2".into(), &mut used), "sales_2024_2_2");
    }

    #[test]
    fn test_render_summary_lists_failures() {
        let outcomes = vec![
            SheetOutcome::Exported(SheetExport {
                sheet_name: "Policies".into(),
                shape: (10, 4),
                csv: PathBuf::from("out/policies.csv"),
                json: PathBuf::from("out/policies.json"),
                schema: PathBuf::from("out/policies_schema.json"),
            }),
            SheetOutcome::Failed {
                sheet_name: "Broken".into(),
                error: "could not convert".into(),
            },
        ];
        let md = render_summary("book.xlsx", Path::new("out"), &outcomes, "2024-01-01 00:00:00");

        assert!(md.starts_with("# Workbook Conversion Summary"));
        assert!(md.contains("- **CSV:** `policies.csv`"));
        assert!(md.contains("- **Shape:** 10 rows x 4 columns"));
        assert!(md.contains("### Broken\n- **Failed:** could not convert"));
    }

    #[test]
    fn test_ensure_output_dir_rejects_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(ensure_output_dir(file.path()).is_err());

        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_output_dir(dir.path()).is_ok());
    }
}
