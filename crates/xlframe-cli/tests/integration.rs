//! Integration tests for xlframe CLI
//!
//! These drive the command functions against workbooks written to a temp
//! directory.

use std::io::{Cursor, Write};
use std::path::Path;

use tempfile::TempDir;
use xlframe_cli::{convert_command, copy_command, read_command, sheets_command, OutputFormat, ReadFlags};
use xlframe_core::{
    list_sheets, read_excel_sheet, CellValue, Column, DataType, Frame, ListSheetsArgs,
    ReadExcelSheetArgs, ReadOptions, XlsxWriter,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn flags() -> ReadFlags {
    ReadFlags {
        no_header: false,
        infer_schema_length: None,
    }
}

fn claims() -> Frame {
    Frame::new(vec![
        Column::new(
            "Claim_ID",
            DataType::String,
            vec![
                CellValue::Text("C-001".into()),
                CellValue::Text("C-002".into()),
                CellValue::Text("C-003".into()),
            ],
        ),
        Column::new(
            "Amount",
            DataType::Float64,
            vec![
                CellValue::Float(1250.5),
                CellValue::Null,
                CellValue::Float(310.0),
            ],
        ),
        Column::new(
            "Approved",
            DataType::Boolean,
            vec![
                CellValue::Bool(true),
                CellValue::Bool(false),
                CellValue::Bool(true),
            ],
        ),
    ])
    .unwrap()
}

fn write_workbook(dir: &Path, name: &str, sheets: &[&str]) -> String {
    let path = dir.join(name);
    let mut writer = XlsxWriter::new();
    for sheet in sheets {
        writer.add_sheet(*sheet, claims()).unwrap();
    }
    writer.save(&path).unwrap();
    path.to_str().unwrap().to_string()
}

/// A zip archive with the right extension but no workbook parts
fn create_broken_workbook(dir: &Path) -> String {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
</Types>"#)
        .unwrap();
    zip.finish().unwrap();

    let path = dir.join("broken.xlsx");
    std::fs::write(&path, buffer.into_inner()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_convert_command_exports_each_sheet() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "claims.xlsx", &["Claims 2023", "Claims 2024"]);
    let out = dir.path().join("out");

    convert_command(&input, &out, &flags()).unwrap();

    for name in [
        "claims_2023.csv",
        "claims_2023.json",
        "claims_2023_schema.json",
        "claims_2024.csv",
        "conversion_summary.md",
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }

    let records: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("claims_2024.json")).unwrap())
            .unwrap();
    assert_eq!(records[0]["Claim_ID"], "C-001");
    assert!(records[1]["Amount"].is_null());
    assert_eq!(records[2]["Approved"], true);

    let summary = std::fs::read_to_string(out.join("conversion_summary.md")).unwrap();
    assert!(summary.contains("Claims 2023"));
    assert!(summary.contains("claims.xlsx"));
}

#[test]
fn test_convert_command_rejects_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.xlsx");

    let err = convert_command(missing.to_str().unwrap(), &dir.path().join("out"), &flags())
        .unwrap_err();

    assert!(format!("{:#}", err).contains("File not found"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_copy_command_round_trips_types() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "source.xlsx", &["A", "B", "C"]);
    let output = dir.path().join("copy.xlsx");

    copy_command(&input, &output, &["C".to_string(), "A".to_string()], &flags()).unwrap();

    let copied = output.to_str().unwrap();
    let sheets = list_sheets(&ListSheetsArgs::new(copied)).into_result().unwrap();
    assert_eq!(sheets.sheets, vec!["C", "A"]);

    let table = read_excel_sheet(&ReadExcelSheetArgs::new(copied, "A"), &ReadOptions::default())
        .into_result()
        .unwrap();
    assert_eq!(table.shape, (3, 3));
    assert_eq!(table.schema.get("Amount"), Some(DataType::Float64));
    assert_eq!(table.schema.get("Approved"), Some(DataType::Boolean));
    assert_eq!(
        table.data.get("Amount").unwrap(),
        &[CellValue::Float(1250.5), CellValue::Null, CellValue::Float(310.0)]
    );
}

#[test]
fn test_copy_command_unknown_sheet() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "source.xlsx", &["Only"]);

    let err = copy_command(
        &input,
        &dir.path().join("copy.xlsx"),
        &["Missing".to_string()],
        &flags(),
    )
    .unwrap_err();

    assert!(format!("{:#}", err).contains("Sheet 'Missing' not found in workbook"));
}

#[test]
fn test_text_commands_report_failures() {
    let dir = TempDir::new().unwrap();
    let notes = dir.path().join("notes.csv");
    std::fs::write(&notes, "a,b\n1,2\n").unwrap();

    let err = sheets_command(notes.to_str().unwrap(), OutputFormat::Text).unwrap_err();
    assert_eq!(err.to_string(), "File must be an Excel file (.xlsx or .xls)");

    let err = read_command(
        "/nonexistent/book.xlsx",
        None,
        &flags(),
        OutputFormat::Text,
        10,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "File not found: /nonexistent/book.xlsx");
}

#[test]
fn test_broken_package_is_reported() {
    let dir = TempDir::new().unwrap();
    let broken = create_broken_workbook(dir.path());

    let outcome = list_sheets(&ListSheetsArgs::new(&broken));
    assert!(outcome
        .error_message()
        .unwrap()
        .starts_with("Failed to list sheets:"));

    assert!(convert_command(&broken, &dir.path().join("out"), &flags()).is_err());
}

#[test]
fn test_convert_command_fails_when_a_sheet_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.xlsx");
    let mixed = Frame::new(vec![Column::new(
        "Amount",
        DataType::String,
        vec![CellValue::Float(12.5), CellValue::Text("pending".into())],
    )])
    .unwrap();
    let mut writer = XlsxWriter::new();
    writer.add_sheet("Mixed", mixed).unwrap();
    writer.add_sheet("Claims", claims()).unwrap();
    writer.save(&path).unwrap();
    let out = dir.path().join("out");

    let sampled = ReadFlags {
        no_header: false,
        infer_schema_length: Some(1),
    };
    let err = convert_command(path.to_str().unwrap(), &out, &sampled).unwrap_err();

    assert!(err.to_string().contains("1 of 2 sheet(s) failed to convert"));
    assert!(!out.join("mixed.csv").exists());
    assert!(out.join("claims.csv").exists());
    assert!(out.join("conversion_summary.md").exists());
}
