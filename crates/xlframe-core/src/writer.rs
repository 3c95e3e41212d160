//! Minimal `.xlsx` writer for frames.
//!
//! Each frame becomes one worksheet with a header row of column names.
//! Text is written as inline strings, so the package needs no shared string
//! table. Datetime and duration columns are written as their ISO-8601 text.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, XlError};
use crate::frame::{CellValue, Frame};

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Characters Excel refuses in sheet names
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Excel's sheet name length limit
const MAX_SHEET_NAME_LEN: usize = 31;

/// Builds a workbook from named frames
#[derive(Debug, Default)]
pub struct XlsxWriter {
    sheets: Vec<(String, Frame)>,
}

impl XlsxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet; names must be unique (ignoring case) and valid for Excel
    pub fn add_sheet(&mut self, name: impl Into<String>, frame: Frame) -> Result<&mut Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(XlError::invalid_argument("sheet_name", "must not be empty"));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(XlError::invalid_argument(
                "sheet_name",
                format!("'{}' is longer than {} characters", name, MAX_SHEET_NAME_LEN),
            ));
        }
        if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
            return Err(XlError::invalid_argument(
                "sheet_name",
                format!("'{}' contains forbidden character '{}'", name, c),
            ));
        }
        let folded = name.to_lowercase();
        if self
            .sheets
            .iter()
            .any(|(existing, _)| existing.to_lowercase() == folded)
        {
            return Err(XlError::invalid_argument(
                "sheet_name",
                format!("duplicate sheet name '{}'", name),
            ));
        }

        self.sheets.push((name, frame));
        Ok(self)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Write the workbook to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the workbook to any seekable writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(XlError::invalid_argument(
                "sheets",
                "a workbook needs at least one sheet",
            ));
        }

        let mut zip = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(root_rels_xml().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels_xml().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(styles_xml().as_bytes())?;

        for (idx, (_, frame)) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
            zip.write_all(worksheet_xml(frame).as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
"#,
        );
        for idx in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n",
                idx
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<workbook xmlns=\"{}\" xmlns:r=\"{}\"><sheets>",
            SPREADSHEET_NS, OFFICE_REL_NS
        );
        for (idx, (name, _)) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
                escape(name.as_str()),
                idx + 1,
                idx + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{}\">",
            RELATIONSHIPS_NS
        );
        for idx in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"{}/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
                idx, OFFICE_REL_NS, idx
            ));
        }
        let styles_id = self.sheets.len() + 1;
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{}/styles\" Target=\"styles.xml\"/>",
            styles_id, OFFICE_REL_NS
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

fn root_rels_xml() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{}\"><Relationship Id=\"rId1\" Type=\"{}/officeDocument\" Target=\"xl/workbook.xml\"/></Relationships>",
        RELATIONSHIPS_NS, OFFICE_REL_NS
    )
}

fn styles_xml() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<styleSheet xmlns=\"{}\"><fonts count=\"1\"><font/></fonts><fills count=\"1\"><fill/></fills><borders count=\"1\"><border/></borders><cellXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellXfs></styleSheet>",
        SPREADSHEET_NS
    )
}

fn worksheet_xml(frame: &Frame) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<worksheet xmlns=\"{}\"><sheetData>",
        SPREADSHEET_NS
    );

    if !frame.is_empty() {
        xml.push_str("<row r=\"1\">");
        for (col_idx, name) in frame.column_names().iter().enumerate() {
            push_inline_string(&mut xml, &cell_ref(col_idx, 1), name);
        }
        xml.push_str("</row>");
    }

    for (row_idx, row) in frame.rows().enumerate() {
        let row_number = row_idx + 2;
        xml.push_str(&format!("<row r=\"{}\">", row_number));
        for (col_idx, value) in row.into_iter().enumerate() {
            let reference = cell_ref(col_idx, row_number);
            match value {
                CellValue::Null => {}
                CellValue::Int(i) => {
                    xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, i));
                }
                CellValue::Float(f) if f.is_finite() => {
                    xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, f));
                }
                CellValue::Float(_) => {}
                CellValue::Bool(b) => {
                    xml.push_str(&format!(
                        "<c r=\"{}\" t=\"b\"><v>{}</v></c>",
                        reference,
                        u8::from(*b)
                    ));
                }
                CellValue::Text(s) => push_inline_string(&mut xml, &reference, s),
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_inline_string(xml: &mut String, reference: &str, text: &str) {
    let space = if text.trim() != text {
        " xml:space=\"preserve\""
    } else {
        ""
    };
    xml.push_str(&format!(
        "<c r=\"{}\" t=\"inlineStr\"><is><t{}>{}</t></is></c>",
        reference,
        space,
        escape(text)
    ));
}

/// A1-style reference for a zero-based column and one-based row
fn cell_ref(col_idx: usize, row: usize) -> String {
    format!("{}{}", column_letters(col_idx), row)
}

/// Convert a zero-based column index to letters (0 = A, 25 = Z, 26 = AA)
fn column_letters(mut col_idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col_idx % 26) as u8);
        if col_idx < 26 {
            break;
        }
        col_idx = col_idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Column, DataType};
    use std::io::Cursor;

    fn frame() -> Frame {
        Frame::new(vec![
            Column::new(
                "Name",
                DataType::String,
                vec![CellValue::Text("A & B".into()), CellValue::Null],
            ),
            Column::new(
                "Active",
                DataType::Boolean,
                vec![CellValue::Bool(true), CellValue::Bool(false)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(51), "AZ");
        assert_eq!(column_letters(52), "BA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_worksheet_xml_escapes_and_skips_nulls() {
        let xml = worksheet_xml(&frame());

        assert!(xml.contains("<c r=\"A1\" t=\"inlineStr\"><is><t>Name</t></is></c>"));
        assert!(xml.contains("A &amp; B"));
        assert!(xml.contains("<c r=\"B2\" t=\"b\"><v>1</v></c>"));
        assert!(!xml.contains("r=\"A3\""));
    }

    #[test]
    fn test_rejects_bad_sheet_names() {
        let mut writer = XlsxWriter::new();
        assert!(writer.add_sheet("", Frame::default()).is_err());
        assert!(writer.add_sheet("a/b", Frame::default()).is_err());
        assert!(writer.add_sheet("x".repeat(32), Frame::default()).is_err());

        writer.add_sheet("Data", Frame::default()).unwrap();
        assert!(writer.add_sheet("data", Frame::default()).is_err());
        assert_eq!(writer.sheet_count(), 1);
    }

    #[test]
    fn test_duplicate_names_fold_unicode_case() {
        let mut writer = XlsxWriter::new();
        writer.add_sheet("Ärger", Frame::default()).unwrap();

        assert!(writer.add_sheet("ärger", Frame::default()).is_err());
        assert!(writer.add_sheet("ÄRGER", Frame::default()).is_err());
        assert_eq!(writer.sheet_count(), 1);
    }

    #[test]
    fn test_empty_workbook_rejected() {
        let writer = XlsxWriter::new();
        assert!(writer.write_to(Cursor::new(Vec::new())).is_err());
    }

    #[test]
    fn test_write_produces_zip() {
        let mut writer = XlsxWriter::new();
        writer.add_sheet("People", frame()).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        writer.write_to(&mut buffer).unwrap();

        let bytes = buffer.into_inner();
        assert_eq!(&bytes[..2], b"PK");
    }
}
