//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use xlframe_core::export::{convert_workbook, SheetOutcome};
use xlframe_core::stats::frame_stats;
use xlframe_core::tools::{enumerate_sheets, read_frame};
use xlframe_core::{
    list_sheets, read_excel, read_excel_sheet, CellValue, Frame, ListSheetsArgs, Outcome,
    ReadExcelArgs, ReadExcelSheetArgs, ReadOptions, ReadRequest, SheetList, TableResult,
    WorkbookPath, XlsxWriter,
};

/// Output format for tool results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// The exact JSON payload the server would return
    Json,
}

#[derive(Parser)]
#[command(name = "xlframe")]
#[command(author, version, about = "Read Excel workbooks as typed tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads sheet data
#[derive(Debug, Clone, Copy, Args)]
pub struct ReadFlags {
    /// Treat the first row as data instead of column names
    #[arg(long)]
    pub no_header: bool,

    /// Rows sampled to infer column types (0 reads everything as text)
    #[arg(long, value_name = "ROWS")]
    pub infer_schema_length: Option<usize>,
}

impl ReadFlags {
    /// Options with the flags applied over the defaults
    pub fn options(&self) -> ReadOptions {
        let defaults = ReadOptions::default();
        ReadOptions {
            has_header: !self.no_header,
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheet names of a workbook
    Sheets {
        /// Input workbook (.xlsx or .xls)
        input: String,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Read the first sheet, or the one named with --sheet
    Read {
        /// Input workbook (.xlsx or .xls)
        input: String,

        /// Sheet to read
        #[arg(short, long)]
        sheet: Option<String>,

        #[command(flatten)]
        flags: ReadFlags,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Rows shown in text output
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },

    /// Read one named sheet
    ReadSheet {
        /// Input workbook (.xlsx or .xls)
        input: String,

        /// Sheet to read
        sheet: String,

        #[command(flatten)]
        flags: ReadFlags,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Rows shown in text output
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },

    /// Show shape, types, sample rows and statistics of every sheet
    View {
        /// Input workbook (.xlsx or .xls)
        input: String,

        #[command(flatten)]
        flags: ReadFlags,
    },

    /// Export every sheet to CSV, JSON and a schema report
    Convert {
        /// Input workbook (.xlsx or .xls)
        input: String,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: String,

        #[command(flatten)]
        flags: ReadFlags,
    },

    /// Write sheets, as read and typed, to a new .xlsx workbook
    Copy {
        /// Input workbook (.xlsx or .xls)
        input: String,

        /// Output .xlsx file
        output: String,

        /// Sheets to copy (all sheets when omitted)
        #[arg(short, long)]
        sheet: Vec<String>,

        #[command(flatten)]
        flags: ReadFlags,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sheets { input, format } => {
            sheets_command(&input, format)?;
        }
        Commands::Read {
            input,
            sheet,
            flags,
            format,
            rows,
        } => {
            read_command(&input, sheet.as_deref(), &flags, format, rows)?;
        }
        Commands::ReadSheet {
            input,
            sheet,
            flags,
            format,
            rows,
        } => {
            read_sheet_command(&input, &sheet, &flags, format, rows)?;
        }
        Commands::View { input, flags } => {
            view_command(&input, &flags)?;
        }
        Commands::Convert {
            input,
            output,
            flags,
        } => {
            convert_command(&input, Path::new(&output), &flags)?;
        }
        Commands::Copy {
            input,
            output,
            sheet,
            flags,
        } => {
            copy_command(&input, Path::new(&output), &sheet, &flags)?;
        }
    }

    Ok(())
}

/// Execute the sheets command
pub fn sheets_command(input: &str, format: OutputFormat) -> Result<()> {
    let outcome = list_sheets(&ListSheetsArgs::new(input));
    emit(&outcome, format, render_sheet_list)
}

/// Execute the read command
pub fn read_command(
    input: &str,
    sheet: Option<&str>,
    flags: &ReadFlags,
    format: OutputFormat,
    rows: usize,
) -> Result<()> {
    let mut args = ReadExcelArgs::new(input).with_header(!flags.no_header);
    if let Some(sheet) = sheet {
        args = args.with_sheet(sheet);
    }
    if let Some(n) = flags.infer_schema_length {
        args = args.with_infer_schema_length(n);
    }

    let outcome = read_excel(&args, &ReadOptions::default());
    emit(&outcome, format, |table| render_table(table, rows))
}

/// Execute the read-sheet command
pub fn read_sheet_command(
    input: &str,
    sheet: &str,
    flags: &ReadFlags,
    format: OutputFormat,
    rows: usize,
) -> Result<()> {
    let mut args = ReadExcelSheetArgs::new(input, sheet).with_header(!flags.no_header);
    if let Some(n) = flags.infer_schema_length {
        args = args.with_infer_schema_length(n);
    }

    let outcome = read_excel_sheet(&args, &ReadOptions::default());
    emit(&outcome, format, |table| render_table(table, rows))
}

/// Execute the view command
pub fn view_command(input: &str, flags: &ReadFlags) -> Result<()> {
    let path = WorkbookPath::validate(input)?;
    let sheets = enumerate_sheets(path).with_context(|| format!("Failed to list sheets: {}", input))?;

    println!("xlframe v{}", xlframe_core::VERSION);
    println!("Found {} sheet(s): {}", sheets.len(), sheets.join(", "));

    for (idx, sheet) in sheets.iter().enumerate() {
        println!();
        println!("{}. Sheet: {}", idx + 1, sheet);

        let request = ReadRequest {
            file_path: input.to_string(),
            sheet_name: Some(sheet.clone()),
            options: flags.options(),
        };
        match read_frame(&request) {
            Ok((_, frame)) => print!("{}", render_overview(&frame)),
            Err(err) => println!("  Error reading sheet {}: {}", sheet, err),
        }
    }

    Ok(())
}

/// Execute the convert command
pub fn convert_command(input: &str, output_dir: &Path, flags: &ReadFlags) -> Result<()> {
    println!("xlframe v{}", xlframe_core::VERSION);
    println!("Converting: {}", input);

    let report = convert_workbook(input, output_dir, &flags.options())
        .with_context(|| format!("Failed to convert workbook: {}", input))?;

    for outcome in &report.sheets {
        match outcome {
            SheetOutcome::Exported(export) => {
                println!(
                    "  {} ({} rows x {} columns)",
                    export.sheet_name, export.shape.0, export.shape.1
                );
                for file in [&export.csv, &export.json, &export.schema] {
                    println!("    Created: {}", file.display());
                }
            }
            SheetOutcome::Failed { sheet_name, error } => {
                println!("  {} failed: {}", sheet_name, error);
            }
        }
    }

    println!();
    println!("Summary: {}", report.summary.display());
    if report.failed_count() > 0 {
        anyhow::bail!(
            "{} of {} sheet(s) failed to convert",
            report.failed_count(),
            report.sheets.len()
        );
    }

    println!("Conversion complete!");
    Ok(())
}

/// Execute the copy command
pub fn copy_command(input: &str, output: &Path, sheets: &[String], flags: &ReadFlags) -> Result<()> {
    let path = WorkbookPath::validate(input)?;
    let selected = if sheets.is_empty() {
        enumerate_sheets(path).with_context(|| format!("Failed to list sheets: {}", input))?
    } else {
        sheets.to_vec()
    };

    let mut writer = XlsxWriter::new();
    for sheet in &selected {
        let request = ReadRequest {
            file_path: input.to_string(),
            sheet_name: Some(sheet.clone()),
            options: flags.options(),
        };
        let (name, frame) = read_frame(&request)
            .with_context(|| format!("Failed to read sheet '{}' from {}", sheet, input))?;
        writer
            .add_sheet(name, frame)
            .with_context(|| format!("Cannot write sheet '{}'", sheet))?;
    }

    writer
        .save(output)
        .with_context(|| format!("Failed to write workbook: {}", output.display()))?;
    println!(
        "Wrote {} sheet(s) to {}",
        writer.sheet_count(),
        output.display()
    );

    Ok(())
}

/// Print an outcome; JSON failures exit with status 1 after printing the payload
fn emit<T, F>(outcome: &Outcome<T>, format: OutputFormat, render: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(outcome)
                .context("Failed to serialize result to JSON")?;
            println!("{}", json);
            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        OutputFormat::Text => match outcome {
            Outcome::Success(payload) => print!("{}", render(payload)),
            Outcome::Failure(err) => anyhow::bail!("{}", err),
        },
    }

    Ok(())
}

/// Text rendering of a sheet list
pub fn render_sheet_list(list: &SheetList) -> String {
    let mut output = format!("{} ({} sheet(s))\n", list.file_path, list.sheets.len());
    for (idx, sheet) in list.sheets.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", idx + 1, sheet));
    }
    output
}

/// Text rendering of a table: shape, schema and the first `max_rows` rows
pub fn render_table(table: &TableResult, max_rows: usize) -> String {
    let mut output = String::new();

    if let Some(sheet) = &table.sheet_name {
        output.push_str(&format!("Sheet: {}\n", sheet));
    }
    output.push_str(&format!(
        "Shape: ({}, {}) (rows x columns)\n",
        table.shape.0, table.shape.1
    ));
    output.push_str("Schema:\n");
    for (name, dtype) in table.schema.iter() {
        output.push_str(&format!("  {}: {}\n", name, dtype));
    }

    let columns: Vec<(&str, &[CellValue])> = table.data.iter().collect();
    output.push('\n');
    output.push_str(&render_grid(&columns, max_rows));
    if table.shape.0 > max_rows {
        output.push_str(&format!("... {} more row(s)\n", table.shape.0 - max_rows));
    }

    output
}

/// Shape, columns, types, three sample rows and numeric statistics of a frame
pub fn render_overview(frame: &Frame) -> String {
    let mut output = format!(
        "  Shape: ({}, {}) (rows x columns)\n  Columns: {}\n  Data Types:\n",
        frame.height(),
        frame.width(),
        frame.column_names().join(", ")
    );
    for (name, dtype) in frame.schema() {
        output.push_str(&format!("    {}: {}\n", name, dtype));
    }

    let columns: Vec<(&str, &[CellValue])> = frame
        .columns()
        .iter()
        .map(|c| (c.name(), c.values()))
        .collect();
    output.push_str("  Sample Data (first 3 rows):\n");
    for line in render_grid(&columns, 3).lines() {
        output.push_str(&format!("    {}\n", line));
    }

    let numeric: Vec<_> = frame_stats(frame)
        .into_iter()
        .filter(|(_, stats)| stats.dtype.is_numeric())
        .collect();
    if !numeric.is_empty() {
        output.push_str("  Statistics (numeric columns):\n");
        for (name, stats) in numeric {
            let show = |v: Option<CellValue>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
            output.push_str(&format!(
                "    {}: min={} max={} mean={} nulls={}\n",
                name,
                show(stats.min),
                show(stats.max),
                stats
                    .mean
                    .map(|m| format!("{:.4}", m))
                    .unwrap_or_else(|| "-".into()),
                stats.null_count
            ));
        }
    }

    output
}

/// Left-aligned grid of column values, nulls shown as `null`
fn render_grid(columns: &[(&str, &[CellValue])], max_rows: usize) -> String {
    let height = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    let shown = height.min(max_rows);

    let cells: Vec<Vec<String>> = columns
        .iter()
        .map(|(_, values)| values[..shown].iter().map(display_cell).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .zip(&cells)
        .map(|((name, _), col)| {
            col.iter()
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|((name, _), w)| pad(name, *w))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&rule.join("-+-"));
    output.push('\n');

    for row in 0..shown {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(col, w)| pad(&col[row], *w))
            .collect();
        output.push_str(line.join(" | ").trim_end());
        output.push('\n');
    }

    output
}

fn display_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}
