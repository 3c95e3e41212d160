//! Tool definitions and dispatch for `tools/list` and `tools/call`

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use xlframe_core::tools::{LIST_SHEETS, READ_EXCEL, READ_EXCEL_SHEET};
use xlframe_core::{
    list_sheets, read_excel, read_excel_sheet, ListSheetsArgs, Outcome, ReadExcelArgs,
    ReadExcelSheetArgs, ReadOptions,
};

use crate::protocol::{McpRpcError, McpTool, ToolCallResult};

/// The workbook tools, bound to the configured read defaults
#[derive(Debug, Clone, Default)]
pub struct WorkbookTools {
    defaults: ReadOptions,
}

impl WorkbookTools {
    pub fn new(defaults: ReadOptions) -> Self {
        Self { defaults }
    }

    /// Tool definitions advertised by `tools/list`
    pub fn definitions(&self) -> Vec<McpTool> {
        vec![
            McpTool {
                name: LIST_SHEETS.to_string(),
                description: "List all sheet names in an Excel file.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path_property(),
                    },
                    "required": ["file_path"],
                }),
            },
            McpTool {
                name: READ_EXCEL.to_string(),
                description: "Read an Excel file and return its data with schema. \
                              Reads the first sheet unless sheet_name is given."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path_property(),
                        "sheet_name": {
                            "type": "string",
                            "description": "Sheet to read; the first sheet when omitted",
                        },
                        "has_header": self.has_header_property(),
                        "infer_schema_length": self.infer_property(),
                    },
                    "required": ["file_path"],
                }),
            },
            McpTool {
                name: READ_EXCEL_SHEET.to_string(),
                description: "Read a specific sheet from an Excel file.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path_property(),
                        "sheet_name": {
                            "type": "string",
                            "description": "Name of the sheet to read",
                        },
                        "has_header": self.has_header_property(),
                        "infer_schema_length": self.infer_property(),
                    },
                    "required": ["file_path", "sheet_name"],
                }),
            },
        ]
    }

    /// Run a tool by name.
    ///
    /// Argument and workbook failures come back as a tool result with
    /// `isError` set; only an unknown tool name is a protocol error.
    pub fn call(&self, name: &str, arguments: Option<Value>) -> Result<ToolCallResult, McpRpcError> {
        let arguments = unwrap_args_envelope(arguments.unwrap_or_else(|| json!({})));
        debug!(tool = name, "Calling tool");

        let payload = match name {
            LIST_SHEETS => run(name, arguments, |args: ListSheetsArgs| list_sheets(&args)),
            READ_EXCEL => run(name, arguments, |args: ReadExcelArgs| {
                read_excel(&args, &self.defaults)
            }),
            READ_EXCEL_SHEET => run(name, arguments, |args: ReadExcelSheetArgs| {
                read_excel_sheet(&args, &self.defaults)
            }),
            other => {
                warn!(tool = other, "Unknown tool requested");
                return Err(McpRpcError::new(-32602, format!("Unknown tool: {}", other)));
            }
        };

        Ok(ToolCallResult::from_payload(payload))
    }

    fn has_header_property(&self) -> Value {
        json!({
            "type": "boolean",
            "description": "Whether the first row holds column names",
            "default": self.defaults.has_header,
        })
    }

    fn infer_property(&self) -> Value {
        json!({
            "type": "integer",
            "minimum": 0,
            "description": "Rows sampled to infer column types; 0 reads every column as text",
            "default": self.defaults.infer_schema_length,
        })
    }
}

fn file_path_property() -> Value {
    json!({
        "type": "string",
        "description": "Path to the Excel file (.xlsx or .xls)",
    })
}

/// Accept `{"args": {...}}` as well as the bare argument object
fn unwrap_args_envelope(arguments: Value) -> Value {
    match arguments {
        Value::Object(mut map) if map.len() == 1 && map.get("args").is_some_and(Value::is_object) => {
            map.remove("args").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode the arguments, run the tool and encode its outcome
fn run<A, T, F>(tool: &str, arguments: Value, f: F) -> Value
where
    A: DeserializeOwned,
    T: Serialize,
    F: FnOnce(A) -> Outcome<T>,
{
    let outcome = match serde_json::from_value::<A>(arguments) {
        Ok(args) => f(args),
        Err(e) => {
            warn!(tool, error = %e, "Undecodable tool arguments");
            Outcome::failure(format!("Invalid arguments for {}: {}", tool, e))
        }
    };

    serde_json::to_value(&outcome)
        .unwrap_or_else(|e| json!({ "error": format!("Failed to encode {} result: {}", tool, e) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_cover_all_tools() {
        let tools = WorkbookTools::default().definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["list_sheets", "read_excel", "read_excel_sheet"]);
        assert_eq!(tools[2].input_schema["required"], json!(["file_path", "sheet_name"]));
    }

    #[test]
    fn test_schema_defaults_follow_config() {
        let tools = WorkbookTools::new(ReadOptions {
            has_header: false,
            infer_schema_length: 7,
        })
        .definitions();

        let props = &tools[1].input_schema["properties"];
        assert_eq!(props["has_header"]["default"], false);
        assert_eq!(props["infer_schema_length"]["default"], 7);
    }

    #[test]
    fn test_args_envelope_is_unwrapped() {
        let wrapped = json!({"args": {"file_path": "a.xlsx"}});
        assert_eq!(unwrap_args_envelope(wrapped), json!({"file_path": "a.xlsx"}));

        // A tool argument literally named "args" alongside others is left alone
        let plain = json!({"args": {}, "file_path": "a.xlsx"});
        assert_eq!(unwrap_args_envelope(plain.clone()), plain);
    }

    #[test]
    fn test_missing_file_is_tool_error() {
        let result = WorkbookTools::default()
            .call(LIST_SHEETS, Some(json!({"file_path": "/nonexistent/book.xlsx"})))
            .unwrap();

        assert!(result.is_error);
        assert_eq!(
            result.structured_content.unwrap(),
            json!({"error": "File not found: /nonexistent/book.xlsx"})
        );
    }

    #[test]
    fn test_undecodable_arguments_are_tool_error() {
        let result = WorkbookTools::default()
            .call(READ_EXCEL_SHEET, Some(json!({"file_path": "a.xlsx"})))
            .unwrap();

        assert!(result.is_error);
        let payload = result.structured_content.unwrap();
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid arguments for read_excel_sheet:"));
    }

    #[test]
    fn test_missing_arguments_are_tool_error() {
        let result = WorkbookTools::default().call(READ_EXCEL, None).unwrap();
        assert!(result.is_error);
    }

    #[test]
    fn test_unknown_tool_is_protocol_error() {
        let err = WorkbookTools::default()
            .call("write_excel", Some(json!({})))
            .unwrap_err();

        assert_eq!(err.code, -32602);
        assert!(err.message.contains("write_excel"));
    }
}
