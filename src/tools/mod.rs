//! MCP tool implementations.
//!
//! Each tool lives in its own module exporting a descriptor and an invoke
//! function. The [`Tool`] enum is the single source of truth for the catalog:
//! `tools/list` and `tools/call` both walk the same fixed variant set, so a
//! tool cannot be advertised without also being callable.

pub mod format_code;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Error produced by tool lookup or argument parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The requested name matches no tool in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    /// A required argument was absent or not of its declared type.
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),
}

impl ToolError {
    /// JSON-RPC error code this variant maps to at the protocol boundary.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            ToolError::UnknownTool(_) => crate::core::server::METHOD_NOT_FOUND,
            ToolError::MissingArgument(_) => crate::core::server::INVALID_PARAMS,
        }
    }
}

/// Advertised metadata for a single tool, as returned by `tools/list`.
///
/// `input_schema` is a JSON-Schema object describing the argument shape.
/// It is advertisement only; enforcement happens in each tool's typed
/// argument parser.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// One text item in a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            content_type: "text",
            text: text.into(),
        }
    }
}

/// The closed set of tools this server offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    RunPythonTest,
    FormatCode,
}

impl Tool {
    /// Catalog order. `tools/list` returns descriptors in exactly this order.
    pub const ALL: [Tool; 2] = [Tool::RunPythonTest, Tool::FormatCode];

    /// Exact, case-sensitive name lookup.
    pub fn from_name(name: &str) -> Result<Self, ToolError> {
        match name {
            run_test::NAME => Ok(Tool::RunPythonTest),
            format_code::NAME => Ok(Tool::FormatCode),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        match self {
            Tool::RunPythonTest => run_test::descriptor(),
            Tool::FormatCode => format_code::descriptor(),
        }
    }
}

/// Return descriptors for every tool, in catalog order.
pub fn list_tools() -> Vec<ToolDescriptor> {
    Tool::ALL.iter().map(|t| t.descriptor()).collect()
}

/// Execute the named tool against the supplied JSON argument object.
///
/// Stateless: identical calls produce identical output.
pub fn call_tool(name: &str, arguments: &Value) -> Result<Vec<TextContent>, ToolError> {
    let content = match Tool::from_name(name)? {
        Tool::RunPythonTest => run_test::invoke(run_test::RunTestArgs::parse(arguments)?),
        Tool::FormatCode => format_code::invoke(format_code::FormatCodeArgs::parse(arguments)?),
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_has_two_tools_in_fixed_order() {
        let tools = list_tools();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "run_python_test");
        assert_eq!(tools[1].name, "format_code");
    }

    #[test]
    fn every_advertised_name_is_callable() {
        for descriptor in list_tools() {
            let tool = Tool::from_name(descriptor.name).expect("advertised tool must resolve");
            assert_eq!(tool.descriptor().name, descriptor.name);
        }
    }

    #[test]
    fn descriptor_serializes_input_schema_in_camel_case() {
        let value = serde_json::to_value(Tool::RunPythonTest.descriptor()).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(
            Tool::from_name("Run_Python_Test"),
            Err(ToolError::UnknownTool("Run_Python_Test".to_string()))
        );
    }

    #[test]
    fn unknown_tool_carries_offending_name() {
        let err = call_tool("unknown_tool", &json!({})).unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("unknown_tool".to_string()));
        assert_eq!(err.to_string(), "Unknown tool: unknown_tool");
    }

    #[test]
    fn run_python_test_produces_single_text_item() {
        let content = call_tool("run_python_test", &json!({"test_path": "tests/"})).unwrap();
        assert_eq!(
            content,
            vec![TextContent::new("Running Python tests for: tests/")]
        );
    }

    #[test]
    fn format_code_produces_single_text_item() {
        let content = call_tool("format_code", &json!({"file_path": "a.py"})).unwrap();
        assert_eq!(content, vec![TextContent::new("Formatted Python file: a.py")]);
    }

    #[test]
    fn identical_calls_yield_identical_output() {
        let args = json!({"test_path": "tests/", "verbose": true});
        let first = call_tool("run_python_test", &args).unwrap();
        let second = call_tool("run_python_test", &args).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn text_content_serializes_with_type_tag() {
        let value = serde_json::to_value(TextContent::new("hi")).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hi"}));
    }
}
