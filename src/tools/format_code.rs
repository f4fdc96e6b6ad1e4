//! `format_code` tool.
//!
//! Advertises a black-style formatter. The handler does not touch the file;
//! it renders the confirmation line for the requested path.

use serde_json::{Value, json};

use super::{TextContent, ToolDescriptor, ToolError};

pub const NAME: &str = "format_code";

/// Parsed arguments for a `format_code` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCodeArgs {
    pub file_path: String,
}

impl FormatCodeArgs {
    /// Extract arguments from the call's JSON object. `file_path` must be
    /// present as a string.
    pub fn parse(args: &Value) -> Result<Self, ToolError> {
        let file_path = args
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or(ToolError::MissingArgument("file_path"))?
            .to_string();

        Ok(Self { file_path })
    }
}

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: NAME,
        description: "Format Python code using black",
        input_schema: json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to Python file to format"
                }
            },
            "required": ["file_path"]
        }),
    }
}

pub fn invoke(args: FormatCodeArgs) -> Vec<TextContent> {
    vec![TextContent::new(format!(
        "Formatted Python file: {}",
        args.file_path
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_file_path() {
        let args = FormatCodeArgs::parse(&json!({"file_path": "a.py"})).unwrap();
        assert_eq!(args.file_path, "a.py");
    }

    #[test]
    fn parse_rejects_missing_file_path() {
        assert_eq!(
            FormatCodeArgs::parse(&json!({})),
            Err(ToolError::MissingArgument("file_path"))
        );
    }

    #[test]
    fn invoke_renders_path() {
        let content = invoke(FormatCodeArgs {
            file_path: "a.py".to_string(),
        });
        assert_eq!(content, vec![TextContent::new("Formatted Python file: a.py")]);
    }
}
