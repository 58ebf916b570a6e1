//! Errors raised by the tool layer itself, before a call reaches the worker.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Malformed tool arguments.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A tool result could not be encoded.
    #[error("SERIALIZATION_FAILED: {0}")]
    Serialization(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::Serialization(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: McpError = ToolError::InvalidInput("url cannot be empty".into()).into();
        assert_eq!(err.code, ErrorCode(-32602));
        assert_eq!(err.message, "url cannot be empty");

        let err: McpError = ToolError::Serialization("boom".into()).into();
        assert_eq!(err.code, ErrorCode(-32603));
    }

    #[test]
    fn test_display_has_prefix() {
        assert_eq!(ToolError::InvalidInput("x".into()).to_string(), "INVALID_INPUT: x");
    }
}
