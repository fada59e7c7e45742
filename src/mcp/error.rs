//! MCP-specific error types and mapping to JSON-RPC error codes.

use crate::error::NotelinkError;
use rmcp::model::ErrorCode;
use rmcp::ErrorData as RmcpError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Custom MCP error codes (in the -32000 to -32099 range for server errors)
pub mod error_codes {
    pub const NOTE_NOT_FOUND: i32 = -32001;
    pub const AMBIGUOUS_ID: i32 = -32002;
    pub const VALIDATION_FAILED: i32 = -32003;
    pub const STORAGE_ERROR: i32 = -32010;
    pub const INTERNAL_ERROR: i32 = -32011;
}

/// MCP-specific error types with detailed context.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum McpError {
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    #[error("Ambiguous id prefix '{prefix}' matches {matches} notes")]
    AmbiguousId { prefix: String, matches: usize },

    #[error("Validation failed for field '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Get the JSON-RPC error code for this error type.
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::NoteNotFound { .. } => error_codes::NOTE_NOT_FOUND,
            McpError::AmbiguousId { .. } => error_codes::AMBIGUOUS_ID,
            McpError::ValidationFailed { .. } => error_codes::VALIDATION_FAILED,
            McpError::StorageError { .. } => error_codes::STORAGE_ERROR,
            McpError::InternalError { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get the error type name for the data payload.
    pub fn error_type(&self) -> &'static str {
        match self {
            McpError::NoteNotFound { .. } => "NoteNotFound",
            McpError::AmbiguousId { .. } => "AmbiguousId",
            McpError::ValidationFailed { .. } => "ValidationFailed",
            McpError::StorageError { .. } => "StorageError",
            McpError::InternalError { .. } => "InternalError",
        }
    }

    /// Convert to rmcp ErrorData for JSON-RPC response.
    pub fn to_rmcp_error(&self) -> RmcpError {
        RmcpError {
            code: ErrorCode(self.error_code()),
            message: self.to_string().into(),
            data: Some(json!({
                "error_type": self.error_type(),
                "details": self.clone()
            })),
        }
    }
}

impl From<McpError> for RmcpError {
    fn from(err: McpError) -> Self {
        err.to_rmcp_error()
    }
}

impl From<NotelinkError> for McpError {
    fn from(err: NotelinkError) -> Self {
        match err {
            NotelinkError::NoteNotFound(id) => McpError::NoteNotFound { id },
            NotelinkError::AmbiguousId(prefix, matches) => {
                McpError::AmbiguousId { prefix, matches }
            }
            NotelinkError::InvalidId(id) => McpError::ValidationFailed {
                field: "id".to_string(),
                message: format!("'{}' is not a note id", id),
            },
            NotelinkError::InvalidBackup(msg) => McpError::ValidationFailed {
                field: "backup".to_string(),
                message: msg,
            },
            NotelinkError::Json(e) => McpError::InternalError {
                message: format!("JSON error: {}", e),
            },
            other => McpError::StorageError {
                message: other.to_string(),
            },
        }
    }
}

/// Validation constants.
pub mod validation {
    pub const MIN_ID_PREFIX_LENGTH: usize = 4;
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 100;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = McpError::NoteNotFound {
            id: "100000001".to_string(),
        };
        assert_eq!(err.error_code(), error_codes::NOTE_NOT_FOUND);

        let err = McpError::ValidationFailed {
            field: "query".to_string(),
            message: "empty".to_string(),
        };
        assert_eq!(err.error_code(), error_codes::VALIDATION_FAILED);
    }

    #[test]
    fn test_from_notelink_error() {
        let mcp_err: McpError = NotelinkError::NoteNotFound("xyz".to_string()).into();
        assert!(matches!(mcp_err, McpError::NoteNotFound { id } if id == "xyz"));

        let mcp_err: McpError = NotelinkError::AmbiguousId("1000".to_string(), 3).into();
        assert!(matches!(mcp_err, McpError::AmbiguousId { matches: 3, .. }));

        let mcp_err: McpError = NotelinkError::NotInitialized.into();
        assert_eq!(mcp_err.error_code(), error_codes::STORAGE_ERROR);
    }

    #[test]
    fn test_to_rmcp_error() {
        let err = McpError::NoteNotFound {
            id: "123456789".to_string(),
        };
        let rmcp_err = err.to_rmcp_error();
        assert_eq!(rmcp_err.code, ErrorCode(error_codes::NOTE_NOT_FOUND));
        assert!(rmcp_err.message.contains("123456789"));
        assert_eq!(rmcp_err.data.unwrap()["error_type"], "NoteNotFound");
    }
}
