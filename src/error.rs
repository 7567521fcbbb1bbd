//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown user, bad config)
//! - 3: Rejected by policy (validation, duplicate id, version conflict)
//! - 4: Operation failed (IO, serialization)

use thiserror::Error;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("No current user in session")]
    NoCurrentUser,

    #[error("Expected exactly one current user, found {0}")]
    AmbiguousCurrentUser(usize),

    // Policy rejections (exit code 3)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::UserNotFound(_)
            | Error::NoCurrentUser
            | Error::AmbiguousCurrentUser(_) => exit_codes::USER_ERROR,

            Error::Validation(_) | Error::DuplicateId(_) | Error::VersionConflict { .. } => {
                exit_codes::POLICY_REJECTED
            }

            Error::Io(_) | Error::Json(_) | Error::TomlParse(_) | Error::TomlSerialize(_) => {
                exit_codes::OPERATION_FAILED
            }
        }
    }

    /// Structured details for JSON error output, when the variant carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::VersionConflict {
                id,
                expected,
                actual,
            } => Some(serde_json::json!({
                "id": id,
                "expected": expected,
                "actual": actual,
            })),
            Error::DuplicateId(id) => Some(serde_json::json!({ "id": id })),
            _ => None,
        }
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
