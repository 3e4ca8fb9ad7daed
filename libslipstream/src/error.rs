//! Error types for Slipstream

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlipstreamError>;

#[derive(Error, Debug)]
pub enum SlipstreamError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SlipstreamError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SlipstreamError::InvalidInput(_) => 3,
            SlipstreamError::Config(_) => 2,
            SlipstreamError::Storage(_) => 2,
            SlipstreamError::Remote(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Snapshot serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Failure reported by a remote write.
///
/// Backends differ wildly in what they return; the only two things the
/// reconciliation logic can rely on are an optional structured `code` and an
/// optional human-readable `message`. Everything else is discarded at the
/// integration boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Remote write failed: code={}, message={}", .code.as_deref().unwrap_or("none"), .message.as_deref().unwrap_or("none"))]
pub struct RemoteError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl RemoteError {
    pub fn new(code: Option<String>, message: Option<String>) -> Self {
        RemoteError { code, message }
    }

    /// A connectivity-shaped failure with no structured code.
    pub fn network(message: &str) -> Self {
        RemoteError {
            code: None,
            message: Some(message.to_string()),
        }
    }

    /// A duplicate-row failure: the action was already applied remotely.
    pub fn conflict() -> Self {
        RemoteError {
            code: Some(UNIQUE_VIOLATION_CODE.to_string()),
            message: Some("duplicate key value violates unique constraint".to_string()),
        }
    }

    /// A structured backend failure (validation, permission, and so on).
    pub fn server(code: &str, message: &str) -> Self {
        RemoteError {
            code: Some(code.to_string()),
            message: Some(message.to_string()),
        }
    }
}

/// The unique-constraint violation code recognized as "already applied".
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// How the mutation engine should resolve a failed remote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote state already reflects the action. Treat as success.
    AlreadyApplied,
    /// Connectivity-shaped failure. Keep the optimistic state and defer.
    Recoverable,
    /// Anything else. Roll back and tell the user.
    Fatal,
}

/// Classifies a remote failure. All failure-path branching in the mutation
/// engine and every queue replayer goes through this one function.
///
/// Rules, checked in order:
/// 1. The recognized unique-constraint code means the write already
///    happened: [`FailureKind::AlreadyApplied`].
/// 2. No structured code and either no message (an empty message counts as
///    absent) or a message containing `network` or `fetch`
///    (case-insensitive) is connectivity-shaped: [`FailureKind::Recoverable`].
/// 3. Everything else, including any unrecognized structured code, is
///    [`FailureKind::Fatal`].
pub fn classify_remote_error(error: &RemoteError) -> FailureKind {
    if error.code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
        return FailureKind::AlreadyApplied;
    }

    if error.code.is_none() {
        let message = error.message.as_deref().unwrap_or("");
        if message.is_empty() {
            return FailureKind::Recoverable;
        }
        let lowered = message.to_lowercase();
        if lowered.contains("network") || lowered.contains("fetch") {
            return FailureKind::Recoverable;
        }
    }

    FailureKind::Fatal
}
