//! Error types for the AWS integration library

use std::path::PathBuf;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by settings loading, session building and SDK calls
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid AWS settings: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to read settings from {path:?}: {source}")]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {path:?}: {source}")]
    WriteSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    ParseSettings(#[from] serde_json::Error),

    #[error("failed to determine settings directory")]
    NoSettingsDir,

    #[error("failed to read AWS shared file {path:?}: {source}")]
    ReadAwsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("handle was built for '{actual}', not '{requested}'")]
    ServiceMismatch { requested: String, actual: String },

    #[error("the '{0}' service has no resource interface")]
    ResourceNotAvailable(String),

    #[error("STS request failed: {0}")]
    Sts(#[from] Box<aws_sdk_sts::Error>),

    #[error("STS returned no caller ARN")]
    MissingCallerArn,
}

/// Reasons an `AwsSettings` value is rejected when loaded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid AWS region")]
    InvalidRegion(String),

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error(
        "both aws_access_key_id and aws_secret_access_key are required \
         when neither an IAM role nor a credentials profile is used"
    )]
    IncompleteKeyPair,

    #[error("access key ID must be {expected} characters, got {actual}")]
    AccessKeyLength { expected: usize, actual: usize },

    #[error("secret access key must be {expected} characters, got {actual}")]
    SecretKeyLength { expected: usize, actual: usize },
}
