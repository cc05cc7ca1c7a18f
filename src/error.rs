//! Unified error types for the student performance service.

use thiserror::Error;

/// Process-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Persistence error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A submission payload failed the required-field checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The request body could not be parsed as JSON.
    #[error("malformed request body: {0}")]
    Malformed(String),

    /// The request body is JSON but not an object.
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// A required field is absent, null, or blank.
    #[error("{field} is required")]
    Missing {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field is present with the wrong JSON type.
    #[error("{field} must be a {expected}")]
    InvalidType {
        /// Name of the offending field.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },

    /// A numeric field exceeds the accepted magnitude.
    #[error("{field} must be between -{limit} and {limit}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Largest accepted absolute value.
        limit: u64,
    },
}

impl ValidationError {
    /// The field this error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Missing { field }
            | Self::InvalidType { field, .. }
            | Self::OutOfRange { field, .. } => Some(field),
            Self::Malformed(_) | Self::NotAnObject => None,
        }
    }
}

/// Persistence collaborator errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store is unreachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Insert collided with an existing record.
    #[error("student {student_id} already exists")]
    DuplicateKey {
        /// The colliding key.
        student_id: String,
    },

    /// Update targeted a record that does not exist.
    #[error("student {student_id} does not exist")]
    MissingRecord {
        /// The missing key.
        student_id: String,
    },

    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Test history could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by the student record service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Client-supplied data failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No record exists for the requested student.
    #[error("student {student_id} not found")]
    NotFound {
        /// The requested key.
        student_id: String,
    },

    /// The store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
