use thiserror::Error;

/// Core error types for FHIRBridge mapping operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unexpected FHIR resource type: expected {expected}, got {actual}")]
    ResourceTypeMismatch { expected: String, actual: String },

    #[error("Invalid FHIR instant: {0}")]
    InvalidInstant(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Record not found: {record_type}/{id}")]
    RecordNotFound { record_type: String, id: String },

    #[error("Invalid record data: {message}")]
    InvalidRecord { message: String },

    #[error("Session has no EHR linkage")]
    NoSessionLinkage,
}

impl CoreError {
    /// Create a new ResourceTypeMismatch error
    pub fn resource_type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ResourceTypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new InvalidInstant error
    pub fn invalid_instant(instant: impl Into<String>) -> Self {
        Self::InvalidInstant(instant.into())
    }

    /// Create a new MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a new RecordNotFound error
    pub fn record_not_found(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RecordNotFound {
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    /// Create a new InvalidRecord error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ResourceTypeMismatch { .. }
                | Self::InvalidInstant(_)
                | Self::MissingField(_)
                | Self::RecordNotFound { .. }
                | Self::InvalidRecord { .. }
                | Self::JsonError(_)
                | Self::NoSessionLinkage
        )
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ResourceTypeMismatch { .. } => ErrorCategory::TypeMismatch,
            Self::InvalidInstant(_) | Self::MissingField(_) | Self::InvalidRecord { .. } => {
                ErrorCategory::MalformedInput
            }
            Self::RecordNotFound { .. } => ErrorCategory::NotFound,
            Self::JsonError(_) => ErrorCategory::MalformedInput,
            Self::UuidError(_) => ErrorCategory::System,
            Self::NoSessionLinkage => ErrorCategory::Session,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    MalformedInput,
    TypeMismatch,
    NotFound,
    Session,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedInput => write!(f, "malformed_input"),
            Self::TypeMismatch => write!(f, "type_mismatch"),
            Self::NotFound => write!(f, "not_found"),
            Self::Session => write!(f, "session"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
