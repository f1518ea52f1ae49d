use thiserror::Error;

/// Errors surfaced by repository and directory collaborators.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {record_type}/{id}")]
    NotFound { record_type: String, id: String },

    #[error("Record already exists: {record_type}/{id}")]
    AlreadyExists { record_type: String, id: String },

    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn not_found(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    pub fn already_exists(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord(message.into())
    }

    /// True for errors caused by the request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::AlreadyExists { .. } | Self::InvalidRecord(_)
        )
    }
}
