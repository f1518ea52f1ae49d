use fhirbridge_core::CoreError;
use fhirbridge_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the adapter operations.
///
/// Everything reaching the HTTP boundary is one of these; the boundary maps
/// client errors to 4xx responses and the rest to 5xx.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Unknown provider reference: {0}")]
    UnknownProvider(String),

    #[error("Unknown pharmacy reference: {0}")]
    UnknownPharmacy(String),
}

impl AdapterError {
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Core(e) => e.is_client_error(),
            Self::Storage(e) => e.is_client_error(),
            Self::UnknownProvider(_) | Self::UnknownPharmacy(_) => true,
        }
    }
}

/// Convenience result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
