//! Collaborator traits the mapping layer calls into.
//!
//! Records live in per-practice EHR databases addressed by a connection
//! key, so every repository call names its connection explicitly (the
//! original kept this as mutable repository state). Implementations must
//! be thread-safe (`Send + Sync`).

use async_trait::async_trait;
use fhirbridge_core::EhrRecord;
use std::collections::HashMap;

use crate::error::StorageError;

/// CRUD plus parameterized listing over EHR records.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Reads a record by id. Returns `None` when absent; errors are
    /// reserved for infrastructure failures.
    async fn find(&self, connection: &str, id: &str) -> Result<Option<EhrRecord>, StorageError>;

    /// Creates a record, assigning an id when the record carries none.
    /// Returns the stored record including the assigned id.
    async fn create(&self, connection: &str, record: EhrRecord) -> Result<EhrRecord, StorageError>;

    /// Replaces an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when no record exists under `id`.
    async fn update(
        &self,
        connection: &str,
        id: &str,
        record: EhrRecord,
    ) -> Result<EhrRecord, StorageError>;

    /// Deletes a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when no record exists under `id`.
    async fn delete(&self, connection: &str, id: &str) -> Result<(), StorageError>;

    /// Lists records matching all of the given query parameters.
    async fn list_by_param(
        &self,
        connection: &str,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<EhrRecord>, StorageError>;
}

/// A provider as resolved from the master directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    /// Canonical provider id inside the EHR database.
    pub emr_id: String,
    /// Connection key of the EHR database the provider practices in.
    pub connection_key: String,
}

/// A pharmacy as resolved from the master directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PharmacyEntry {
    /// Canonical pharmacy id inside the EHR database.
    pub emr_id: String,
}

/// Resolves portal-side provider references to canonical EMR identity.
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn resolve(&self, portal_id: &str) -> Result<Option<ProviderEntry>, StorageError>;
}

/// Resolves portal-side pharmacy references to canonical EMR identity.
#[async_trait]
pub trait PharmacyDirectory: Send + Sync {
    async fn resolve(&self, portal_id: &str) -> Result<Option<PharmacyEntry>, StorageError>;
}
