//! In-memory collaborators, used by the test suites and local tooling.

use async_trait::async_trait;
use fhirbridge_core::EhrRecord;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::traits::{
    PharmacyDirectory, PharmacyEntry, ProviderDirectory, ProviderEntry, RecordRepository,
};

type StorageKey = String; // Format: "connection/id"

fn make_storage_key(connection: &str, id: &str) -> StorageKey {
    format!("{connection}/{id}")
}

fn record_type(record: &EhrRecord) -> &'static str {
    match record {
        EhrRecord::Appointment(_) => "Appointment",
        EhrRecord::Patient(_) => "Patient",
    }
}

fn set_record_id(record: &mut EhrRecord, id: &str) {
    match record {
        EhrRecord::Appointment(r) => r.id = id.to_string(),
        EhrRecord::Patient(r) => r.id = id.to_string(),
    }
}

/// True when the record matches every filter; an unsupported filter key
/// matches nothing rather than everything.
///
/// `group_pids` is the pre-resolved membership of a `groupId` filter: the
/// ids of the patients in that group on the queried connection. Patients
/// match a group by their own `group_id`, appointments through the patient
/// they belong to.
fn matches_filters(
    record: &EhrRecord,
    filters: &HashMap<String, String>,
    group_pids: Option<&HashSet<String>>,
) -> bool {
    filters.iter().all(|(key, value)| match record {
        EhrRecord::Appointment(r) => match key.as_str() {
            "patient" => &r.patient_id == value,
            "provider" => &r.provider_id == value,
            "status" => &r.status == value,
            "groupId" => group_pids.is_some_and(|pids| pids.contains(&r.patient_id)),
            _ => false,
        },
        EhrRecord::Patient(r) => match key.as_str() {
            "groupId" => &r.group_id == value,
            "patient" => &r.id == value,
            _ => false,
        },
    })
}

/// In-memory record repository keyed by `connection/id`.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    data: RwLock<HashMap<StorageKey, EhrRecord>>,
    next_id: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seed a record under a known id, for test setup.
    pub async fn seed(&self, connection: &str, record: EhrRecord) {
        let key = make_storage_key(connection, record.id());
        self.data.write().await.insert(key, record);
    }

    /// Number of stored records across all connections.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn find(&self, connection: &str, id: &str) -> Result<Option<EhrRecord>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(&make_storage_key(connection, id)).cloned())
    }

    async fn create(
        &self,
        connection: &str,
        mut record: EhrRecord,
    ) -> Result<EhrRecord, StorageError> {
        if record.id().is_empty() {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            set_record_id(&mut record, &id);
        }
        let key = make_storage_key(connection, record.id());
        let mut data = self.data.write().await;
        if data.contains_key(&key) {
            return Err(StorageError::already_exists(record_type(&record), record.id()));
        }
        tracing::debug!(connection, id = record.id(), "creating record");
        data.insert(key, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        connection: &str,
        id: &str,
        mut record: EhrRecord,
    ) -> Result<EhrRecord, StorageError> {
        let key = make_storage_key(connection, id);
        let mut data = self.data.write().await;
        if !data.contains_key(&key) {
            return Err(StorageError::not_found(record_type(&record), id));
        }
        set_record_id(&mut record, id);
        data.insert(key, record.clone());
        Ok(record)
    }

    async fn delete(&self, connection: &str, id: &str) -> Result<(), StorageError> {
        let key = make_storage_key(connection, id);
        let mut data = self.data.write().await;
        match data.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found("Record", id)),
        }
    }

    async fn list_by_param(
        &self,
        connection: &str,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<EhrRecord>, StorageError> {
        let prefix = format!("{connection}/");
        let data = self.data.read().await;
        let group_pids: Option<HashSet<String>> = filters.get("groupId").map(|group_id| {
            data.iter()
                .filter(|(key, _)| key.starts_with(&prefix))
                .filter_map(|(_, record)| record.as_patient())
                .filter(|patient| &patient.group_id == group_id)
                .map(|patient| patient.id.clone())
                .collect()
        });
        let mut records: Vec<EhrRecord> = data
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, record)| record.clone())
            .filter(|record| matches_filters(record, filters, group_pids.as_ref()))
            .collect();
        records.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(records)
    }
}

/// In-memory provider/pharmacy master directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    providers: HashMap<String, ProviderEntry>,
    pharmacies: HashMap<String, PharmacyEntry>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, portal_id: impl Into<String>, entry: ProviderEntry) -> Self {
        self.providers.insert(portal_id.into(), entry);
        self
    }

    pub fn with_pharmacy(mut self, portal_id: impl Into<String>, entry: PharmacyEntry) -> Self {
        self.pharmacies.insert(portal_id.into(), entry);
        self
    }
}

#[async_trait]
impl ProviderDirectory for InMemoryDirectory {
    async fn resolve(&self, portal_id: &str) -> Result<Option<ProviderEntry>, StorageError> {
        Ok(self.providers.get(portal_id).cloned())
    }
}

#[async_trait]
impl PharmacyDirectory for InMemoryDirectory {
    async fn resolve(&self, portal_id: &str) -> Result<Option<PharmacyEntry>, StorageError> {
        Ok(self.pharmacies.get(portal_id).cloned())
    }
}
