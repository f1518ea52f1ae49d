//! End-to-end adapter tests against the in-memory collaborators.

use fhirbridge_core::{
    AppointmentRecord, EhrRecord, FhirDateTime, PatientRecord, RegistrationStatus, RequestContext,
    UserSession,
};
use fhirbridge_mapper::{AdapterError, AppointmentAdapter, PatientAdapter};
use fhirbridge_model::Resource;
use fhirbridge_storage::{
    InMemoryDirectory, InMemoryRepository, PharmacyEntry, ProviderEntry, RecordRepository,
};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

fn ctx() -> RequestContext {
    RequestContext::new(
        "portal.example.org",
        "https://portal.example.org/fhir",
        FhirDateTime::from_str("2023-05-15T14:30:00Z").unwrap(),
    )
}

fn directory() -> Arc<InMemoryDirectory> {
    Arc::new(
        InMemoryDirectory::new()
            .with_provider(
                "p-77",
                ProviderEntry {
                    emr_id: "77".into(),
                    connection_key: "emr-east".into(),
                },
            )
            .with_pharmacy("ph-9", PharmacyEntry { emr_id: "9".into() }),
    )
}

fn patient_adapter(repo: Arc<InMemoryRepository>) -> PatientAdapter {
    let directory = directory();
    PatientAdapter::new(repo, directory.clone(), directory)
}

fn registration_body() -> String {
    json!({
        "resourceType": "Patient",
        "birthDate": "1985-03-02",
        "gender": "female",
        "name": [{"use": "usual", "given": ["Ada"], "family": ["Lovelace"]}],
        "telecom": [{"system": "phone", "value": "555-0100", "use": "primary"}],
        "extension": [{
            "url": "https://portal.example.org/fhir/extension/gponline-patient-data",
            "extension": [
                {"url": "#providerId", "valueString": "p-77"},
                {"url": "#pharmacyId", "valueString": "ph-9"}
            ]
        }]
    })
    .to_string()
}

fn appointment_record(id: &str, patient_id: &str) -> AppointmentRecord {
    AppointmentRecord {
        id: id.into(),
        start: FhirDateTime::from_str("2023-05-15T14:00:00Z").unwrap(),
        end: FhirDateTime::from_str("2023-05-15T14:30:00Z").unwrap(),
        duration_minutes: 30,
        description: "Follow-up".into(),
        status: "booked".into(),
        provider_id: "77".into(),
        patient_id: patient_id.into(),
        location: None,
        multiple: 0,
    }
}

#[tokio::test]
async fn store_master_without_linkage_registers_as_pending() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = patient_adapter(repo.clone());
    let mut session = UserSession::default();

    let resource = adapter
        .store_master(&registration_body(), &ctx(), &mut session)
        .await
        .unwrap();

    let Resource::Patient(patient) = resource else {
        panic!("expected a Patient resource");
    };
    // session now carries the fresh linkage
    assert_eq!(session.connection.as_deref(), Some("emr-east"));
    let pid = session.ehr_pid.clone().unwrap();
    assert_eq!(session.status, Some(RegistrationStatus::Pending));

    // references resolved to canonical EMR ids, group id set to own pid
    let stored = repo.find("emr-east", &pid).await.unwrap().unwrap();
    let stored = stored.as_patient().unwrap();
    assert_eq!(stored.provider_id, "77");
    assert_eq!(stored.pharmacy_id, "9");
    assert_eq!(stored.group_id, pid);
    assert_eq!(stored.status, Some(RegistrationStatus::Pending));
    assert_eq!(patient.id.as_deref(), Some(pid.as_str()));
}

#[tokio::test]
async fn store_master_with_matching_linkage_updates_in_place() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = patient_adapter(repo.clone());

    // first call registers
    let mut session = UserSession::default();
    adapter
        .store_master(&registration_body(), &ctx(), &mut session)
        .await
        .unwrap();
    let pid = session.ehr_pid.clone().unwrap();
    let count_after_register = repo.len().await;

    // second call with the linked session must update, not create, and a
    // payload without a status child must not reset the stored PENDING
    adapter
        .store_master(&registration_body(), &ctx(), &mut session)
        .await
        .unwrap();
    assert_eq!(repo.len().await, count_after_register);
    assert_eq!(session.ehr_pid.as_deref(), Some(pid.as_str()));

    let stored = repo.find("emr-east", &pid).await.unwrap().unwrap();
    assert_eq!(
        stored.as_patient().unwrap().status,
        Some(RegistrationStatus::Pending)
    );
    assert_eq!(session.status, Some(RegistrationStatus::Pending));
}

#[tokio::test]
async fn store_master_update_applies_explicit_status() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = patient_adapter(repo.clone());

    let mut session = UserSession::default();
    adapter
        .store_master(&registration_body(), &ctx(), &mut session)
        .await
        .unwrap();
    let pid = session.ehr_pid.clone().unwrap();

    let body = json!({
        "resourceType": "Patient",
        "extension": [{
            "url": "https://portal.example.org/fhir/extension/gponline-patient-data",
            "extension": [
                {"url": "#providerId", "valueString": "p-77"},
                {"url": "#pharmacyId", "valueString": "ph-9"},
                {"url": "#status", "valueString": "ACTIVE"}
            ]
        }]
    })
    .to_string();
    adapter.store_master(&body, &ctx(), &mut session).await.unwrap();

    let stored = repo.find("emr-east", &pid).await.unwrap().unwrap();
    assert_eq!(
        stored.as_patient().unwrap().status,
        Some(RegistrationStatus::Active)
    );
    assert_eq!(session.status, Some(RegistrationStatus::Active));
}

#[tokio::test]
async fn store_master_unknown_provider_is_client_error() {
    let repo = Arc::new(InMemoryRepository::new());
    let directory = Arc::new(
        InMemoryDirectory::new().with_pharmacy("ph-9", PharmacyEntry { emr_id: "9".into() }),
    );
    let adapter = PatientAdapter::new(repo, directory.clone(), directory);

    let err = adapter
        .store_master(&registration_body(), &ctx(), &mut UserSession::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::UnknownProvider(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn patient_update_without_id_leaves_repository_untouched() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = patient_adapter(repo.clone());

    let body = json!({"resourceType": "Patient", "gender": "female"});
    let err = adapter
        .update("emr-east", &body, &ctx())
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn patient_store_rejects_wrong_resource_type() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = patient_adapter(repo.clone());
    let session = UserSession {
        connection: Some("emr-east".into()),
        ehr_pid: Some("1".into()),
        status: Some(RegistrationStatus::Active),
    };

    let body = json!({"resourceType": "Appointment", "status": "booked"}).to_string();
    let err = adapter.store(&body, &ctx(), &session).await.unwrap_err();
    assert!(err.is_client_error());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn retrieve_missing_patient_is_not_found() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = patient_adapter(repo);
    let err = adapter
        .retrieve("emr-east", "404", &ctx())
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("Patient/404"));
}

#[tokio::test]
async fn appointment_store_and_retrieve_round_trip() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = AppointmentAdapter::new(repo.clone());

    let body = json!({
        "resourceType": "Appointment",
        "status": "booked",
        "description": "Video follow-up",
        "start": "2023-05-15T14:00:00Z",
        "end": "2023-05-15T14:45:00Z",
        "extension": [{
            "url": "https://portal.example.org/fhir/extension/vidyo-portal-data",
            "extension": [
                {"url": "#portal-uri", "valueString": "https://vidyo.example.org/join"},
                {"url": "#room-key", "valueString": "room-1"},
                {"url": "#pin", "valueString": "9876"},
                {"url": "#provider-id", "valueString": "77"},
                {"url": "#patient-id", "valueString": "42"}
            ]
        }]
    })
    .to_string();

    let stored = adapter.store("emr-east", &body, &ctx()).await.unwrap();
    let Resource::Appointment(stored) = stored else {
        panic!("expected an Appointment resource");
    };
    let id = stored.id.unwrap();

    let retrieved = adapter.retrieve("emr-east", &id, &ctx()).await.unwrap();
    let Resource::Appointment(retrieved) = retrieved else {
        panic!("expected an Appointment resource");
    };
    assert_eq!(retrieved.description.as_deref(), Some("Video follow-up"));
    assert_eq!(retrieved.extension[0].extension.len(), 5);

    // stored record carries the computed duration
    let record = repo.find("emr-east", &id).await.unwrap().unwrap();
    assert_eq!(record.as_appointment().unwrap().duration_minutes, 45);
}

#[tokio::test]
async fn appointment_collection_defaults_to_session_patient() {
    let repo = Arc::new(InMemoryRepository::new());
    repo.seed("emr-east", EhrRecord::Appointment(appointment_record("1", "42")))
        .await;
    repo.seed("emr-east", EhrRecord::Appointment(appointment_record("2", "43")))
        .await;
    let adapter = AppointmentAdapter::new(repo);

    let session = UserSession {
        connection: Some("emr-east".into()),
        ehr_pid: Some("42".into()),
        status: Some(RegistrationStatus::Active),
    };
    let bundle = adapter
        .collection_to_output("emr-east", &HashMap::new(), &session, &ctx())
        .await
        .unwrap();
    assert_eq!(bundle.total, 1);
    assert_eq!(bundle.entry[0].response.location, "Appointment/1/_history/1");
}

#[tokio::test]
async fn appointment_collection_without_linkage_is_error() {
    let repo = Arc::new(InMemoryRepository::new());
    let adapter = AppointmentAdapter::new(repo);
    let err = adapter
        .collection_to_output("emr-east", &HashMap::new(), &UserSession::default(), &ctx())
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn patient_show_group_skips_other_variants() {
    let repo = Arc::new(InMemoryRepository::new());
    repo.seed(
        "emr-east",
        EhrRecord::Patient(PatientRecord {
            id: "1".into(),
            group_id: "g1".into(),
            ..Default::default()
        }),
    )
    .await;
    repo.seed(
        "emr-east",
        EhrRecord::Patient(PatientRecord {
            id: "2".into(),
            group_id: "g2".into(),
            ..Default::default()
        }),
    )
    .await;
    let adapter = patient_adapter(repo);

    let bundle = adapter.show_group("emr-east", "g1", &ctx()).await.unwrap();
    assert_eq!(bundle.total, 1);
    assert_eq!(bundle.entry[0].response.location, "Patient/1/_history");
    assert_eq!(bundle.bundle_type, "searchset");
}

#[tokio::test]
async fn appointment_show_group_spans_group_members() {
    let repo = Arc::new(InMemoryRepository::new());
    for (id, group_id) in [("42", "42"), ("43", "42"), ("50", "50")] {
        repo.seed(
            "emr-east",
            EhrRecord::Patient(PatientRecord {
                id: id.into(),
                group_id: group_id.into(),
                ..Default::default()
            }),
        )
        .await;
    }
    repo.seed("emr-east", EhrRecord::Appointment(appointment_record("1", "42")))
        .await;
    repo.seed("emr-east", EhrRecord::Appointment(appointment_record("2", "43")))
        .await;
    repo.seed("emr-east", EhrRecord::Appointment(appointment_record("3", "50")))
        .await;
    let adapter = AppointmentAdapter::new(repo);

    // both group members' appointments, the patient records skipped
    let bundle = adapter.show_group("emr-east", "42", &ctx()).await.unwrap();
    assert_eq!(bundle.total, 2);
    assert_eq!(bundle.entry[0].response.location, "Appointment/1/_history/1");
    assert_eq!(bundle.entry[1].response.location, "Appointment/2/_history/1");
}

#[tokio::test]
async fn remove_deletes_record() {
    let repo = Arc::new(InMemoryRepository::new());
    repo.seed("emr-east", EhrRecord::Appointment(appointment_record("1", "42")))
        .await;
    let adapter = AppointmentAdapter::new(repo.clone());

    adapter.remove("emr-east", "1").await.unwrap();
    assert!(repo.is_empty().await);
    assert!(adapter.remove("emr-east", "1").await.is_err());
}
