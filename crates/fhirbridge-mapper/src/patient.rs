//! Patient mapping, adapter operations and the master-store account
//! linking path.

use crate::bundle::{BundleEntryMapper, build_bundle};
use crate::error::{AdapterError, Result};
use crate::extensions::{self, block_name, fragment};
use crate::linkage::{Linkage, resolve_linkage};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use fhirbridge_core::{
    CoreError, EhrRecord, PatientRecord, PhotoAttachment, RegistrationStatus, RequestContext,
    SmsPreference, UserSession, generate_id,
};
use fhirbridge_model::{
    Attachment, Bundle, ContactPoint, HumanName, Identifier, Patient, Resource, parse,
};
use fhirbridge_storage::{PharmacyDirectory, ProviderDirectory, RecordRepository};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Field-by-field translation between [`PatientRecord`] and the FHIR
/// Patient resource.
pub struct PatientMapper;

impl PatientMapper {
    pub fn to_fhir(record: &PatientRecord, ctx: &RequestContext) -> Patient {
        let mut children = vec![extensions::string_child(fragment::GROUP_ID, &record.group_id)];
        if let Some(status) = record.status {
            children.push(extensions::string_child(fragment::STATUS, status.as_str()));
        }
        children.push(extensions::string_child(
            fragment::PATIENT_PROVIDER_ID,
            &record.provider_id,
        ));
        children.push(extensions::string_child(
            fragment::PHARMACY_ID,
            &record.pharmacy_id,
        ));
        if let Some(token) = &record.payment_token {
            children.push(extensions::string_child(fragment::STRIPE_TOKEN, token));
        }

        let photo = record
            .photo
            .iter()
            .map(|photo| Attachment {
                content_type: Some(photo.mimetype.clone()),
                data: None,
                url: photo.public_url.clone(),
            })
            .collect();

        Patient {
            id: Some(record.id.clone()),
            identifier: vec![Identifier::usual(&record.id)],
            name: vec![HumanName {
                use_: Some("usual".into()),
                family: vec![record.last_name.clone()],
                given: vec![record.first_name.clone()],
            }],
            gender: Some(record.gender.clone()),
            birth_date: Some(record.dob.clone()),
            telecom: vec![
                ContactPoint::primary("phone", &record.primary_phone),
                ContactPoint::primary("email", &record.email),
            ],
            photo,
            extension: vec![extensions::block(
                ctx.extension_url(block_name::GPONLINE_PATIENT_DATA),
                children,
            )],
        }
    }

    /// Map a FHIR Patient back to an internal record.
    ///
    /// Only the first name entry and its first given/family parts are read,
    /// and the first telecom entry wins as primary phone whatever its
    /// system says. Unrecognized extension fragments are ignored.
    pub fn from_fhir(patient: &Patient) -> std::result::Result<PatientRecord, CoreError> {
        let mut record = PatientRecord {
            id: patient.id.clone().unwrap_or_default(),
            dob: patient.birth_date.clone().unwrap_or_default(),
            gender: patient.gender.clone().unwrap_or_default(),
            ..Default::default()
        };

        if let Some(name) = patient.name.first() {
            record.first_name = name.given.first().cloned().unwrap_or_default();
            record.last_name = name.family.first().cloned().unwrap_or_default();
        }

        if let Some(telecom) = patient.telecom.first() {
            record.primary_phone = telecom.value.clone().unwrap_or_default();
        }

        if let Some(block) = extensions::find_block(&patient.extension, block_name::CONTRACTS) {
            for (url, child) in extensions::fields(block) {
                match url {
                    fragment::ALLOW_SMS => {
                        record.allow_sms =
                            SmsPreference::from_bool(child.value_boolean.unwrap_or(false));
                    }
                    fragment::TERMS_OF_SERVICE => {}
                    _ => {}
                }
            }
        }

        if let Some(block) =
            extensions::find_block(&patient.extension, block_name::GPONLINE_PATIENT_DATA)
        {
            for (url, child) in extensions::fields(block) {
                let value = child.value_string.clone().unwrap_or_default();
                match url {
                    fragment::PATIENT_PROVIDER_ID => record.provider_id = value,
                    fragment::PHARMACY_ID => record.pharmacy_id = value,
                    fragment::GROUP_ID => record.group_id = value,
                    fragment::STATUS => {
                        record.status = Some(RegistrationStatus::from_str(&value)?);
                    }
                    fragment::STRIPE_TOKEN => record.payment_token = Some(value),
                    _ => {}
                }
            }
        }

        if let Some(photo) = patient.photo.first() {
            record.photo = Some(Self::photo_from_attachment(photo)?);
        }

        Ok(record)
    }

    fn photo_from_attachment(
        photo: &Attachment,
    ) -> std::result::Result<PhotoAttachment, CoreError> {
        let mimetype = photo.content_type.clone().unwrap_or_default();
        let extension = PhotoAttachment::extension_for(&mimetype);
        if let Some(data) = &photo.data {
            BASE64.decode(data).map_err(|e| {
                CoreError::invalid_record(format!("photo data is not valid base64: {e}"))
            })?;
        }
        Ok(PhotoAttachment {
            mimetype,
            base64_data: photo.data.clone(),
            filename: format!("{}.{extension}", generate_id()),
            public_url: None,
        })
    }
}

impl BundleEntryMapper for PatientMapper {
    fn entry_for(record: &EhrRecord, ctx: &RequestContext) -> Option<(Resource, String)> {
        let patient = record.as_patient()?;
        let location = format!("Patient/{}/_history", patient.id);
        Some((Resource::Patient(Self::to_fhir(patient, ctx)), location))
    }
}

/// Patient operations as called by the HTTP controller layer.
pub struct PatientAdapter {
    repository: Arc<dyn RecordRepository>,
    providers: Arc<dyn ProviderDirectory>,
    pharmacies: Arc<dyn PharmacyDirectory>,
}

impl PatientAdapter {
    pub fn new(
        repository: Arc<dyn RecordRepository>,
        providers: Arc<dyn ProviderDirectory>,
        pharmacies: Arc<dyn PharmacyDirectory>,
    ) -> Self {
        Self {
            repository,
            providers,
            pharmacies,
        }
    }

    /// Fetch one patient as a FHIR resource. Absent or wrong-variant
    /// records are reported as not found.
    pub async fn retrieve(
        &self,
        connection: &str,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<Resource> {
        tracing::debug!(connection, id, "retrieving patient");
        let record = self
            .repository
            .find(connection, id)
            .await?
            .ok_or_else(|| CoreError::record_not_found("Patient", id))?;
        let patient = record
            .as_patient()
            .ok_or_else(|| CoreError::record_not_found("Patient", id))?;
        Ok(Resource::Patient(PatientMapper::to_fhir(patient, ctx)))
    }

    /// Store a dependent patient against the session's already-resolved
    /// connection.
    pub async fn store(
        &self,
        body: &str,
        ctx: &RequestContext,
        session: &UserSession,
    ) -> Result<Resource> {
        let patient = parse(body)?.expect_patient()?;
        let record = PatientMapper::from_fhir(&patient)?;
        let stored = self.store_interface(record, session).await?;
        Ok(Resource::Patient(PatientMapper::to_fhir(&stored, ctx)))
    }

    /// Persist a record over the session's connection, forcing status to
    /// Active. Updates when the record already carries an id, creates
    /// otherwise.
    pub async fn store_interface(
        &self,
        mut record: PatientRecord,
        session: &UserSession,
    ) -> Result<PatientRecord> {
        let connection = session
            .connection
            .as_deref()
            .ok_or(CoreError::NoSessionLinkage)?;
        if session.ehr_pid.is_none() {
            return Err(CoreError::NoSessionLinkage.into());
        }

        record.status = Some(RegistrationStatus::Active);
        let stored = if record.id.is_empty() {
            self.repository
                .create(connection, EhrRecord::Patient(record))
                .await?
        } else {
            let id = record.id.clone();
            self.repository
                .update(connection, &id, EhrRecord::Patient(record))
                .await?
        };
        patient_of(stored)
    }

    /// Register or update the session owner's own record in the master EHR.
    pub async fn store_master(
        &self,
        body: &str,
        ctx: &RequestContext,
        session: &mut UserSession,
    ) -> Result<Resource> {
        let patient = parse(body)?.expect_patient()?;
        let record = PatientMapper::from_fhir(&patient)?;
        let stored = self.store_master_interface(record, session).await?;
        Ok(Resource::Patient(PatientMapper::to_fhir(&stored, ctx)))
    }

    /// The account-linking store path.
    ///
    /// Resolves the pharmacy and provider references to canonical EMR ids,
    /// picks the connection from the resolved provider, then either updates
    /// the record the session is already linked to or creates a fresh
    /// registration (status Pending). An update whose payload carries no
    /// status keeps the stored one, so the registration lifecycle never runs
    /// backwards on a profile edit. The assigned pid becomes the record's
    /// group id, and connection/pid/status are written back to the session
    /// for the caller to persist.
    pub async fn store_master_interface(
        &self,
        mut record: PatientRecord,
        session: &mut UserSession,
    ) -> Result<PatientRecord> {
        let pharmacy = self
            .pharmacies
            .resolve(&record.pharmacy_id)
            .await?
            .ok_or_else(|| AdapterError::UnknownPharmacy(record.pharmacy_id.clone()))?;
        record.pharmacy_id = pharmacy.emr_id;

        let provider = self
            .providers
            .resolve(&record.provider_id)
            .await?
            .ok_or_else(|| AdapterError::UnknownProvider(record.provider_id.clone()))?;
        record.provider_id = provider.emr_id;
        let connection = provider.connection_key;

        let stored = match resolve_linkage(session, &connection) {
            Linkage::Linked { pid } => {
                tracing::debug!(connection = %connection, pid = %pid, "updating linked patient record");
                if record.status.is_none() {
                    record.status = self.stored_status(&connection, &pid).await?;
                }
                record.id = pid.clone();
                self.repository
                    .update(&connection, &pid, EhrRecord::Patient(record))
                    .await?
            }
            Linkage::Unlinked => {
                tracing::debug!(connection = %connection, "registering new patient record");
                record.id = String::new();
                record.status = Some(RegistrationStatus::Pending);
                self.repository
                    .create(&connection, EhrRecord::Patient(record))
                    .await?
            }
        };

        let mut patient = patient_of(stored)?;
        let pid = patient.id.clone();
        patient.group_id = pid.clone();
        let stored = self
            .repository
            .update(&connection, &pid, EhrRecord::Patient(patient))
            .await?;
        let patient = patient_of(stored)?;

        session.connection = Some(connection);
        session.ehr_pid = Some(pid);
        session.status = patient.status;

        Ok(patient)
    }

    /// Update an existing patient. A payload without an `id` is rejected
    /// before the repository is touched; one without a status keeps the
    /// stored status.
    pub async fn update(
        &self,
        connection: &str,
        body: &Value,
        ctx: &RequestContext,
    ) -> Result<Resource> {
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CoreError::missing_field("id"))?;
        let patient: Patient = serde_json::from_value(body.clone()).map_err(CoreError::from)?;
        let mut record = PatientMapper::from_fhir(&patient)?;
        if record.status.is_none() {
            record.status = self.stored_status(connection, &id).await?;
        }
        let stored = self
            .repository
            .update(connection, &id, EhrRecord::Patient(record))
            .await?;
        let patient = patient_of(stored)?;
        Ok(Resource::Patient(PatientMapper::to_fhir(&patient, ctx)))
    }

    /// Registration status currently on a stored record, if any.
    async fn stored_status(
        &self,
        connection: &str,
        id: &str,
    ) -> Result<Option<RegistrationStatus>> {
        Ok(self
            .repository
            .find(connection, id)
            .await?
            .as_ref()
            .and_then(|record| record.as_patient())
            .and_then(|patient| patient.status))
    }

    /// Delete a patient by id.
    pub async fn remove(&self, connection: &str, id: &str) -> Result<()> {
        tracing::debug!(connection, id, "removing patient");
        self.repository.delete(connection, id).await?;
        Ok(())
    }

    /// Bundle of all patients in a group.
    pub async fn show_group(
        &self,
        connection: &str,
        group_id: &str,
        ctx: &RequestContext,
    ) -> Result<Bundle> {
        let mut filters = HashMap::new();
        filters.insert("groupId".to_string(), group_id.to_string());
        let records = self.repository.list_by_param(connection, &filters).await?;
        Ok(build_bundle::<PatientMapper>(&records, ctx))
    }

    /// Bundle of patients matching the request query; an empty query lists
    /// everything on the connection.
    pub async fn collection_to_output(
        &self,
        connection: &str,
        query: &HashMap<String, String>,
        ctx: &RequestContext,
    ) -> Result<Bundle> {
        let records = self.repository.list_by_param(connection, query).await?;
        Ok(build_bundle::<PatientMapper>(&records, ctx))
    }
}

fn patient_of(stored: EhrRecord) -> Result<PatientRecord> {
    match stored {
        EhrRecord::Patient(patient) => Ok(patient),
        EhrRecord::Appointment(_) => {
            Err(CoreError::invalid_record("repository returned wrong record variant").into())
        }
    }
}
