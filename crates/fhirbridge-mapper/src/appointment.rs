//! Appointment mapping and adapter operations.

use crate::bundle::{BundleEntryMapper, build_bundle};
use crate::error::Result;
use crate::extensions::{self, block_name, fragment};
use fhirbridge_core::{
    AppointmentRecord, CoreError, EhrRecord, RequestContext, TelehealthLocation, UserSession,
    duration_minutes,
};
use fhirbridge_model::{Appointment, Bundle, Resource, parse};
use fhirbridge_storage::RecordRepository;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Field-by-field translation between [`AppointmentRecord`] and the FHIR
/// Appointment resource.
pub struct AppointmentMapper;

impl AppointmentMapper {
    /// Map an internal record to its FHIR representation.
    ///
    /// The telehealth children are only emitted when the record carries a
    /// location payload; provider-id and patient-id are always emitted.
    pub fn to_fhir(record: &AppointmentRecord, ctx: &RequestContext) -> Appointment {
        let mut children = Vec::new();
        if let Some(location) = &record.location {
            children.push(extensions::string_child(
                fragment::PORTAL_URI,
                &location.portal_uri,
            ));
            children.push(extensions::string_child(
                fragment::ROOM_KEY,
                &location.room_key,
            ));
            children.push(extensions::string_child(fragment::PIN, &location.pin));
        }
        children.push(extensions::string_child(
            fragment::PROVIDER_ID,
            &record.provider_id,
        ));
        children.push(extensions::string_child(
            fragment::PATIENT_ID,
            &record.patient_id,
        ));

        Appointment {
            id: Some(record.id.clone()),
            status: Some(record.status.clone()),
            description: Some(record.description.clone()),
            start: Some(record.start),
            end: Some(record.end),
            extension: vec![extensions::block(
                ctx.extension_url(block_name::VIDYO_PORTAL_DATA),
                children,
            )],
        }
    }

    /// Map a FHIR Appointment back to an internal record.
    ///
    /// Duration is computed from the parsed instants, so both start and end
    /// are required. Unrecognized extension fragments are ignored.
    pub fn from_fhir(appointment: &Appointment) -> std::result::Result<AppointmentRecord, CoreError> {
        let start = appointment
            .start
            .ok_or_else(|| CoreError::missing_field("start"))?;
        let end = appointment
            .end
            .ok_or_else(|| CoreError::missing_field("end"))?;

        let mut record = AppointmentRecord {
            id: appointment.id.clone().unwrap_or_default(),
            start,
            end,
            duration_minutes: duration_minutes(&start, &end),
            description: appointment.description.clone().unwrap_or_default(),
            status: appointment.status.clone().unwrap_or_default(),
            provider_id: String::new(),
            patient_id: String::new(),
            location: None,
            multiple: 0,
        };

        if let Some(block) = extensions::find_block(&appointment.extension, block_name::VIDYO_PORTAL_DATA)
        {
            let mut portal_uri = None;
            let mut room_key = None;
            let mut pin = None;
            for (url, child) in extensions::fields(block) {
                match url {
                    fragment::PORTAL_URI => portal_uri = child.value_string.clone(),
                    fragment::ROOM_KEY => room_key = child.value_string.clone(),
                    fragment::PIN => pin = child.value_string.clone(),
                    fragment::PROVIDER_ID => {
                        record.provider_id = child.value_string.clone().unwrap_or_default();
                    }
                    fragment::PATIENT_ID => {
                        record.patient_id = child.value_string.clone().unwrap_or_default();
                    }
                    _ => {}
                }
            }
            if portal_uri.is_some() || room_key.is_some() || pin.is_some() {
                record.location = Some(TelehealthLocation {
                    portal_uri: portal_uri.unwrap_or_default(),
                    room_key: room_key.unwrap_or_default(),
                    pin: pin.unwrap_or_default(),
                });
            }
        }

        Ok(record)
    }
}

impl BundleEntryMapper for AppointmentMapper {
    fn entry_for(record: &EhrRecord, ctx: &RequestContext) -> Option<(Resource, String)> {
        let appointment = record.as_appointment()?;
        let location = format!("Appointment/{}/_history/1", appointment.id);
        Some((
            Resource::Appointment(Self::to_fhir(appointment, ctx)),
            location,
        ))
    }
}

/// Appointment operations as called by the HTTP controller layer.
pub struct AppointmentAdapter {
    repository: Arc<dyn RecordRepository>,
}

impl AppointmentAdapter {
    pub fn new(repository: Arc<dyn RecordRepository>) -> Self {
        Self { repository }
    }

    /// Fetch one appointment as a FHIR resource. Absent or wrong-variant
    /// records are reported as not found.
    pub async fn retrieve(
        &self,
        connection: &str,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<Resource> {
        tracing::debug!(connection, id, "retrieving appointment");
        let record = self
            .repository
            .find(connection, id)
            .await?
            .ok_or_else(|| CoreError::record_not_found("Appointment", id))?;
        let appointment = record
            .as_appointment()
            .ok_or_else(|| CoreError::record_not_found("Appointment", id))?;
        Ok(Resource::Appointment(AppointmentMapper::to_fhir(
            appointment,
            ctx,
        )))
    }

    /// Store a new appointment from an inbound FHIR payload.
    pub async fn store(
        &self,
        connection: &str,
        body: &str,
        ctx: &RequestContext,
    ) -> Result<Resource> {
        let appointment = parse(body)?.expect_appointment()?;
        let record = AppointmentMapper::from_fhir(&appointment)?;
        let stored = self
            .repository
            .create(connection, EhrRecord::Appointment(record))
            .await?;
        self.stored_to_resource(stored, ctx)
    }

    /// Update an existing appointment. A payload without an `id` is
    /// rejected before the repository is touched.
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
        let appointment: Appointment =
            serde_json::from_value(body.clone()).map_err(CoreError::from)?;
        let record = AppointmentMapper::from_fhir(&appointment)?;
        let stored = self
            .repository
            .update(connection, &id, EhrRecord::Appointment(record))
            .await?;
        self.stored_to_resource(stored, ctx)
    }

    /// Delete an appointment by id.
    pub async fn remove(&self, connection: &str, id: &str) -> Result<()> {
        tracing::debug!(connection, id, "removing appointment");
        self.repository.delete(connection, id).await?;
        Ok(())
    }

    /// Bundle of all appointments in a group.
    pub async fn show_group(
        &self,
        connection: &str,
        group_id: &str,
        ctx: &RequestContext,
    ) -> Result<Bundle> {
        let mut filters = HashMap::new();
        filters.insert("groupId".to_string(), group_id.to_string());
        let records = self.repository.list_by_param(connection, &filters).await?;
        Ok(build_bundle::<AppointmentMapper>(&records, ctx))
    }

    /// Bundle of appointments matching the request query. When the query
    /// does not name a patient, the session's linked patient is used;
    /// listing everyone's appointments is never the default.
    pub async fn collection_to_output(
        &self,
        connection: &str,
        query: &HashMap<String, String>,
        session: &UserSession,
        ctx: &RequestContext,
    ) -> Result<Bundle> {
        let mut filters = query.clone();
        if !filters.contains_key("patient") {
            let pid = session
                .ehr_pid
                .as_deref()
                .ok_or(CoreError::NoSessionLinkage)?;
            filters.insert("patient".to_string(), pid.to_string());
        }
        let records = self.repository.list_by_param(connection, &filters).await?;
        Ok(build_bundle::<AppointmentMapper>(&records, ctx))
    }

    fn stored_to_resource(&self, stored: EhrRecord, ctx: &RequestContext) -> Result<Resource> {
        let appointment = stored
            .as_appointment()
            .ok_or_else(|| CoreError::invalid_record("repository returned wrong record variant"))?;
        Ok(Resource::Appointment(AppointmentMapper::to_fhir(
            appointment,
            ctx,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirbridge_core::FhirDateTime;
    use serde_json::json;
    use std::str::FromStr;

    fn ctx() -> RequestContext {
        RequestContext::new(
            "portal.example.org",
            "https://portal.example.org/fhir",
            FhirDateTime::from_str("2023-05-15T14:30:00Z").unwrap(),
        )
    }

    fn record_with_location() -> AppointmentRecord {
        AppointmentRecord {
            id: "15".into(),
            start: FhirDateTime::from_str("2023-05-15T14:00:00Z").unwrap(),
            end: FhirDateTime::from_str("2023-05-15T14:45:00Z").unwrap(),
            duration_minutes: 45,
            description: "Video follow-up".into(),
            status: "booked".into(),
            provider_id: "77".into(),
            patient_id: "42".into(),
            location: Some(TelehealthLocation {
                portal_uri: "https://vidyo.example.org/join".into(),
                room_key: "room-1".into(),
                pin: "9876".into(),
            }),
            multiple: 0,
        }
    }

    #[test]
    fn test_to_fhir_with_location_emits_five_children() {
        let appointment = AppointmentMapper::to_fhir(&record_with_location(), &ctx());
        let block = &appointment.extension[0];
        assert_eq!(
            block.url,
            "https://portal.example.org/fhir/extension/vidyo-portal-data"
        );
        let fragments: Vec<&str> = block.extension.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            fragments,
            vec!["#portal-uri", "#room-key", "#pin", "#provider-id", "#patient-id"]
        );
    }

    #[test]
    fn test_to_fhir_without_location_emits_ids_only() {
        let mut record = record_with_location();
        record.location = None;
        let appointment = AppointmentMapper::to_fhir(&record, &ctx());
        let fragments: Vec<&str> = appointment.extension[0]
            .extension
            .iter()
            .map(|c| c.url.as_str())
            .collect();
        assert_eq!(fragments, vec!["#provider-id", "#patient-id"]);
    }

    #[test]
    fn test_round_trip() {
        let record = record_with_location();
        let appointment = AppointmentMapper::to_fhir(&record, &ctx());
        let back = AppointmentMapper::from_fhir(&appointment).unwrap();
        assert_eq!(back.start, record.start);
        assert_eq!(back.end, record.end);
        assert_eq!(back.status, record.status);
        assert_eq!(back.description, record.description);
        assert_eq!(back.provider_id, record.provider_id);
        assert_eq!(back.patient_id, record.patient_id);
        assert_eq!(back.location, record.location);
        assert_eq!(back.duration_minutes, 45);
    }

    #[test]
    fn test_from_fhir_requires_instants() {
        let appointment = Appointment {
            end: Some(FhirDateTime::from_str("2023-05-15T14:45:00Z").unwrap()),
            ..Default::default()
        };
        match AppointmentMapper::from_fhir(&appointment) {
            Err(CoreError::MissingField(field)) => assert_eq!(field, "start"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_from_fhir_ignores_unknown_fragments() {
        let appointment: Appointment = serde_json::from_value(json!({
            "start": "2023-05-15T14:00:00Z",
            "end": "2023-05-15T14:30:00Z",
            "extension": [{
                "url": "https://other.example.org/fhir/extension/vidyo-portal-data",
                "extension": [
                    {"url": "#provider-id", "valueString": "77"},
                    {"url": "#wavelength", "valueString": "blue"}
                ]
            }]
        }))
        .unwrap();
        let record = AppointmentMapper::from_fhir(&appointment).unwrap();
        assert_eq!(record.provider_id, "77");
        assert!(record.location.is_none());
        assert_eq!(record.duration_minutes, 30);
    }

    #[test]
    fn test_wire_shape() {
        use assert_json_diff::assert_json_eq;

        let mut record = record_with_location();
        record.location = None;
        let resource = Resource::Appointment(AppointmentMapper::to_fhir(&record, &ctx()));
        assert_json_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({
                "resourceType": "Appointment",
                "id": "15",
                "status": "booked",
                "description": "Video follow-up",
                "start": "2023-05-15T14:00:00Z",
                "end": "2023-05-15T14:45:00Z",
                "extension": [{
                    "url": "https://portal.example.org/fhir/extension/vidyo-portal-data",
                    "extension": [
                        {"url": "#provider-id", "valueString": "77"},
                        {"url": "#patient-id", "valueString": "42"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_dead_multiple_field_stays_zero() {
        let appointment = AppointmentMapper::to_fhir(&record_with_location(), &ctx());
        let record = AppointmentMapper::from_fhir(&appointment).unwrap();
        assert_eq!(record.multiple, 0);
    }
}
