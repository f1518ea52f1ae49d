use crate::context::{RegistrationStatus, SmsPreference};
use crate::time::{FhirDateTime, duration_minutes};
use serde::{Deserialize, Serialize};

/// Telehealth session payload attached to an appointment.
///
/// Stored in the EHR as one serialized blob on the appointment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelehealthLocation {
    #[serde(rename = "portalUri")]
    pub portal_uri: String,
    #[serde(rename = "roomKey")]
    pub room_key: String,
    pub pin: String,
}

/// Internal appointment record as the EHR stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: String,
    pub start: FhirDateTime,
    pub end: FhirDateTime,
    /// Derived from start/end, kept denormalized to match the EHR schema.
    pub duration_minutes: i64,
    pub description: String,
    pub status: String,
    pub provider_id: String,
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<TelehealthLocation>,
    /// Dead field in the EHR schema, always 0.
    #[serde(default)]
    pub multiple: i32,
}

impl AppointmentRecord {
    /// Recompute the denormalized duration from start/end.
    pub fn refresh_duration(&mut self) {
        self.duration_minutes = duration_minutes(&self.start, &self.end);
    }
}

/// Profile photo as carried by the patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    pub mimetype: String,
    /// Base64-encoded payload, present on inbound photos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_data: Option<String>,
    /// Generated on inbound photos from the mimetype.
    pub filename: String,
    /// Where the stored photo is served from, present on outbound photos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl PhotoAttachment {
    /// File extension for a photo mimetype.
    ///
    /// This is the EHR's two-way rule, not a general MIME table: exactly
    /// `image/jpeg` gets `jpg`, everything else gets `jpeg`.
    pub fn extension_for(mimetype: &str) -> &'static str {
        match mimetype {
            "image/jpeg" => "jpg",
            _ => "jpeg",
        }
    }
}

/// Internal patient record as the EHR stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PatientRecord {
    pub id: String,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub primary_phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoAttachment>,
    pub group_id: String,
    pub provider_id: String,
    pub pharmacy_id: String,
    /// `None` when an inbound payload carried no status child; the store
    /// paths fill it in before persisting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RegistrationStatus>,
    pub allow_sms: SmsPreference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
}

/// One record from the EHR, of whichever variant a query returned.
///
/// Collections coming back from the repository are heterogeneous at the
/// type level; each mapper picks out its own variant and skips the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EhrRecord {
    Appointment(AppointmentRecord),
    Patient(PatientRecord),
}

impl EhrRecord {
    pub fn id(&self) -> &str {
        match self {
            Self::Appointment(r) => &r.id,
            Self::Patient(r) => &r.id,
        }
    }

    pub fn as_appointment(&self) -> Option<&AppointmentRecord> {
        match self {
            Self::Appointment(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_patient(&self) -> Option<&PatientRecord> {
        match self {
            Self::Patient(r) => Some(r),
            _ => None,
        }
    }
}
