//! Generic wire-to-resource parsing.
//!
//! Inbound payloads carry a top-level `resourceType`; dispatch happens on
//! that field so a mismatch can report what actually arrived instead of a
//! bare deserialization failure.

use crate::appointment::Appointment;
use crate::bundle::Bundle;
use crate::patient::Patient;
use fhirbridge_core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed FHIR resource of one of the supported types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Appointment(Appointment),
    Patient(Patient),
    Bundle(Bundle),
}

impl Resource {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Appointment(_) => "Appointment",
            Self::Patient(_) => "Patient",
            Self::Bundle(_) => "Bundle",
        }
    }

    /// Unwrap an Appointment, reporting the actual type on mismatch.
    pub fn expect_appointment(self) -> Result<Appointment> {
        match self {
            Self::Appointment(appointment) => Ok(appointment),
            other => Err(CoreError::resource_type_mismatch(
                "Appointment",
                other.type_name(),
            )),
        }
    }

    /// Unwrap a Patient, reporting the actual type on mismatch.
    pub fn expect_patient(self) -> Result<Patient> {
        match self {
            Self::Patient(patient) => Ok(patient),
            other => Err(CoreError::resource_type_mismatch(
                "Patient",
                other.type_name(),
            )),
        }
    }
}

/// Parse a FHIR JSON payload into a typed resource.
pub fn parse(text: &str) -> Result<Resource> {
    let value: Value = serde_json::from_str(text)?;
    let resource_type = value
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::missing_field("resourceType"))?;
    match resource_type {
        "Appointment" => Ok(Resource::Appointment(serde_json::from_value(value)?)),
        "Patient" => Ok(Resource::Patient(serde_json::from_value(value)?)),
        "Bundle" => Ok(Resource::Bundle(serde_json::from_value(value)?)),
        other => Err(CoreError::resource_type_mismatch(
            "Appointment, Patient or Bundle",
            other,
        )),
    }
}
