use crate::element::Extension;
use fhirbridge_core::FhirDateTime;
use serde::{Deserialize, Serialize};

/// FHIR Appointment resource, limited to the fields the mapper reads and
/// writes. Instants are parsed at the wire boundary so downstream
/// arithmetic never sees strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Appointment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<FhirDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<FhirDateTime>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extension: Vec<Extension>,
}
