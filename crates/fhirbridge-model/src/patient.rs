use crate::element::{Attachment, ContactPoint, Extension, HumanName, Identifier};
use serde::{Deserialize, Serialize};

/// FHIR Patient resource, limited to the demographic and extension fields
/// the mapper exchanges with the EHR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub telecom: Vec<ContactPoint>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub photo: Vec<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extension: Vec<Extension>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_demographics() {
        let patient: Patient = serde_json::from_value(json!({
            "birthDate": "1985-03-02",
            "gender": "female",
            "name": [{"use": "usual", "given": ["Ada"], "family": ["Lovelace"]}],
            "telecom": [{"system": "phone", "value": "555-0100", "use": "primary"}]
        }))
        .unwrap();
        assert_eq!(patient.birth_date.as_deref(), Some("1985-03-02"));
        assert_eq!(patient.name[0].given[0], "Ada");
        assert_eq!(patient.telecom[0].value.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_serialize_omits_empty_collections() {
        let patient = Patient::default();
        assert_eq!(serde_json::to_value(&patient).unwrap(), json!({}));
    }
}
