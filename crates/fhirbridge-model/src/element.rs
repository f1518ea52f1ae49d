//! Shared FHIR element types.
//!
//! Only the elements the mappers actually touch are modeled; everything
//! carries `Option`/`Vec` so partial inbound resources deserialize cleanly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Identifier {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Identifier {
    pub fn usual(value: impl Into<String>) -> Self {
        Self {
            use_: Some("usual".into()),
            value: Some(value.into()),
        }
    }
}

/// A human name with repeating given/family parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HumanName {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub family: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
}

impl ContactPoint {
    pub fn primary(system: &str, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: Some(value.into()),
            use_: Some("primary".into()),
        }
    }
}

/// Attachment as used for patient photos: either inline base64 data
/// (inbound) or a URL to the stored file (outbound).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Attachment {
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A FHIR extension node.
///
/// Top-level extensions act as named blocks (url = full endpoint URL) and
/// their children act as fields (url = `#fragment`), each carrying one of
/// the value[x] choices below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Extension {
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extension: Vec<Extension>,
    #[serde(rename = "valueString", skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(rename = "valueBoolean", skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
    #[serde(rename = "valueUri", skip_serializing_if = "Option::is_none")]
    pub value_uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn test_identifier_usual_shape() {
        let identifier = Identifier::usual("42");
        assert_json_eq!(
            serde_json::to_value(&identifier).unwrap(),
            json!({"use": "usual", "value": "42"})
        );
    }

    #[test]
    fn test_contact_point_shape() {
        let phone = ContactPoint::primary("phone", "555-0100");
        assert_json_eq!(
            serde_json::to_value(&phone).unwrap(),
            json!({"system": "phone", "value": "555-0100", "use": "primary"})
        );
    }

    #[test]
    fn test_extension_omits_absent_values() {
        let ext = Extension {
            url: "#pin".into(),
            value_string: Some("1234".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&ext).unwrap();
        assert_json_eq!(value, json!({"url": "#pin", "valueString": "1234"}));
    }

    #[test]
    fn test_nested_extension_roundtrip() {
        let json = json!({
            "url": "https://example.org/fhir/extension/contracts",
            "extension": [
                {"url": "#allow-sms", "valueBoolean": true}
            ]
        });
        let ext: Extension = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(ext.extension.len(), 1);
        assert_eq!(ext.extension[0].value_boolean, Some(true));
        assert_json_eq!(serde_json::to_value(&ext).unwrap(), json);
    }

    #[test]
    fn test_human_name_deserializes_partial() {
        let name: HumanName = serde_json::from_value(json!({"given": ["Ada"]})).unwrap();
        assert_eq!(name.given, vec!["Ada"]);
        assert!(name.family.is_empty());
    }
}
