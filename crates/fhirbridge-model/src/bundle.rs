use crate::parser::Resource;
use fhirbridge_core::FhirDateTime;
use serde::{Deserialize, Serialize};

/// Bundle type emitted for search results.
pub const SEARCHSET: &str = "searchset";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "lastUpdated")]
    pub last_updated: FhirDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

impl BundleLink {
    pub fn self_link(url: impl Into<String>) -> Self {
        Self {
            relation: "self".into(),
            url: url.into(),
        }
    }
}

/// Per-entry response metadata (searchset entries carry where the resource
/// lives and when it was mapped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleResponse {
    pub location: String,
    #[serde(rename = "lastModified")]
    pub last_modified: FhirDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    #[serde(rename = "fullUrl")]
    pub full_url: String,
    pub resource: Resource,
    pub response: BundleResponse,
}

/// FHIR searchset Bundle. `total` counts mapped entries, not the size of
/// the input collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: String,
    pub meta: Meta,
    #[serde(rename = "type")]
    pub bundle_type: String,
    pub total: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub link: Vec<BundleLink>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub entry: Vec<BundleEntry>,
}
