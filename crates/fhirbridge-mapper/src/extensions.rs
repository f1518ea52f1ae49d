//! The extension vocabulary shared by both mappers.
//!
//! Custom fields ride on FHIR resources as one named extension block whose
//! children are addressed by `#fragment` URLs. The fragment set is a fixed,
//! hard-coded vocabulary; anything else found in a block is ignored without
//! error.

use fhirbridge_model::Extension;

/// Block names, appended to the endpoint's extension URL prefix.
pub mod block_name {
    pub const VIDYO_PORTAL_DATA: &str = "vidyo-portal-data";
    pub const GPONLINE_PATIENT_DATA: &str = "gponline-patient-data";
    pub const CONTRACTS: &str = "contracts";
}

/// Child fragment names.
pub mod fragment {
    pub const PORTAL_URI: &str = "#portal-uri";
    pub const ROOM_KEY: &str = "#room-key";
    pub const PIN: &str = "#pin";
    pub const PROVIDER_ID: &str = "#provider-id";
    pub const PATIENT_ID: &str = "#patient-id";

    pub const GROUP_ID: &str = "#groupId";
    pub const STATUS: &str = "#status";
    pub const PATIENT_PROVIDER_ID: &str = "#providerId";
    pub const PHARMACY_ID: &str = "#pharmacyId";
    pub const STRIPE_TOKEN: &str = "#stripeToken";

    pub const ALLOW_SMS: &str = "#allow-sms";
    pub const TERMS_OF_SERVICE: &str = "#terms-of-service";
}

/// Build a named block from its children.
pub fn block(url: String, children: Vec<Extension>) -> Extension {
    Extension {
        url,
        extension: children,
        ..Default::default()
    }
}

/// Build a string-valued child field.
pub fn string_child(fragment: &str, value: impl Into<String>) -> Extension {
    Extension {
        url: fragment.to_string(),
        value_string: Some(value.into()),
        ..Default::default()
    }
}

/// Build a boolean-valued child field.
pub fn bool_child(fragment: &str, value: bool) -> Extension {
    Extension {
        url: fragment.to_string(),
        value_boolean: Some(value),
        ..Default::default()
    }
}

/// Find a named block among a resource's extensions, matching on the URL
/// suffix so the endpoint prefix the sender used does not matter.
pub fn find_block<'a>(extensions: &'a [Extension], name: &str) -> Option<&'a Extension> {
    let suffix = format!("/extension/{name}");
    extensions
        .iter()
        .find(|ext| ext.url.ends_with(&suffix) || ext.url == name)
}

/// Iterate a block's children as `(fragment, child)` pairs.
pub fn fields(block: &Extension) -> impl Iterator<Item = (&str, &Extension)> {
    block
        .extension
        .iter()
        .map(|child| (child.url.as_str(), child))
}

/// Extract one string field from a block, `None` when absent.
pub fn string_field<'a>(block: &'a Extension, fragment: &str) -> Option<&'a str> {
    fields(block)
        .find(|(url, _)| *url == fragment)
        .and_then(|(_, child)| child.value_string.as_deref())
}
