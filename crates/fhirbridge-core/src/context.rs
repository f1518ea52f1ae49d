use crate::error::{CoreError, Result};
use crate::time::FhirDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient registration status as stored in the EHR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationStatus {
    #[default]
    New,
    Pending,
    Active,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NEW" => Ok(Self::New),
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            other => Err(CoreError::invalid_record(format!(
                "unknown registration status '{other}'"
            ))),
        }
    }
}

/// SMS contact preference, stored in the EHR as YES/NO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SmsPreference {
    Yes,
    #[default]
    No,
}

impl SmsPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }

    pub fn from_bool(allow: bool) -> Self {
        if allow { Self::Yes } else { Self::No }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Ambient request state made explicit.
///
/// The mapping functions never read host, clock or base URL from globals;
/// the HTTP layer fills this in once per request and passes it down.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request host, used for bundle self-links and entry full URLs.
    pub host: String,
    /// Base URL of the FHIR endpoint, used as the extension URL prefix.
    pub fhir_base_url: String,
    /// Mapping time, embedded as lastModified/lastUpdated in bundles.
    pub now: FhirDateTime,
}

impl RequestContext {
    pub fn new(
        host: impl Into<String>,
        fhir_base_url: impl Into<String>,
        now: FhirDateTime,
    ) -> Self {
        Self {
            host: host.into(),
            fhir_base_url: fhir_base_url.into(),
            now,
        }
    }

    /// URL of a named extension block under this endpoint.
    pub fn extension_url(&self, name: &str) -> String {
        format!("{}/extension/{name}", self.fhir_base_url)
    }
}

/// The authenticated portal user's EHR linkage.
///
/// `connection` names the EHR database the user's record lives in and
/// `ehr_pid` is the patient id inside that database. Both are absent until
/// registration completes. The master store path updates this value and the
/// caller persists it back to its session store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSession {
    pub connection: Option<String>,
    pub ehr_pid: Option<String>,
    pub status: Option<RegistrationStatus>,
}

impl UserSession {
    /// True when the session is already linked to an EHR record over the
    /// given connection.
    pub fn is_linked_to(&self, connection: &str) -> bool {
        self.connection.as_deref() == Some(connection) && self.ehr_pid.is_some()
    }
}
