//! The update-vs-create decision for master patient stores.
//!
//! Kept as a pure function over session state so the persistence side
//! effects in the adapter stay separate from the decision itself.

use fhirbridge_core::UserSession;

/// Whether the caller's session already links to an EHR record over the
/// connection the resolved provider practices in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    /// The session holds this connection and a patient id: update path.
    Linked { pid: String },
    /// No matching linkage: fresh registration, create path.
    Unlinked,
}

pub fn resolve_linkage(session: &UserSession, connection: &str) -> Linkage {
    match (session.connection.as_deref(), session.ehr_pid.as_ref()) {
        (Some(existing), Some(pid)) if existing == connection => {
            Linkage::Linked { pid: pid.clone() }
        }
        _ => Linkage::Unlinked,
    }
}
