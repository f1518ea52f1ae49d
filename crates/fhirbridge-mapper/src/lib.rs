pub mod appointment;
pub mod bundle;
pub mod error;
pub mod extensions;
pub mod linkage;
pub mod patient;

pub use appointment::{AppointmentAdapter, AppointmentMapper};
pub use bundle::{BundleEntryMapper, build_bundle};
pub use error::{AdapterError, Result};
pub use linkage::{Linkage, resolve_linkage};
pub use patient::{PatientAdapter, PatientMapper};
