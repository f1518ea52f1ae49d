pub mod context;
pub mod error;
pub mod id;
pub mod record;
pub mod time;

pub use context::{RegistrationStatus, RequestContext, SmsPreference, UserSession};
pub use error::{CoreError, ErrorCategory, Result};
pub use id::generate_id;
pub use record::{AppointmentRecord, EhrRecord, PatientRecord, PhotoAttachment, TelehealthLocation};
pub use time::{FhirDateTime, duration_minutes, now_utc};
