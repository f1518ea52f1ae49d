pub mod appointment;
pub mod bundle;
pub mod element;
pub mod parser;
pub mod patient;

pub use appointment::Appointment;
pub use bundle::{Bundle, BundleEntry, BundleLink, BundleResponse, Meta, SEARCHSET};
pub use element::{Attachment, ContactPoint, Extension, HumanName, Identifier};
pub use parser::{Resource, parse};
pub use patient::Patient;
