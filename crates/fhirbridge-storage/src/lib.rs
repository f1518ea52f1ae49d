pub mod error;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use memory::{InMemoryDirectory, InMemoryRepository};
pub use traits::{PharmacyEntry, PharmacyDirectory, ProviderDirectory, ProviderEntry, RecordRepository};
