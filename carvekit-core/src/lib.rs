//! carvekit Core - shared types
//!
//! Error taxonomy, content hashing, the carve artifact name convention and the
//! record handed to storage. All other crates depend on this.

pub mod carve_name;
pub mod error;
pub mod identity;
pub mod record;

pub use carve_name::{parse_carve_filename, CarveName};
pub use error::{CarveError, CarveResult, ConfigError, NameError, StorageError};
pub use identity::{compute_content_hash, content_hash_hex, ContentHash};
pub use record::{CarveRecord, Timestamp};
