mod error;
mod folder;
mod key;
mod signing;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use folder::Folder;
pub use key::{natural_cmp, sanitize_key, validate_object_key};
pub use signing::UrlSigner;
pub use traits::{ObjectInfo, ObjectStore, PutOptions};
