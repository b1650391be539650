pub mod storage;

pub use storage::{
    Folder, ObjectInfo, ObjectStore, PutOptions, StorageError, UrlSigner, natural_cmp,
    sanitize_key, validate_object_key,
};
