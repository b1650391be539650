use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Per-object settings applied on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: String,
    pub cache_control: Option<String>,
    /// Whether the object is readable without a signed URL.
    pub public: bool,
}

impl PutOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control: None,
            public: false,
        }
    }

    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }
}

/// Metadata describing one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub public: bool,
    pub created_at: DateTime<Utc>,
}

impl ObjectInfo {
    /// The last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Key-addressed object storage with a `/`-separated hierarchical namespace.
///
/// There are no directory entities: a "folder" is only a shared key prefix
/// (see [`super::Folder`]).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store (or replace) an object.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        options: PutOptions,
    ) -> Result<ObjectInfo, StorageError>;

    /// Retrieve all bytes of an object.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Look up object metadata. Returns `None` if the object does not exist.
    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.head(key).await?.is_some())
    }

    /// List every object whose key starts with `prefix`, in key order.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Stable URL of a public object.
    fn public_url(&self, key: &str) -> String;

    /// Time-limited read URL for any object.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}
