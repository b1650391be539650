use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::error::StorageError;
use super::key::validate_object_key;
use super::signing::UrlSigner;
use super::traits::{ObjectInfo, ObjectStore, PutOptions};

/// Filesystem-backed object store.
///
/// Layout under `root`:
/// - `objects/{key}`: object bytes
/// - `meta/{key}.json`: content type, cache control, visibility, creation time
/// - `.tmp/`: staging area for atomic writes
///
/// Public objects are served at `{base_url}/public/{key}`, everything else
/// through `{base_url}/files/{key}` with an HMAC-signed query string.
pub struct FilesystemObjectStore {
    root: PathBuf,
    base_url: String,
    signer: UrlSigner,
    max_size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    content_type: Option<String>,
    cache_control: Option<String>,
    public: bool,
    created_at: DateTime<Utc>,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store, creating directories as needed.
    pub async fn new(
        root: PathBuf,
        base_url: impl Into<String>,
        secret: impl AsRef<[u8]>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(root.join("objects")).await?;
        fs::create_dir_all(root.join("meta")).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self {
            root,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer: UrlSigner::new(secret)?,
            max_size,
        })
    }

    /// The signer used for `signed_url`, shared with the route that serves
    /// signed reads.
    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.objects_dir().join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(format!("{key}.json"))
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_atomic(&self, dest: &Path, data: &[u8]) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, dest).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_meta(&self, key: &str) -> Result<Option<StoredMeta>, StorageError> {
        match fs::read(self.meta_path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn info_for(&self, key: &str) -> Result<Option<ObjectInfo>, StorageError> {
        let size = match fs::metadata(self.object_path(key)).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta = self.read_meta(key).await?;
        Ok(Some(ObjectInfo {
            key: key.to_string(),
            size,
            content_type: meta.as_ref().and_then(|m| m.content_type.clone()),
            cache_control: meta.as_ref().and_then(|m| m.cache_control.clone()),
            public: meta.as_ref().is_some_and(|m| m.public),
            created_at: meta.map(|m| m.created_at).unwrap_or_else(Utc::now),
        }))
    }

    /// Remove now-empty parent directories of `path`, stopping at `stop`.
    async fn prune_empty_dirs(path: &Path, stop: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == stop || !dir.starts_with(stop) {
                break;
            }
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }

    /// Collect every object key under the objects directory.
    async fn walk_keys(&self) -> Result<Vec<String>, StorageError> {
        let base = self.objects_dir();
        let mut keys = Vec::new();
        let mut pending = vec![base.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&base) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        options: PutOptions,
    ) -> Result<ObjectInfo, StorageError> {
        validate_object_key(key)?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let meta = StoredMeta {
            content_type: Some(options.content_type),
            cache_control: options.cache_control,
            public: options.public,
            created_at: Utc::now(),
        };
        self.write_atomic(&self.meta_path(key), &serde_json::to_vec(&meta)?)
            .await?;
        self.write_atomic(&self.object_path(key), &data).await?;

        tracing::debug!(key, size = data.len(), "Stored object");
        Ok(ObjectInfo {
            key: key.to_string(),
            size: data.len() as u64,
            content_type: meta.content_type,
            cache_control: meta.cache_control,
            public: meta.public,
            created_at: meta.created_at,
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_object_key(key)?;
        match fs::read(self.object_path(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, StorageError> {
        validate_object_key(key)?;
        self.info_for(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut keys: Vec<String> = self
            .walk_keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(info) = self.info_for(&key).await? {
                out.push(info);
            }
        }
        Ok(out)
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_object_key(key)?;
        let object_path = self.object_path(key);
        let removed = match fs::remove_file(&object_path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        let meta_path = self.meta_path(key);
        match fs::remove_file(&meta_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Self::prune_empty_dirs(&object_path, &self.objects_dir()).await;
        Self::prune_empty_dirs(&meta_path, &self.root.join("meta")).await;
        Ok(removed)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/public/{}", self.base_url, key)
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_object_key(key)?;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let signature = self.signer.sign(key, expires);
        Ok(format!(
            "{}/files/{}?expires={}&signature={}",
            self.base_url, key, expires, signature
        ))
    }
}
