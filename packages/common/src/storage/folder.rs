use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::StorageError;
use super::key::validate_object_key;
use super::traits::{ObjectInfo, ObjectStore, PutOptions};

/// A key prefix in an [`ObjectStore`] treated as a directory.
///
/// The folder exists exactly as long as at least one object carries its
/// prefix.
#[derive(Clone)]
pub struct Folder {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl Folder {
    /// Open the folder at `path` (`albums/nolle`, without trailing slash).
    pub fn new(store: Arc<dyn ObjectStore>, path: &str) -> Result<Self, StorageError> {
        validate_object_key(path)?;
        Ok(Self {
            store,
            prefix: format!("{path}/"),
        })
    }

    /// The last segment of the folder path.
    pub fn name(&self) -> &str {
        self.prefix
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Name of `object` relative to this folder, if it lies inside it.
    pub fn relative<'a>(&self, object: &'a ObjectInfo) -> Option<&'a str> {
        object.key.strip_prefix(&self.prefix)
    }

    /// Direct subfolders holding at least one object, in key order, each with
    /// every object below it.
    pub async fn subfolders(&self) -> Result<Vec<(Folder, Vec<ObjectInfo>)>, StorageError> {
        let mut groups: BTreeMap<String, Vec<ObjectInfo>> = BTreeMap::new();
        for object in self.list().await? {
            let child = self
                .relative(&object)
                .and_then(|rest| rest.split_once('/'))
                .map(|(child, _)| child.to_string());
            if let Some(child) = child {
                groups.entry(child).or_default().push(object);
            }
        }

        groups
            .into_iter()
            .map(|(child, objects)| {
                let path = self.key(&child);
                Ok((Folder::new(self.store.clone(), &path)?, objects))
            })
            .collect()
    }

    /// Full object key of `name` inside this folder.
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub async fn list(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        self.store.list(&self.prefix).await
    }

    pub async fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.list().await?.is_empty())
    }

    pub async fn put(
        &self,
        name: &str,
        data: Vec<u8>,
        options: PutOptions,
    ) -> Result<ObjectInfo, StorageError> {
        let key = self.key(name);
        validate_object_key(&key)?;
        self.store.put(&key, data, options).await
    }

    /// Read `name`, or `None` if it does not exist.
    pub async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self.store.get(&self.key(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete every object under the prefix. Returns the number deleted.
    pub async fn delete_all(&self) -> Result<usize, StorageError> {
        let objects = self.list().await?;
        let mut deleted = 0;
        for object in &objects {
            if self.store.delete(&object.key).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    pub async fn signed_url(
        &self,
        name: &str,
        ttl: std::time::Duration,
    ) -> Result<String, StorageError> {
        self.store.signed_url(&self.key(name), ttl).await
    }
}

impl std::fmt::Debug for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Folder")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
