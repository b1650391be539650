use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use super::error::StorageError;
use super::key::validate_object_key;
use super::traits::{ObjectInfo, ObjectStore, PutOptions};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL under which public objects are reachable. Defaults to
    /// `{endpoint}/{bucket}`.
    pub public_base_url: Option<String>,
    pub max_size: u64,
}

/// Object store backed by an S3-compatible service (path-style addressing).
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_base_url: String,
    max_size: u64,
}

fn backend(err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(err.to_string())
}

impl S3ObjectStore {
    pub fn new(settings: S3Settings) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: settings.region.clone(),
            endpoint: settings.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(backend)?;
        let bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(backend)?
            .with_path_style();

        let public_base_url = settings
            .public_base_url
            .unwrap_or_else(|| {
                format!(
                    "{}/{}",
                    settings.endpoint.trim_end_matches('/'),
                    settings.bucket
                )
            })
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bucket,
            public_base_url,
            max_size: settings.max_size,
        })
    }
}

fn parse_last_modified(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| {
            DateTime::parse_from_rfc3339(v)
                .or_else(|_| DateTime::parse_from_rfc2822(v))
                .ok()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

fn check_status(key: &str, status: u16) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        other => Err(StorageError::Backend(format!(
            "unexpected status {other} for {key}"
        ))),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
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

        let mut bucket = self.bucket.as_ref().clone();
        if let Some(cache_control) = &options.cache_control {
            bucket.add_header("Cache-Control", cache_control);
        }
        if options.public {
            bucket.add_header("x-amz-acl", "public-read");
        }

        let response = bucket
            .put_object_with_content_type(key, &data, &options.content_type)
            .await
            .map_err(backend)?;
        check_status(key, response.status_code())?;

        tracing::debug!(key, size = data.len(), "Uploaded object");
        Ok(ObjectInfo {
            key: key.to_string(),
            size: data.len() as u64,
            content_type: Some(options.content_type),
            cache_control: options.cache_control,
            public: options.public,
            created_at: Utc::now(),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_object_key(key)?;
        let response = self.bucket.get_object(key).await.map_err(backend)?;
        check_status(key, response.status_code())?;
        Ok(response.bytes().to_vec())
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, StorageError> {
        validate_object_key(key)?;
        let (head, status) = self.bucket.head_object(key).await.map_err(backend)?;
        if status == 404 {
            return Ok(None);
        }
        check_status(key, status)?;

        Ok(Some(ObjectInfo {
            key: key.to_string(),
            size: head.content_length.unwrap_or_default().max(0) as u64,
            content_type: head.content_type,
            cache_control: head.cache_control,
            public: false,
            created_at: parse_last_modified(head.last_modified.as_deref()),
        }))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let pages = self
            .bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(backend)?;

        let mut out: Vec<ObjectInfo> = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| ObjectInfo {
                created_at: parse_last_modified(Some(&object.last_modified)),
                key: object.key,
                size: object.size,
                content_type: None,
                cache_control: None,
                public: false,
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_object_key(key)?;
        if !self.exists(key).await? {
            return Ok(false);
        }
        let response = self.bucket.delete_object(key).await.map_err(backend)?;
        check_status(key, response.status_code())?;
        Ok(true)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_object_key(key)?;
        let secs = u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX);
        self.bucket
            .presign_get(key, secs, None)
            .await
            .map_err(backend)
    }
}
