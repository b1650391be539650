use std::sync::Arc;
use std::time::Duration;

use common::storage::filesystem::FilesystemObjectStore;
use common::storage::s3::{S3ObjectStore, S3Settings};
use common::{ObjectStore, StorageError, UrlSigner};
use sea_orm::DatabaseConnection;

use crate::config::{AppConfig, StorageBackend};
use crate::identity::IdentityProvider;
use crate::services::{AdminService, AlbumService, EventService, PostService};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub store: Arc<dyn ObjectStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: AppConfig,
    /// Verifier for `/files` URLs. `None` when the store signs its own URLs.
    pub url_signer: Option<UrlSigner>,
}

impl AppState {
    pub fn events(&self) -> EventService {
        EventService::new(self.db.clone(), self.store.clone())
    }

    pub fn albums(&self) -> AlbumService {
        AlbumService::new(self.store.clone(), self.signed_url_ttl())
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(
            self.db.clone(),
            self.store.clone(),
            self.identity.clone(),
            self.signed_url_ttl(),
        )
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.db.clone())
    }

    fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.config.storage.signed_url_ttl_hours * 3600)
    }
}

/// Build the configured object store and, for the filesystem backend, the
/// signer that validates its URLs.
pub async fn build_object_store(
    config: &AppConfig,
) -> Result<(Arc<dyn ObjectStore>, Option<UrlSigner>), StorageError> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemObjectStore::new(
                storage.root.clone(),
                config.api_base_url(),
                &storage.signing_secret,
                storage.max_object_size,
            )
            .await?;
            let signer = store.signer().clone();
            Ok((Arc::new(store), Some(signer)))
        }
        StorageBackend::S3 => {
            let s3 = storage.s3.clone().ok_or_else(|| {
                StorageError::Backend("storage.s3 section is required for the s3 backend".into())
            })?;
            let store = S3ObjectStore::new(S3Settings {
                endpoint: s3.endpoint,
                region: s3.region,
                bucket: s3.bucket,
                access_key: s3.access_key,
                secret_key: s3.secret_key,
                public_base_url: s3.public_base_url,
                max_size: storage.max_object_size,
            })?;
            Ok((Arc::new(store), None))
        }
    }
}
