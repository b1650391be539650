use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{Folder, ObjectStore, PutOptions, natural_cmp, sanitize_key};
use tracing::{error, info, instrument, warn};

use crate::error::AppError;
use crate::extractors::auth::{AuthUser, Role};
use crate::models::album::{
    AlbumListResponse, AlbumMetadata, AlbumSummary, DeleteAlbumRequest, DeleteAlbumResponse,
    NewAlbum,
};
use crate::utils::filename::{ALBUM_METADATA_FILE, album_page_name, has_extension};

/// Key prefix under which every album folder lives.
pub const ALBUM_ROOT: &str = "albums";

const DEFAULT_ALBUM_NAME: &str = "unknown_pdf";
const PAGE_CACHE_CONTROL: &str = "public, max-age=2592000";
const FALLBACK_PAGE_TYPE: &str = "image/png";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Albums ("Bländare"): folders of page images under `albums/<key>/`.
/// Albums are created in one upload and deleted as a whole.
pub struct AlbumService {
    store: Arc<dyn ObjectStore>,
    signed_url_ttl: Duration,
}

impl AlbumService {
    pub fn new(store: Arc<dyn ObjectStore>, signed_url_ttl: Duration) -> Self {
        Self {
            store,
            signed_url_ttl,
        }
    }

    fn folder(&self, key: &str) -> Result<Folder, AppError> {
        Ok(Folder::new(self.store.clone(), &format!("{ALBUM_ROOT}/{key}"))?)
    }

    /// Upload a new album. Returns the object keys of the stored pages.
    ///
    /// Pages are uploaded one by one; a failure part-way leaves the pages
    /// stored so far in place.
    #[instrument(skip(self, caller, album), fields(uid = %caller.uid, pages = album.pages.len()))]
    pub async fn create_album(
        &self,
        caller: &AuthUser,
        album: NewAlbum,
    ) -> Result<Vec<String>, AppError> {
        caller.require_role(Role::Admin)?;

        if album.pages.is_empty() {
            return Err(AppError::Validation("No images uploaded".into()));
        }

        let key = sanitize_key(album.raw_name.as_deref().unwrap_or(DEFAULT_ALBUM_NAME));
        if key.is_empty() {
            return Err(AppError::Validation(
                "Album name is empty after sanitizing".into(),
            ));
        }
        let folder = self.folder(&key)?;
        if !folder.is_empty().await? {
            return Err(AppError::Conflict("Bländare already exists".into()));
        }

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(album.pages.len());
        for page in &album.pages {
            let name =
                album_page_name(&page.file_name).map_err(|e| AppError::Validation(e.message().into()))?;
            if !seen.insert(name.clone()) {
                return Err(AppError::Validation(format!("Duplicate page name: {name}")));
            }
            names.push(name);
        }

        let mut uploaded = Vec::with_capacity(names.len());
        for (page, name) in album.pages.into_iter().zip(names) {
            let content_type = page_content_type(page.content_type.as_deref(), &name);
            let options = PutOptions::new(content_type).cache_control(PAGE_CACHE_CONTROL);
            if let Err(e) = folder.put(&name, page.bytes, options).await {
                error!(
                    album = %key,
                    uploaded = uploaded.len(),
                    "Album upload failed part-way: {}",
                    e
                );
                return Err(e.into());
            }
            uploaded.push(folder.key(&name));
        }

        if let Some(display_name) = album
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            let metadata = AlbumMetadata {
                display_name: display_name.to_string(),
                name: key.clone(),
                created_at: Utc::now(),
                uploaded_by: caller.uid.clone(),
            };
            let bytes = serde_json::to_vec(&metadata)
                .map_err(|e| AppError::Internal(format!("Metadata encode error: {e}")))?;
            folder
                .put(ALBUM_METADATA_FILE, bytes, PutOptions::new("application/json"))
                .await?;
        }

        info!(album = %key, pages = uploaded.len(), "Album created");
        Ok(uploaded)
    }

    /// Every album, oldest first, with signed page URLs.
    #[instrument(skip(self))]
    pub async fn list_albums(&self) -> Result<AlbumListResponse, AppError> {
        let root = Folder::new(self.store.clone(), ALBUM_ROOT)?;
        let mut ordered: Vec<_> = root
            .subfolders()
            .await?
            .into_iter()
            .filter_map(|(folder, objects)| {
                let created = objects.iter().map(|o| o.created_at).min()?;
                Some((created, folder, objects))
            })
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name().cmp(b.1.name())));

        let mut blandare = Vec::with_capacity(ordered.len());
        let mut all_images = Vec::new();
        for (time_created, folder, objects) in ordered {
            let name = folder.name().to_string();
            let display_name = self.display_name(&folder).await.unwrap_or_else(|| name.clone());

            let mut pages: Vec<&str> = objects
                .iter()
                .filter_map(|o| folder.relative(o))
                .filter(|page| has_extension(page, IMAGE_EXTENSIONS))
                .collect();
            pages.sort_by(|a, b| natural_cmp(a, b));

            let mut images = Vec::with_capacity(pages.len());
            for page in pages {
                images.push(folder.signed_url(page, self.signed_url_ttl).await?);
            }

            if !images.is_empty() {
                all_images.push(images.clone());
            }
            blandare.push(AlbumSummary {
                name,
                display_name,
                images,
                time_created,
            });
        }

        Ok(AlbumListResponse {
            blandare,
            all_images,
        })
    }

    /// Delete every object of an album, metadata included.
    #[instrument(skip(self, caller, request), fields(uid = %caller.uid))]
    pub async fn delete_album(
        &self,
        caller: &AuthUser,
        request: &DeleteAlbumRequest,
    ) -> Result<DeleteAlbumResponse, AppError> {
        caller.require_role(Role::Admin)?;

        let name = request
            .folder_name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation("Folder name is required".into()))?;
        if sanitize_key(name) != name {
            return Err(AppError::Validation(format!("Invalid folder name: {name:?}")));
        }

        let folder = self.folder(name)?;
        if folder.is_empty().await? {
            return Err(AppError::NotFound(format!("Bländare \"{name}\" not found")));
        }
        let deleted_files = folder.delete_all().await?;

        info!(album = %name, deleted_files, "Album deleted");
        Ok(DeleteAlbumResponse {
            success: true,
            message: format!("Bländare \"{name}\" deleted successfully"),
            deleted_files,
        })
    }

    /// `displayName` from the folder's metadata file, if readable.
    async fn display_name(&self, folder: &Folder) -> Option<String> {
        let bytes = match folder.get(ALBUM_METADATA_FILE).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(folder = %folder.name(), error = %e, "Failed to read album metadata");
                return None;
            }
        };
        match serde_json::from_slice::<AlbumMetadata>(&bytes) {
            Ok(meta) if !meta.display_name.trim().is_empty() => Some(meta.display_name),
            Ok(_) => None,
            Err(e) => {
                warn!(folder = %folder.name(), error = %e, "Malformed album metadata");
                None
            }
        }
    }
}

/// Content type of a page: the declared one, else guessed from the name,
/// else PNG.
fn page_content_type(declared: Option<&str>, name: &str) -> String {
    declared
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "application/octet-stream")
        .map(str::to_string)
        .or_else(|| {
            mime_guess::from_path(name)
                .first()
                .filter(|m| m.type_() == mime_guess::mime::IMAGE)
                .map(|m| m.essence_str().to_string())
        })
        .unwrap_or_else(|| FALLBACK_PAGE_TYPE.to_string())
}
