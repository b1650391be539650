use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded page of a new album, as read from the multipart body.
#[derive(Debug, Clone)]
pub struct AlbumPage {
    pub file_name: String,
    /// Content type declared by the multipart part, if any.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Parsed multipart input for album creation.
#[derive(Debug, Clone, Default)]
pub struct NewAlbum {
    /// Raw folder name (`pdfName`), sanitized by the service.
    pub raw_name: Option<String>,
    pub display_name: Option<String>,
    pub pages: Vec<AlbumPage>,
}

/// Contents of `metadata.json` inside an album folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumMetadata {
    pub display_name: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Uid of the uploading admin.
    pub uploaded_by: String,
}

/// Multipart form of `POST /albums`, documented for OpenAPI only.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct UploadAlbumForm {
    /// Page images in reading order, sent as repeated `images[]` parts.
    #[schema(rename = "images[]", value_type = Vec<String>)]
    pub images: Vec<Vec<u8>>,
    /// Folder name; sanitized into the album key. Defaults to `unknown_pdf`.
    #[schema(rename = "pdfName", example = "Bländaren 2024")]
    pub pdf_name: Option<String>,
    /// Optional human-readable label.
    #[schema(rename = "displayName", example = "Bländaren, vecka 1")]
    pub display_name: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AlbumUploadResponse {
    #[schema(example = true)]
    pub success: bool,
    /// Object keys of the stored pages.
    #[schema(example = json!(["albums/Blandaren_2024/page-1.png"]))]
    pub uploaded: Vec<String>,
}

/// One album in the listing.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    /// Folder key.
    #[schema(example = "Blandaren_2024")]
    pub name: String,
    /// Label from `metadata.json`, falling back to the folder key.
    #[schema(example = "Bländaren, vecka 1")]
    pub display_name: String,
    /// Signed page URLs in page order.
    pub images: Vec<String>,
    /// Creation time of the oldest object in the folder.
    pub time_created: DateTime<Utc>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlbumListResponse {
    /// Albums, oldest first.
    pub blandare: Vec<AlbumSummary>,
    /// Page URLs of every album that has at least one image.
    pub all_images: Vec<Vec<String>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAlbumRequest {
    /// Folder key as returned in `blandare[].name`.
    #[schema(example = "Blandaren_2024")]
    pub folder_name: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAlbumResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Bländare \"Blandaren_2024\" deleted successfully")]
    pub message: String,
    #[schema(example = 13)]
    pub deleted_files: usize,
}
