use common::sanitize_key;

/// Name reserved for album metadata inside an album folder.
pub const ALBUM_METADATA_FILE: &str = "metadata.json";

/// Result of validating an uploaded page name.
#[derive(Debug, PartialEq, Eq)]
pub enum PageNameError {
    /// Name is empty after sanitizing.
    Empty,
    /// Name collides with the album metadata file.
    Reserved,
    /// Name starts with a dot (hidden file).
    Hidden,
}

impl PageNameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Invalid page name: nothing left after sanitizing",
            Self::Reserved => "Invalid page name: 'metadata.json' is reserved",
            Self::Hidden => "Invalid page name: hidden files (starting with '.') are not allowed",
        }
    }
}

/// Sanitizes an uploaded page file name into an album object name.
pub fn album_page_name(raw: &str) -> Result<String, PageNameError> {
    let name = sanitize_key(base_name(raw.trim()));

    if name.is_empty() {
        return Err(PageNameError::Empty);
    }
    if name.eq_ignore_ascii_case(ALBUM_METADATA_FILE) {
        return Err(PageNameError::Reserved);
    }
    if name.starts_with('.') {
        return Err(PageNameError::Hidden);
    }
    Ok(name)
}

/// Last path component, accepting both `/` and `\` separators.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// File name without directories or extension. `photo.final.png` → `photo.final`.
pub fn file_stem(path: &str) -> &str {
    let name = base_name(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Object key for an event thumbnail uploaded at `millis`.
pub fn thumbnail_key(millis: i64, file_name: &str) -> String {
    let stem = sanitize_key(file_stem(file_name));
    let stem = if stem.is_empty() { "thumbnail".to_string() } else { stem };
    format!("event-thumbnails/{millis}_{stem}.webp")
}

/// Object key of a user's profile picture.
pub fn profile_picture_key(uid: &str) -> String {
    format!("profilepics/{uid}.webp")
}

/// Checks that a file name has one of the given extensions (case-insensitive).
pub fn has_extension(name: &str, extensions: &[&str]) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => extensions
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_page_name_sanitizes() {
        assert_eq!(album_page_name("page-1.png").unwrap(), "page-1.png");
        assert_eq!(album_page_name("Sida 2.png").unwrap(), "Sida_2.png");
        assert_eq!(album_page_name("dir/sub/page-3.png").unwrap(), "page-3.png");
        assert_eq!(album_page_name("C:\\scans\\p4.jpg").unwrap(), "p4.jpg");
    }

    #[test]
    fn album_page_name_rejects_empty_reserved_and_hidden() {
        assert_eq!(album_page_name("日本"), Err(PageNameError::Empty));
        assert_eq!(album_page_name("   "), Err(PageNameError::Empty));
        assert_eq!(album_page_name("metadata.json"), Err(PageNameError::Reserved));
        assert_eq!(album_page_name("METADATA.JSON"), Err(PageNameError::Reserved));
        assert_eq!(album_page_name(".hidden.png"), Err(PageNameError::Hidden));
    }

    #[test]
    fn file_stem_strips_directories_and_extension() {
        assert_eq!(file_stem("photo.png"), "photo");
        assert_eq!(file_stem("a/b/photo.final.jpg"), "photo.final");
        assert_eq!(file_stem("no_ext"), "no_ext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn thumbnail_key_uses_millis_and_sanitized_stem() {
        assert_eq!(
            thumbnail_key(1_700_000_000_000, "Nollning Fest.jpg"),
            "event-thumbnails/1700000000000_Nollning_Fest.webp"
        );
        assert_eq!(
            thumbnail_key(5, "Övning.webp"),
            "event-thumbnails/5_ovning.webp"
        );
        assert_eq!(thumbnail_key(5, "???.png"), "event-thumbnails/5_thumbnail.webp");
    }

    #[test]
    fn has_extension_matches_case_insensitively() {
        let exts = ["png", "jpg", "jpeg", "webp"];
        assert!(has_extension("page-1.PNG", &exts));
        assert!(has_extension("x.jpeg", &exts));
        assert!(!has_extension("metadata.json", &exts));
        assert!(!has_extension("png", &exts));
        assert!(!has_extension(".png", &exts));
    }

    #[test]
    fn profile_picture_key_layout() {
        assert_eq!(profile_picture_key("abc"), "profilepics/abc.webp");
    }

    #[test]
    fn album_keys_sanitize_and_sort_through_the_storage_crate() {
        use common::{natural_cmp, sanitize_key, validate_object_key};

        let key = sanitize_key("Bländaren 2024");
        assert_eq!(key, "Blandaren_2024");
        assert!(validate_object_key(&format!("albums/{key}/page-1.png")).is_ok());

        let mut pages = vec!["page-10.png", "page-2.png", "page-1.png"];
        pages.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(pages, ["page-1.png", "page-2.png", "page-10.png"]);
    }
}
