use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::error::AppError;
use crate::utils::image::is_webp;

/// Plain `{ message }` response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "User is now an admin.")]
    pub message: String,
}

/// `{ success, message }` response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Event deleted successfully")]
    pub message: String,
}

/// Returns the trimmed value of a string field that must be present and
/// non-blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate an optional field that, when supplied, must not be blank.
pub fn optional_non_blank<'a>(
    value: Option<&'a str>,
    field: &str,
) -> Result<Option<&'a str>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => {
            Err(AppError::Validation(format!("{field} must not be empty")))
        }
        Some(v) => Ok(Some(v.trim())),
    }
}

/// Parse an event date. Accepts RFC 3339 and the `datetime-local` forms
/// `YYYY-MM-DDTHH:MM[:SS]` and `YYYY-MM-DD`, the latter read as UTC.
pub fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(AppError::Validation(format!("Invalid eventDate: {raw:?}")))
}

/// Decode base64 image data, with or without a `data:<mime>;base64,` prefix.
pub fn decode_base64_payload(data: &str) -> Result<Vec<u8>, AppError> {
    let data = data.trim();
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("Invalid base64 image data: {e}")))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Image data is empty".into()));
    }
    Ok(bytes)
}

/// Decode a base64 image that must already be WebP.
pub fn decode_webp_payload(data: &str, field: &str) -> Result<Vec<u8>, AppError> {
    let bytes = decode_base64_payload(data)?;
    if !is_webp(&bytes) {
        return Err(AppError::Validation(format!("{field} must be a WebP image")));
    }
    Ok(bytes)
}

/// Require an absolute `http`/`https` URL with a host.
pub fn validate_http_url(raw: &str, field: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation(format!("{field} must be an absolute http(s) URL"));
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_event_date_accepts_rfc3339_and_local_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 8, 20, 18, 0, 0).unwrap();
        assert_eq!(parse_event_date("2024-08-20T18:00:00Z").unwrap(), expected);
        assert_eq!(parse_event_date("2024-08-20T20:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_event_date("2024-08-20T18:00").unwrap(), expected);
        assert_eq!(parse_event_date("2024-08-20T18:00:00").unwrap(), expected);
        assert_eq!(
            parse_event_date("2024-08-20").unwrap(),
            Utc.with_ymd_and_hms(2024, 8, 20, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn parse_event_date_rejects_garbage() {
        assert!(parse_event_date("tomorrow").is_err());
        assert!(parse_event_date("2024-13-01").is_err());
    }

    #[test]
    fn decode_base64_strips_data_url_prefix() {
        assert_eq!(
            decode_base64_payload("data:image/webp;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert_eq!(decode_base64_payload("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn decode_base64_rejects_invalid_and_empty() {
        assert!(decode_base64_payload("data:image/webp;base64,!!!").is_err());
        assert!(decode_base64_payload("").is_err());
    }

    #[test]
    fn decode_webp_rejects_other_formats() {
        let webp = STANDARD.encode(b"RIFF\x04\x00\x00\x00WEBPVP8 ");
        assert!(decode_webp_payload(&format!("data:image/webp;base64,{webp}"), "thumbnailData").is_ok());

        let png = STANDARD.encode(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR");
        assert!(matches!(
            decode_webp_payload(&png, "thumbnailData"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn validate_http_url_requires_scheme_and_host() {
        assert!(validate_http_url("https://drive.google.com/x", "driveUrl").is_ok());
        assert!(validate_http_url("http://example.org", "driveUrl").is_ok());
        assert!(validate_http_url("ftp://example.org", "driveUrl").is_err());
        assert!(validate_http_url("https://", "driveUrl").is_err());
        assert!(validate_http_url("drive.google.com", "driveUrl").is_err());
        assert!(validate_http_url("https://a b", "driveUrl").is_err());
        assert!(validate_http_url("https://:@", "driveUrl").is_err());
        assert!(validate_http_url("http://%%%", "driveUrl").is_err());
    }

    #[test]
    fn optional_non_blank_distinguishes_absent_and_blank() {
        assert!(optional_non_blank(None, "name").unwrap().is_none());
        assert_eq!(optional_non_blank(Some(" x "), "name").unwrap(), Some("x"));
        assert!(optional_non_blank(Some("  "), "name").is_err());
    }
}
