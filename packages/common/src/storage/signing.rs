use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::StorageError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies time-limited read URLs for stores that are served by
/// this application (the filesystem backend).
///
/// The signature is HMAC-SHA256 over `key \n expires`, hex-encoded.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, StorageError> {
        let mac = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| StorageError::Backend(format!("Invalid signing secret: {e}")))?;
        Ok(Self { mac })
    }

    /// Hex signature for `key` valid until the unix timestamp `expires`.
    pub fn sign(&self, key: &str, expires: i64) -> String {
        hex::encode(self.keyed(key, expires).finalize().into_bytes())
    }

    /// Checks a signature and that `now` has not passed `expires`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        self.keyed(key, expires).verify_slice(&signature).is_ok()
    }

    fn keyed(&self, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{key}\n{expires}").as_bytes());
        mac
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}
