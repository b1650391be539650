use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable origin of this server, used to build object URLs
    /// for the filesystem storage backend.
    pub public_url: String,
    /// Request body limit for album uploads, in bytes.
    pub album_upload_limit: usize,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory of the filesystem backend.
    pub root: PathBuf,
    /// HMAC secret for filesystem signed URLs.
    pub signing_secret: String,
    pub max_object_size: u64,
    /// Lifetime of signed album image URLs, in hours.
    pub signed_url_ttl_hours: u64,
    pub s3: Option<S3StorageConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, e.g. `info` or
    /// `mottagning_server=debug,sea_orm=warn`.
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.public_url", "http://127.0.0.1:3000")?
            .set_default("server.album_upload_limit", 200 * 1024 * 1024)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://mottagning.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("auth.token_ttl_minutes", 60)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.root", "./data/storage")?
            .set_default("storage.max_object_size", 50 * 1024 * 1024)?
            .set_default("storage.signed_url_ttl_hours", 24)?
            .set_default("logging.level", "info")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., MOTTAGNING__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("MOTTAGNING").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Base URL of the versioned API, without trailing slash.
    pub fn api_base_url(&self) -> String {
        format!("{}/api/v1", self.server.public_url.trim_end_matches('/'))
    }
}
