use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use ::common::storage::filesystem::FilesystemObjectStore;
use ::common::{ObjectStore, UrlSigner};
use mottagning_server::config::{
    AppConfig, AuthConfig, BootstrapAdmin, CorsConfig, DatabaseConfig, LoggingConfig,
    ServerConfig, StorageBackend, StorageConfig,
};
use mottagning_server::identity::{DbIdentityProvider, IdentityProvider, NewIdentity};
use mottagning_server::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@example.org";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const SIGNING_SECRET: &str = "test-signing-secret";

/// A 1x1 WebP image.
pub const TINY_WEBP: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x1a, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38,
    0x4c, 0x0d, 0x00, 0x00, 0x00, 0x2f, 0x00, 0x00, 0x00, 0x10, 0x07, 0x10, 0x11, 0x11, 0x88,
    0x88, 0xfe, 0x07, 0x00,
];

pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";
    pub const EVENTS: &str = "/api/v1/events";
    pub const ALBUMS: &str = "/api/v1/albums";
    pub const POSTS: &str = "/api/v1/posts";
    pub const SET_CLAIM: &str = "/api/v1/admin/setClaim";
    pub const USERS: &str = "/api/v1/admin/users";
    pub const ADMINS: &str = "/api/v1/admin/admins";
    pub const BULK_CREATE: &str = "/api/v1/admin/bulkCreateUsers";
    pub const PURGE: &str = "/api/v1/admin/purge";

    pub fn event(id: &str) -> String {
        format!("/api/v1/events/{id}")
    }

    pub fn display_name(uid: &str) -> String {
        format!("/api/v1/admin/users/{uid}/displayName")
    }

    pub fn profile_picture(uid: &str) -> String {
        format!("/api/v1/admin/users/{uid}/profilePicture")
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub store: Arc<dyn ObjectStore>,
    identity: Arc<DbIdentityProvider>,
    _storage_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();
        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
                public_url: format!("http://{addr}"),
                album_upload_limit: 20 * 1024 * 1024,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_minutes: 60,
                bootstrap_admin: Some(BootstrapAdmin {
                    email: ADMIN_EMAIL.to_string(),
                    password: ADMIN_PASSWORD.to_string(),
                    display_name: Some("Överste".to_string()),
                }),
            },
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                root: PathBuf::from(storage_dir.path()),
                signing_secret: SIGNING_SECRET.to_string(),
                max_object_size: 10 * 1024 * 1024,
                signed_url_ttl_hours: 24,
                s3: None,
            },
            logging: LoggingConfig {
                level: "warn".to_string(),
            },
        };

        let db = mottagning_server::database::init_db(&app_config.database)
            .await
            .expect("Failed to initialize test database");

        let store = FilesystemObjectStore::new(
            app_config.storage.root.clone(),
            app_config.api_base_url(),
            SIGNING_SECRET,
            app_config.storage.max_object_size,
        )
        .await
        .expect("Failed to create object store");
        let signer = store.signer().clone();
        let store: Arc<dyn ObjectStore> = Arc::new(store);

        let identity = Arc::new(DbIdentityProvider::new(
            db.clone(),
            app_config.auth.jwt_secret.clone(),
            chrono::Duration::minutes(app_config.auth.token_ttl_minutes),
        ));
        if let Some(admin) = &app_config.auth.bootstrap_admin {
            mottagning_server::seed::ensure_bootstrap_admin(&db, identity.as_ref(), admin)
                .await
                .expect("Failed to create bootstrap admin");
        }

        let state = AppState {
            db: db.clone(),
            store: store.clone(),
            identity: identity.clone(),
            config: app_config,
            url_signer: Some(signer),
        };

        let app = mottagning_server::build_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            store,
            identity,
            _storage_dir: storage_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A signer with the server's secret, for forging URLs in tests.
    pub fn signer(&self) -> UrlSigner {
        UrlSigner::new(SIGNING_SECRET).unwrap()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Create a plain member and return `(uid, token)`.
    pub async fn member(&self, email: &str) -> (String, String) {
        let record = self
            .identity
            .create_user(NewIdentity {
                email: email.to_string(),
                password: "member-password".to_string(),
                ..Default::default()
            })
            .await
            .expect("Failed to create member");
        let token = self.login(email, "member-password").await;
        (record.uid, token)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .post_without_token(
                routes::LOGIN,
                &serde_json::json!({"email": email, "password": password}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        self.get_url(&self.url(path)).await
    }

    /// GET an absolute URL, e.g. one handed out by the object store.
    pub async fn get_url(&self, url: &str) -> TestResponse {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_bytes_with_token(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_json_with_token(
        &self,
        path: &str,
        body: &Value,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Upload an album. `pages` are `(file name, bytes)` pairs sent as
    /// `images[]` parts with content type `image/png`.
    pub async fn upload_album(
        &self,
        pdf_name: &str,
        display_name: Option<&str>,
        pages: &[(&str, &[u8])],
        token: &str,
    ) -> TestResponse {
        let mut form = reqwest::multipart::Form::new().text("pdfName", pdf_name.to_string());
        if let Some(display_name) = display_name {
            form = form.text("displayName", display_name.to_string());
        }
        for (name, bytes) in pages {
            let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                .file_name(name.to_string())
                .mime_str("image/png")
                .expect("Failed to set MIME type");
            form = form.part("images[]", part);
        }

        let res = self
            .client
            .post(self.url(routes::ALBUMS))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Create an event via the API and return its id.
    pub async fn create_event(&self, token: &str, name: &str, event_date: &str) -> String {
        let res = self
            .post_with_token(routes::EVENTS, &event_body(name, event_date), token)
            .await;
        assert_eq!(res.status, 201, "create_event failed: {}", res.text);
        res.body["eventId"]
            .as_str()
            .expect("Response should contain eventId")
            .to_string()
    }
}

/// A complete create-event body with a WebP thumbnail.
pub fn event_body(name: &str, event_date: &str) -> Value {
    use base64::Engine;
    serde_json::json!({
        "name": name,
        "driveUrl": "https://drive.google.com/drive/folders/abc",
        "thumbnailData": format!(
            "data:image/webp;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(TINY_WEBP)
        ),
        "thumbnailFileName": "Omslag bild.jpg",
        "eventDate": event_date,
    })
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}
