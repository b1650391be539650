use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mottagning_server::config::AppConfig;
use mottagning_server::identity::DbIdentityProvider;
use mottagning_server::state::{AppState, build_object_store};
use mottagning_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let db = database::init_db(&config.database)
        .await
        .context("Failed to connect to the database")?;
    info!("Database ready");

    let (store, url_signer) = build_object_store(&config)
        .await
        .context("Failed to initialize object storage")?;
    info!(backend = ?config.storage.backend, "Object storage ready");

    let identity = Arc::new(DbIdentityProvider::new(
        db.clone(),
        config.auth.jwt_secret.clone(),
        chrono::Duration::minutes(config.auth.token_ttl_minutes),
    ));

    if let Some(admin) = &config.auth.bootstrap_admin {
        seed::ensure_bootstrap_admin(&db, identity.as_ref(), admin)
            .await
            .context("Failed to create the bootstrap admin")?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        store,
        identity,
        config,
        url_signer,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
