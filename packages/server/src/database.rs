use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    // An in-memory SQLite database lives exactly as long as its connection.
    if config.url.starts_with("sqlite::memory:") {
        opt.max_connections(1);
    } else {
        opt.idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800));
    }

    let db = Database::connect(opt).await?;
    db.get_schema_registry("mottagning_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

#[cfg(test)]
pub(crate) async fn connect_for_tests() -> DatabaseConnection {
    init_db(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .unwrap()
}
