use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_path).await?;
        db::bootstrap(&db).await?;
        Ok(Self { db, config })
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// In-memory state for tests. A single connection keeps every query on
    /// the same `:memory:` database.
    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::JwtConfig;
        use sqlx::sqlite::SqlitePoolOptions;

        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        db::bootstrap(&db).await.expect("bootstrap schema");

        let config = Arc::new(AppConfig {
            database_path: ":memory:".into(),
            jwt: JwtConfig {
                secret: "unit-test-secret-unit-test-secret!!!".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
        });
        Self { db, config }
    }
}
