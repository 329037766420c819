use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::AppConfig;
use crate::{Error, Result};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the configured store and run migrations.
    /// Any failure here is a [`Error::StoreConnection`] and aborts the job.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        if config.general.database_url.is_none() {
            // Ensure the data directory exists for the default file location
            let db_path = config.database_path();
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::StoreConnection(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }

        Self::connect_url(&config.database_url()).await
    }

    /// Connect to an explicit SQLite URL
    pub async fn connect_url(db_url: &str) -> Result<Self> {
        tracing::info!("Connecting to article store: {}", db_url);

        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(|e| Error::StoreConnection(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations()
            .await
            .map_err(|e| Error::StoreConnection(format!("migrations failed: {}", e)))?;

        Ok(db)
    }

    /// Create an in-memory database for testing
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        tracing::debug!("Running database migrations...");

        sqlx::query(MIGRATION_001_ARTICLES)
            .execute(&self.pool)
            .await?;

        sqlx::query(MIGRATION_INDEXES)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

const MIGRATION_001_ARTICLES: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id TEXT PRIMARY KEY,
    source_link TEXT NOT NULL,
    title TEXT NOT NULL,
    source_name TEXT NOT NULL,
    category TEXT NOT NULL,
    content TEXT,
    summary TEXT NOT NULL,
    secondary_summary TEXT,
    thumbnail TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    published_at DATETIME NOT NULL,
    fetched_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    summary_updated_at DATETIME,
    secondary_summary_updated_at DATETIME
)
"#;

const MIGRATION_INDEXES: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_source_link ON articles(source_link);
CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at DESC);
CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category)
"#;
