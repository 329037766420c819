pub mod backfill;
pub mod feeds;
pub mod ingest;
pub mod word_cap;

use std::sync::Arc;

use marketbrief_core::storage::{ArticleRepository, ArticleStore, Database};
use marketbrief_core::AppConfig;

/// Open the configured article store; failure here aborts the command
pub async fn connect_store(config: &AppConfig) -> marketbrief_core::Result<Arc<dyn ArticleStore>> {
    let db = Database::connect(config).await?;
    Ok(Arc::new(ArticleRepository::new(db)))
}
