mod article_repo;
mod database;
mod retry;

use async_trait::async_trait;
use uuid::Uuid;

use crate::feed::{Article, NewArticle};
use crate::Result;

pub use article_repo::ArticleRepository;
pub use database::Database;

/// Result of writing an article keyed by its source link
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Inserted(Article),
    /// A row with the same source link was already stored
    Existing,
}

/// Persistence operations used by the ingestion and maintenance jobs
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn exists(&self, source_link: &str) -> Result<bool>;

    /// Insert, or on conflict only fill a missing thumbnail
    async fn upsert(&self, article: &NewArticle) -> Result<UpsertOutcome>;

    async fn find_by_source_link(&self, source_link: &str) -> Result<Option<Article>>;

    /// Articles whose secondary summary is absent or blank, newest first
    async fn find_missing_secondary_summary(&self, limit: Option<usize>) -> Result<Vec<Article>>;

    /// Articles whose summary exceeds `max_words`, newest first
    async fn find_over_length_summaries(
        &self,
        max_words: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Article>>;

    async fn update_summary(&self, id: Uuid, summary: &str) -> Result<()>;

    async fn update_secondary_summary(&self, id: Uuid, secondary_summary: &str) -> Result<()>;
}
