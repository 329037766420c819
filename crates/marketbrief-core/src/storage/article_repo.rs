use async_trait::async_trait;
use futures::TryStreamExt;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::retry::with_retry;
use super::{ArticleStore, Database, UpsertOutcome};
use crate::feed::{Article, Category, NewArticle};
use crate::summary::word_count;
use crate::{Error, Result};

const ARTICLE_COLUMNS: &str = "id, source_link, title, source_name, category, content, summary, \
     secondary_summary, thumbnail, tags, published_at, fetched_at";

/// SQLite-backed article store
#[derive(Clone)]
pub struct ArticleRepository {
    db: Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: String,
    source_link: String,
    title: String,
    source_name: String,
    category: String,
    content: Option<String>,
    summary: String,
    secondary_summary: Option<String>,
    thumbnail: Option<String>,
    tags: String,
    published_at: DateTime<Utc>,
    fetched_at: DateTime<Utc>,
}

impl ArticleRow {
    /// Convert to an article, skipping rows whose id is not a UUID
    fn into_article(self) -> Option<Article> {
        let row = self;
        let id = match Uuid::parse_str(&row.id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(id = %row.id, link = %row.source_link, "Skipping article with corrupt id: {}", e);
                return None;
            }
        };

        let category = row.category.parse().unwrap_or_else(|_| {
            tracing::warn!(category = %row.category, link = %row.source_link, "Unknown stored category");
            Category::General
        });

        Some(Article {
            id,
            source_link: row.source_link,
            title: row.title,
            source_name: row.source_name,
            category,
            content: row.content,
            summary: row.summary,
            secondary_summary: row.secondary_summary,
            thumbnail: row.thumbnail,
            published_at: row.published_at,
            fetched_at: row.fetched_at,
            tags: serde_json::from_str(&row.tags).unwrap_or_default(),
        })
    }
}

impl ArticleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        let pool = self.db.pool();
        let id = id.to_string();
        let sql = format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS);

        let row: Option<ArticleRow> = with_retry("find_by_id", || {
            sqlx::query_as(&sql).bind(id.as_str()).fetch_optional(pool)
        })
        .await?;

        Ok(row.and_then(ArticleRow::into_article))
    }

    /// Total number of stored articles
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

/// SQL expression removing every character that can separate two counted words
fn strip_separators_sql(column: &str) -> String {
    let mut expr = column.to_string();
    for separator in [
        "' '", "char(9)", "char(10)", "char(11)", "char(12)", "char(13)", "char(160)", "'-'", "'/'",
        "'–'", "'—'",
    ] {
        expr = format!("REPLACE({}, {}, '')", expr, separator);
    }
    expr
}

fn require_summary(summary: &str, link: &str) -> Result<()> {
    if summary.trim().is_empty() {
        return Err(Error::Other(format!("refusing to store empty summary for {}", link)));
    }
    Ok(())
}

#[async_trait]
impl ArticleStore for ArticleRepository {
    async fn exists(&self, source_link: &str) -> Result<bool> {
        let pool = self.db.pool();

        let found: Option<i64> = with_retry("exists", || {
            sqlx::query_scalar("SELECT 1 FROM articles WHERE source_link = ? LIMIT 1")
                .bind(source_link)
                .fetch_optional(pool)
        })
        .await?;

        Ok(found.is_some())
    }

    async fn upsert(&self, article: &NewArticle) -> Result<UpsertOutcome> {
        require_summary(&article.summary, &article.source_link)?;

        let pool = self.db.pool();
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let tags = serde_json::to_string(&article.tags)?;
        let category = article.category.as_str();
        let now = Utc::now();

        // The unique index on source_link turns a lost race into a no-op insert
        let result = with_retry("insert_article", || {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO articles
                (id, source_link, title, source_name, category, content, summary,
                 secondary_summary, thumbnail, tags, published_at, fetched_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id_str.as_str())
            .bind(article.source_link.as_str())
            .bind(article.title.as_str())
            .bind(article.source_name.as_str())
            .bind(category)
            .bind(article.content.as_deref())
            .bind(article.summary.as_str())
            .bind(article.secondary_summary.as_deref())
            .bind(article.thumbnail.as_deref())
            .bind(tags.as_str())
            .bind(article.published_at)
            .bind(now)
            .execute(pool)
        })
        .await?;

        if result.rows_affected() > 0 {
            return match self.find_by_id(id).await? {
                Some(stored) => Ok(UpsertOutcome::Inserted(stored)),
                None => Err(Error::Other(format!("inserted article {} not readable", id))),
            };
        }

        // Existing row: only a missing thumbnail may be filled in
        if let Some(thumbnail) = article.thumbnail.as_deref() {
            with_retry("fill_thumbnail", || {
                sqlx::query(
                    "UPDATE articles SET thumbnail = COALESCE(thumbnail, ?) WHERE source_link = ?",
                )
                .bind(thumbnail)
                .bind(article.source_link.as_str())
                .execute(pool)
            })
            .await?;
        }

        Ok(UpsertOutcome::Existing)
    }

    async fn find_by_source_link(&self, source_link: &str) -> Result<Option<Article>> {
        let pool = self.db.pool();
        let sql = format!("SELECT {} FROM articles WHERE source_link = ?", ARTICLE_COLUMNS);

        let row: Option<ArticleRow> = with_retry("find_by_source_link", || {
            sqlx::query_as(&sql).bind(source_link).fetch_optional(pool)
        })
        .await?;

        Ok(row.and_then(ArticleRow::into_article))
    }

    async fn find_missing_secondary_summary(&self, limit: Option<usize>) -> Result<Vec<Article>> {
        let pool = self.db.pool();
        let limit = limit.map_or(-1, |n| n as i64);
        let sql = format!(
            r#"
            SELECT {} FROM articles
            WHERE secondary_summary IS NULL OR TRIM(secondary_summary) = ''
            ORDER BY published_at DESC
            LIMIT ?
            "#,
            ARTICLE_COLUMNS
        );

        let rows: Vec<ArticleRow> = with_retry("find_missing_secondary_summary", || {
            sqlx::query_as(&sql).bind(limit).fetch_all(pool)
        })
        .await?;

        Ok(rows.into_iter().filter_map(ArticleRow::into_article).collect())
    }

    async fn find_over_length_summaries(
        &self,
        max_words: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Article>> {
        let limit = limit.unwrap_or(usize::MAX);
        if limit == 0 {
            return Ok(Vec::new());
        }

        // More than N words needs at least N separators between or inside tokens,
        // so this prefilter keeps every candidate; the exact count is done in Rust
        let sql = format!(
            r#"
            SELECT {} FROM articles
            WHERE LENGTH(summary) - LENGTH({}) >= ?
            ORDER BY published_at DESC
            "#,
            ARTICLE_COLUMNS,
            strip_separators_sql("summary")
        );
        let min_separators = max_words.saturating_sub(1) as i64;

        let mut rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(min_separators)
            .fetch(self.db.pool());

        let mut found = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let Some(article) = row.into_article() else {
                continue;
            };
            if word_count(&article.summary) > max_words {
                found.push(article);
                if found.len() >= limit {
                    break;
                }
            }
        }

        Ok(found)
    }

    async fn update_summary(&self, id: Uuid, summary: &str) -> Result<()> {
        require_summary(summary, &id.to_string())?;

        let pool = self.db.pool();
        let id = id.to_string();
        let now = Utc::now();

        let result = with_retry("update_summary", || {
            sqlx::query("UPDATE articles SET summary = ?, summary_updated_at = ? WHERE id = ?")
                .bind(summary)
                .bind(now)
                .bind(id.as_str())
                .execute(pool)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Other(format!("no stored article with id {}", id)));
        }

        Ok(())
    }

    async fn update_secondary_summary(&self, id: Uuid, secondary_summary: &str) -> Result<()> {
        let pool = self.db.pool();
        let id = id.to_string();
        let now = Utc::now();

        let result = with_retry("update_secondary_summary", || {
            sqlx::query(
                r#"
                UPDATE articles
                SET secondary_summary = ?, secondary_summary_updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(secondary_summary)
            .bind(now)
            .bind(id.as_str())
            .execute(pool)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Other(format!("no stored article with id {}", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_article(link: &str, summary: &str) -> NewArticle {
        NewArticle {
            source_link: link.to_string(),
            title: "Sensex climbs 500 points".to_string(),
            source_name: "Test Wire".to_string(),
            category: Category::Market,
            content: Some("Full body of the story.".to_string()),
            summary: summary.to_string(),
            secondary_summary: None,
            thumbnail: None,
            published_at: Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap(),
            tags: vec!["markets".to_string(), "sensex".to_string()],
        }
    }

    async fn repo() -> ArticleRepository {
        ArticleRepository::new(Database::new_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_then_read_back() {
        let repo = repo().await;
        let outcome = repo
            .upsert(&new_article("https://example.com/a", "Sensex climbed."))
            .await
            .unwrap();

        let UpsertOutcome::Inserted(stored) = outcome else {
            panic!("expected insert");
        };
        assert_eq!(stored.category, Category::Market);
        assert_eq!(stored.tags, vec!["markets", "sensex"]);
        assert!(repo.exists("https://example.com/a").await.unwrap());
        assert!(!repo.exists("https://example.com/b").await.unwrap());

        let found = repo.find_by_source_link("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn test_conflict_only_fills_missing_thumbnail() {
        let repo = repo().await;
        repo.upsert(&new_article("https://example.com/a", "Original summary."))
            .await
            .unwrap();

        let mut again = new_article("https://example.com/a", "A different summary.");
        again.thumbnail = Some("https://img.example.com/1.jpg".to_string());
        let outcome = repo.upsert(&again).await.unwrap();
        assert!(matches!(outcome, UpsertOutcome::Existing));

        let stored = repo.find_by_source_link("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(stored.summary, "Original summary.");
        assert_eq!(stored.thumbnail.as_deref(), Some("https://img.example.com/1.jpg"));

        again.thumbnail = Some("https://img.example.com/2.jpg".to_string());
        repo.upsert(&again).await.unwrap();
        let stored = repo.find_by_source_link("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(stored.thumbnail.as_deref(), Some("https://img.example.com/1.jpg"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_summary_rejected() {
        let repo = repo().await;
        let result = repo.upsert(&new_article("https://example.com/a", "  ")).await;
        assert!(result.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_secondary_summary_query() {
        let repo = repo().await;
        let mut with_secondary = new_article("https://example.com/a", "Done.");
        with_secondary.secondary_summary = Some("Ho gaya.".to_string());
        repo.upsert(&with_secondary).await.unwrap();

        let mut blank = new_article("https://example.com/b", "Blank.");
        blank.secondary_summary = Some("   ".to_string());
        repo.upsert(&blank).await.unwrap();
        repo.upsert(&new_article("https://example.com/c", "Missing."))
            .await
            .unwrap();

        let pending = repo.find_missing_secondary_summary(None).await.unwrap();
        let mut links: Vec<_> = pending.iter().map(|a| a.source_link.as_str()).collect();
        links.sort();
        assert_eq!(links, vec!["https://example.com/b", "https://example.com/c"]);

        assert_eq!(repo.find_missing_secondary_summary(Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_over_length_query_and_updates() {
        let repo = repo().await;
        let long = "word ".repeat(75).trim_end().to_string() + ".";
        repo.upsert(&new_article("https://example.com/long", &long))
            .await
            .unwrap();
        repo.upsert(&new_article("https://example.com/short", "Short one."))
            .await
            .unwrap();

        let over = repo.find_over_length_summaries(60, None).await.unwrap();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].source_link, "https://example.com/long");

        repo.update_summary(over[0].id, "Trimmed.").await.unwrap();
        repo.update_secondary_summary(over[0].id, "Chhota kar diya.")
            .await
            .unwrap();
        assert!(repo.find_over_length_summaries(60, None).await.unwrap().is_empty());

        let stored = repo
            .find_by_source_link("https://example.com/long")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.summary, "Trimmed.");
        assert_eq!(stored.secondary_summary.as_deref(), Some("Chhota kar diya."));
        assert!(repo.update_summary(stored.id, "").await.is_err());
    }

    #[tokio::test]
    async fn test_over_length_query_counts_compound_parts_and_stops_at_limit() {
        let repo = repo().await;
        let hyphenated = vec!["ab"; 61].join("-");
        let mut newer = new_article("https://example.com/hyphenated", &hyphenated);
        newer.published_at = Utc.with_ymd_and_hms(2024, 7, 2, 9, 30, 0).unwrap();
        repo.upsert(&newer).await.unwrap();
        let long = "word ".repeat(75).trim_end().to_string();
        repo.upsert(&new_article("https://example.com/long", &long))
            .await
            .unwrap();
        repo.upsert(&new_article("https://example.com/short", "Short one."))
            .await
            .unwrap();

        let over = repo.find_over_length_summaries(60, None).await.unwrap();
        assert_eq!(over.len(), 2);

        let limited = repo.find_over_length_summaries(60, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].source_link, "https://example.com/hyphenated");
        assert!(repo.find_over_length_summaries(60, Some(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rows_with_corrupt_id_are_skipped() {
        let repo = repo().await;
        repo.upsert(&new_article("https://example.com/good", &"word ".repeat(75)))
            .await
            .unwrap();
        sqlx::query(
            r#"
            INSERT INTO articles (id, source_link, title, source_name, category, summary, tags, published_at, fetched_at)
            VALUES ('not-a-uuid', 'https://example.com/corrupt', 'Corrupt', 'Test Wire', 'market', ?, '[]', ?, ?)
            "#,
        )
        .bind("word ".repeat(75))
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(repo.db.pool())
        .await
        .unwrap();

        let missing = repo.find_missing_secondary_summary(None).await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].source_link, "https://example.com/good");

        let over = repo.find_over_length_summaries(60, None).await.unwrap();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].source_link, "https://example.com/good");

        assert!(repo
            .find_by_source_link("https://example.com/corrupt")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_of_unknown_id_is_an_error() {
        let repo = repo().await;
        assert!(repo.update_summary(Uuid::new_v4(), "Trimmed.").await.is_err());
        assert!(repo
            .update_secondary_summary(Uuid::new_v4(), "Chhota kar diya.")
            .await
            .is_err());
    }
}
