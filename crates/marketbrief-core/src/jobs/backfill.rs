use std::sync::Arc;
use std::time::Duration;

use super::queue::ThrottledQueue;
use super::stats::MaintenanceStats;
use crate::ai::{GenerativeServices, Outcome};
use crate::config::MaintenanceConfig;
use crate::feed::Article;
use crate::storage::ArticleStore;
use crate::Result;

enum BackfillResult {
    Filled,
    Absent,
    Failed,
}

/// Generates missing secondary summaries for stored articles through a throttled queue
pub struct BackfillJob {
    store: Arc<dyn ArticleStore>,
    services: Arc<GenerativeServices>,
    queue: ThrottledQueue,
}

impl BackfillJob {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        services: Arc<GenerativeServices>,
        config: &MaintenanceConfig,
    ) -> Self {
        Self {
            store,
            services,
            queue: ThrottledQueue::new(config.concurrency, Duration::from_millis(config.pause_ms)),
        }
    }

    pub async fn run(&self, limit: Option<usize>) -> Result<MaintenanceStats> {
        let articles = self.store.find_missing_secondary_summary(limit).await?;
        let mut stats = MaintenanceStats {
            candidates: articles.len(),
            ..Default::default()
        };
        tracing::info!(
            candidates = stats.candidates,
            concurrency = self.queue.concurrency(),
            language = self.services.localizer.language(),
            "Backfilling secondary summaries"
        );

        let results = self
            .queue
            .run(articles, |article| {
                let store = Arc::clone(&self.store);
                let services = Arc::clone(&self.services);
                async move { fill_one(store.as_ref(), &services, article).await }
            })
            .await;

        for result in results {
            match result {
                BackfillResult::Filled => stats.updated += 1,
                BackfillResult::Absent => stats.skipped += 1,
                BackfillResult::Failed => stats.failed += 1,
            }
        }

        tracing::info!("Backfill finished: {}", stats);
        Ok(stats)
    }
}

async fn fill_one(store: &dyn ArticleStore, services: &GenerativeServices, article: Article) -> BackfillResult {
    let text = match services.localizer.localize(&article.title, &article.summary).await {
        Outcome::Present(text) => text,
        Outcome::Absent(reason) => {
            tracing::debug!(link = %article.source_link, %reason, "Secondary summary still absent");
            return BackfillResult::Absent;
        }
    };

    match store.update_secondary_summary(article.id, &text).await {
        Ok(()) => BackfillResult::Filled,
        Err(e) => {
            tracing::warn!(link = %article.source_link, "Failed to store secondary summary: {}", e);
            BackfillResult::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::feed::{Category, FeedSource, RelevanceFilter};
    use crate::jobs::IngestJob;
    use crate::storage::{ArticleRepository, Database};
    use crate::testing::{raw_item, StubFeedReader, StubProvider};

    fn services(provider: StubProvider) -> Arc<GenerativeServices> {
        let mut config = AppConfig::default();
        config.ai.min_call_interval_ms = 0;
        Arc::new(GenerativeServices::with_provider(Arc::new(provider), &config))
    }

    fn fast_queue() -> MaintenanceConfig {
        MaintenanceConfig {
            pause_ms: 0,
            concurrency: 2,
        }
    }

    #[tokio::test]
    async fn test_backfill_after_failed_localization() {
        let repo = Arc::new(ArticleRepository::new(Database::new_in_memory().await.unwrap()));
        let source = FeedSource::new("https://a.example.com/rss", "Wire A", Category::Ipo);
        let reader = StubFeedReader::default().with_items(
            &source.url,
            vec![raw_item(
                "Swiggy IPO subscribed 3 times",
                "https://a.example.com/swiggy",
                "The Swiggy IPO was subscribed three times on the final day of bidding.",
            )],
        );

        // First run: the text service is down
        let mut ingest = IngestJob::new(
            Arc::new(reader),
            RelevanceFilter::new(["ipo"]),
            Some(services(StubProvider::failing("service unavailable"))),
            1,
        );
        let store: Arc<dyn ArticleStore> = repo.clone();
        ingest.run(async { Ok(store) }, &[source]).await.unwrap();

        let before = repo
            .find_by_source_link("https://a.example.com/swiggy")
            .await
            .unwrap()
            .unwrap();
        assert!(before.secondary_summary.is_none());

        // Later backfill with a healthy service
        let job = BackfillJob::new(
            repo.clone(),
            services(StubProvider::replying("Swiggy ka IPO teen guna subscribe hua.")),
            &fast_queue(),
        );
        let stats = job.run(None).await.unwrap();
        assert_eq!((stats.candidates, stats.updated), (1, 1));

        let after = repo
            .find_by_source_link("https://a.example.com/swiggy")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.secondary_summary.as_deref(), Some("Swiggy ka IPO teen guna subscribe hua."));
        assert_eq!(after.summary, before.summary);
        assert_eq!(after.source_link, before.source_link);
        assert_eq!(after.id, before.id);
    }

    #[tokio::test]
    async fn test_failed_localization_leaves_article_pending() {
        let repo = Arc::new(ArticleRepository::new(Database::new_in_memory().await.unwrap()));
        repo.upsert(&crate::feed::NewArticle {
            source_link: "https://example.com/a".to_string(),
            title: "Sensex slips".to_string(),
            source_name: "Test Wire".to_string(),
            category: Category::Market,
            content: None,
            summary: "Sensex slipped 200 points.".to_string(),
            secondary_summary: None,
            thumbnail: None,
            published_at: chrono::Utc::now(),
            tags: Vec::new(),
        })
        .await
        .unwrap();

        let provider = StubProvider::failing("quota exceeded");
        let job = BackfillJob::new(repo.clone(), services(provider), &fast_queue());
        let stats = job.run(None).await.unwrap();

        assert_eq!((stats.updated, stats.skipped), (0, 1));
        assert_eq!(repo.find_missing_secondary_summary(None).await.unwrap().len(), 1);
    }
}
