use std::sync::Arc;

use super::stats::MaintenanceStats;
use crate::feed::Article;
use crate::storage::ArticleStore;
use crate::summary::{summarize_with_limit, word_count, MAX_SUMMARY_WORDS};
use crate::Result;

/// Re-summarizes stored articles whose summary exceeds the word cap
pub struct WordCapJob {
    store: Arc<dyn ArticleStore>,
    max_words: usize,
}

impl WordCapJob {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self {
            store,
            max_words: MAX_SUMMARY_WORDS,
        }
    }

    /// Recompute from `content`, falling back to the stored summary when there is none
    fn recompute(&self, article: &Article) -> String {
        let source = article
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&article.summary);

        let summary = summarize_with_limit(source, self.max_words);
        if summary.is_empty() {
            summarize_with_limit(&article.summary, self.max_words)
        } else {
            summary
        }
    }

    pub async fn run(&self, limit: Option<usize>) -> Result<MaintenanceStats> {
        let articles = self
            .store
            .find_over_length_summaries(self.max_words, limit)
            .await?;

        let mut stats = MaintenanceStats {
            candidates: articles.len(),
            ..Default::default()
        };
        tracing::info!(candidates = stats.candidates, max_words = self.max_words, "Enforcing summary word cap");

        for article in articles {
            let summary = self.recompute(&article);
            if summary.is_empty() || word_count(&summary) > self.max_words {
                tracing::warn!(link = %article.source_link, "Could not produce a capped summary");
                stats.skipped += 1;
                continue;
            }

            match self.store.update_summary(article.id, &summary).await {
                Ok(()) => {
                    tracing::debug!(
                        link = %article.source_link,
                        before = word_count(&article.summary),
                        after = word_count(&summary),
                        "Summary shortened"
                    );
                    stats.updated += 1;
                }
                Err(e) => {
                    tracing::warn!(link = %article.source_link, "Failed to update summary: {}", e);
                    stats.failed += 1;
                }
            }
        }

        tracing::info!("Word cap pass finished: {}", stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Category, NewArticle};
    use crate::storage::{ArticleRepository, Database};
    use chrono::Utc;

    fn article(link: &str, summary: &str, content: Option<&str>) -> NewArticle {
        NewArticle {
            source_link: link.to_string(),
            title: "Nifty update".to_string(),
            source_name: "Test Wire".to_string(),
            category: Category::Market,
            content: content.map(str::to_string),
            summary: summary.to_string(),
            secondary_summary: None,
            thumbnail: None,
            published_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    fn long_text(sentences: usize) -> String {
        (0..sentences)
            .map(|n| format!("Nifty futures traded in a narrow band during session number {}.", n))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn test_only_over_length_summaries_change() {
        let repo = Arc::new(ArticleRepository::new(Database::new_in_memory().await.unwrap()));
        let short = "Nifty closed flat; metals gained while banks slipped.";
        repo.upsert(&article("https://example.com/short", short, Some(&long_text(20))))
            .await
            .unwrap();
        repo.upsert(&article("https://example.com/long", &long_text(12), Some(&long_text(20))))
            .await
            .unwrap();
        repo.upsert(&article("https://example.com/no-content", &long_text(9), None))
            .await
            .unwrap();

        let job = WordCapJob::new(repo.clone());
        let stats = job.run(None).await.unwrap();
        assert_eq!(stats.candidates, 2);
        assert_eq!(stats.updated, 2);

        let untouched = repo.find_by_source_link("https://example.com/short").await.unwrap().unwrap();
        assert_eq!(untouched.summary, short);

        for link in ["https://example.com/long", "https://example.com/no-content"] {
            let capped = repo.find_by_source_link(link).await.unwrap().unwrap();
            assert!(word_count(&capped.summary) <= MAX_SUMMARY_WORDS, "{}", capped.summary);
            assert!(capped.summary.starts_with("Nifty futures traded"));
        }

        let again = job.run(None).await.unwrap();
        assert_eq!(again.candidates, 0);
    }

    #[tokio::test]
    async fn test_limit_bounds_the_pass() {
        let repo = Arc::new(ArticleRepository::new(Database::new_in_memory().await.unwrap()));
        for n in 0..3 {
            repo.upsert(&article(&format!("https://example.com/{}", n), &long_text(10), None))
                .await
                .unwrap();
        }

        let stats = WordCapJob::new(repo.clone()).run(Some(2)).await.unwrap();
        assert_eq!(stats.updated, 2);
        assert_eq!(repo.find_over_length_summaries(MAX_SUMMARY_WORDS, None).await.unwrap().len(), 1);
    }
}
