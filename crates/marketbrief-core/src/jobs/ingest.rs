use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;

use super::stats::{FeedStats, RunStats};
use crate::ai::{GenerativeServices, Outcome};
use crate::config::AppConfig;
use crate::feed::{FeedFetcher, FeedReader, FeedSource, NewArticle, RawItem, RelevanceFilter};
use crate::storage::{ArticleStore, UpsertOutcome};
use crate::summary::{clean_text, summarize};
use crate::Result;

/// Lifecycle of one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ConnectingStore,
    Processing,
    Reporting,
    Done,
    /// The store could not be reached; nothing was processed
    FatalAborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ConnectingStore => "connecting-store",
            Self::Processing => "processing",
            Self::Reporting => "reporting",
            Self::Done => "done",
            Self::FatalAborted => "fatal-aborted",
        };
        f.write_str(name)
    }
}

/// What happened to a single feed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemDisposition {
    Invalid,
    Filtered,
    Duplicate,
    Inserted { localized: bool, image: bool },
    Failed,
}

/// Shared, read-only collaborators handed to every feed worker
struct FeedContext {
    store: Arc<dyn ArticleStore>,
    reader: Arc<dyn FeedReader>,
    filter: RelevanceFilter,
    services: Option<Arc<GenerativeServices>>,
}

/// Batch orchestrator: fetch, filter, dedupe, summarize, enrich and persist
pub struct IngestJob {
    reader: Arc<dyn FeedReader>,
    filter: RelevanceFilter,
    services: Option<Arc<GenerativeServices>>,
    concurrency: usize,
    state: RunState,
}

impl IngestJob {
    pub fn new(
        reader: Arc<dyn FeedReader>,
        filter: RelevanceFilter,
        services: Option<Arc<GenerativeServices>>,
        concurrency: usize,
    ) -> Self {
        Self {
            reader,
            filter,
            services,
            concurrency: concurrency.max(1),
            state: RunState::Idle,
        }
    }

    /// Wire the HTTP fetcher and keyword filter from configuration
    pub fn from_config(config: &AppConfig, services: Option<Arc<GenerativeServices>>) -> Result<Self> {
        let reader: Arc<dyn FeedReader> = Arc::new(FeedFetcher::new(config)?);
        Ok(Self::new(
            reader,
            RelevanceFilter::new(&config.filter.keywords),
            services,
            config.sync.feed_concurrency,
        ))
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "Ingest state change");
        self.state = next;
    }

    /// Run one batch over `feeds`. Only a store connection failure is returned as an error;
    /// every per-feed and per-item failure is counted in the returned statistics.
    pub async fn run<C>(&mut self, connect: C, feeds: &[FeedSource]) -> Result<RunStats>
    where
        C: Future<Output = Result<Arc<dyn ArticleStore>>>,
    {
        self.transition(RunState::ConnectingStore);
        let store = match connect.await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("Aborting run, article store unavailable: {}", e);
                self.transition(RunState::FatalAborted);
                return Err(e);
            }
        };

        self.transition(RunState::Processing);
        tracing::info!(
            feeds = feeds.len(),
            concurrency = self.concurrency,
            generative = self.services.is_some(),
            "Starting ingestion run"
        );

        let ctx = Arc::new(FeedContext {
            store,
            reader: Arc::clone(&self.reader),
            filter: self.filter.clone(),
            services: self.services.clone(),
        });
        let stats = process_feeds(ctx, feeds, self.concurrency).await;

        self.transition(RunState::Reporting);
        stats.log();

        self.transition(RunState::Done);
        Ok(stats)
    }
}

/// Worker pool over feeds; at most `concurrency` feeds are in flight
async fn process_feeds(ctx: Arc<FeedContext>, feeds: &[FeedSource], concurrency: usize) -> RunStats {
    let mut join_set: JoinSet<(String, FeedStats)> = JoinSet::new();
    let mut pending = feeds.iter().cloned();
    let mut run = RunStats::default();

    fn spawn_feed(join_set: &mut JoinSet<(String, FeedStats)>, ctx: Arc<FeedContext>, source: FeedSource) {
        join_set.spawn(async move {
            let name = source.name.clone();
            // The inner task isolates a panic so the feed still gets a stats entry
            let worker = tokio::spawn(async move { process_feed(&ctx, &source).await });
            let stats = match worker.await {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::error!(feed = %name, "Feed worker failed to complete: {}", e);
                    FeedStats {
                        fetch_error: Some(format!("feed worker failed: {}", e)),
                        ..Default::default()
                    }
                }
            };
            (name, stats)
        });
    }

    for _ in 0..concurrency {
        if let Some(source) = pending.next() {
            spawn_feed(&mut join_set, Arc::clone(&ctx), source);
        }
    }

    while let Some(result) = join_set.join_next().await {
        match result {
            Ok((name, stats)) => run.record(&name, stats),
            Err(e) => tracing::error!("Feed worker failed to complete: {}", e),
        }

        if let Some(source) = pending.next() {
            spawn_feed(&mut join_set, Arc::clone(&ctx), source);
        }
    }

    // Report in registry order regardless of completion order
    run.feeds
        .sort_by_key(|(name, _)| feeds.iter().position(|f| &f.name == name));
    run
}

async fn process_feed(ctx: &FeedContext, source: &FeedSource) -> FeedStats {
    let mut stats = FeedStats::default();

    let items = match ctx.reader.fetch(source).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(feed = %source.name, url = %source.url, "Fetch failed: {}", e);
            stats.fetch_error = Some(e.to_string());
            return stats;
        }
    };

    stats.fetched = items.len();
    tracing::debug!(feed = %source.name, items = items.len(), "Fetched feed");

    for item in items {
        match process_item(ctx, source, item).await {
            ItemDisposition::Invalid => stats.invalid += 1,
            ItemDisposition::Filtered => stats.filtered += 1,
            ItemDisposition::Duplicate => stats.duplicates += 1,
            ItemDisposition::Failed => stats.failed += 1,
            ItemDisposition::Inserted { localized, image } => {
                stats.inserted += 1;
                stats.localized += usize::from(localized);
                stats.images += usize::from(image);
            }
        }
    }

    stats
}

async fn process_item(ctx: &FeedContext, source: &FeedSource, item: RawItem) -> ItemDisposition {
    let link = match item.link.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(link) => link.to_string(),
        None => return ItemDisposition::Invalid,
    };
    let title = item.title.trim().to_string();
    if title.is_empty() {
        return ItemDisposition::Invalid;
    }

    if !ctx.filter.is_relevant(&title, &item.body) {
        return ItemDisposition::Filtered;
    }

    match ctx.store.exists(&link).await {
        Ok(true) => return ItemDisposition::Duplicate,
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(link = %link, "Duplicate check failed: {}", e);
            return ItemDisposition::Failed;
        }
    }

    let mut summary = summarize(&item.body);
    if summary.is_empty() {
        summary = summarize(&title);
    }
    if summary.is_empty() {
        return ItemDisposition::Invalid;
    }

    let (secondary, synthesized) = match ctx.services.as_deref() {
        Some(services) => {
            let image = async {
                match (&services.images, &item.image_url) {
                    (Some(images), None) => Some(images.synthesize(&title, source.category).await),
                    _ => None,
                }
            };
            let (secondary, image) = tokio::join!(services.localizer.localize(&title, &summary), image);
            (secondary.into_option(), image.and_then(Outcome::into_option))
        }
        None => (None, None),
    };

    let localized = secondary.is_some();
    let image = synthesized.is_some();

    let article = NewArticle {
        source_link: link,
        title,
        source_name: source.name.clone(),
        category: source.category,
        content: Some(clean_text(&item.body)).filter(|c| !c.is_empty()),
        summary,
        secondary_summary: secondary,
        thumbnail: item.image_url.or(synthesized),
        published_at: item.published_at.unwrap_or_else(Utc::now),
        tags: item.tags,
    };

    match ctx.store.upsert(&article).await {
        Ok(UpsertOutcome::Inserted(stored)) => {
            tracing::debug!(id = %stored.id, link = %stored.source_link, "Stored article");
            ItemDisposition::Inserted { localized, image }
        }
        Ok(UpsertOutcome::Existing) => ItemDisposition::Duplicate,
        Err(e) => {
            tracing::warn!(link = %article.source_link, "Failed to store article: {}", e);
            ItemDisposition::Failed
        }
    }
}
