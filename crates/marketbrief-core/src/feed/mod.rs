mod fetcher;
mod filter;
mod models;
mod parser;

pub use fetcher::FeedFetcher;
pub use filter::RelevanceFilter;
pub use models::{Article, Category, FeedSource, NewArticle, RawItem};
pub use parser::parse_feed;

use crate::Result;

/// Source of raw feed items, one feed at a time
#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    /// Fetch and parse a single feed
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawItem>>;
}
