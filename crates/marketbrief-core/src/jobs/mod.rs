//! Batch jobs: the ingestion run and the two maintenance passes over stored articles.

mod backfill;
mod ingest;
mod queue;
mod stats;
mod word_cap;

pub use backfill::BackfillJob;
pub use ingest::{IngestJob, RunState};
pub use queue::ThrottledQueue;
pub use stats::{FeedStats, MaintenanceStats, RunStats};
pub use word_cap::WordCapJob;
