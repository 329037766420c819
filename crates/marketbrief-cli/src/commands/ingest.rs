use std::sync::Arc;

use anyhow::Result;

use marketbrief_core::ai::GenerativeServices;
use marketbrief_core::jobs::IngestJob;
use marketbrief_core::AppConfig;

use super::connect_store;

pub async fn run(config: &AppConfig) -> Result<()> {
    let services = GenerativeServices::from_config(config)?.map(Arc::new);
    let mut job = IngestJob::from_config(config, services)?;

    let stats = job.run(connect_store(config), &config.feeds).await?;

    let totals = stats.totals();
    println!(
        "Ingested {} new articles from {} feeds ({} unreachable).",
        totals.inserted,
        stats.feeds.len(),
        stats.failed_feeds()
    );

    Ok(())
}
