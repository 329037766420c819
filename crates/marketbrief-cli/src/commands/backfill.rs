use std::sync::Arc;

use anyhow::Result;

use marketbrief_core::ai::GenerativeServices;
use marketbrief_core::jobs::BackfillJob;
use marketbrief_core::AppConfig;

use super::connect_store;

pub async fn run(config: &AppConfig, limit: Option<usize>) -> Result<()> {
    let Some(services) = GenerativeServices::from_config(config)? else {
        println!("Generative services unavailable; nothing to backfill.");
        return Ok(());
    };

    let store = connect_store(config).await?;
    let job = BackfillJob::new(store, Arc::new(services), &config.maintenance);
    let stats = job.run(limit).await?;

    println!(
        "Filled {} of {} missing secondary summaries ({} still pending).",
        stats.updated,
        stats.candidates,
        stats.skipped + stats.failed
    );

    Ok(())
}
