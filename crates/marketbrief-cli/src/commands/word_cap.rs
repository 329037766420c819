use anyhow::Result;

use marketbrief_core::jobs::WordCapJob;
use marketbrief_core::AppConfig;

use super::connect_store;

pub async fn run(config: &AppConfig, limit: Option<usize>) -> Result<()> {
    let store = connect_store(config).await?;
    let stats = WordCapJob::new(store).run(limit).await?;

    if stats.candidates == 0 {
        println!("All summaries are within the word cap.");
    } else {
        println!("Shortened {} of {} over-length summaries.", stats.updated, stats.candidates);
    }

    Ok(())
}
