use anyhow::Result;

use marketbrief_core::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    println!("Feeds ({}):\n", config.feeds.len());

    for feed in &config.feeds {
        println!("  {} [{}]", feed.name, feed.category);
        println!("    URL: {}", feed.url);
    }

    println!("\nKeywords: {}", config.filter.keywords.join(", "));

    Ok(())
}
