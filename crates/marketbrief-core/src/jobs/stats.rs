use std::fmt;

/// Counters for one feed in an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub fetched: usize,
    /// Rejected by the relevance filter
    pub filtered: usize,
    /// Source link already stored
    pub duplicates: usize,
    /// Missing link or title
    pub invalid: usize,
    pub inserted: usize,
    pub localized: usize,
    pub images: usize,
    /// Per-item store failures
    pub failed: usize,
    pub fetch_error: Option<String>,
}

impl FeedStats {
    fn absorb(&mut self, other: &FeedStats) {
        self.fetched += other.fetched;
        self.filtered += other.filtered;
        self.duplicates += other.duplicates;
        self.invalid += other.invalid;
        self.inserted += other.inserted;
        self.localized += other.localized;
        self.images += other.images;
        self.failed += other.failed;
    }
}

impl fmt::Display for FeedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={} filtered={} duplicate={} invalid={} inserted={} localized={} images={} failed={}",
            self.fetched,
            self.filtered,
            self.duplicates,
            self.invalid,
            self.inserted,
            self.localized,
            self.images,
            self.failed
        )
    }
}

/// Per-feed and total counters of an ingestion run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub feeds: Vec<(String, FeedStats)>,
}

impl RunStats {
    pub fn record(&mut self, feed_name: &str, stats: FeedStats) {
        self.feeds.push((feed_name.to_string(), stats));
    }

    pub fn totals(&self) -> FeedStats {
        let mut totals = FeedStats::default();
        for (_, stats) in &self.feeds {
            totals.absorb(stats);
        }
        totals
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|(_, s)| s.fetch_error.is_some()).count()
    }

    pub fn get(&self, feed_name: &str) -> Option<&FeedStats> {
        self.feeds
            .iter()
            .find(|(name, _)| name == feed_name)
            .map(|(_, stats)| stats)
    }

    /// Write the run statistics to the operational log
    pub fn log(&self) {
        for (name, stats) in &self.feeds {
            match &stats.fetch_error {
                Some(error) => tracing::warn!(feed = %name, error = %error, "Feed skipped"),
                None => tracing::info!(feed = %name, "{}", stats),
            }
        }
        tracing::info!(
            feeds = self.feeds.len(),
            unreachable = self.failed_feeds(),
            "Run totals: {}",
            self.totals()
        );
    }
}

/// Counters for a maintenance pass over stored articles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceStats {
    pub candidates: usize,
    pub updated: usize,
    /// Left unchanged, e.g. the service returned nothing usable
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for MaintenanceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates={} updated={} skipped={} failed={}",
            self.candidates, self.updated, self.skipped, self.failed
        )
    }
}
