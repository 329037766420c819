use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::feed::{Category, FeedSource};

/// Environment variable overriding the store connection string
pub const DATABASE_URL_ENV: &str = "MARKETBRIEF_DATABASE_URL";
/// Environment variable holding the generative service credential
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    /// Feed registry, read-only for the lifetime of the process
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSource>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            ai: AiConfig::default(),
            sync: SyncConfig::default(),
            maintenance: MaintenanceConfig::default(),
            filter: FilterConfig::default(),
            feeds: default_feeds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (holds the SQLite file when no database_url is set)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Store connection string, e.g. "sqlite:/var/lib/marketbrief/articles.db"
    #[serde(default)]
    pub database_url: Option<String>,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_url: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Enable localization and image synthesis
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Enable cover image synthesis for items without a thumbnail
    #[serde(default = "default_true")]
    pub images_enabled: bool,
    /// OpenAI API key (falls back to OPENAI_API_KEY)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Alternative OpenAI-compatible endpoint
    #[serde(default)]
    pub openai_base_url: Option<String>,
    /// Chat model used for the secondary summary
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Image model used for cover images
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Secondary summary language (e.g., "Hindi", "Marathi")
    #[serde(default = "default_secondary_language")]
    pub secondary_language: String,
    /// Max tokens for the secondary summary
    #[serde(default = "default_max_tokens")]
    pub max_summary_tokens: u32,
    /// Timeout for a single generative call in seconds
    #[serde(default = "default_ai_timeout")]
    pub request_timeout_secs: u64,
    /// Minimum spacing between consecutive generative calls in milliseconds
    #[serde(default = "default_min_call_interval")]
    pub min_call_interval_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            images_enabled: default_true(),
            openai_api_key: None,
            openai_base_url: None,
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            secondary_language: default_secondary_language(),
            max_summary_tokens: default_max_tokens(),
            request_timeout_secs: default_ai_timeout(),
            min_call_interval_ms: default_min_call_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Feeds processed concurrently
    #[serde(default = "default_feed_concurrency")]
    pub feed_concurrency: usize,
    /// Items considered per feed per run
    #[serde(default = "default_max_items_per_feed")]
    pub max_items_per_feed: usize,
    /// HTTP proxy URL for feed fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            feed_concurrency: default_feed_concurrency(),
            max_items_per_feed: default_max_items_per_feed(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Pause between consecutive backfill tasks in milliseconds
    #[serde(default = "default_maintenance_pause")]
    pub pause_ms: u64,
    /// Backfill tasks allowed in flight at once
    #[serde(default = "default_maintenance_concurrency")]
    pub concurrency: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            pause_ms: default_maintenance_pause(),
            concurrency: default_maintenance_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Terms of which at least one must appear in title or body
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marketbrief")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_secondary_language() -> String {
    "Hindi".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_ai_timeout() -> u64 {
    30
}

fn default_min_call_interval() -> u64 {
    250
}

fn default_timeout() -> u64 {
    20
}

fn default_feed_concurrency() -> usize {
    4
}

fn default_max_items_per_feed() -> usize {
    30
}

fn default_maintenance_pause() -> u64 {
    500
}

fn default_maintenance_concurrency() -> usize {
    1
}

fn default_keywords() -> Vec<String> {
    [
        "market", "stock", "share", "sensex", "nifty", "bse", "nse", "ipo", "listing",
        "unlisted", "pre-ipo", "startup", "funding", "valuation", "investor", "investment",
        "sebi", "rbi", "regulator", "profit", "revenue", "earnings", "quarter", "dividend",
        "crore", "rupee", "trading", "exchange", "mutual fund", "bond", "equity", "company",
        "merger", "acquisition", "reliance", "tata", "infosys", "hdfc", "adani",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "https://economictimes.indiatimes.com/markets/rssfeeds/1977021501.cms",
            "ET Markets",
            Category::Market,
        ),
        FeedSource::new(
            "https://economictimes.indiatimes.com/markets/ipos/fpos/rssfeeds/14655708.cms",
            "ET IPO",
            Category::Ipo,
        ),
        FeedSource::new(
            "https://www.moneycontrol.com/rss/marketreports.xml",
            "Moneycontrol Markets",
            Category::Market,
        ),
        FeedSource::new(
            "https://www.moneycontrol.com/rss/business.xml",
            "Moneycontrol Business",
            Category::Company,
        ),
        FeedSource::new("https://www.livemint.com/rss/markets", "Mint Markets", Category::Market),
        FeedSource::new("https://www.livemint.com/rss/companies", "Mint Companies", Category::Company),
        FeedSource::new("https://inc42.com/feed/", "Inc42", Category::Startup),
        FeedSource::new("https://www.sebi.gov.in/sebirss.xml", "SEBI", Category::Regulatory),
    ]
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from an explicit path, or the default location, or defaults.
    /// Environment overrides are applied and the result is validated.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    crate::Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content)?
            }
            None => {
                let config_path = Self::config_path();
                if config_path.exists() {
                    let content = std::fs::read_to_string(&config_path)?;
                    Self::from_toml_str(&content)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Apply environment overrides through the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.general.database_url = Some(url);
        }
        if self.ai.openai_api_key.is_none() {
            self.ai.openai_api_key = lookup(OPENAI_API_KEY_ENV).filter(|v| !v.trim().is_empty());
        }
    }

    /// Check the feed registry and the filter before any job starts
    pub fn validate(&self) -> crate::Result<()> {
        if self.feeds.is_empty() {
            return Err(crate::Error::Config("no feeds configured".to_string()));
        }

        let mut seen = HashSet::new();
        let mut names = HashSet::new();
        for feed in &self.feeds {
            if feed.name.trim().is_empty() {
                return Err(crate::Error::Config(format!("feed {} has an empty name", feed.url)));
            }
            // Run statistics are reported per feed name
            if !names.insert(feed.name.trim()) {
                return Err(crate::Error::Config(format!("duplicate feed name '{}'", feed.name)));
            }
            let parsed = url::Url::parse(&feed.url)
                .map_err(|e| crate::Error::Config(format!("invalid feed URL '{}': {}", feed.url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(crate::Error::Config(format!(
                    "feed URL '{}' must use http or https",
                    feed.url
                )));
            }
            if !seen.insert(feed.url.as_str()) {
                return Err(crate::Error::Config(format!("duplicate feed URL '{}'", feed.url)));
            }
        }

        if !self.filter.keywords.iter().any(|k| !k.trim().is_empty()) {
            return Err(crate::Error::Config("keyword list is empty".to_string()));
        }

        Ok(())
    }

    /// Whether a generative credential is available and AI steps are enabled
    pub fn ai_available(&self) -> bool {
        self.ai.enabled
            && self
                .ai
                .openai_api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/marketbrief/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("marketbrief")
            .join("config.toml")
    }

    /// Get the store connection string
    pub fn database_url(&self) -> String {
        match &self.general.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Get the database file path used when no explicit URL is configured
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("marketbrief.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[general]
database_url = "sqlite::memory:"

[ai]
secondary_language = "Marathi"
min_call_interval_ms = 100

[filter]
keywords = ["sensex", "ipo"]

[[feeds]]
url = "https://example.com/markets.xml"
name = "Example Markets"
category = "Market"

[[feeds]]
url = "https://example.com/ipo.xml"
name = "Example IPO"
category = "ipo"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[1].category, Category::Ipo);
        assert_eq!(config.ai.secondary_language, "Marathi");
        assert_eq!(config.ai.chat_model, "gpt-4o-mini");
        assert_eq!(config.sync.feed_concurrency, 4);
        assert_eq!(config.database_url(), "sqlite::memory:");
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert!(!config.ai_available());
    }

    #[test]
    fn test_duplicate_feed_rejected() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.feeds[1].url = config.feeds[0].url.clone();
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_duplicate_feed_name_rejected() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.feeds[1].name = format!("{} ", config.feeds[0].name);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate feed name"));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.feeds[0].url = "ftp://example.com/feed".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.filter.keywords = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.apply_env(|key| match key {
            DATABASE_URL_ENV => Some("sqlite:/tmp/brief.db".to_string()),
            OPENAI_API_KEY_ENV => Some("sk-test".to_string()),
            _ => None,
        });
        assert_eq!(config.database_url(), "sqlite:/tmp/brief.db");
        assert!(config.ai_available());

        config.ai.enabled = false;
        assert!(!config.ai_available());
    }

    #[test]
    fn test_config_key_wins_over_env() {
        let mut config = AppConfig::default();
        config.ai.openai_api_key = Some("from-file".to_string());
        config.apply_env(|_| Some("from-env".to_string()));
        assert_eq!(config.ai.openai_api_key.as_deref(), Some("from-file"));
    }
}
