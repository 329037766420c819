use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Editorial category attached to a feed and inherited by its articles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Market,
    Ipo,
    Unlisted,
    Startup,
    Regulatory,
    Company,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Ipo => "IPO",
            Self::Unlisted => "Unlisted",
            Self::Startup => "Startup",
            Self::Regulatory => "Regulatory",
            Self::Company => "Company",
            Self::General => "General",
        }
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "ipo" => Ok(Self::Ipo),
            "unlisted" => Ok(Self::Unlisted),
            "startup" => Ok(Self::Startup),
            "regulatory" => Ok(Self::Regulatory),
            "company" => Ok(Self::Company),
            "general" => Ok(Self::General),
            other => Err(crate::Error::Config(format!("unknown category '{}'", other))),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered feed endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    pub name: String,
    pub category: Category,
}

impl FeedSource {
    pub fn new(url: &str, name: &str, category: Category) -> Self {
        Self {
            url: url.to_string(),
            name: name.to_string(),
            category,
        }
    }
}

/// One entry as parsed from a feed document, before filtering
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub title: String,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Description or content converted to plain text
    pub body: String,
    /// Thumbnail discovered in media tags or the body markup
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

/// Persisted article record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub source_link: String,
    pub title: String,
    pub source_name: String,
    pub category: Category,
    pub content: Option<String>,
    pub summary: String,
    pub secondary_summary: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Data required to create a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_link: String,
    pub title: String,
    pub source_name: String,
    pub category: Category,
    pub content: Option<String>,
    pub summary: String,
    pub secondary_summary: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl Article {
    /// Check if the secondary summary still needs to be generated
    pub fn needs_secondary_summary(&self) -> bool {
        self.secondary_summary
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
    }
}
