//! In-process stand-ins for the network collaborators, used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::ai::GenerativeProvider;
use crate::feed::{FeedReader, FeedSource, RawItem};
use crate::{Error, Result};

pub struct StubProvider {
    reply: std::result::Result<String, String>,
    image: Option<String>,
    delay: Option<Duration>,
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            image: None,
            delay: None,
            text_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            ..Self::replying("")
        }
    }

    pub fn with_image(mut self, url: &str) -> Self {
        self.image = Some(url.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GenerativeProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _system: &str, prompt: &str, _max_tokens: u32) -> Result<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(Error::AiProvider)
    }

    async fn generate_image(&self, _prompt: &str) -> Result<String> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match (&self.reply, &self.image) {
            (Err(message), _) => Err(Error::AiProvider(message.clone())),
            (Ok(_), Some(url)) => Ok(url.clone()),
            (Ok(_), None) => Err(Error::AiProvider("no image configured".to_string())),
        }
    }
}

/// Feed reader answering from a fixed table keyed by feed URL
#[derive(Default)]
pub struct StubFeedReader {
    feeds: HashMap<String, std::result::Result<Vec<RawItem>, String>>,
}

impl StubFeedReader {
    pub fn with_items(mut self, url: &str, items: Vec<RawItem>) -> Self {
        self.feeds.insert(url.to_string(), Ok(items));
        self
    }

    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.feeds.insert(url.to_string(), Err(message.to_string()));
        self
    }
}

#[async_trait::async_trait]
impl FeedReader for StubFeedReader {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawItem>> {
        match self.feeds.get(&source.url) {
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(message)) => Err(Error::Fetch(message.clone())),
            None => Err(Error::Fetch(format!("no stub for {}", source.url))),
        }
    }
}

pub fn raw_item(title: &str, link: &str, body: &str) -> RawItem {
    RawItem {
        title: title.to_string(),
        link: Some(link.to_string()),
        published_at: None,
        body: body.to_string(),
        image_url: None,
        tags: Vec::new(),
    }
}
