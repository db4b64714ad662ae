//! Static feed registry.

use std::collections::HashSet;

use crate::news::types::{FeedDescriptor, DEFAULT_FEED_ID};
use crate::{NewsError, Result};

/// Read-only set of known feeds, in registration order.
#[derive(Debug, Clone)]
pub struct FeedRegistry {
    feeds: Vec<FeedDescriptor>,
    default_index: usize,
}

impl FeedRegistry {
    /// Build a registry from feeds and the id of the fallback feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, ids repeat, or the default
    /// feed is not part of the list.
    pub fn new(feeds: Vec<FeedDescriptor>, default_id: &str) -> Result<Self> {
        if feeds.is_empty() {
            return Err(NewsError::Config("feed registry is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for feed in &feeds {
            if feed.id.trim().is_empty() {
                return Err(NewsError::Config("feed id must not be empty".to_string()));
            }
            if !seen.insert(feed.id.as_str()) {
                return Err(NewsError::Config(format!("duplicate feed id: {}", feed.id)));
            }
        }

        let default_index = feeds
            .iter()
            .position(|f| f.id == default_id)
            .ok_or_else(|| {
                NewsError::Config(format!("default feed '{}' is not registered", default_id))
            })?;

        Ok(Self {
            feeds,
            default_index,
        })
    }

    /// The feeds shipped with newsdesk.
    pub fn builtin() -> Self {
        Self {
            feeds: builtin_feeds(),
            default_index: 0,
        }
    }

    /// Look up a feed, falling back to the default feed for unknown ids.
    pub fn resolve(&self, id: &str) -> &FeedDescriptor {
        self.get(id).unwrap_or_else(|| self.default_feed())
    }

    /// Look up a feed by id.
    pub fn get(&self, id: &str) -> Option<&FeedDescriptor> {
        self.feeds.iter().find(|f| f.id == id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The fallback feed.
    pub fn default_feed(&self) -> &FeedDescriptor {
        &self.feeds[self.default_index]
    }

    /// All feeds in registration order.
    pub fn list(&self) -> &[FeedDescriptor] {
        &self.feeds
    }

    /// All feed ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.feeds.iter().map(|f| f.id.clone()).collect()
    }
}

fn builtin_feeds() -> Vec<FeedDescriptor> {
    vec![
        FeedDescriptor::new(
            DEFAULT_FEED_ID,
            "Quanta Magazine",
            "https://api.quantamagazine.org/feed/",
        )
        .with_icon("https://d2r55xnwy6nx47.cloudfront.net/uploads/2018/03/QM_Favicon-32x32.png")
        .with_home("https://www.quantamagazine.org")
        .with_color(0xFF6600),
        FeedDescriptor::new("arxiv-physics", "arXiv - Physics", "https://rss.arxiv.org/rss/physics")
            .with_icon("https://info.arxiv.org/brand/images/brand-logomark-primary.jpg")
            .with_home("https://arxiv.org/list/physics/new")
            .with_color(0xB31B1B),
        FeedDescriptor::new("phys-org", "Phys.org", "https://phys.org/rss-feed/")
            .with_icon("https://phys.org/favicon.ico")
            .with_home("https://phys.org")
            .with_color(0x1A1A2E),
    ]
}
