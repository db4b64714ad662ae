//! News types for newsdesk.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Maximum summary length in characters, including the ellipsis marker.
pub const MAX_SUMMARY_LENGTH: usize = 300;

/// Marker appended to truncated summaries.
pub const ELLIPSIS: &str = "...";

/// Maximum number of articles returned by an on-demand query.
pub const MAX_ARTICLES: usize = 5;

/// Title used when a feed entry has none.
pub const UNTITLED: &str = "Untitled";

/// Default feed identifier.
pub const DEFAULT_FEED_ID: &str = "quanta";

/// A registered syndication feed and its presentation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedDescriptor {
    /// Unique feed key.
    pub id: String,
    /// Name shown to users.
    pub display_name: String,
    /// Feed endpoint.
    pub source_url: String,
    /// Icon shown next to the feed name.
    #[serde(default)]
    pub icon_url: String,
    /// Homepage of the publication.
    #[serde(default)]
    pub home_url: String,
    /// Accent color (0xRRGGBB).
    #[serde(default)]
    pub accent_color: u32,
}

impl FeedDescriptor {
    /// Create a new feed descriptor.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            source_url: source_url.into(),
            icon_url: String::new(),
            home_url: String::new(),
            accent_color: 0,
        }
    }

    /// Set the icon URL.
    pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = icon_url.into();
        self
    }

    /// Set the homepage URL.
    pub fn with_home(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    /// Set the accent color.
    pub fn with_color(mut self, accent_color: u32) -> Self {
        self.accent_color = accent_color;
        self
    }
}

/// A normalized item derived from one feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Entry title.
    pub title: String,
    /// Entry link, used as the dedup key. Empty when the source omits it.
    pub canonical_url: String,
    /// Plain-text summary, at most `MAX_SUMMARY_LENGTH` characters.
    pub summary: String,
    /// First author, if any.
    pub author: Option<String>,
    /// Publication (or last update) time.
    ///
    /// `None` when the entry has no date or feed-rs cannot parse it; such
    /// articles are rendered without a "Published" field.
    pub published_at: Option<DateTime<Utc>>,
    /// First usable media attachment.
    pub image_url: Option<String>,
}

impl Article {
    /// Create an article with only a title and link.
    pub fn new(title: impl Into<String>, canonical_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            canonical_url: canonical_url.into(),
            summary: String::new(),
            author: None,
            published_at: None,
            image_url: None,
        }
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Set the image URL.
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Identity used for deduplication.
    ///
    /// Falls back to the title when the entry has no link.
    pub fn dedup_key(&self) -> &str {
        if self.canonical_url.is_empty() {
            &self.title
        } else {
            &self.canonical_url
        }
    }
}
