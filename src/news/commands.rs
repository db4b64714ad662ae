//! Inbound command handling.
//!
//! Each request maps onto a store mutation or a query. Replies carry the
//! data a front end needs; their `Display` impls give the plain-text form.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::delivery::Delivery;
use crate::news::query::{QueryReply, QueryService};
use crate::news::registry::FeedRegistry;
use crate::news::store::{ConfigKey, NewsConfigStore};
use crate::news::types::FeedDescriptor;
use crate::{NewsError, Result};

/// Message shown when a query comes back empty.
pub const NO_ARTICLES_MESSAGE: &str = "Could not fetch any articles right now. Try again later.";

/// Reply to a set-feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetFeedReply {
    Updated { feed: FeedDescriptor },
    UnknownFeed {
        requested: String,
        available: Vec<String>,
    },
}

impl fmt::Display for SetFeedReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated { feed } => write!(f, "Active feed is now {}.", feed.display_name),
            Self::UnknownFeed { available, .. } => {
                write!(f, "Unknown feed. Available feeds: {}", available.join(", "))
            }
        }
    }
}

/// Reply to a set-channel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSetReply {
    pub channel_id: u64,
    pub feed: FeedDescriptor,
    pub schedule: String,
}

impl fmt::Display for ChannelSetReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Daily news from {} will be posted to channel {} ({}).",
            self.feed.display_name,
            self.channel_id,
            self.schedule.to_lowercase()
        )
    }
}

/// Delivery state as seen by status queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    /// No channel configured.
    Disabled,
    /// Posting to an existing channel.
    Active { channel_id: u64, label: String },
    /// A channel is configured but cannot be found.
    UnknownDestination { channel_id: u64 },
}

/// Snapshot of the news configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub channel: ChannelStatus,
    pub active_feed: FeedDescriptor,
    pub schedule: String,
    pub last_posted_url: Option<String>,
    pub available: Vec<String>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            ChannelStatus::Disabled => writeln!(f, "Status: inactive, set a channel to enable")?,
            ChannelStatus::Active { label, .. } => {
                writeln!(f, "Status: active, posting to {}", label)?
            }
            ChannelStatus::UnknownDestination { channel_id } => {
                writeln!(f, "Status: active, posting to unknown destination ({})", channel_id)?
            }
        }
        writeln!(
            f,
            "Feed: {} ({})",
            self.active_feed.display_name, self.active_feed.home_url
        )?;
        writeln!(f, "Schedule: {}", self.schedule)?;
        if let Some(url) = &self.last_posted_url {
            writeln!(f, "Last posted: {}", url)?;
        }
        write!(f, "Available feeds: {}", self.available.join(", "))
    }
}

/// One registry entry in a feed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedListingEntry {
    pub feed: FeedDescriptor,
    pub active: bool,
}

/// All registered feeds with the active one marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedListing {
    pub entries: Vec<FeedListingEntry>,
}

impl fmt::Display for FeedListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let marker = if entry.active { "  <- active" } else { "" };
            write!(
                f,
                "{}{} - {} ({})",
                entry.feed.id, marker, entry.feed.display_name, entry.feed.home_url
            )?;
        }
        Ok(())
    }
}

/// Entry point for the command gateway.
#[derive(Clone)]
pub struct NewsCommands {
    store: Arc<NewsConfigStore>,
    registry: Arc<FeedRegistry>,
    query: QueryService,
    delivery: Arc<dyn Delivery>,
    schedule: String,
}

impl NewsCommands {
    /// Create a new command gateway.
    ///
    /// `schedule` is the human-readable schedule echoed in replies.
    pub fn new(
        store: Arc<NewsConfigStore>,
        registry: Arc<FeedRegistry>,
        query: QueryService,
        delivery: Arc<dyn Delivery>,
        schedule: impl Into<String>,
    ) -> Self {
        Self {
            store,
            registry,
            query,
            delivery,
            schedule: schedule.into(),
        }
    }

    /// Fetch articles for display.
    pub async fn request_query(&self, feed: Option<&str>, count: i64) -> QueryReply {
        self.query.query(feed, count).await
    }

    /// Enable daily posting to `channel_id`.
    ///
    /// Channel id 0 is never a real channel and is rejected without touching
    /// the stored configuration.
    pub fn request_set_channel(&self, channel_id: u64) -> Result<ChannelSetReply> {
        if channel_id == 0 {
            return Err(NewsError::Validation(
                "channel id must be a non-zero snowflake".to_string(),
            ));
        }
        self.store.set_channel_id(channel_id)?;
        info!(channel_id, "news channel set");
        Ok(ChannelSetReply {
            channel_id,
            feed: self.store.active_feed(&self.registry).clone(),
            schedule: self.schedule.clone(),
        })
    }

    /// Disable daily posting.
    pub fn request_clear_channel(&self) -> Result<()> {
        self.store.clear(ConfigKey::ChannelId)?;
        info!("news channel cleared");
        Ok(())
    }

    /// Switch the active feed. Unknown ids leave the configuration untouched.
    pub fn request_set_feed(&self, feed_id: &str) -> Result<SetFeedReply> {
        let Some(feed) = self.registry.get(feed_id) else {
            return Ok(SetFeedReply::UnknownFeed {
                requested: feed_id.to_string(),
                available: self.registry.ids(),
            });
        };
        self.store.set_feed_id(feed.id.clone())?;
        info!(feed = %feed.id, "active news feed changed");
        Ok(SetFeedReply::Updated { feed: feed.clone() })
    }

    /// Current configuration and registry.
    pub async fn request_status(&self) -> StatusReport {
        let config = self.store.snapshot();
        let channel = match config.channel_id {
            None => ChannelStatus::Disabled,
            Some(channel_id) => match self.delivery.resolve_channel(channel_id).await {
                Ok(Some(label)) => ChannelStatus::Active { channel_id, label },
                Ok(None) => ChannelStatus::UnknownDestination { channel_id },
                Err(e) => {
                    warn!(channel_id, error = %e, "failed to resolve news channel");
                    ChannelStatus::UnknownDestination { channel_id }
                }
            },
        };

        StatusReport {
            channel,
            active_feed: self.registry.resolve(&config.feed).clone(),
            schedule: self.schedule.clone(),
            last_posted_url: config.last_posted_url,
            available: self.registry.ids(),
        }
    }

    /// All registered feeds with the active one marked.
    pub fn request_feeds(&self) -> FeedListing {
        let active_id = self.store.active_feed(&self.registry).id.clone();
        FeedListing {
            entries: self
                .registry
                .list()
                .iter()
                .map(|feed| FeedListingEntry {
                    feed: feed.clone(),
                    active: feed.id == active_id,
                })
                .collect(),
        }
    }
}
