//! Outbound delivery boundary.
//!
//! The news core hands rendered articles to a [`Delivery`] implementation and
//! never retries; implementations log their own failures.

pub mod discord;
pub mod log;

use async_trait::async_trait;

use crate::news::RenderedArticle;
use crate::Result;

pub use discord::DiscordDelivery;
pub use log::LogDelivery;

/// A destination that can display rendered articles.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Post `article` to `channel_id`.
    async fn deliver(&self, channel_id: u64, article: &RenderedArticle) -> Result<()>;

    /// Human-readable label for `channel_id`, or `None` if it no longer exists.
    async fn resolve_channel(&self, channel_id: u64) -> Result<Option<String>>;
}
