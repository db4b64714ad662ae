//! Dry-run delivery that only writes to the log.

use async_trait::async_trait;
use tracing::info;

use crate::delivery::Delivery;
use crate::news::RenderedArticle;
use crate::Result;

/// Logs every article instead of posting it.
#[derive(Debug, Default, Clone)]
pub struct LogDelivery;

impl LogDelivery {
    /// Create a new dry-run delivery.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Delivery for LogDelivery {
    async fn deliver(&self, channel_id: u64, article: &RenderedArticle) -> Result<()> {
        info!(
            channel_id,
            title = %article.title,
            url = %article.url,
            "dry run: would post article"
        );
        Ok(())
    }

    async fn resolve_channel(&self, channel_id: u64) -> Result<Option<String>> {
        Ok(Some(format!("channel {}", channel_id)))
    }
}
