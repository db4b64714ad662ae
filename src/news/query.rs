//! On-demand article queries.

use std::sync::Arc;

use tracing::debug;

use crate::news::fetcher::ArticleSource;
use crate::news::registry::FeedRegistry;
use crate::news::store::NewsConfigStore;
use crate::news::types::{Article, FeedDescriptor, MAX_ARTICLES};

/// Reply to an on-demand query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryReply {
    /// Articles in feed order.
    Articles {
        feed: FeedDescriptor,
        articles: Vec<Article>,
    },
    /// The feed returned nothing; try again later.
    NoArticles { feed: FeedDescriptor },
    /// The requested feed override is not registered.
    UnknownFeed {
        requested: String,
        available: Vec<String>,
    },
}

/// Clamp a requested article count into `1..=MAX_ARTICLES`.
pub fn clamp_count(count: i64) -> usize {
    count.clamp(1, MAX_ARTICLES as i64) as usize
}

/// Fetches articles for display without touching dedup state.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<NewsConfigStore>,
    registry: Arc<FeedRegistry>,
    source: Arc<dyn ArticleSource>,
}

impl QueryService {
    /// Create a new query service.
    pub fn new(
        store: Arc<NewsConfigStore>,
        registry: Arc<FeedRegistry>,
        source: Arc<dyn ArticleSource>,
    ) -> Self {
        Self {
            store,
            registry,
            source,
        }
    }

    /// Fetch up to `count` articles (clamped to `1..=5`) from `feed_override`
    /// or, when absent, the active feed.
    pub async fn query(&self, feed_override: Option<&str>, count: i64) -> QueryReply {
        let count = clamp_count(count);

        let feed = match feed_override {
            Some(id) => match self.registry.get(id) {
                Some(feed) => feed.clone(),
                None => {
                    return QueryReply::UnknownFeed {
                        requested: id.to_string(),
                        available: self.registry.ids(),
                    }
                }
            },
            None => self.store.active_feed(&self.registry).clone(),
        };

        debug!(feed = %feed.id, count, "news query");
        let articles = self.source.fetch(&feed.source_url, count).await;
        if articles.is_empty() {
            QueryReply::NoArticles { feed }
        } else {
            QueryReply::Articles { feed, articles }
        }
    }
}
