//! News module for newsdesk.
//!
//! Feed registry, article fetching, persisted settings, the daily scheduler
//! and the on-demand query and command paths.

pub mod commands;
pub mod fetcher;
pub mod query;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod store;
pub mod types;

pub use commands::{
    ChannelSetReply, ChannelStatus, FeedListing, FeedListingEntry, NewsCommands, SetFeedReply,
    StatusReport, NO_ARTICLES_MESSAGE,
};
pub use fetcher::{clean_summary, parse_articles, validate_url, ArticleSource, FeedFetcher};
pub use query::{clamp_count, QueryReply, QueryService};
pub use registry::FeedRegistry;
pub use render::{EmbedAuthor, EmbedField, RenderedArticle, DAILY_FOOTER};
pub use scheduler::{CycleOutcome, HostReady, NewsScheduler, SchedulerHandle};
pub use store::{ConfigKey, NewsConfig, NewsConfigStore};
pub use types::{
    Article, FeedDescriptor, DEFAULT_FEED_ID, ELLIPSIS, MAX_ARTICLES, MAX_SUMMARY_LENGTH, UNTITLED,
};
