//! newsdesk - daily science news poster.
//!
//! Fetches syndication feeds, posts the newest article to a chat channel once
//! a day without repeating itself, and answers on-demand article queries.

pub mod config;
pub mod datetime;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod news;

pub use config::Config;
pub use delivery::{Delivery, DiscordDelivery, LogDelivery};
pub use error::{NewsError, Result};
pub use news::{
    Article, ArticleSource, CycleOutcome, FeedDescriptor, FeedFetcher, FeedRegistry, HostReady,
    NewsCommands, NewsConfigStore, NewsScheduler, QueryReply, QueryService, RenderedArticle,
};
