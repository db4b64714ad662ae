//! Feed fetcher and article normalization.
//!
//! Fetching never fails the caller: network, HTTP and parse errors are
//! logged and turned into an empty article list, so a feed outage can
//! neither crash the scheduler nor leak a raw error to an end user.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::{Entry, Link, MediaObject};
use feed_rs::parser;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::news::types::{Article, ELLIPSIS, MAX_SUMMARY_LENGTH, UNTITLED};
use crate::{NewsError, Result};

/// Anything that can turn a feed endpoint into articles.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Return up to `limit` articles in feed order.
    ///
    /// An unavailable feed yields an empty vector.
    async fn fetch(&self, source_url: &str, limit: usize) -> Vec<Article>;
}

/// HTTP feed fetcher with bounded timeouts and size limits.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a new fetcher from fetch settings.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| NewsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and parse a feed, reporting failures as `FetchUnavailable`.
    pub async fn try_fetch(&self, url: &str, limit: usize) -> Result<Vec<Article>> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsError::FetchUnavailable(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(NewsError::FetchUnavailable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(NewsError::FetchUnavailable(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NewsError::FetchUnavailable(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(NewsError::FetchUnavailable(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_articles(&bytes, limit)
    }
}

#[async_trait]
impl ArticleSource for FeedFetcher {
    async fn fetch(&self, source_url: &str, limit: usize) -> Vec<Article> {
        match self.try_fetch(source_url, limit).await {
            Ok(articles) => {
                debug!(url = source_url, count = articles.len(), "feed fetched");
                articles
            }
            Err(e) => {
                warn!(url = source_url, error = %e, "feed unavailable");
                Vec::new()
            }
        }
    }
}

/// Validate that a feed URL is an absolute http(s) URL with a host.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| NewsError::FetchUnavailable(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(NewsError::FetchUnavailable(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(NewsError::FetchUnavailable("URL has no host".to_string()));
    }

    Ok(())
}

/// Parse feed bytes into at most `limit` articles, in source order.
pub fn parse_articles(bytes: &[u8], limit: usize) -> Result<Vec<Article>> {
    let feed = parser::parse(bytes)
        .map_err(|e| NewsError::FetchUnavailable(format!("failed to parse feed: {}", e)))?;

    Ok(feed
        .entries
        .into_iter()
        .take(limit)
        .map(article_from_entry)
        .collect())
}

fn article_from_entry(entry: Entry) -> Article {
    let title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let canonical_url = canonical_link(&entry.links).unwrap_or_default();
    let summary = entry
        .summary
        .map(|t| t.content)
        .or(entry.content.and_then(|c| c.body))
        .map(|s| clean_summary(&s))
        .unwrap_or_default();
    let author = entry
        .authors
        .first()
        .map(|a| a.name.clone())
        .filter(|a| !a.is_empty());
    let image_url = extract_image(&entry.media);

    Article {
        title,
        canonical_url,
        summary,
        author,
        published_at: entry.published.or(entry.updated),
        image_url,
    }
}

/// The entry's alternate link, else its first link.
///
/// A link without `rel` is an alternate link (RFC 4287, 4.2.7.2).
fn canonical_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}

/// Strip markup from a summary and cap it at `MAX_SUMMARY_LENGTH` characters.
pub fn clean_summary(html: &str) -> String {
    static RE_TAGS: OnceLock<Regex> = OnceLock::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));

    let stripped = re_tags.replace_all(html, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    truncate_summary(decoded.trim())
}

fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= MAX_SUMMARY_LENGTH {
        return text.to_string();
    }
    let mut out: String = text
        .chars()
        .take(MAX_SUMMARY_LENGTH - ELLIPSIS.len())
        .collect();
    out.push_str(ELLIPSIS);
    out
}

/// First media-content URL, else first thumbnail URL.
fn extract_image(media: &[MediaObject]) -> Option<String> {
    let content = media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()));
    if content.is_some() {
        return content;
    }
    media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .find(|uri| !uri.is_empty())
}
