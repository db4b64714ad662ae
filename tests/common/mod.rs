//! Test helpers for newsdesk integration tests.
//!
//! Provides a scripted article source, a recording delivery boundary and
//! helpers to build the news services over a temporary state file.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tempfile::TempDir;
use tokio::sync::Notify;

use newsdesk::news::{
    Article, ArticleSource, FeedDescriptor, FeedRegistry, NewsCommands, NewsConfigStore,
    NewsScheduler, QueryService, RenderedArticle,
};
use newsdesk::{Delivery, NewsError, Result};

/// Article source returning whatever the test put in it.
#[derive(Default)]
pub struct StubSource {
    articles: Mutex<Vec<Article>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StubSource {
    pub fn new(articles: Vec<Article>) -> Arc<Self> {
        Arc::new(Self {
            articles: Mutex::new(articles),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Replace the articles served from now on.
    pub fn set_articles(&self, articles: Vec<Article>) {
        *self.articles.lock().unwrap() = articles;
    }

    /// Every `(source_url, limit)` pair requested so far.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSource for StubSource {
    async fn fetch(&self, source_url: &str, limit: usize) -> Vec<Article> {
        self.calls
            .lock()
            .unwrap()
            .push((source_url.to_string(), limit));
        self.articles
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }
}

/// Delivery boundary that records posts instead of sending them.
#[derive(Default)]
pub struct RecordingDelivery {
    delivered: Mutex<Vec<(u64, RenderedArticle)>>,
    unresolvable: Mutex<bool>,
    failing: Mutex<bool>,
}

impl RecordingDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every channel lookup come back empty.
    pub fn set_unresolvable(&self, value: bool) {
        *self.unresolvable.lock().unwrap() = value;
    }

    /// Make every delivery fail.
    pub fn set_failing(&self, value: bool) {
        *self.failing.lock().unwrap() = value;
    }

    pub fn delivered(&self) -> Vec<(u64, RenderedArticle)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_urls(&self) -> Vec<String> {
        self.delivered()
            .into_iter()
            .map(|(_, article)| article.url)
            .collect()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(&self, channel_id: u64, article: &RenderedArticle) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(NewsError::Delivery("channel rejected the post".to_string()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((channel_id, article.clone()));
        Ok(())
    }

    async fn resolve_channel(&self, channel_id: u64) -> Result<Option<String>> {
        if *self.unresolvable.lock().unwrap() {
            Ok(None)
        } else {
            Ok(Some(format!("#news-{}", channel_id)))
        }
    }
}

/// Delivery that parks inside `deliver` until released.
pub struct GatedDelivery {
    inner: Arc<RecordingDelivery>,
    /// Notified when a delivery has started.
    pub started: Notify,
    /// Notify to let the parked delivery finish.
    pub release: Notify,
}

impl GatedDelivery {
    pub fn new(inner: Arc<RecordingDelivery>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            started: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl Delivery for GatedDelivery {
    async fn deliver(&self, channel_id: u64, article: &RenderedArticle) -> Result<()> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.deliver(channel_id, article).await
    }

    async fn resolve_channel(&self, channel_id: u64) -> Result<Option<String>> {
        self.inner.resolve_channel(channel_id).await
    }
}

/// Trigger that fires once, `delay_ms` after the scheduler starts, then
/// only a day later.
pub fn fire_once(delay_ms: i64) -> impl Fn(DateTime<Utc>) -> DateTime<Utc> + Send + Sync {
    let fired = AtomicBool::new(false);
    move |after| {
        if fired.swap(true, Ordering::SeqCst) {
            after + TimeDelta::days(1)
        } else {
            after + TimeDelta::milliseconds(delay_ms)
        }
    }
}

/// Two-feed registry with `alpha` as the default.
pub fn test_registry() -> Arc<FeedRegistry> {
    let feeds = vec![
        FeedDescriptor::new("alpha", "Alpha Weekly", "https://alpha.example/feed")
            .with_home("https://alpha.example")
            .with_color(0x112233),
        FeedDescriptor::new("beta", "Beta Daily", "https://beta.example/rss")
            .with_home("https://beta.example"),
    ];
    Arc::new(FeedRegistry::new(feeds, "alpha").unwrap())
}

/// Article with a summary, keyed by `url`.
pub fn article(title: &str, url: &str) -> Article {
    Article::new(title, url).with_summary(format!("Summary of {}", title))
}

/// Everything a test needs, wired over a temp directory.
pub struct Harness {
    pub dir: TempDir,
    pub registry: Arc<FeedRegistry>,
    pub store: Arc<NewsConfigStore>,
    pub source: Arc<StubSource>,
    pub delivery: Arc<RecordingDelivery>,
}

impl Harness {
    pub fn new(articles: Vec<Article>) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(NewsConfigStore::load(dir.path().join("news.json"), "alpha").unwrap());
        Self {
            dir,
            registry: test_registry(),
            store,
            source: StubSource::new(articles),
            delivery: RecordingDelivery::new(),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("news.json")
    }

    /// Reload the state file as a fresh process would.
    pub fn reload(&self) -> NewsConfigStore {
        NewsConfigStore::load(self.state_path(), "alpha").unwrap()
    }

    pub fn scheduler(&self) -> NewsScheduler {
        self.scheduler_with(self.delivery.clone())
    }

    /// Scheduler posting through `delivery` instead of the recorder.
    pub fn scheduler_with(&self, delivery: Arc<dyn Delivery>) -> NewsScheduler {
        NewsScheduler::new(
            self.store.clone(),
            self.registry.clone(),
            self.source.clone(),
            delivery,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            chrono_tz::UTC,
        )
    }

    pub fn query(&self) -> QueryService {
        QueryService::new(self.store.clone(), self.registry.clone(), self.source.clone())
    }

    pub fn commands(&self) -> NewsCommands {
        NewsCommands::new(
            self.store.clone(),
            self.registry.clone(),
            self.query(),
            self.delivery.clone(),
            "Daily at 09:00 UTC",
        )
    }
}
