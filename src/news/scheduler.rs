//! Daily news scheduler.
//!
//! Once the host signals it is ready, the scheduler wakes at a fixed wall-clock
//! time every day, fetches the newest article of the active feed and posts it
//! unless it was the last one posted. The last-posted marker is written only
//! after the delivery boundary accepted the post.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::datetime::{describe_schedule, next_daily_trigger};
use crate::delivery::Delivery;
use crate::news::fetcher::ArticleSource;
use crate::news::registry::FeedRegistry;
use crate::news::render::{RenderedArticle, DAILY_FOOTER};
use crate::news::store::NewsConfigStore;
use crate::Result;

/// Result of one scheduled cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No channel configured; auto-posting is off.
    Disabled,
    /// The configured channel no longer exists.
    ChannelUnresolvable { channel_id: u64 },
    /// The feed returned nothing.
    NoArticles,
    /// The newest article was already posted.
    Duplicate { url: String },
    /// The newest article was posted and recorded.
    Delivered { url: String },
    /// The delivery boundary rejected the post; nothing was recorded.
    DeliveryFailed { url: String },
}

/// One-time "host is connected" signal.
#[derive(Debug)]
pub struct HostReady {
    tx: watch::Sender<bool>,
}

impl HostReady {
    /// Create a new signal in the not-ready state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Mark the host as ready. Later calls have no effect.
    pub fn signal(&self) {
        self.tx.send_replace(true);
    }

    /// Whether `signal` has been called.
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for HostReady {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running scheduler task.
///
/// Dropping the handle stops the scheduler at its next cycle boundary.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Prevent further cycles. A cycle already running is left to finish.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Stop and wait for the task to exit.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            error!("news scheduler task failed: {}", e);
        }
    }
}

/// Maps an instant to the next trigger strictly after it.
type TriggerFn = dyn Fn(DateTime<Utc>) -> DateTime<Utc> + Send + Sync;

/// The daily news poster.
pub struct NewsScheduler {
    store: Arc<NewsConfigStore>,
    registry: Arc<FeedRegistry>,
    source: Arc<dyn ArticleSource>,
    delivery: Arc<dyn Delivery>,
    post_time: NaiveTime,
    timezone: Tz,
    next_trigger: Box<TriggerFn>,
    cycle_lock: Mutex<()>,
}

impl NewsScheduler {
    /// Create a scheduler posting daily at `post_time` in `timezone`.
    pub fn new(
        store: Arc<NewsConfigStore>,
        registry: Arc<FeedRegistry>,
        source: Arc<dyn ArticleSource>,
        delivery: Arc<dyn Delivery>,
        post_time: NaiveTime,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            registry,
            source,
            delivery,
            post_time,
            timezone,
            next_trigger: Box::new(move |after| next_daily_trigger(after, post_time, timezone)),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Replace the daily trigger computation.
    ///
    /// `next_trigger` receives the instant to schedule after and must return a
    /// later instant.
    pub fn with_trigger<F>(mut self, next_trigger: F) -> Self
    where
        F: Fn(DateTime<Utc>) -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.next_trigger = Box::new(next_trigger);
        self
    }

    /// Human-readable schedule.
    pub fn schedule(&self) -> String {
        describe_schedule(self.post_time, self.timezone)
    }

    /// Run one fetch-dedup-post cycle now.
    ///
    /// Cycles never overlap. Only persistence failures are returned as errors;
    /// everything else is reported through the outcome.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let _guard = self.cycle_lock.lock().await;

        let Some(channel_id) = self.store.channel_id() else {
            debug!("no news channel configured, skipping cycle");
            return Ok(CycleOutcome::Disabled);
        };

        match self.delivery.resolve_channel(channel_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(channel_id, "news channel not found, skipping cycle");
                return Ok(CycleOutcome::ChannelUnresolvable { channel_id });
            }
            Err(e) => {
                warn!(channel_id, error = %e, "failed to resolve news channel");
                return Ok(CycleOutcome::ChannelUnresolvable { channel_id });
            }
        }

        let feed = self.store.active_feed(&self.registry).clone();
        let articles = self.source.fetch(&feed.source_url, 1).await;
        let Some(article) = articles.into_iter().next() else {
            debug!(feed = %feed.id, "feed returned no articles");
            return Ok(CycleOutcome::NoArticles);
        };

        let url = article.dedup_key().to_string();
        if self.store.last_posted_url().as_deref() == Some(url.as_str()) {
            debug!(feed = %feed.id, url = %url, "newest article already posted");
            return Ok(CycleOutcome::Duplicate { url });
        }

        let rendered = RenderedArticle::new(&article, &feed).with_footer(DAILY_FOOTER);
        if let Err(e) = self.delivery.deliver(channel_id, &rendered).await {
            warn!(channel_id, url = %url, error = %e, "daily news delivery failed");
            return Ok(CycleOutcome::DeliveryFailed { url });
        }

        self.store.set_last_posted_url(url.clone())?;
        info!(channel_id, feed = %feed.id, url = %url, "daily news posted");
        Ok(CycleOutcome::Delivered { url })
    }

    /// Spawn the scheduler loop. It waits for `ready` before the first cycle.
    pub fn spawn(self: Arc<Self>, ready: &HostReady) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let ready_rx = ready.subscribe();
        let task = tokio::spawn(async move {
            self.run(ready_rx, stop_rx).await;
        });
        SchedulerHandle {
            stop: stop_tx,
            task,
        }
    }

    async fn run(&self, mut ready: watch::Receiver<bool>, mut stop: watch::Receiver<bool>) {
        tokio::select! {
            res = ready.wait_for(|r| *r) => {
                if res.is_err() {
                    info!("host shut down before becoming ready, news scheduler not started");
                    return;
                }
            }
            _ = stop.wait_for(|s| *s) => {
                info!("news scheduler stopped before start");
                return;
            }
        }

        info!(schedule = %self.schedule(), "news scheduler started");

        let mut next = (self.next_trigger)(Utc::now());
        loop {
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            debug!(next = %next, "waiting for next news cycle");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = stop.wait_for(|s| *s) => break,
            }
            if *stop.borrow() {
                break;
            }

            match self.run_cycle().await {
                Ok(outcome) => info!(?outcome, "news cycle finished"),
                Err(e) => error!(error = %e, "news cycle failed"),
            }

            // An early wake must not schedule the same trigger twice, and a
            // late one skips missed triggers.
            next = (self.next_trigger)(next.max(Utc::now()));
        }

        info!("news scheduler stopped");
    }
}
