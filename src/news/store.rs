//! Persisted news settings.
//!
//! The record lives in a single JSON file and is rewritten in full on every
//! mutation, while the store's lock is held. A mutation only returns once the
//! file is synced to disk; if the write fails the in-memory record is rolled back
//! and the error is returned to the caller.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::news::registry::FeedRegistry;
use crate::news::types::FeedDescriptor;
use crate::{NewsError, Result};

/// Keys of the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    /// Delivery channel; unset disables auto-posting.
    ChannelId,
    /// Active feed id.
    Feed,
    /// Dedup key of the last auto-posted article.
    LastPostedUrl,
}

/// The persisted news record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Target channel for the daily post.
    pub channel_id: Option<u64>,
    /// Active feed id.
    pub feed: String,
    /// Dedup key of the last auto-posted article.
    pub last_posted_url: Option<String>,
}

impl NewsConfig {
    /// Defaults for a fresh deployment.
    pub fn with_default_feed(default_feed: impl Into<String>) -> Self {
        Self {
            channel_id: None,
            feed: default_feed.into(),
            last_posted_url: None,
        }
    }
}

/// Stored form: every key optional so older files merge over defaults.
#[derive(Debug, Default, Deserialize)]
struct StoredNewsConfig {
    #[serde(default)]
    channel_id: Option<u64>,
    #[serde(default)]
    feed: Option<String>,
    #[serde(default)]
    last_posted_url: Option<String>,
}

/// Write-through store for the news record.
pub struct NewsConfigStore {
    path: PathBuf,
    default_feed: String,
    data: Mutex<NewsConfig>,
}

impl NewsConfigStore {
    /// Load the record from `path`, or start from defaults if it does not exist.
    ///
    /// Keys missing from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>, default_feed: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let default_feed = default_feed.into();
        let mut data = NewsConfig::with_default_feed(default_feed.clone());

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let stored: StoredNewsConfig =
                serde_json::from_str(&content).map_err(|e| NewsError::StateFormat {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            if stored.channel_id.is_some() {
                data.channel_id = stored.channel_id;
            }
            if let Some(feed) = stored.feed {
                data.feed = feed;
            }
            if stored.last_posted_url.is_some() {
                data.last_posted_url = stored.last_posted_url;
            }
            info!(path = %path.display(), "news state loaded");
        } else {
            info!(path = %path.display(), "no news state found, using defaults");
        }

        Ok(Self {
            path,
            default_feed,
            data: Mutex::new(data),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> NewsConfig {
        self.lock().clone()
    }

    /// Current delivery channel.
    pub fn channel_id(&self) -> Option<u64> {
        self.lock().channel_id
    }

    /// Current feed id, exactly as stored.
    pub fn feed_id(&self) -> String {
        self.lock().feed.clone()
    }

    /// Dedup key of the last auto-posted article.
    pub fn last_posted_url(&self) -> Option<String> {
        self.lock().last_posted_url.clone()
    }

    /// The active feed, falling back to the registry default for unknown ids.
    pub fn active_feed<'r>(&self, registry: &'r FeedRegistry) -> &'r FeedDescriptor {
        registry.resolve(&self.lock().feed)
    }

    /// Set the delivery channel and persist.
    pub fn set_channel_id(&self, channel_id: u64) -> Result<()> {
        self.update(|data| data.channel_id = Some(channel_id))
    }

    /// Set the active feed id and persist.
    ///
    /// Callers are responsible for checking the id against the registry.
    pub fn set_feed_id(&self, feed: impl Into<String>) -> Result<()> {
        let feed = feed.into();
        self.update(|data| data.feed = feed)
    }

    /// Record the last auto-posted article and persist.
    pub fn set_last_posted_url(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        self.update(|data| data.last_posted_url = Some(url))
    }

    /// Reset one key to its default and persist.
    pub fn clear(&self, key: ConfigKey) -> Result<()> {
        let default_feed = self.default_feed.clone();
        self.update(|data| match key {
            ConfigKey::ChannelId => data.channel_id = None,
            ConfigKey::Feed => data.feed = default_feed,
            ConfigKey::LastPostedUrl => data.last_posted_url = None,
        })
    }

    /// Apply `mutate` and write the full record, all under the lock.
    fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut NewsConfig),
    {
        let mut data = self.lock();
        let previous = data.clone();
        mutate(&mut data);
        if let Err(e) = write_record(&self.path, &data) {
            *data = previous;
            return Err(e);
        }
        debug!(path = %self.path.display(), "news state saved");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, NewsConfig> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Write the record to a sibling temp file, then rename it into place.
fn write_record(path: &Path, data: &NewsConfig) -> Result<()> {
    let persistence = |source: std::io::Error| NewsError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(persistence)?;
        }
    }

    let json = serde_json::to_string_pretty(data)
        .map_err(|e| persistence(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp).map_err(persistence)?;
    file.write_all(json.as_bytes()).map_err(persistence)?;
    file.sync_all().map_err(persistence)?;
    drop(file);

    fs::rename(&tmp, path).map_err(persistence)?;
    sync_parent_dir(path).map_err(persistence)?;
    Ok(())
}

/// Make the rename itself durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => File::open(".")?.sync_all(),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> NewsConfigStore {
        NewsConfigStore::load(dir.path().join("data/news_config.json"), "quanta").unwrap()
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.snapshot(), NewsConfig::with_default_feed("quanta"));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_creates_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_channel_id(42).unwrap();
        assert!(store.path().exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["channel_id"], 42);
        assert_eq!(raw["feed"], "quanta");
        assert!(raw["last_posted_url"].is_null());
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_channel_id(1).unwrap();
        store.set_last_posted_url("https://example.com/1").unwrap();

        let names: Vec<String> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["news_config.json"]);

        let on_disk: NewsConfig =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, store.snapshot());
    }

    #[test]
    fn test_load_merges_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("news_config.json");
        fs::write(&path, r#"{"channel_id": 7}"#).unwrap();

        let store = NewsConfigStore::load(&path, "quanta").unwrap();
        assert_eq!(store.channel_id(), Some(7));
        assert_eq!(store.feed_id(), "quanta");
        assert_eq!(store.last_posted_url(), None);
    }

    #[test]
    fn test_load_ignores_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("news_config.json");
        fs::write(&path, r#"{"feed": "phys-org", "future_key": true}"#).unwrap();

        let store = NewsConfigStore::load(&path, "quanta").unwrap();
        assert_eq!(store.feed_id(), "phys-org");
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("news_config.json");
        fs::write(&path, "{not json").unwrap();

        let result = NewsConfigStore::load(&path, "quanta");
        assert!(matches!(result, Err(NewsError::StateFormat { .. })));
    }

    #[test]
    fn test_clear_resets_to_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_channel_id(1).unwrap();
        store.set_feed_id("phys-org").unwrap();
        store.set_last_posted_url("https://example.com/a").unwrap();

        store.clear(ConfigKey::ChannelId).unwrap();
        store.clear(ConfigKey::Feed).unwrap();
        store.clear(ConfigKey::LastPostedUrl).unwrap();

        assert_eq!(store.snapshot(), NewsConfig::with_default_feed("quanta"));
        let reloaded = store_in(&dir);
        assert_eq!(reloaded.snapshot(), NewsConfig::with_default_feed("quanta"));
    }

    #[test]
    fn test_active_feed_falls_back_for_unknown_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_feed_id("removed-feed").unwrap();

        let registry = FeedRegistry::builtin();
        assert_eq!(store.active_feed(&registry).id, "quanta");
        assert_eq!(store.feed_id(), "removed-feed");
    }

    #[test]
    fn test_write_failure_is_reported_and_rolled_back() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = NewsConfigStore::load(blocker.join("news_config.json"), "quanta").unwrap();

        let result = store.set_last_posted_url("https://example.com/a");
        assert!(matches!(result, Err(NewsError::Persistence { .. })));
        assert_eq!(store.last_posted_url(), None);
    }
}
