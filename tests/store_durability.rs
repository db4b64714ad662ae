//! Persistence tests for the news state file.

use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use newsdesk::news::{ConfigKey, NewsConfig, NewsConfigStore};

#[test]
fn test_every_key_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("news.json");

    let store = NewsConfigStore::load(&path, "alpha").unwrap();
    store.set_channel_id(77).unwrap();
    store.set_feed_id("beta").unwrap();
    store.set_last_posted_url("https://beta.example/1").unwrap();

    let reloaded = NewsConfigStore::load(&path, "alpha").unwrap();
    assert_eq!(reloaded.channel_id(), Some(77));
    assert_eq!(reloaded.feed_id(), "beta");
    assert_eq!(
        reloaded.last_posted_url().as_deref(),
        Some("https://beta.example/1")
    );
}

#[test]
fn test_clear_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("news.json");

    let store = NewsConfigStore::load(&path, "alpha").unwrap();
    store.set_channel_id(77).unwrap();
    store.set_feed_id("beta").unwrap();
    store.clear(ConfigKey::ChannelId).unwrap();
    store.clear(ConfigKey::Feed).unwrap();

    let reloaded = NewsConfigStore::load(&path, "alpha").unwrap();
    assert_eq!(reloaded.channel_id(), None);
    assert_eq!(reloaded.feed_id(), "alpha");
}

#[test]
fn test_concurrent_writers_leave_valid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("news.json");
    let store = Arc::new(NewsConfigStore::load(&path, "alpha").unwrap());

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                for j in 0..10u64 {
                    store.set_channel_id(i * 100 + j).unwrap();
                    store
                        .set_last_posted_url(format!("https://alpha.example/{}/{}", i, j))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let on_disk: NewsConfig = serde_json::from_str(&content).unwrap();
    assert_eq!(on_disk, store.snapshot());
}
