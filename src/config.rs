//! Configuration module for newsdesk.

use std::path::Path;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::datetime::{parse_post_time, parse_timezone};
use crate::news::{FeedDescriptor, FeedRegistry, DEFAULT_FEED_ID};
use crate::{NewsError, Result};

/// News posting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsSettings {
    /// Path of the persisted news state (JSON).
    #[serde(default = "default_state_path")]
    pub state_path: String,
    /// Feed used when none is stored, or the stored one is unknown.
    #[serde(default = "default_feed")]
    pub default_feed: String,
    /// Daily post time, `HH:MM`.
    #[serde(default = "default_post_time")]
    pub post_time: String,
    /// Time zone the post time is expressed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_state_path() -> String {
    "data/news_config.json".to_string()
}

fn default_feed() -> String {
    DEFAULT_FEED_ID.to_string()
}

fn default_post_time() -> String {
    "09:00".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            default_feed: default_feed(),
            post_time: default_post_time(),
            timezone: default_timezone(),
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024
}

fn default_user_agent() -> String {
    concat!("newsdesk/", env!("CARGO_PKG_VERSION"), " (feed reader)").to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            user_agent: default_user_agent(),
        }
    }
}

/// Discord delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied through `DISCORD_TOKEN`.
    #[serde(default)]
    pub token: String,
    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds.
    #[serde(default = "default_discord_timeout")]
    pub timeout_secs: u64,
    /// Log posts instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_discord_timeout() -> u64 {
    10
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
            timeout_secs: default_discord_timeout(),
            dry_run: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/newsdesk.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// News posting configuration.
    #[serde(default)]
    pub news: NewsSettings,
    /// Feed fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Discord delivery configuration.
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed registry. Empty means the built-in feeds.
    #[serde(default)]
    pub feeds: Vec<FeedDescriptor>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NewsError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NewsError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DISCORD_TOKEN`: Override the Discord bot token
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("DISCORD_TOKEN") {
            if !token.is_empty() {
                self.discord.token = token;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The post time or time zone cannot be parsed
    /// - The feed registry is invalid or does not contain the default feed
    pub fn validate(&self) -> Result<()> {
        self.post_time()?;
        self.timezone()?;
        self.registry()?;
        Ok(())
    }

    /// Parsed daily post time.
    pub fn post_time(&self) -> Result<NaiveTime> {
        parse_post_time(&self.news.post_time)
    }

    /// Parsed post time zone.
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.news.timezone)
    }

    /// The feed registry described by this configuration.
    pub fn registry(&self) -> Result<FeedRegistry> {
        if self.feeds.is_empty() {
            let builtin = FeedRegistry::builtin();
            return FeedRegistry::new(builtin.list().to_vec(), &self.news.default_feed);
        }
        FeedRegistry::new(self.feeds.clone(), &self.news.default_feed)
    }
}
