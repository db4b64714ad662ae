//! Discord REST delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DiscordConfig;
use crate::delivery::Delivery;
use crate::news::RenderedArticle;
use crate::{NewsError, Result};

/// Posts articles as embeds through the Discord bot API.
#[derive(Clone)]
pub struct DiscordDelivery {
    client: Client,
    api_base: String,
    token: String,
}

impl DiscordDelivery {
    /// Create a client for the bot identified by `config.token`.
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        if config.token.is_empty() {
            return Err(NewsError::Config(
                "Discord token is not set. Set it in config.toml or via DISCORD_TOKEN.".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NewsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Check the token against the API. Succeeds once the bot can post.
    pub async fn connect(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/users/@me", self.api_base))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| NewsError::Delivery(format!("Discord request failed: {}", e)))?;
        let response = response
            .error_for_status()
            .map_err(|e| NewsError::Delivery(format!("Discord login failed: {}", e)))?;
        let me: DiscordUser = response
            .json()
            .await
            .map_err(|e| NewsError::Delivery(format!("invalid Discord response: {}", e)))?;
        info!(bot = %me.username, id = %me.id, "connected to Discord");
        Ok(())
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl Delivery for DiscordDelivery {
    async fn deliver(&self, channel_id: u64, article: &RenderedArticle) -> Result<()> {
        let payload = MessagePayload {
            embeds: vec![Embed::from(article)],
        };
        let result = self
            .client
            .post(format!("{}/channels/{}/messages", self.api_base, channel_id))
            .header("Authorization", self.auth_header())
            .json(&payload)
            .send()
            .await
            .and_then(|rsp| rsp.error_for_status());

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(channel_id, error = %e, "failed to post article");
                Err(NewsError::Delivery(format!("Discord post failed: {}", e)))
            }
        }
    }

    async fn resolve_channel(&self, channel_id: u64) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/channels/{}", self.api_base, channel_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| NewsError::Delivery(format!("Discord request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let channel: DiscordChannel = response
                    .json()
                    .await
                    .map_err(|e| NewsError::Delivery(format!("invalid Discord response: {}", e)))?;
                Ok(Some(match channel.name {
                    Some(name) => format!("#{}", name),
                    None => format!("channel {}", channel_id),
                }))
            }
            status => Err(NewsError::Delivery(format!(
                "Discord channel lookup failed: HTTP {}",
                status
            ))),
        }
    }
}

#[derive(Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct DiscordChannel {
    name: Option<String>,
}

#[derive(Serialize)]
struct MessagePayload {
    embeds: Vec<Embed>,
}

#[derive(Serialize)]
struct Embed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    color: u32,
    author: EmbedAuthor,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<EmbedFooter>,
}

#[derive(Serialize)]
struct EmbedAuthor {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    icon_url: String,
}

#[derive(Serialize)]
struct EmbedImage {
    url: String,
}

#[derive(Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Serialize)]
struct EmbedFooter {
    text: String,
}

impl From<&RenderedArticle> for Embed {
    fn from(article: &RenderedArticle) -> Self {
        Self {
            title: article.title.clone(),
            url: Some(article.url.clone()).filter(|u| !u.is_empty()),
            description: article.description.clone(),
            color: article.color,
            author: EmbedAuthor {
                name: article.author.name.clone(),
                url: article.author.url.clone(),
                icon_url: article.author.icon_url.clone(),
            },
            image: article.image_url.clone().map(|url| EmbedImage { url }),
            fields: article
                .fields
                .iter()
                .map(|f| EmbedField {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    inline: f.inline,
                })
                .collect(),
            footer: article.footer.clone().map(|text| EmbedFooter { text }),
        }
    }
}
