//! Presentation of articles for the delivery boundary.

use serde::Serialize;

use crate::datetime::format_published;
use crate::news::types::{Article, FeedDescriptor};

/// Footer attached to scheduled posts.
pub const DAILY_FOOTER: &str = "📰 Automatic daily news";

/// Publication block shown above the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

/// A labelled value shown below the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// An article ready to be shown in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedArticle {
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
    pub author: EmbedAuthor,
    pub image_url: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl RenderedArticle {
    /// Render `article` with the presentation metadata of `feed`.
    pub fn new(article: &Article, feed: &FeedDescriptor) -> Self {
        let mut fields = Vec::new();
        if let Some(author) = &article.author {
            fields.push(EmbedField {
                name: "Author".to_string(),
                value: author.clone(),
                inline: true,
            });
        }
        if let Some(published_at) = &article.published_at {
            fields.push(EmbedField {
                name: "Published".to_string(),
                value: format_published(published_at),
                inline: true,
            });
        }

        Self {
            title: article.title.clone(),
            url: article.canonical_url.clone(),
            description: article.summary.clone(),
            color: feed.accent_color,
            author: EmbedAuthor {
                name: feed.display_name.clone(),
                url: feed.home_url.clone(),
                icon_url: feed.icon_url.clone(),
            },
            image_url: article.image_url.clone(),
            fields,
            footer: None,
        }
    }

    /// Attach a footer.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Render as plain text, for consoles and logs.
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("[{}] {}", self.author.name, self.title);
        if !self.url.is_empty() {
            out.push_str(&format!("\n{}", self.url));
        }
        if !self.description.is_empty() {
            out.push_str(&format!("\n{}", self.description));
        }
        for field in &self.fields {
            out.push_str(&format!("\n{}: {}", field.name, field.value));
        }
        if let Some(footer) = &self.footer {
            out.push_str(&format!("\n-- {}", footer));
        }
        out
    }
}
