//! Blog index fetching.
//!
//! `ContentFetcher` is the seam the pipeline depends on. `BlogIndexFetcher` is the
//! default backend: a plain HTTP GET of the index page parsed with `scraper`.
//! Podcast entries have no author block; they come back with `author: None`
//! and are dropped before layout.

pub mod images;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::models::RawArticle;

pub use images::{clear_images, ImageDownloader};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selector {selector:?}: {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },

    #[error("Blog index has no #content element")]
    MissingContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Source of scraped article tuples, in page order.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_articles(&self) -> Result<Vec<RawArticle>, FetchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// BlogIndexFetcher
// ────────────────────────────────────────────────────────────────────────────

/// Fetches the blog index over HTTP and parses its article cards.
#[derive(Clone)]
pub struct BlogIndexFetcher {
    client: Client,
    index_url: Url,
}

impl BlogIndexFetcher {
    pub fn new(client: Client, index_url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            client,
            index_url: Url::parse(index_url)?,
        })
    }
}

#[async_trait]
impl ContentFetcher for BlogIndexFetcher {
    async fn fetch_articles(&self) -> Result<Vec<RawArticle>, FetchError> {
        let html = self
            .client
            .get(self.index_url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let articles = parse_blog_index(&html, &self.index_url)?;
        info!(
            url = %self.index_url,
            articles = articles.len(),
            "Fetched blog index"
        );
        Ok(articles)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTML parsing
// ────────────────────────────────────────────────────────────────────────────

struct IndexSelectors {
    content: Selector,
    article: Selector,
    title_link: Selector,
    excerpt: Selector,
    author: Selector,
    author_image: Selector,
    article_image: Selector,
}

impl IndexSelectors {
    fn new() -> Result<Self, FetchError> {
        Ok(Self {
            content: selector("#content")?,
            article: selector("article")?,
            title_link: selector("h2 a")?,
            excerpt: selector("div.lh-excerpt")?,
            author: selector("span a.author")?,
            author_image: selector("img.avatar.avatar-40")?,
            article_image: selector("img.wp-post-image")?,
        })
    }
}

fn selector(css: &'static str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Selector {
        selector: css,
        message: e.to_string(),
    })
}

/// Extracts article cards from the blog index HTML, in document order.
///
/// Relative links and image URLs are resolved against `base`. Cards without a
/// title link are skipped.
pub fn parse_blog_index(html: &str, base: &Url) -> Result<Vec<RawArticle>, FetchError> {
    let selectors = IndexSelectors::new()?;
    let document = Html::parse_document(html);

    let content = document
        .select(&selectors.content)
        .next()
        .ok_or(FetchError::MissingContent)?;

    let mut articles = Vec::new();
    for card in content.select(&selectors.article) {
        let Some(title_link) = card.select(&selectors.title_link).next() else {
            warn!("Skipping article card without a title link");
            continue;
        };

        articles.push(RawArticle {
            title: inner_text(title_link),
            link: absolute_attr(title_link, "href", base).unwrap_or_default(),
            excerpt: card
                .select(&selectors.excerpt)
                .next()
                .map(inner_text)
                .unwrap_or_default(),
            author: card
                .select(&selectors.author)
                .next()
                .map(inner_text)
                .filter(|name| !name.is_empty()),
            author_image_url: card
                .select(&selectors.author_image)
                .next()
                .and_then(|img| absolute_attr(img, "src", base)),
            article_image_url: card
                .select(&selectors.article_image)
                .next()
                .and_then(|img| absolute_attr(img, "src", base)),
        });
    }

    Ok(articles)
}

/// Visible text of an element with whitespace runs collapsed.
fn inner_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolute_attr(element: ElementRef<'_>, attr: &str, base: &Url) -> Option<String> {
    let value = element.value().attr(attr)?.trim();
    if value.is_empty() {
        return None;
    }
    base.join(value).ok().map(String::from)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
