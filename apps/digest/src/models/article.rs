use std::path::PathBuf;

/// One entry as scraped from the blog index, before any filtering.
///
/// Podcast entries carry no author block, so `author` stays `None` for them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    pub title: String,
    pub link: String,
    pub excerpt: String,
    pub author: Option<String>,
    pub author_image_url: Option<String>,
    pub article_image_url: Option<String>,
}

/// An article ready for layout: text fields plus local image paths.
///
/// The image refs are filled in by the downloader. `None` is a normal state
/// and means the image slot is left blank on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub title: String,
    pub link: String,
    pub excerpt: String,
    pub author: String,
    pub author_image_ref: Option<PathBuf>,
    pub article_image_ref: Option<PathBuf>,
}

impl ArticleRecord {
    /// Converts a scraped entry into a record. Entries without an author return `None`.
    pub fn from_raw(raw: RawArticle) -> Option<Self> {
        let author = raw.author?;
        Some(Self {
            title: raw.title,
            link: raw.link,
            excerpt: raw.excerpt,
            author,
            author_image_ref: None,
            article_image_ref: None,
        })
    }
}
