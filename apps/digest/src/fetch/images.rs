//! Image download into the local asset directory.
//!
//! All images of a run are fetched concurrently and joined once before layout
//! starts. A failed download is logged and leaves that image ref empty.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetch::FetchError;
use crate::models::{ArticleRecord, RawArticle};

/// Removes every file from `dir` so images from an earlier run never reach a new digest.
/// Creates the directory when it does not exist yet.
pub async fn clear_images(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path()).await?;
            removed += 1;
        }
    }

    info!(dir = %dir.display(), removed, "Cleared image directory");
    Ok(())
}

/// Local file name for an author's avatar.
pub fn author_image_name(author: &str) -> String {
    format!("{}.png", sanitize(author.trim()))
}

/// Local file name for an article image: the URL's last path segment up to its first dot.
pub fn article_image_name(image_url: &str) -> Option<String> {
    let url = Url::parse(image_url).ok()?;
    let basename = url.path_segments()?.next_back()?;
    let stem = basename.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}.jpeg", sanitize(stem)))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            _ => c,
        })
        .collect()
}

/// Distinct downloads for one run: one entry per URL, each with a unique file name.
#[derive(Default)]
struct DownloadPlan {
    targets: Vec<(String, String)>,
    by_url: HashMap<String, usize>,
    names: HashSet<String>,
}

impl DownloadPlan {
    /// Index of the download for `url`, registering it under `file_name` (or a
    /// numbered variant when that name is taken by another URL) on first use.
    fn slot(&mut self, url: String, file_name: String) -> usize {
        if let Some(&index) = self.by_url.get(&url) {
            return index;
        }

        let mut unique = file_name.clone();
        let mut n = 2;
        while self.names.contains(&unique) {
            unique = numbered_name(&file_name, n);
            n += 1;
        }

        let index = self.targets.len();
        self.names.insert(unique.clone());
        self.by_url.insert(url.clone(), index);
        self.targets.push((url, unique));
        index
    }
}

/// `hero.jpeg` with `n = 2` becomes `hero-2.jpeg`.
fn numbered_name(file_name: &str, n: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{n}.{ext}"),
        None => format!("{file_name}-{n}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Downloader
// ────────────────────────────────────────────────────────────────────────────

/// Downloads article and author images into a single directory.
#[derive(Clone)]
pub struct ImageDownloader {
    client: Client,
    dir: PathBuf,
}

impl ImageDownloader {
    pub fn new(client: Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: dir.into(),
        }
    }

    /// Turns scraped entries into layout records with local image refs.
    ///
    /// Entries without an author are dropped first. Every distinct image URL is
    /// downloaded once, all concurrently, into its own file; records that point
    /// at the same URL share the file. The returned records keep the input order.
    pub async fn download_all(&self, articles: Vec<RawArticle>) -> Vec<ArticleRecord> {
        let mut plan = DownloadPlan::default();
        let mut pending = Vec::new();
        for raw in articles {
            let author_url = raw.author_image_url.clone();
            let article_url = raw.article_image_url.clone();
            let Some(record) = ArticleRecord::from_raw(raw) else {
                continue;
            };

            let author_slot = author_url.map(|url| {
                let name = author_image_name(&record.author);
                plan.slot(url, name)
            });
            let article_slot = article_url.and_then(|url| {
                let name = article_image_name(&url)?;
                Some(plan.slot(url, name))
            });
            pending.push((record, author_slot, article_slot));
        }

        let saved: Vec<Option<PathBuf>> = join_all(
            plan.targets
                .iter()
                .map(|(url, file_name)| self.try_download(url, file_name)),
        )
        .await;

        let records: Vec<ArticleRecord> = pending
            .into_iter()
            .map(|(mut record, author_slot, article_slot)| {
                record.author_image_ref = author_slot.and_then(|i| saved[i].clone());
                record.article_image_ref = article_slot.and_then(|i| saved[i].clone());
                record
            })
            .collect();

        info!(
            articles = records.len(),
            downloads = plan.targets.len(),
            author_images = records.iter().filter(|r| r.author_image_ref.is_some()).count(),
            article_images = records.iter().filter(|r| r.article_image_ref.is_some()).count(),
            "Downloaded article images"
        );
        records
    }

    async fn try_download(&self, url: &str, file_name: &str) -> Option<PathBuf> {
        match self.download(url, file_name).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(url, error = %e, "Image download failed, slot will be left empty");
                None
            }
        }
    }

    /// Downloads `url` to `<dir>/<file_name>` and returns the local path.
    pub async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, FetchError> {
        let body: Bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, &body).await?;
        debug!(url, path = %path.display(), bytes = body.len(), "Saved image");
        Ok(path)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn make_raw(author: Option<&str>, author_url: Option<String>, article_url: Option<String>) -> RawArticle {
        RawArticle {
            title: "Title".to_string(),
            link: "https://stackoverflow.blog/post".to_string(),
            excerpt: "Excerpt".to_string(),
            author: author.map(str::to_string),
            author_image_url: author_url,
            article_image_url: article_url,
        }
    }

    // ── file names ──────────────────────────────────────────────────────────

    #[test]
    fn test_author_image_name_uses_author() {
        assert_eq!(author_image_name("Ryan Donovan"), "Ryan Donovan.png");
    }

    #[test]
    fn test_author_image_name_replaces_separators() {
        assert_eq!(author_image_name("AC/DC"), "AC_DC.png");
    }

    #[test]
    fn test_article_image_name_strips_extension_and_query() {
        assert_eq!(
            article_image_name("https://cdn.example.com/uploads/2024/hero-shot.min.jpg?w=600"),
            Some("hero-shot.jpeg".to_string())
        );
    }

    #[test]
    fn test_article_image_name_rejects_empty_basename() {
        assert_eq!(article_image_name("https://cdn.example.com/uploads/"), None);
        assert_eq!(article_image_name("not a url"), None);
    }

    // ── clear_images ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_clear_images_removes_files_only() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("old.png"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("old.jpeg"), b"y").await.unwrap();
        tokio::fs::create_dir(dir.path().join("keep")).await.unwrap();

        clear_images(dir.path()).await.unwrap();

        let mut remaining = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            remaining.push(entry.file_name());
        }
        assert_eq!(remaining, vec![std::ffi::OsString::from("keep")]);
    }

    #[tokio::test]
    async fn test_clear_images_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        clear_images(&images).await.unwrap();
        assert!(images.is_dir());
    }

    // ── download_all ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_download_all_saves_images_and_keeps_order() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/avatars/ryan.png");
                then.status(200).body(b"avatar-bytes".as_slice());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/uploads/hero.jpg");
                then.status(200).body(b"hero-bytes".as_slice());
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(Client::new(), dir.path());

        let mut second = make_raw(Some("Second"), None, None);
        second.title = "Second".to_string();
        let records = downloader
            .download_all(vec![
                make_raw(
                    Some("Ryan"),
                    Some(server.url("/avatars/ryan.png")),
                    Some(server.url("/uploads/hero.jpg")),
                ),
                second,
            ])
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].author, "Ryan");
        assert_eq!(records[1].title, "Second");

        let avatar = records[0].author_image_ref.as_ref().unwrap();
        assert_eq!(avatar, &dir.path().join("Ryan.png"));
        assert_eq!(tokio::fs::read(avatar).await.unwrap(), b"avatar-bytes");

        let hero = records[0].article_image_ref.as_ref().unwrap();
        assert_eq!(hero, &dir.path().join("hero.jpeg"));
        assert_eq!(tokio::fs::read(hero).await.unwrap(), b"hero-bytes");

        assert!(records[1].author_image_ref.is_none());
        assert!(records[1].article_image_ref.is_none());
    }

    #[tokio::test]
    async fn test_download_all_drops_entries_without_author() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(Client::new(), dir.path());

        let records = downloader
            .download_all(vec![make_raw(None, None, None), make_raw(Some("A"), None, None)])
            .await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].author, "A");
    }

    #[test]
    fn test_numbered_name_keeps_extension() {
        assert_eq!(numbered_name("hero.jpeg", 2), "hero-2.jpeg");
        assert_eq!(numbered_name("noext", 3), "noext-3");
    }

    #[tokio::test]
    async fn test_colliding_stems_get_separate_files() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2024/01/hero.jpg");
                then.status(200).body(b"january".as_slice());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2024/02/hero.png");
                then.status(200).body(b"february".as_slice());
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(Client::new(), dir.path());
        let records = downloader
            .download_all(vec![
                make_raw(Some("A"), None, Some(server.url("/2024/01/hero.jpg"))),
                make_raw(Some("B"), None, Some(server.url("/2024/02/hero.png"))),
            ])
            .await;

        let first = records[0].article_image_ref.as_ref().unwrap();
        let second = records[1].article_image_ref.as_ref().unwrap();
        assert_eq!(first, &dir.path().join("hero.jpeg"));
        assert_eq!(second, &dir.path().join("hero-2.jpeg"));
        assert_eq!(tokio::fs::read(first).await.unwrap(), b"january");
        assert_eq!(tokio::fs::read(second).await.unwrap(), b"february");
    }

    #[tokio::test]
    async fn test_shared_avatar_is_downloaded_once() {
        let server = MockServer::start_async().await;
        let avatar = server
            .mock_async(|when, then| {
                when.method(GET).path("/avatars/ryan.png");
                then.status(200).body(b"avatar-bytes".as_slice());
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(Client::new(), dir.path());
        let url = server.url("/avatars/ryan.png");
        let records = downloader
            .download_all(vec![
                make_raw(Some("Ryan"), Some(url.clone()), None),
                make_raw(Some("Ryan"), Some(url), None),
            ])
            .await;

        avatar.assert_hits_async(1).await;
        assert_eq!(records[0].author_image_ref, records[1].author_image_ref);
        assert_eq!(
            records[0].author_image_ref.as_deref(),
            Some(dir.path().join("Ryan.png").as_path())
        );
    }

    #[tokio::test]
    async fn test_failed_download_leaves_ref_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.png");
                then.status(404);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = ImageDownloader::new(Client::new(), dir.path());
        let records = downloader
            .download_all(vec![make_raw(Some("A"), Some(server.url("/missing.png")), None)])
            .await;

        assert!(records[0].author_image_ref.is_none());
        assert!(!dir.path().join("A.png").exists());
    }
}
