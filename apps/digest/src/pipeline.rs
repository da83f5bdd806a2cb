//! One digest run, end to end.
//!
//! 1. Clear the image directory.
//! 2. Fetch the blog index.
//! 3. Download every article's images concurrently and join.
//! 4. Lay out and assemble the PDF on the blocking pool.
//! 5. Write the document to disk.
//! 6. Mail it. A mail failure is logged; the run still succeeds.

use chrono::NaiveDate;
use tracing::{error, info};

use crate::errors::AppError;
use crate::fetch::clear_images;
use crate::layout::{AssetResolver, PageLayoutEngine};
use crate::mail::MailMessage;
use crate::render::{assemble, write_output};
use crate::state::AppState;

const DEFAULT_ATTACHMENT_NAME: &str = "output.pdf";

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub articles: usize,
    pub pages: usize,
    pub bytes_written: usize,
    pub mail_sent: bool,
}

pub async fn run(state: &AppState, today: NaiveDate) -> Result<RunSummary, AppError> {
    let config = &state.config;

    clear_images(&config.images_dir).await?;

    let scraped = state.fetcher.fetch_articles().await?;
    info!(entries = scraped.len(), "Scraped blog index");

    let articles = state.downloader.download_all(scraped).await;
    let article_count = articles.len();

    let engine = PageLayoutEngine::new(
        state.layout.clone(),
        AssetResolver::new(state.assets.clone()),
        today,
    );
    let (page_count, document) = tokio::task::spawn_blocking(move || {
        let pages = engine.layout(&articles);
        let bytes = assemble(&pages, engine.config())?;
        Ok::<_, AppError>((pages.len(), bytes))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))??;
    info!(
        articles = article_count,
        pages = page_count,
        bytes = document.len(),
        "Laid out digest"
    );

    write_output(&config.output_path, &document).await?;

    let message = MailMessage {
        recipients: config.mail_recipients.clone(),
        subject: config.mail_subject.clone(),
        body: config.mail_body.clone(),
        attachment_name: config
            .output_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string()),
        attachment: document,
    };
    let mail_sent = match state.mailer.send(&message).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, path = %config.output_path.display(), "Failed to mail digest");
            false
        }
    };

    Ok(RunSummary {
        articles: article_count,
        pages: page_count,
        bytes_written: message.attachment.len(),
        mail_sent,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
