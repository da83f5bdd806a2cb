mod config;
mod errors;
mod fetch;
mod layout;
mod mail;
mod models;
mod pipeline;
mod render;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::fetch::{BlogIndexFetcher, ImageDownloader};
use crate::layout::{default_layout_config, load_layout_config, FsAssetStore};
use crate::mail::HttpMailTransport;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting blog digest v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client for the index, the image downloads and the mail server
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let fetcher = BlogIndexFetcher::new(client.clone(), &config.blog_url)
        .with_context(|| format!("BLOG_URL '{}' is not a valid URL", config.blog_url))?;
    let downloader = ImageDownloader::new(client.clone(), config.images_dir.clone());
    let mailer = HttpMailTransport::new(client, config.mail_endpoint.clone());
    info!(
        blog = %config.blog_url,
        mail_endpoint = %config.mail_endpoint,
        recipients = config.mail_recipients.len(),
        "Clients initialized"
    );

    let layout = match &config.layout_config {
        Some(path) => {
            info!(path = %path.display(), "Loading layout override");
            load_layout_config(path)?
        }
        None => default_layout_config(),
    };

    let state = AppState {
        config,
        layout,
        fetcher: Arc::new(fetcher),
        downloader,
        assets: Arc::new(FsAssetStore),
        mailer: Arc::new(mailer),
    };

    let today = chrono::Local::now().date_naive();
    let summary = pipeline::run(&state, today).await?;

    info!(
        articles = summary.articles,
        pages = summary.pages,
        bytes = summary.bytes_written,
        mail_sent = summary.mail_sent,
        output = %state.config.output_path.display(),
        "Digest complete"
    );

    Ok(())
}
