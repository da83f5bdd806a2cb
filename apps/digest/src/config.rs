use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_BLOG_URL: &str = "https://stackoverflow.blog/";
pub const DEFAULT_MAIL_ENDPOINT: &str = "https://127.0.0.1:9001/v1/mail-server/send/bulk-mail";
pub const DEFAULT_MAIL_SUBJECT: &str = "Latest Stackoverflow blogs";
pub const DEFAULT_MAIL_BODY: &str =
    "Your daily dose of Stackoverflow articles are waiting for you. Check out the attachment!";

/// Application configuration loaded from environment variables.
/// Startup fails if `MAIL_RECIPIENTS` is missing or empty.
#[derive(Debug, Clone)]
pub struct Config {
    pub blog_url: String,
    pub mail_endpoint: String,
    pub mail_recipients: Vec<String>,
    pub mail_subject: String,
    pub mail_body: String,
    pub images_dir: PathBuf,
    pub output_path: PathBuf,
    /// Optional JSON file overriding parts of the default page layout.
    pub layout_config: Option<PathBuf>,
    pub http_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs = optional_env("HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            blog_url: optional_env("BLOG_URL", DEFAULT_BLOG_URL),
            mail_endpoint: optional_env("MAIL_ENDPOINT", DEFAULT_MAIL_ENDPOINT),
            mail_recipients: parse_recipients(&require_env("MAIL_RECIPIENTS")?)?,
            mail_subject: optional_env("MAIL_SUBJECT", DEFAULT_MAIL_SUBJECT),
            mail_body: optional_env("MAIL_BODY", DEFAULT_MAIL_BODY),
            images_dir: PathBuf::from(optional_env("IMAGES_DIR", "images")),
            output_path: PathBuf::from(optional_env("OUTPUT_PATH", "output.pdf")),
            layout_config: std::env::var("LAYOUT_CONFIG").ok().map(PathBuf::from),
            http_timeout: Duration::from_secs(timeout_secs),
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

/// Splits a comma-separated recipient list, dropping blank entries.
pub fn parse_recipients(raw: &str) -> Result<Vec<String>> {
    let recipients: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();

    if recipients.is_empty() {
        bail!("MAIL_RECIPIENTS must name at least one address");
    }
    Ok(recipients)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
