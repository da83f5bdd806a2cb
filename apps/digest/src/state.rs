use std::sync::Arc;

use crate::config::Config;
use crate::fetch::{ContentFetcher, ImageDownloader};
use crate::layout::{AssetStore, LayoutConfig};
use crate::mail::MailTransport;

/// Everything a digest run needs, wired once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Page geometry and font metrics shared by layout and assembly.
    pub layout: LayoutConfig,
    pub fetcher: Arc<dyn ContentFetcher>,
    pub downloader: ImageDownloader,
    pub assets: Arc<dyn AssetStore>,
    pub mailer: Arc<dyn MailTransport>,
}
