use thiserror::Error;

use crate::fetch::FetchError;
use crate::render::RenderError;

/// Errors that abort a digest run.
///
/// Mail failures are not part of this type: the pipeline logs them and the run
/// still counts as successful once the document is on disk.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
