pub mod pdf;

use std::path::Path;

use tracing::info;

pub use pdf::{assemble, RenderError};

/// Writes the assembled document to `path`, creating parent directories as needed.
pub async fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote digest document");
    Ok(())
}
