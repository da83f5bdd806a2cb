// Digest layout: text measurement, line wrapping, asset resolution and page placement.
// Layout reads local image files, so callers run it inside tokio::task::spawn_blocking.

pub mod assets;
pub mod engine;
pub mod font_metrics;
pub mod wrap;

// Re-export the public API consumed by the pipeline and the renderer.
pub use assets::{AssetResolver, AssetStore, FsAssetStore};
pub use engine::PageLayoutEngine;
pub use font_metrics::{default_layout_config, load_layout_config, LayoutConfig};
