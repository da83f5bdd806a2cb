//! Text measurement and the fixed page geometry used by the layout engine.
//!
//! Widths are estimated with a single per-character factor instead of glyph
//! metrics. The estimate only needs to be good enough to decide where lines
//! break; it is not an exact bound on the rendered width.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Average glyph advance in em units applied to every character.
pub const CHAR_WIDTH_EM: f32 = 0.6;

/// Estimated rendered width of `text` at `font_size`, in points.
///
/// Counts Unicode scalar values, so the estimate is independent of UTF-8 byte length.
pub fn measure(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * CHAR_WIDTH_EM
}

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

/// Standard PDF fonts the document can reference without embedding glyph data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum FontFamily {
    Helvetica,
    TimesRoman,
    Courier,
}

impl FontFamily {
    /// PostScript base font name written into the font dictionary.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontFamily::Helvetica => "Helvetica",
            FontFamily::TimesRoman => "Times-Roman",
            FontFamily::Courier => "Courier",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout configuration
// ────────────────────────────────────────────────────────────────────────────

/// Font size and baseline-to-baseline distance for a wrapped text region.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TextStyle {
    pub font_size: f32,
    pub line_height: f32,
}

/// Width and height an image is scaled to on the page.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ImageBox {
    pub width: f32,
    pub height: f32,
}

/// Vertical anchors of one article block, measured down from the top edge of the page.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BlockAnchors {
    /// Baseline of the first title line.
    pub title_top: f32,
    /// Bottom edge of the article image.
    pub image_bottom: f32,
    /// Baseline of the first excerpt line.
    pub excerpt_top: f32,
    /// Baseline of the "By" label and the author name.
    pub byline: f32,
    /// Bottom edge of the author avatar.
    pub avatar_bottom: f32,
}

impl BlockAnchors {
    /// Returns the same anchors shifted `delta` points further down the page.
    pub fn shifted(&self, delta: f32) -> Self {
        Self {
            title_top: self.title_top + delta,
            image_bottom: self.image_bottom + delta,
            excerpt_top: self.excerpt_top + delta,
            byline: self.byline + delta,
            avatar_bottom: self.avatar_bottom + delta,
        }
    }
}

/// Fixed header content and placement, repeated on every page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeaderGeometry {
    pub heading: String,
    pub greeting: String,
    pub heading_size: f32,
    pub stamp_size: f32,
    pub greeting_size: f32,
    /// Distance from the top edge to the heading and date stamp baseline.
    pub heading_offset: f32,
    /// Distance from the top edge to the greeting baseline.
    pub greeting_offset: f32,
    /// Distance from the right edge to the start of the date stamp.
    pub stamp_inset: f32,
}

/// Horizontal positions shared by both article blocks.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColumnGeometry {
    /// Left column: title, article image and "By" label.
    pub left_x: f32,
    /// Right column: excerpt and link.
    pub right_x: f32,
    pub avatar_x: f32,
    pub author_x: f32,
    /// Wrap width of the right column.
    pub right_width: f32,
    /// Title wrap width is the page width minus this margin.
    pub title_margin: f32,
    /// Vertical gap between the last excerpt line and the first link line.
    pub link_gap: f32,
}

/// Read-only configuration consumed by the layout engine and the document assembler.
///
/// Coordinates follow PDF conventions: origin at the bottom-left corner, y grows upward.
/// A JSON override file may set any subset of the top-level fields; the rest keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub font: FontFamily,
    pub page_width: f32,
    pub page_height: f32,
    pub header: HeaderGeometry,
    pub columns: ColumnGeometry,
    pub primary: BlockAnchors,
    pub secondary: BlockAnchors,
    pub title: TextStyle,
    pub excerpt: TextStyle,
    pub link: TextStyle,
    /// Font size of the "By" label and author name.
    pub byline_size: f32,
    pub link_prefix: String,
    pub article_image: ImageBox,
    pub avatar: ImageBox,
}

impl LayoutConfig {
    /// Wrap width for article titles.
    pub fn title_width(&self) -> f32 {
        self.page_width - self.columns.title_margin
    }

    /// Converts a distance measured down from the top edge into a PDF y coordinate.
    pub fn from_top(&self, offset: f32) -> f32 {
        self.page_height - offset
    }
}

/// A4 page in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// Vertical distance between the primary and the secondary block.
pub const SECONDARY_BLOCK_SHIFT: f32 = 330.0;

/// Returns the default digest layout: A4, Helvetica, two article blocks per page.
pub fn default_layout_config() -> LayoutConfig {
    let primary = BlockAnchors {
        title_top: 170.0,
        image_bottom: 370.0,
        excerpt_top: 230.0,
        byline: 410.0,
        avatar_bottom: 420.0,
    };

    LayoutConfig {
        font: FontFamily::Helvetica,
        page_width: A4_WIDTH,
        page_height: A4_HEIGHT,
        header: HeaderGeometry {
            heading: "Latest Stackoverflow Articles".to_string(),
            greeting: "Hello Floks! here is the list of latest articles from Stackoverflow blog, enjoy :)"
                .to_string(),
            heading_size: 20.0,
            stamp_size: 12.0,
            greeting_size: 12.0,
            heading_offset: 70.0,
            greeting_offset: 110.0,
            stamp_inset: 140.0,
        },
        columns: ColumnGeometry {
            left_x: 50.0,
            right_x: 370.0,
            avatar_x: 80.0,
            author_x: 120.0,
            right_width: 220.0,
            title_margin: 100.0,
            link_gap: 20.0,
        },
        primary,
        secondary: primary.shifted(SECONDARY_BLOCK_SHIFT),
        title: TextStyle {
            font_size: 15.0,
            line_height: 20.0,
        },
        excerpt: TextStyle {
            font_size: 12.0,
            line_height: 15.0,
        },
        link: TextStyle {
            font_size: 10.0,
            line_height: 12.0,
        },
        byline_size: 12.0,
        link_prefix: "Know more here : ".to_string(),
        article_image: ImageBox {
            width: 300.0,
            height: 150.0,
        },
        avatar: ImageBox {
            width: 30.0,
            height: 30.0,
        },
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        default_layout_config()
    }
}

/// Reads a JSON layout override from `path` and applies it over the default layout.
pub fn load_layout_config(path: &Path) -> Result<LayoutConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout config '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid layout config '{}'", path.display()))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
