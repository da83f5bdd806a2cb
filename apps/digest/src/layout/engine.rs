//! Page layout: places article records two per page at fixed coordinates.
//!
//! # Pairing
//! Records are consumed in order, two at a time. The record at an even index is the
//! primary block at the top of the page; the record right after it (if any) is the
//! secondary block on the lower half. A list of N records yields `ceil(N / 2)` pages.
//!
//! # Flow
//! Title, excerpt and link text are wrapped and flow downward from their anchors.
//! The link starts a fixed gap below wherever the excerpt ended. Nothing checks
//! the page bounds: a very long excerpt runs into whatever lies below it.
//!
//! Image references that cannot be resolved leave their slot empty.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::layout::assets::{AssetResolver, EmbeddedImage};
use crate::layout::font_metrics::{BlockAnchors, ImageBox, LayoutConfig, TextStyle};
use crate::layout::wrap::{wrap_chars, wrap_words};
use crate::models::ArticleRecord;

// ────────────────────────────────────────────────────────────────────────────
// Page model
// ────────────────────────────────────────────────────────────────────────────

/// One line of text anchored at its baseline start.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

/// An image scaled into a box whose bottom-left corner is at `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub image: EmbeddedImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSlot {
    Primary,
    Secondary,
}

/// Everything drawn for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleBlock {
    pub slot: BlockSlot,
    pub title: Vec<TextLine>,
    pub article_image: Option<PlacedImage>,
    pub excerpt: Vec<TextLine>,
    pub link: Vec<TextLine>,
    pub byline_label: TextLine,
    pub author_image: Option<PlacedImage>,
    pub author_name: TextLine,
}

impl ArticleBlock {
    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.title
            .iter()
            .chain(&self.excerpt)
            .chain(&self.link)
            .chain([&self.byline_label, &self.author_name])
    }

    pub fn images(&self) -> impl Iterator<Item = &PlacedImage> {
        self.article_image.iter().chain(self.author_image.iter())
    }
}

/// Heading, date stamp and greeting repeated at the top of every page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    pub heading: TextLine,
    pub date_stamp: TextLine,
    pub greeting: TextLine,
}

/// One rendered sheet: the header plus up to two article blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub header: PageHeader,
    pub primary: ArticleBlock,
    pub secondary: Option<ArticleBlock>,
}

impl Page {
    pub fn blocks(&self) -> impl Iterator<Item = &ArticleBlock> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }

    /// All text on the page, header first, in drawing order.
    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        [
            &self.header.heading,
            &self.header.date_stamp,
            &self.header.greeting,
        ]
        .into_iter()
        .chain(self.blocks().flat_map(ArticleBlock::text_lines))
    }

    pub fn images(&self) -> impl Iterator<Item = &PlacedImage> {
        self.blocks().flat_map(ArticleBlock::images)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Formats the header date stamp as `Date : D/M/YYYY` without zero padding.
pub fn format_date_stamp(date: NaiveDate) -> String {
    format!("Date : {}/{}/{}", date.day(), date.month(), date.year())
}

/// Lays out article records as pages. Holds only read-only state, so each page
/// depends on nothing but its own records.
pub struct PageLayoutEngine {
    config: LayoutConfig,
    resolver: AssetResolver,
    date_stamp: String,
}

impl PageLayoutEngine {
    pub fn new(config: LayoutConfig, resolver: AssetResolver, today: NaiveDate) -> Self {
        Self {
            config,
            resolver,
            date_stamp: format_date_stamp(today),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `articles` in order, one page per pair.
    pub fn layout(&self, articles: &[ArticleRecord]) -> Vec<Page> {
        let pages: Vec<Page> = articles
            .chunks(2)
            .map(|pair| self.layout_page(&pair[0], pair.get(1)))
            .collect();

        debug!(
            articles = articles.len(),
            pages = pages.len(),
            "Laid out digest pages"
        );
        pages
    }

    fn layout_page(&self, primary: &ArticleRecord, secondary: Option<&ArticleRecord>) -> Page {
        Page {
            header: self.layout_header(),
            primary: self.layout_block(primary, &self.config.primary, BlockSlot::Primary),
            secondary: secondary.map(|article| {
                self.layout_block(article, &self.config.secondary, BlockSlot::Secondary)
            }),
        }
    }

    fn layout_header(&self) -> PageHeader {
        let cfg = &self.config;
        let header = &cfg.header;
        let heading_y = cfg.from_top(header.heading_offset);

        PageHeader {
            heading: TextLine {
                text: header.heading.clone(),
                x: cfg.columns.left_x,
                y: heading_y,
                font_size: header.heading_size,
            },
            date_stamp: TextLine {
                text: self.date_stamp.clone(),
                x: cfg.page_width - header.stamp_inset,
                y: heading_y,
                font_size: header.stamp_size,
            },
            greeting: TextLine {
                text: header.greeting.clone(),
                x: cfg.columns.left_x,
                y: cfg.from_top(header.greeting_offset),
                font_size: header.greeting_size,
            },
        }
    }

    fn layout_block(
        &self,
        article: &ArticleRecord,
        anchors: &BlockAnchors,
        slot: BlockSlot,
    ) -> ArticleBlock {
        let cfg = &self.config;
        let cols = &cfg.columns;

        let (title, _) = flow_lines(
            wrap_words(&article.title, cfg.title_width(), cfg.title.font_size),
            cols.left_x,
            cfg.from_top(anchors.title_top),
            cfg.title,
        );

        let article_image = self.place_image(
            article.article_image_ref.as_deref(),
            cols.left_x,
            cfg.from_top(anchors.image_bottom),
            cfg.article_image,
        );

        let (excerpt, after_excerpt) = flow_lines(
            wrap_words(&article.excerpt, cols.right_width, cfg.excerpt.font_size),
            cols.right_x,
            cfg.from_top(anchors.excerpt_top),
            cfg.excerpt,
        );

        let link_text = format!("{}{}", cfg.link_prefix, article.link);
        let (link, _) = flow_lines(
            wrap_chars(&link_text, cols.right_width, cfg.link.font_size),
            cols.right_x,
            after_excerpt - cols.link_gap,
            cfg.link,
        );

        let byline_y = cfg.from_top(anchors.byline);
        let author_image = self.place_image(
            article.author_image_ref.as_deref(),
            cols.avatar_x,
            cfg.from_top(anchors.avatar_bottom),
            cfg.avatar,
        );

        ArticleBlock {
            slot,
            title,
            article_image,
            excerpt,
            link,
            byline_label: TextLine {
                text: "By".to_string(),
                x: cols.left_x,
                y: byline_y,
                font_size: cfg.byline_size,
            },
            author_image,
            author_name: TextLine {
                text: article.author.clone(),
                x: cols.author_x,
                y: byline_y,
                font_size: cfg.byline_size,
            },
        }
    }

    fn place_image(
        &self,
        reference: Option<&std::path::Path>,
        x: f32,
        y: f32,
        size: ImageBox,
    ) -> Option<PlacedImage> {
        let reference = reference?;
        match self.resolver.resolve(reference) {
            Ok(image) => Some(PlacedImage {
                image,
                x,
                y,
                width: size.width,
                height: size.height,
            }),
            Err(e) => {
                warn!(error = %e, "Skipping unavailable image");
                None
            }
        }
    }
}

/// Positions wrapped lines downward from `top`. Returns the lines and the baseline
/// the next line would have taken.
fn flow_lines(lines: Vec<String>, x: f32, top: f32, style: TextStyle) -> (Vec<TextLine>, f32) {
    let mut y = top;
    let placed = lines
        .into_iter()
        .map(|text| {
            let line = TextLine {
                text,
                x,
                y,
                font_size: style.font_size,
            };
            y -= style.line_height;
            line
        })
        .collect();
    (placed, y)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
