//! Document assembly: serializes laid-out pages into a single PDF byte buffer.
//!
//! The standard Helvetica font is written once and referenced from every page's
//! resources. Each placed image becomes an image XObject; JPEGs keep their DCT
//! stream, everything else is written as Flate-compressed RGB with an optional
//! soft mask. Page content streams are Flate-compressed.

use std::path::PathBuf;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};
use thiserror::Error;
use tracing::debug;

use crate::layout::assets::{EmbeddedImage, ImageData};
use crate::layout::engine::Page;
use crate::layout::font_metrics::LayoutConfig;

/// Resource name of the shared font on every page.
const FONT_NAME: &[u8] = b"F1";
const DEFLATE_LEVEL: u8 = 6;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document has too many pages to serialize: {0}")]
    TooManyPages(usize),

    #[error("image {path} is too large to embed ({width}x{height})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Serializes `pages` in order. Either every page is written or an error is returned.
pub fn assemble(pages: &[Page], config: &LayoutConfig) -> Result<Vec<u8>, RenderError> {
    let page_count = i32::try_from(pages.len()).map_err(|_| RenderError::TooManyPages(pages.len()))?;

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let font_id = alloc.bump();
    let page_ids: Vec<Ref> = pages.iter().map(|_| alloc.bump()).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_count);
    pdf.type1_font(font_id)
        .base_font(Name(config.font.base_font().as_bytes()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (page, &page_id) in pages.iter().zip(&page_ids) {
        let content_id = alloc.bump();
        let mut content = Content::new();

        for line in page.text_lines().filter(|l| !l.text.is_empty()) {
            let encoded = encode_win_ansi(&line.text);
            content
                .begin_text()
                .set_font(Name(FONT_NAME), line.font_size)
                .next_line(line.x, line.y)
                .show(Str(&encoded))
                .end_text();
        }

        let mut image_names: Vec<(String, Ref)> = Vec::new();
        for placed in page.images() {
            let image_id = write_image(&mut pdf, &mut alloc, &placed.image)?;
            let name = format!("Im{}", image_names.len() + 1);

            content.save_state();
            content.transform([placed.width, 0.0, 0.0, placed.height, placed.x, placed.y]);
            content.x_object(Name(name.as_bytes()));
            content.restore_state();

            image_names.push((name, image_id));
        }

        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, DEFLATE_LEVEL);
        pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);

        let mut page_writer = pdf.page(page_id);
        page_writer
            .media_box(Rect::new(0.0, 0.0, config.page_width, config.page_height))
            .parent(page_tree_id)
            .contents(content_id);

        let mut resources = page_writer.resources();
        resources.fonts().pair(Name(FONT_NAME), font_id);
        if !image_names.is_empty() {
            let mut x_objects = resources.x_objects();
            for (name, image_id) in &image_names {
                x_objects.pair(Name(name.as_bytes()), *image_id);
            }
        }
    }

    let bytes = pdf.finish();
    debug!(pages = pages.len(), bytes = bytes.len(), "Assembled PDF document");
    Ok(bytes)
}

/// Writes `image` as an XObject (plus a soft mask when it has alpha) and returns its ref.
fn write_image(pdf: &mut Pdf, alloc: &mut Ref, image: &EmbeddedImage) -> Result<Ref, RenderError> {
    let too_large = || RenderError::ImageTooLarge {
        path: image.source.clone(),
        width: image.pixel_width,
        height: image.pixel_height,
    };
    let width = i32::try_from(image.pixel_width).map_err(|_| too_large())?;
    let height = i32::try_from(image.pixel_height).map_err(|_| too_large())?;

    let image_id = alloc.bump();
    match &image.data {
        ImageData::Jpeg { bytes, grayscale } => {
            let mut xobj = pdf.image_xobject(image_id, bytes);
            xobj.filter(Filter::DctDecode);
            xobj.width(width);
            xobj.height(height);
            if *grayscale {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        ImageData::Deflated { rgb, alpha } => {
            let mask_id = alpha.as_ref().map(|alpha| {
                let mask_id = alloc.bump();
                let mut mask = pdf.image_xobject(mask_id, alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(width);
                mask.height(height);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_id
            });

            let mut xobj = pdf.image_xobject(image_id, rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(width);
            xobj.height(height);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_id) = mask_id {
                xobj.s_mask(mask_id);
            }
        }
    }

    Ok(image_id)
}

/// Encodes text for a WinAnsi (cp1252) simple font. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{0020}'..='\u{007E}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            '\t' | '\n' | '\r' => b' ',
            _ => b'?',
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
