//! Gerber-to-polygon compiler and polygon scanline rasterizer.
//!
//! [`render`] is the whole pipeline end to end: one or more Gerber RS-274X
//! sources go in, a single bit-packed monochrome [`raster::RasterImage`]
//! comes out. [`compile_document`] exposes the first half alone (Gerber text
//! to a [`document::GerberDocument`] of polygons) for callers that want to
//! inspect or recombine documents themselves before rasterizing.

pub mod config;
pub mod document;
pub mod error;
pub mod gerber;
pub mod polygon;
pub mod raster;

use config::RenderConfig;
use document::GerberDocument;
use error::GerberError;
use polygon::PolygonShape;
use raster::{RasterImage, Rasterizer};

/// Compile one Gerber source into its document of polygons, without
/// placing it into an image or combining it with any other source.
pub fn compile_document(input: &[u8], config: &RenderConfig) -> Result<GerberDocument, GerberError> {
    gerber::compile(input, config)
}

/// Compile every source and composite them into one rasterized image.
///
/// `sources` are compiled independently and their polygons pooled together;
/// each source's own `%OF` axis offset is what positions it relative to the
/// others, so overlaying files is just concatenating them here. The first
/// source's `%IP` image polarity, XORed with `config.invert_polarity`, sets
/// the base polarity `P0` for the whole image: the strip buffer starts all
/// dark when `P0` is clear and all clear when `P0` is dark, and every
/// polygon's own fill operator is swapped (dark for clear, clear for dark,
/// xor unchanged) whenever `P0` is clear, since a layer's Dark/Clear
/// polarity is only meaningful relative to the background it's drawn on.
pub fn render(sources: &[Vec<u8>], config: &RenderConfig) -> Result<RasterImage, GerberError> {
    if sources.is_empty() {
        return Err(GerberError::EmptyImage);
    }

    let mut documents = Vec::with_capacity(sources.len());
    for source in sources {
        documents.push(compile_document(source, config)?);
    }

    let base_polarity_dark = documents[0].image_polarity_dark ^ config.invert_polarity;

    let polygons: Vec<PolygonShape> = documents
        .iter()
        .flat_map(|doc| doc.polygons.iter().cloned())
        .collect();

    if polygons.is_empty() {
        return Err(GerberError::EmptyImage);
    }

    let (min_x, min_y, max_x, max_y) = polygons.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(ax0, ay0, ax1, ay1), shape| {
            let (x0, y0, x1, y1) = shape.bbox;
            (ax0.min(x0), ay0.min(y0), ax1.max(x1), ay1.max(y1))
        },
    );

    let border = config.border_pixels().max(0.0);
    let image_width = ((max_x - min_x) + 2.0 * border + 1.0).ceil().max(1.0) as u32;
    let image_height = ((max_y - min_y) + 2.0 * border + 1.0).ceil().max(1.0) as u32;

    let x_offset = border.floor() - min_x;
    let y_offset = border.floor() - min_y;

    let final_shapes: Vec<PolygonShape> = polygons
        .into_iter()
        .map(|shape| {
            let placed = shape
                .translated(x_offset, y_offset)
                .flipped_y(image_height as f64);
            let polarity = if base_polarity_dark {
                placed.polarity
            } else {
                placed.polarity.inverted()
            };
            placed.with_polarity(polarity)
        })
        .collect();

    let rows_per_strip = if config.rows_per_strip == 0 {
        image_height
    } else {
        config.rows_per_strip
    };

    let rasterizer = Rasterizer::new(image_width, image_height, rows_per_strip);
    rasterizer.render(&final_shapes, !base_polarity_dark)
}
