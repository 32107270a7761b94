use crate::error::GerberError;
use crate::polygon::{FillPolarity, PolygonShape};

/// Top `n` bits set (MSB-first), for `n` in `0..=8`. `mask_for(lo, hi)`
/// below combines two entries of this table to select an arbitrary bit
/// range within a byte without looping bit-by-bit.
const TOP_BITS: [u8; 9] = [0x00, 0x80, 0xC0, 0xE0, 0xF0, 0xF8, 0xFC, 0xFE, 0xFF];

fn mask_for(lo: usize, hi: usize) -> u8 {
    TOP_BITS[hi] & !TOP_BITS[lo]
}

/// A fully rasterized monochrome image: one bit per pixel, MSB-first within
/// each byte, packed left to right.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rows: Vec<Vec<u8>>,
}

impl RasterImage {
    pub fn row_bytes(width: u32) -> usize {
        (width as usize + 7) / 8
    }

    /// Read a single pixel's coverage bit. `true` means "dark" (set).
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        let row = &self.rows[y as usize];
        let byte = row[(x / 8) as usize];
        let bit = x % 8;
        (byte & (0x80 >> bit)) != 0
    }
}

/// Strip-based compositor: walks the image top to bottom in fixed-height
/// row strips, admitting and evicting polygons whose bounding box overlaps
/// the current strip, and composites each active polygon's scanline spans
/// into the strip using its fill polarity's operator.
pub struct Rasterizer {
    pub width: u32,
    pub height: u32,
    pub rows_per_strip: u32,
}

impl Rasterizer {
    pub fn new(width: u32, height: u32, rows_per_strip: u32) -> Self {
        Self {
            width,
            height,
            rows_per_strip: rows_per_strip.max(1),
        }
    }

    /// Render `polygons` into a full image. `background_dark` sets the
    /// initial state of every pixel before any polygon is composited,
    /// this is how %IP NEG (negative image polarity) is realized.
    pub fn render(
        &self,
        polygons: &[PolygonShape],
        background_dark: bool,
    ) -> Result<RasterImage, GerberError> {
        let row_bytes = RasterImage::row_bytes(self.width);
        let fill_byte = if background_dark { 0xFF } else { 0x00 };

        let mut rows: Vec<Vec<u8>> = Vec::new();
        rows.try_reserve(self.height as usize).map_err(|e| {
            GerberError::MemoryAllocation(format!("{} rows of {row_bytes} bytes: {e}", self.height))
        })?;
        rows.resize(self.height as usize, vec![fill_byte; row_bytes]);

        // Polygons are admitted in ascending bbox.min_y order so a single
        // forward pointer through this list suffices across all strips.
        let mut admission_order: Vec<usize> = (0..polygons.len()).collect();
        admission_order.sort_by(|&a, &b| {
            polygons[a]
                .bbox
                .1
                .partial_cmp(&polygons[b].bbox.1)
                .unwrap()
        });

        let mut admit_cursor = 0usize;
        let mut active: Vec<ActivePolygon<'_>> = Vec::new();

        let mut strip_top: u32 = 0;
        while strip_top < self.height {
            let strip_bottom = (strip_top + self.rows_per_strip).min(self.height);

            while admit_cursor < admission_order.len()
                && polygons[admission_order[admit_cursor]].bbox.1 < strip_bottom as f64
            {
                let idx = admission_order[admit_cursor];
                let shape = &polygons[idx];
                active.push(ActivePolygon {
                    shape,
                    scan: shape.scan(),
                });
                admit_cursor += 1;
            }

            // Evict anything that ended before this strip, back to front so
            // swap_remove never skips the element shifted into the current slot.
            let mut i = active.len();
            while i > 0 {
                i -= 1;
                if active[i].shape.bbox.3 < strip_top as f64 {
                    active.swap_remove(i);
                }
            }

            for y in strip_top..strip_bottom {
                let row = &mut rows[y as usize];
                let sample_y = y as f64 + 0.5;
                for ap in active.iter_mut() {
                    if sample_y < ap.shape.bbox.1 || sample_y > ap.shape.bbox.3 {
                        continue;
                    }
                    for (x0, x1) in ap.scan.spans_at(sample_y) {
                        apply_span(row, x0, x1, self.width, ap.shape.polarity);
                    }
                }
            }

            strip_top = strip_bottom;
        }

        Ok(RasterImage {
            width: self.width,
            height: self.height,
            rows,
        })
    }
}

struct ActivePolygon<'a> {
    shape: &'a PolygonShape,
    scan: crate::polygon::PolygonScan<'a>,
}

/// Composite one horizontal span `[x0, x1)` (real-valued pixel coordinates,
/// sampled at pixel centers) into `row` using `op`'s operator: `Dark` ORs
/// coverage in, `Clear` ANDs its complement in, `Xor` toggles it.
fn apply_span(row: &mut [u8], x0: f64, x1: f64, width: u32, op: FillPolarity) {
    let start = x0.round().max(0.0) as i64;
    let end = x1.round().min(width as f64) as i64;
    if start >= end {
        return;
    }
    let (start, end) = (start as usize, end as usize);

    let start_byte = start / 8;
    let end_byte = (end - 1) / 8;
    for byte_idx in start_byte..=end_byte {
        let byte_start_bit = byte_idx * 8;
        let lo = start.max(byte_start_bit) - byte_start_bit;
        let hi = (end.min(byte_start_bit + 8) - byte_start_bit).min(8);
        let mask = mask_for(lo, hi);
        match op {
            FillPolarity::Dark => row[byte_idx] |= mask,
            FillPolarity::Clear => row[byte_idx] &= !mask,
            FillPolarity::Xor => row[byte_idx] ^= mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64, polarity: FillPolarity) -> PolygonShape {
        PolygonShape::new(
            &[(min, min), (max, min), (max, max), (min, max)],
            polarity,
        )
        .unwrap()
    }

    #[test]
    fn test_single_dark_square() {
        let shapes = vec![square(2.0, 6.0, FillPolarity::Dark)];
        let rasterizer = Rasterizer::new(8, 8, 4);
        let img = rasterizer.render(&shapes, false).unwrap();
        assert!(img.pixel(3, 3));
        assert!(!img.pixel(0, 0));
        assert!(!img.pixel(7, 7));
    }

    #[test]
    fn test_clear_erases_dark() {
        let shapes = vec![
            square(0.0, 8.0, FillPolarity::Dark),
            square(2.0, 6.0, FillPolarity::Clear),
        ];
        let rasterizer = Rasterizer::new(8, 8, 8);
        let img = rasterizer.render(&shapes, false).unwrap();
        assert!(!img.pixel(3, 3));
        assert!(img.pixel(0, 0));
    }

    #[test]
    fn test_xor_toggles() {
        let shapes = vec![
            square(0.0, 8.0, FillPolarity::Xor),
            square(2.0, 6.0, FillPolarity::Xor),
        ];
        let rasterizer = Rasterizer::new(8, 8, 8);
        let img = rasterizer.render(&shapes, false).unwrap();
        // Double XOR in the overlap cancels back to background (off).
        assert!(!img.pixel(3, 3));
        // Outer ring (covered once) stays toggled on.
        assert!(img.pixel(0, 0));
    }

    #[test]
    fn test_negative_image_polarity_background() {
        let shapes: Vec<PolygonShape> = vec![];
        let rasterizer = Rasterizer::new(4, 4, 4);
        let img = rasterizer.render(&shapes, true).unwrap();
        assert!(img.pixel(0, 0));
    }

    #[test]
    fn test_strip_boundary_does_not_lose_coverage() {
        // A square straddling two strips of height 4 in an 8-row image.
        let shapes = vec![square(1.0, 7.0, FillPolarity::Dark)];
        let rasterizer = Rasterizer::new(8, 8, 4);
        let img = rasterizer.render(&shapes, false).unwrap();
        assert!(img.pixel(3, 3)); // strip 0
        assert!(img.pixel(3, 5)); // strip 1
    }

    #[test]
    fn test_row_bytes_rounds_up() {
        assert_eq!(RasterImage::row_bytes(9), 2);
        assert_eq!(RasterImage::row_bytes(8), 1);
        assert_eq!(RasterImage::row_bytes(1), 1);
    }
}
