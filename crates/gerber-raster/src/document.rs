use crate::polygon::PolygonShape;

/// The compiled output of one Gerber source: every polygon the plotter
/// produced, the document's image polarity, and any recoverable warnings
/// collected along the way.
#[derive(Debug)]
pub struct GerberDocument {
    pub polygons: Vec<PolygonShape>,
    /// From %IP. `true` (POS) is the default when the parameter is absent.
    pub image_polarity_dark: bool,
    pub warnings: Vec<String>,
}

impl GerberDocument {
    /// The bounding box covering every polygon, or `None` for an empty
    /// document (no flashes or strokes were ever emitted).
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        self.polygons.iter().fold(None, |acc, shape| {
            let (x0, y0, x1, y1) = shape.bbox;
            Some(match acc {
                None => shape.bbox,
                Some((ax0, ay0, ax1, ay1)) => (ax0.min(x0), ay0.min(y0), ax1.max(x1), ay1.max(y1)),
            })
        })
    }
}
