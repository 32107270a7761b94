use crate::error::GerberError;

/// Effective fill operator for a polygon once layer polarity, image polarity,
/// and aperture-macro exposure have all been folded together.
///
/// `Dark` ORs the polygon's coverage into the strip, `Clear` ANDs its
/// complement in (erasing previously-drawn coverage), and `Xor` toggles it.
/// Macro primitives with exposure 0 and %LP C layers both resolve to `Clear`
/// rather than being dropped from the polygon list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolarity {
    Dark,
    Clear,
    Xor,
}

impl FillPolarity {
    /// Flip `Dark` to `Clear` and vice versa; `Xor` is its own inverse.
    ///
    /// Used both for macro-primitive exposure inside a %LP C layer and for
    /// composing a document's polygons against a `CLEAR` base image polarity.
    pub fn inverted(self) -> Self {
        match self {
            FillPolarity::Dark => FillPolarity::Clear,
            FillPolarity::Clear => FillPolarity::Dark,
            FillPolarity::Xor => FillPolarity::Xor,
        }
    }
}

/// One non-horizontal edge of a polygon boundary, as stored in the edge table.
///
/// `x_at_y_min` and `inv_slope` let any scanline's crossing x be recovered
/// directly as `x_at_y_min + (y - y_min) * inv_slope`, so the active edge
/// list never needs to accumulate rounding error across many rows.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EtEdge {
    y_min: f64,
    y_max: f64,
    x_at_y_min: f64,
    inv_slope: f64,
}

impl EtEdge {
    fn x_at(&self, y: f64) -> f64 {
        self.x_at_y_min + (y - self.y_min) * self.inv_slope
    }
}

/// An immutable filled region: its vertex loop, bounding box, and edge table.
///
/// Construction does all the per-polygon work once; [`PolygonShape::scan`]
/// hands out a cheap cursor that can walk the shape's scanlines without
/// mutating or re-deriving the edge table.
#[derive(Debug, Clone)]
pub struct PolygonShape {
    pub polarity: FillPolarity,
    pub bbox: (f64, f64, f64, f64), // (min_x, min_y, max_x, max_y)
    edge_table: Vec<EtEdge>,        // sorted ascending by y_min
}

impl PolygonShape {
    /// Build a polygon from a closed vertex loop (the last vertex need not
    /// repeat the first; the edge between them is added implicitly).
    pub fn new(vertices: &[(f64, f64)], polarity: FillPolarity) -> Result<Self, GerberError> {
        if vertices.len() < 3 {
            return Err(GerberError::ParseError(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for &(x, y) in vertices {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let mut edge_table = Vec::with_capacity(vertices.len());
        for idx in 0..vertices.len() {
            let (x0, y0) = vertices[idx];
            let (x1, y1) = vertices[(idx + 1) % vertices.len()];
            if (y0 - y1).abs() < 1e-12 {
                continue; // horizontal edges never cross a scanline
            }
            let (y_min, x_at_y_min, y_max, x_at_y_max) = if y0 < y1 {
                (y0, x0, y1, x1)
            } else {
                (y1, x1, y0, x0)
            };
            let inv_slope = (x_at_y_max - x_at_y_min) / (y_max - y_min);
            edge_table.push(EtEdge {
                y_min,
                y_max,
                x_at_y_min,
                inv_slope,
            });
        }
        edge_table.sort_by(|a, b| a.y_min.partial_cmp(&b.y_min).unwrap());

        Ok(Self {
            polarity,
            bbox: (min_x, min_y, max_x, max_y),
            edge_table,
        })
    }

    /// Start a fresh scanline cursor over this shape. A shape may be scanned
    /// any number of times, independently and in any order, since the cursor
    /// owns all of the mutable walking state.
    pub fn scan(&self) -> PolygonScan<'_> {
        PolygonScan {
            shape: self,
            et_cursor: 0,
            last_y: None,
            active: Vec::new(),
        }
    }

    /// Translate this shape by `(dx, dy)` without rebuilding the edge table
    /// from the vertex loop. Every edge's x-at-y-min and y-range shift by
    /// the offset; each edge's dx/dy slope is translation-invariant.
    ///
    /// This is how a step-and-repeat instance or a multi-layer composite is
    /// placed: the plotter bakes the untranslated shape once and stamps it
    /// at each offset, rather than re-deriving the edge table per stamp.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let edge_table = self
            .edge_table
            .iter()
            .map(|e| EtEdge {
                y_min: e.y_min + dy,
                y_max: e.y_max + dy,
                x_at_y_min: e.x_at_y_min + dx,
                inv_slope: e.inv_slope,
            })
            .collect();
        let (min_x, min_y, max_x, max_y) = self.bbox;
        Self {
            polarity: self.polarity,
            bbox: (min_x + dx, min_y + dy, max_x + dx, max_y + dy),
            edge_table,
        }
    }

    /// Flip this shape vertically about `y = height / 2`, as when converting
    /// from a Cartesian plotter coordinate system (Y up) to image row order
    /// (Y down, row 0 at the top).
    pub fn flipped_y(&self, height: f64) -> Self {
        let edge_table = self
            .edge_table
            .iter()
            .map(|e| EtEdge {
                y_min: height - e.y_max,
                y_max: height - e.y_min,
                x_at_y_min: e.x_at(e.y_max),
                inv_slope: -e.inv_slope,
            })
            .collect();
        let (min_x, min_y, max_x, max_y) = self.bbox;
        Self {
            polarity: self.polarity,
            bbox: (min_x, height - max_y, max_x, height - min_y),
            edge_table,
        }
    }

    /// Replace this shape's fill operator, keeping its geometry. Used to
    /// invert macro-primitive exposure when the enclosing layer itself has
    /// clear polarity.
    pub fn with_polarity(mut self, polarity: FillPolarity) -> Self {
        self.polarity = polarity;
        self
    }
}

/// A stateful cursor walking one [`PolygonShape`]'s scanlines top to bottom.
///
/// Each call to [`PolygonScan::spans_at`] admits newly-active edges from the
/// edge table, evicts edges whose span has ended, and returns the even-odd
/// fill spans for that row. `y` must be non-decreasing across calls.
pub struct PolygonScan<'a> {
    shape: &'a PolygonShape,
    et_cursor: usize,
    last_y: Option<f64>,
    active: Vec<EtEdge>,
}

impl<'a> PolygonScan<'a> {
    /// Non-overlapping, ascending `(x_enter, x_exit)` spans covered by the
    /// polygon at scanline `y`, under the even-odd fill rule.
    pub fn spans_at(&mut self, y: f64) -> Vec<(f64, f64)> {
        debug_assert!(
            self.last_y.is_none_or(|prev| y >= prev),
            "PolygonScan::spans_at called with non-increasing y"
        );
        self.last_y = Some(y);

        let table = &self.shape.edge_table;
        while self.et_cursor < table.len() && table[self.et_cursor].y_min <= y {
            self.active.push(table[self.et_cursor]);
            self.et_cursor += 1;
        }
        self.active.retain(|e| e.y_max > y);

        let mut xs: Vec<f64> = self.active.iter().map(|e| e.x_at(y)).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut spans = Vec::with_capacity(xs.len() / 2);
        let mut pairs = xs.chunks_exact(2);
        for pair in &mut pairs {
            spans.push((pair[0], pair[1]));
        }
        spans
    }
}
