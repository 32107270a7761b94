//! Vertex-loop builders for aperture shapes and strokes.
//!
//! Everything here produces a plain `Vec<(f64, f64)>` closed loop in pixel
//! units, ready to hand to [`crate::polygon::PolygonShape::new`]. Keeping
//! these as free functions separate from the plotter state machine means
//! the same circle/obround/hull math is shared between standard aperture
//! flashes, stroked draws, and macro primitive expansion.

use std::f64::consts::PI;

/// Segments used to approximate a full circle. 64 keeps the polygonal error
/// under a tenth of a pixel for any aperture size this renderer is likely
/// to see.
const CIRCLE_SEGMENTS: usize = 64;

pub fn rotate(p: (f64, f64), angle_deg: f64) -> (f64, f64) {
    if angle_deg.abs() < 1e-12 {
        return p;
    }
    let rad = angle_deg.to_radians();
    let (s, c) = rad.sin_cos();
    (p.0 * c - p.1 * s, p.0 * s + p.1 * c)
}

fn translate_all(points: Vec<(f64, f64)>, dx: f64, dy: f64) -> Vec<(f64, f64)> {
    points.into_iter().map(|(x, y)| (x + dx, y + dy)).collect()
}

/// A circle centered at the origin, as a closed polygon of `CIRCLE_SEGMENTS`
/// vertices, then translated to `(cx, cy)`.
pub fn circle_points(cx: f64, cy: f64, radius: f64) -> Vec<(f64, f64)> {
    arc_points(0.0, 2.0 * PI, radius, CIRCLE_SEGMENTS)
        .into_iter()
        .map(|(x, y)| (x + cx, y + cy))
        .collect()
}

/// Points along a circular arc of the given radius, centered at the origin,
/// sweeping from `start_rad` to `end_rad` (which may be negative or exceed
/// `2*PI` to indicate direction and winding).
fn arc_points(start_rad: f64, end_rad: f64, radius: f64, segments: usize) -> Vec<(f64, f64)> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|k| {
            let t = start_rad + (end_rad - start_rad) * (k as f64 / segments as f64);
            (radius * t.cos(), radius * t.sin())
        })
        .collect()
}

/// A regular polygon of `n` vertices (`n` in `[3, 12]` per the Gerber
/// standard, though this function does not itself enforce the bound),
/// outer diameter `diameter`, first vertex at `rotation_deg` from the
/// positive X axis, centered at `(cx, cy)`.
pub fn regular_polygon_points(
    cx: f64,
    cy: f64,
    diameter: f64,
    n: usize,
    rotation_deg: f64,
) -> Vec<(f64, f64)> {
    let n = n.max(3);
    let r = diameter / 2.0;
    let rot = rotation_deg.to_radians();
    (0..n)
        .map(|k| {
            let theta = rot + 2.0 * PI * (k as f64) / (n as f64);
            (cx + r * theta.cos(), cy + r * theta.sin())
        })
        .collect()
}

/// Axis-aligned rectangle, `width` x `height`, centered at `(cx, cy)`.
pub fn rect_points(cx: f64, cy: f64, width: f64, height: f64) -> Vec<(f64, f64)> {
    let hw = width / 2.0;
    let hh = height / 2.0;
    vec![
        (cx - hw, cy - hh),
        (cx + hw, cy - hh),
        (cx + hw, cy + hh),
        (cx - hw, cy + hh),
    ]
}

/// Obround (stadium): a rectangle with semicircular caps on its shorter
/// axis, centered at `(cx, cy)`. When `width == height` this degenerates
/// to a circle.
pub fn obround_points(cx: f64, cy: f64, width: f64, height: f64) -> Vec<(f64, f64)> {
    if (width - height).abs() < 1e-12 {
        return circle_points(cx, cy, width / 2.0);
    }
    let horizontal = width > height;
    let (long, short) = if horizontal { (width, height) } else { (height, width) };
    let cap_r = short / 2.0;
    let straight_half = long / 2.0 - cap_r;

    // Build the stadium lying horizontally (long axis along X), then rotate
    // 90 degrees into place if the long axis is actually Y.
    let mut pts = Vec::with_capacity(CIRCLE_SEGMENTS + 2);
    pts.extend(arc_points(-PI / 2.0, PI / 2.0, cap_r, CIRCLE_SEGMENTS / 2).into_iter().map(|(x, y)| (x + straight_half, y)));
    pts.extend(arc_points(PI / 2.0, 3.0 * PI / 2.0, cap_r, CIRCLE_SEGMENTS / 2).into_iter().map(|(x, y)| (x - straight_half, y)));

    let pts = if horizontal {
        pts
    } else {
        pts.into_iter().map(|p| rotate(p, 90.0)).collect()
    };
    translate_all(pts, cx, cy)
}

/// A ring-segment (annulus wedge) with flat radial cut ends, the shape of
/// one arm of a thermal relief or of a moire ring, as opposed to
/// [`stroke_arc`]'s rounded-cap band for a drawn trace.
pub fn annular_sector(
    cx: f64,
    cy: f64,
    inner_r: f64,
    outer_r: f64,
    start_rad: f64,
    end_rad: f64,
) -> Vec<(f64, f64)> {
    let segments = (((end_rad - start_rad).abs() / (PI / 36.0)).ceil() as usize).max(2);
    let mut pts = arc_points(start_rad, end_rad, outer_r, segments);
    pts.extend(arc_points(end_rad, start_rad, inner_r.max(0.0), segments));
    translate_all(pts, cx, cy)
}

/// Connects an outer loop to an inner (hole) loop with a zero-width bridge
/// so that a single even-odd-fill vertex loop renders as an annulus.
///
/// Both loops are otherwise independent closed paths; no winding direction
/// is required since the rasterizer fills by parity, not by winding number.
pub fn bridge_hole(outer: &[(f64, f64)], hole: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut v = Vec::with_capacity(outer.len() + hole.len() + 2);
    v.extend_from_slice(outer);
    v.push(outer[0]);
    v.push(hole[0]);
    v.extend(hole.iter().rev().copied());
    v
}

/// Convex hull of a point set via Andrew's monotone chain. Used to build
/// the swept area of a rectangular aperture dragged between two points.
pub fn convex_hull(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    }

    let mut lower: Vec<(f64, f64)> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<(f64, f64)> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// The swept area of a round aperture of `width` diameter dragged from
/// `(x1, y1)` to `(x2, y2)`: an obround oriented along the segment.
pub fn stroke_round(x1: f64, y1: f64, x2: f64, y2: f64, width: f64) -> Vec<(f64, f64)> {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return circle_points(x1, y1, width / 2.0);
    }
    let angle = dy.atan2(dx).to_degrees();
    let mid = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    let local = obround_points(0.0, 0.0, len + width, width);
    local
        .into_iter()
        .map(|p| rotate(p, angle))
        .map(|(x, y)| (x + mid.0, y + mid.1))
        .collect()
}

/// The swept area of a rectangular aperture dragged from `(x1, y1)` to
/// `(x2, y2)`: the convex hull of the rectangle placed at both endpoints.
pub fn stroke_rect_hull(x1: f64, y1: f64, x2: f64, y2: f64, width: f64, height: f64) -> Vec<(f64, f64)> {
    let mut corners = rect_points(x1, y1, width, height);
    corners.extend(rect_points(x2, y2, width, height));
    convex_hull(&corners)
}

/// The swept area of a round aperture dragged along a circular arc from
/// `start_rad` to `end_rad` (radians, `end_rad > start_rad` for the sweep
/// direction already resolved by the caller) around `(cx, cy)`: a rounded
/// annular sector: the arc offset by `width/2` to either side, with
/// semicircular end caps.
pub fn stroke_arc(
    cx: f64,
    cy: f64,
    radius: f64,
    start_rad: f64,
    end_rad: f64,
    width: f64,
) -> Vec<(f64, f64)> {
    let half = width / 2.0;
    let outer_r = radius + half;
    let inner_r = (radius - half).max(0.0);
    let segments = (((end_rad - start_rad).abs() / (PI / 36.0)).ceil() as usize).max(2);

    let mut pts = Vec::with_capacity(segments * 2 + CIRCLE_SEGMENTS);
    pts.extend(arc_points(start_rad, end_rad, outer_r, segments));

    // Round cap at the end.
    let end_dir = end_rad;
    let cap_center = (radius * end_dir.cos(), radius * end_dir.sin());
    let cap_start_angle = end_dir + PI / 2.0;
    pts.extend(
        arc_points(cap_start_angle, cap_start_angle + PI, half, CIRCLE_SEGMENTS / 4)
            .into_iter()
            .map(|(x, y)| (x + cap_center.0, y + cap_center.1)),
    );

    pts.extend(arc_points(end_rad, start_rad, inner_r, segments));

    // Round cap at the start.
    let start_dir = start_rad;
    let cap_center = (radius * start_dir.cos(), radius * start_dir.sin());
    let cap_start_angle = start_dir - PI / 2.0;
    pts.extend(
        arc_points(cap_start_angle, cap_start_angle + PI, half, CIRCLE_SEGMENTS / 4)
            .into_iter()
            .map(|(x, y)| (x + cap_center.0, y + cap_center.1)),
    );

    translate_all(pts, cx, cy)
}

fn signed_area(points: &[(f64, f64)]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        area += x0 * y1 - x1 * y0;
    }
    area / 2.0
}

fn outward_normal(a: (f64, f64), b: (f64, f64), sign: f64) -> (f64, f64) {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return (0.0, 0.0);
    }
    (sign * dy / len, sign * -dx / len)
}

/// Offsets every vertex outward by `amount` along the averaged normal of its
/// two adjacent edges (no miter-length correction). Negative `amount` shrinks
/// the loop instead. This is the photoplotter "grow"/compensation knob: a
/// cheap approximation of a true Minkowski offset, adequate for the mostly
/// convex aperture shapes this renderer produces and good enough for region
/// contours in practice, though sharp concave corners can pinch slightly.
pub fn offset_polygon(points: &[(f64, f64)], amount: f64) -> Vec<(f64, f64)> {
    if amount.abs() < 1e-12 || points.len() < 3 {
        return points.to_vec();
    }
    let n = points.len();
    let sign = if signed_area(points) >= 0.0 { 1.0 } else { -1.0 };
    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            let n1 = outward_normal(prev, curr, sign);
            let n2 = outward_normal(curr, next, sign);
            let (nx, ny) = (n1.0 + n2.0, n1.1 + n2.1);
            let len = (nx * nx + ny * ny).sqrt();
            if len < 1e-12 {
                curr
            } else {
                (curr.0 + nx / len * amount, curr.1 + ny / len * amount)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_points_radius() {
        let pts = circle_points(0.0, 0.0, 5.0);
        for (x, y) in &pts {
            let r = (x * x + y * y).sqrt();
            assert!((r - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_regular_polygon_vertex_count() {
        let pts = regular_polygon_points(0.0, 0.0, 10.0, 6, 0.0);
        assert_eq!(pts.len(), 6);
    }

    #[test]
    fn test_rect_points_corners() {
        let pts = rect_points(0.0, 0.0, 4.0, 2.0);
        assert!(pts.contains(&(-2.0, -1.0)));
        assert!(pts.contains(&(2.0, 1.0)));
    }

    #[test]
    fn test_obround_horizontal_extent() {
        let pts = obround_points(0.0, 0.0, 10.0, 4.0);
        let max_x = pts.iter().map(|p| p.0).fold(f64::MIN, f64::max);
        let min_x = pts.iter().map(|p| p.0).fold(f64::MAX, f64::min);
        assert!((max_x - min_x - 10.0).abs() < 1e-6);
        let max_y = pts.iter().map(|p| p.1).fold(f64::MIN, f64::max);
        assert!((max_y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_obround_degenerates_to_circle() {
        let pts = obround_points(0.0, 0.0, 6.0, 6.0);
        for (x, y) in &pts {
            let r = (x * x + y * y).sqrt();
            assert!((r - 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_convex_hull_of_square_is_itself() {
        let pts = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
    }

    #[test]
    fn test_convex_hull_drops_interior_point() {
        let pts = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (2.0, 2.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
    }

    #[test]
    fn test_stroke_round_length() {
        let pts = stroke_round(0.0, 0.0, 10.0, 0.0, 2.0);
        let max_x = pts.iter().map(|p| p.0).fold(f64::MIN, f64::max);
        let min_x = pts.iter().map(|p| p.0).fold(f64::MAX, f64::min);
        assert!((max_x - min_x - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_stroke_rect_hull_covers_both_ends() {
        let pts = stroke_rect_hull(0.0, 0.0, 10.0, 0.0, 2.0, 2.0);
        let max_x = pts.iter().map(|p| p.0).fold(f64::MIN, f64::max);
        assert!(max_x >= 11.0);
    }

    #[test]
    fn test_offset_polygon_grows_square_outward() {
        let square = rect_points(0.0, 0.0, 10.0, 10.0);
        let grown = offset_polygon(&square, 1.0);
        let max_x = grown.iter().map(|p| p.0).fold(f64::MIN, f64::max);
        assert!(max_x > 5.0 + 0.9);
    }

    #[test]
    fn test_offset_polygon_zero_amount_is_noop() {
        let square = rect_points(0.0, 0.0, 10.0, 10.0);
        let same = offset_polygon(&square, 0.0);
        assert_eq!(same, square);
    }

    #[test]
    fn test_bridge_hole_produces_single_loop_with_both_boundaries() {
        let outer = rect_points(0.0, 0.0, 10.0, 10.0);
        let hole = circle_points(0.0, 0.0, 2.0);
        let bridged = bridge_hole(&outer, &hole);
        assert_eq!(bridged.len(), outer.len() + hole.len() + 1);
    }
}
