use std::f64::consts::PI;

use crate::error::GerberError;
use crate::polygon::{FillPolarity, PolygonShape};

use super::apertures::ApertureTable;
use super::commands::{ApertureTemplate, GerberCommand, Hole, Polarity};
use super::coord::{CoordinateConverter, RawCoord};
use super::geometry;
use super::macros::{self, MacroTable};

/// Output from compiling a single Gerber source into polygons.
#[derive(Debug)]
pub struct GerberLayerOutput {
    pub polygons: Vec<PolygonShape>,
    /// From %IP. `true` (POS) is the default when the parameter is absent.
    pub image_polarity_dark: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterpolationMode {
    Linear,
    ClockwiseArc,
    CounterClockwiseArc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuadrantMode {
    Single,
    Multi,
}

fn invert_polarity(p: FillPolarity) -> FillPolarity {
    p.inverted()
}

fn bridge_contours(contours: &[Vec<(f64, f64)>]) -> Vec<(f64, f64)> {
    let mut merged = contours[0].clone();
    for hole in &contours[1..] {
        merged = geometry::bridge_hole(&merged, hole);
    }
    merged
}

fn apply_hole(outer: Vec<(f64, f64)>, hole: &Option<Hole>, cx: f64, cy: f64) -> Vec<(f64, f64)> {
    match hole {
        None => outer,
        Some(Hole::Circular(d)) => {
            geometry::bridge_hole(&outer, &geometry::circle_points(cx, cy, d / 2.0))
        }
        Some(Hole::Rectangular { width, height }) => {
            geometry::bridge_hole(&outer, &geometry::rect_points(cx, cy, *width, *height))
        }
    }
}

/// The plotter state machine: walks a command stream and accumulates
/// [`PolygonShape`]s in absolute pixel coordinates.
struct Interpreter {
    x: f64,
    y: f64,
    format_set: bool,
    aperture: u32,
    interpolation: InterpolationMode,
    quadrant: QuadrantMode,
    region_active: bool,
    region_points: Vec<(f64, f64)>,
    region_contours: Vec<Vec<(f64, f64)>>,
    polarity: Polarity,
    image_polarity_dark: bool,
    offset_native: (f64, f64),
    mirror: (bool, bool),
    scale_native: (f64, f64),
    converter: CoordinateConverter,
    apertures: ApertureTable,
    macro_table: MacroTable,
    shapes: Vec<PolygonShape>,
    grow: f64,
    warnings: Vec<String>,
    /// Step-and-repeat: index into `shapes` where the current SR block started,
    /// plus the repeat counts and pixel steps for replication on block close.
    sr_block_start: Option<usize>,
    sr_x_repeat: u32,
    sr_y_repeat: u32,
    sr_x_step: f64,
    sr_y_step: f64,
}

impl Interpreter {
    fn new(converter: CoordinateConverter, grow: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            format_set: false,
            aperture: 0,
            interpolation: InterpolationMode::Linear,
            quadrant: QuadrantMode::Multi, // modern default
            region_active: false,
            region_points: Vec::new(),
            region_contours: Vec::new(),
            polarity: Polarity::Dark,
            image_polarity_dark: true,
            offset_native: (0.0, 0.0),
            mirror: (false, false),
            scale_native: (1.0, 1.0),
            converter,
            apertures: ApertureTable::default(),
            macro_table: MacroTable::default(),
            shapes: Vec::new(),
            grow,
            warnings: Vec::new(),
            sr_block_start: None,
            sr_x_repeat: 1,
            sr_y_repeat: 1,
            sr_x_step: 0.0,
            sr_y_step: 0.0,
        }
    }

    fn effective_polarity(&self) -> FillPolarity {
        match self.polarity {
            Polarity::Dark => FillPolarity::Dark,
            Polarity::Clear => FillPolarity::Clear,
        }
    }

    /// Build a polygon from a vertex loop, applying the document-wide grow
    /// compensation uniformly at this single choke point.
    fn finish(&self, points: &[(f64, f64)], polarity: FillPolarity) -> Result<PolygonShape, GerberError> {
        let grown;
        let points = if self.grow.abs() > 1e-12 {
            grown = geometry::offset_polygon(points, self.grow);
            &grown
        } else {
            points
        };
        PolygonShape::new(points, polarity)
    }

    fn mirror_sign(&self, is_x: bool) -> f64 {
        let flip = if is_x { self.mirror.0 } else { self.mirror.1 };
        if flip {
            -1.0
        } else {
            1.0
        }
    }

    /// Decode an absolute coordinate field to pixels: applies %OF offset,
    /// %SF scale, and %MI mirroring ahead of DPI conversion.
    fn decode_point(&self, raw: RawCoord, is_x: bool) -> f64 {
        let native = self.converter.decode_field(raw, is_x);
        let offset = if is_x { self.offset_native.0 } else { self.offset_native.1 };
        let scale = if is_x { self.scale_native.0 } else { self.scale_native.1 };
        let native = (native + offset) * scale * self.mirror_sign(is_x);
        self.converter.to_pixels(native, is_x)
    }

    /// Decode a relative offset field (I/J) to pixels: scale and mirror
    /// apply, but the additive %OF offset does not, since it is a vector.
    fn decode_vector(&self, raw: RawCoord, is_x: bool) -> f64 {
        let native = self.converter.decode_field(raw, is_x);
        let scale = if is_x { self.scale_native.0 } else { self.scale_native.1 };
        let native = native * scale * self.mirror_sign(is_x);
        self.converter.to_pixels(native, is_x)
    }

    fn update_xy(&mut self, x: Option<RawCoord>, y: Option<RawCoord>) -> Result<(), GerberError> {
        if (x.is_some() || y.is_some()) && !self.format_set {
            return Err(GerberError::FormatNotSet);
        }
        if let Some(rx) = x {
            self.x = self.decode_point(rx, true);
        }
        if let Some(ry) = y {
            self.y = self.decode_point(ry, false);
        }
        Ok(())
    }

    fn process(&mut self, cmd: &GerberCommand) -> Result<(), GerberError> {
        match cmd {
            GerberCommand::FormatSpec(fmt) => {
                self.converter.format = fmt.clone();
                self.format_set = true;
            }
            GerberCommand::Units(units) => {
                self.converter.units = *units;
            }
            GerberCommand::ApertureDefine { code, template } => {
                self.apertures.define(*code, template.clone());
            }
            GerberCommand::SelectAperture(code) => {
                self.aperture = *code;
            }
            GerberCommand::LinearMode => {
                self.interpolation = InterpolationMode::Linear;
            }
            GerberCommand::ClockwiseArcMode => {
                self.interpolation = InterpolationMode::ClockwiseArc;
            }
            GerberCommand::CounterClockwiseArcMode => {
                self.interpolation = InterpolationMode::CounterClockwiseArc;
            }
            GerberCommand::SingleQuadrant => {
                self.quadrant = QuadrantMode::Single;
            }
            GerberCommand::MultiQuadrant => {
                self.quadrant = QuadrantMode::Multi;
            }
            GerberCommand::Polarity(p) => {
                self.polarity = *p;
            }
            GerberCommand::ImagePolarity(dark) => {
                self.image_polarity_dark = *dark;
            }
            GerberCommand::Offset { a, b } => {
                self.offset_native = (*a, *b);
            }
            GerberCommand::ImageMirror { a, b } => {
                self.mirror = (*a, *b);
            }
            GerberCommand::ImageScale { a, b } => {
                self.scale_native = (*a, *b);
            }
            GerberCommand::IgnoredParameter(code) => {
                self.warnings.push(format!("ignored parameter %{code}...%"));
            }
            GerberCommand::MacroDefine { name, body } => {
                let primitives = macros::parse_macro_body(body)?;
                self.macro_table.define(
                    name.clone(),
                    macros::ApertureMacro {
                        name: name.clone(),
                        primitives,
                    },
                );
            }
            GerberCommand::RegionBegin => {
                self.region_active = true;
                self.region_points.clear();
                self.region_contours.clear();
            }
            GerberCommand::RegionEnd => {
                self.flush_region_end()?;
                self.region_active = false;
            }
            GerberCommand::Interpolate { x, y, i, j } => {
                let old = (self.x, self.y);
                self.update_xy(*x, *y)?;
                self.do_interpolate(old, *i, *j)?;
            }
            GerberCommand::Move { x, y } => {
                if self.region_active && !self.region_points.is_empty() {
                    let pts = std::mem::take(&mut self.region_points);
                    if pts.len() >= 3 {
                        self.region_contours.push(pts);
                    }
                }
                self.update_xy(*x, *y)?;
                if self.region_active {
                    self.region_points.push((self.x, self.y));
                }
            }
            GerberCommand::Flash { x, y } => {
                self.update_xy(*x, *y)?;
                self.do_flash()?;
            }
            GerberCommand::StepRepeat {
                x_repeat,
                y_repeat,
                x_step,
                y_step,
            } => {
                self.close_sr_block();
                if *x_repeat > 1 || *y_repeat > 1 {
                    self.sr_block_start = Some(self.shapes.len());
                    self.sr_x_repeat = *x_repeat;
                    self.sr_y_repeat = *y_repeat;
                    self.sr_x_step = self.converter.to_pixels(*x_step, true);
                    self.sr_y_step = self.converter.to_pixels(*y_step, false);
                }
            }
            GerberCommand::EndOfFile => {}
        }
        Ok(())
    }

    /// Close an open step-and-repeat block: stamp its polygons at each grid position.
    fn close_sr_block(&mut self) {
        let Some(start) = self.sr_block_start.take() else {
            return;
        };
        let block: Vec<PolygonShape> = self.shapes[start..].to_vec();

        for yi in 0..self.sr_y_repeat {
            for xi in 0..self.sr_x_repeat {
                if xi == 0 && yi == 0 {
                    continue; // original position already drawn
                }
                let dx = xi as f64 * self.sr_x_step;
                let dy = yi as f64 * self.sr_y_step;
                for shape in &block {
                    self.shapes.push(shape.translated(dx, dy));
                }
            }
        }

        self.sr_x_repeat = 1;
        self.sr_y_repeat = 1;
        self.sr_x_step = 0.0;
        self.sr_y_step = 0.0;
    }

    /// Resolve an arc's center and radius from the I/J offsets (multi-quadrant)
    /// or by searching the four sign combinations consistent with a ≤90°
    /// sweep (single-quadrant, where I/J are given as unsigned magnitudes).
    fn resolve_arc_center(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        i: Option<RawCoord>,
        j: Option<RawCoord>,
    ) -> Result<(f64, f64, f64), GerberError> {
        match self.quadrant {
            QuadrantMode::Multi => {
                let di = i.map(|v| self.decode_vector(v, true)).unwrap_or(0.0);
                let dj = j.map(|v| self.decode_vector(v, false)).unwrap_or(0.0);
                let cx = x1 + di;
                let cy = y1 + dj;
                let radius = ((x1 - cx).powi(2) + (y1 - cy).powi(2)).sqrt();
                if radius < 1e-9 {
                    return Err(GerberError::ArcInconsistentWithQuadrant(
                        "zero-radius arc".into(),
                    ));
                }
                Ok((cx, cy, radius))
            }
            QuadrantMode::Single => {
                let di = i.map(|v| self.decode_vector(v, true).abs()).unwrap_or(0.0);
                let dj = j.map(|v| self.decode_vector(v, false).abs()).unwrap_or(0.0);
                let cw = self.interpolation == InterpolationMode::ClockwiseArc;

                for &sx in &[1.0, -1.0] {
                    for &sy in &[1.0, -1.0] {
                        let cx = x1 + sx * di;
                        let cy = y1 + sy * dj;
                        let r1 = ((x1 - cx).powi(2) + (y1 - cy).powi(2)).sqrt();
                        if r1 < 1e-9 {
                            continue;
                        }
                        let r2 = ((x2 - cx).powi(2) + (y2 - cy).powi(2)).sqrt();
                        if (r1 - r2).abs() > r1 * 0.01 + 1e-6 {
                            continue;
                        }
                        let start = (y1 - cy).atan2(x1 - cx);
                        let mut end = (y2 - cy).atan2(x2 - cx);
                        if cw {
                            if end >= start {
                                end -= 2.0 * PI;
                            }
                        } else if end <= start {
                            end += 2.0 * PI;
                        }
                        if (end - start).abs() <= PI / 2.0 + 1e-6 {
                            return Ok((cx, cy, r1));
                        }
                    }
                }
                Err(GerberError::ArcInconsistentWithQuadrant(format!(
                    "no quadrant-consistent center for I={di} J={dj}"
                )))
            }
        }
    }

    fn arc_angle_range(&self, cx: f64, cy: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> (f64, f64) {
        let start = (y1 - cy).atan2(x1 - cx);
        let mut end = (y2 - cy).atan2(x2 - cx);
        let cw = self.interpolation == InterpolationMode::ClockwiseArc;
        if cw {
            if end >= start {
                end -= 2.0 * PI;
            }
        } else if end <= start {
            end += 2.0 * PI;
        }
        (start.min(end), start.max(end))
    }

    fn sample_arc_points(&self, cx: f64, cy: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<(f64, f64)> {
        let radius = ((x1 - cx).powi(2) + (y1 - cy).powi(2)).sqrt();
        let start = (y1 - cy).atan2(x1 - cx);
        let mut end = (y2 - cy).atan2(x2 - cx);
        let cw = self.interpolation == InterpolationMode::ClockwiseArc;
        if cw {
            if end >= start {
                end -= 2.0 * PI;
            }
        } else if end <= start {
            end += 2.0 * PI;
        }
        let segments = (((end - start).abs() / (PI / 18.0)).ceil() as usize).max(2);
        (0..=segments)
            .map(|k| {
                let t = k as f64 / segments as f64;
                let angle = start + t * (end - start);
                (cx + radius * angle.cos(), cy + radius * angle.sin())
            })
            .collect()
    }

    fn stroke_vertices(&self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64) -> Result<Vec<(f64, f64)>, GerberError> {
        let ap = self.apertures.get_or_err(self.aperture)?;
        Ok(match &ap.template {
            ApertureTemplate::Rectangle { x_size, y_size, .. } => {
                geometry::stroke_rect_hull(x1, y1, x2, y2, *x_size, *y_size)
            }
            _ => geometry::stroke_round(x1, y1, x2, y2, width),
        })
    }

    fn do_interpolate(
        &mut self,
        old: (f64, f64),
        i: Option<RawCoord>,
        j: Option<RawCoord>,
    ) -> Result<(), GerberError> {
        let (x1, y1) = old;
        let (x2, y2) = (self.x, self.y);

        if self.region_active {
            if self.region_points.is_empty() {
                self.region_points.push((x1, y1));
            }
            match self.interpolation {
                InterpolationMode::Linear => self.region_points.push((x2, y2)),
                _ => {
                    let (cx, cy, _radius) = self.resolve_arc_center(x1, y1, x2, y2, i, j)?;
                    let pts = self.sample_arc_points(cx, cy, x1, y1, x2, y2);
                    self.region_points.extend(pts.into_iter().skip(1));
                }
            }
            return Ok(());
        }

        let width = self.apertures.stroke_width(self.aperture)?;
        let polarity = self.effective_polarity();

        let verts = match self.interpolation {
            InterpolationMode::Linear => self.stroke_vertices(x1, y1, x2, y2, width)?,
            _ => {
                let (cx, cy, radius) = self.resolve_arc_center(x1, y1, x2, y2, i, j)?;
                let (lo, hi) = self.arc_angle_range(cx, cy, x1, y1, x2, y2);
                geometry::stroke_arc(cx, cy, radius, lo, hi, width)
            }
        };
        let shape = self.finish(&verts, polarity)?;
        self.shapes.push(shape);
        Ok(())
    }

    fn do_flash(&mut self) -> Result<(), GerberError> {
        let code = self.aperture;
        let ap = self.apertures.get_or_err(code)?.clone();
        let (px, py) = (self.x, self.y);
        let polarity = self.effective_polarity();

        match &ap.template {
            ApertureTemplate::Circle { diameter, hole } => {
                let outer = geometry::circle_points(px, py, diameter / 2.0);
                let verts = apply_hole(outer, hole, px, py);
                self.shapes.push(self.finish(&verts, polarity)?);
            }
            ApertureTemplate::Rectangle { x_size, y_size, hole } => {
                let outer = geometry::rect_points(px, py, *x_size, *y_size);
                let verts = apply_hole(outer, hole, px, py);
                self.shapes.push(self.finish(&verts, polarity)?);
            }
            ApertureTemplate::Obround { x_size, y_size, hole } => {
                let outer = geometry::obround_points(px, py, *x_size, *y_size);
                let verts = apply_hole(outer, hole, px, py);
                self.shapes.push(self.finish(&verts, polarity)?);
            }
            ApertureTemplate::Polygon {
                outer_diameter,
                num_vertices,
                rotation,
                hole,
            } => {
                let outer = geometry::regular_polygon_points(
                    px,
                    py,
                    *outer_diameter,
                    *num_vertices as usize,
                    *rotation,
                );
                let verts = apply_hole(outer, hole, px, py);
                self.shapes.push(self.finish(&verts, polarity)?);
            }
            ApertureTemplate::Macro { name, params } => {
                if let Some(mac) = self.macro_table.get(name).cloned() {
                    let prims = macros::evaluate_macro(&mac, params, px, py)?;
                    for (pts, local_polarity) in prims {
                        let final_polarity = if self.polarity == Polarity::Clear {
                            invert_polarity(local_polarity)
                        } else {
                            local_polarity
                        };
                        self.shapes.push(self.finish(&pts, final_polarity)?);
                    }
                } else {
                    self.warnings
                        .push(format!("D03 flash with undefined macro aperture '{name}'"));
                }
            }
        }
        Ok(())
    }

    /// Merge all collected region contours (outer boundary plus any holes)
    /// into one bridged vertex loop and emit a single polygon.
    fn flush_region_end(&mut self) -> Result<(), GerberError> {
        if self.region_points.len() >= 3 {
            let pts = std::mem::take(&mut self.region_points);
            self.region_contours.push(pts);
        } else {
            self.region_points.clear();
        }

        if self.region_contours.is_empty() {
            return Ok(());
        }

        let contours = std::mem::take(&mut self.region_contours);
        let merged = bridge_contours(&contours);
        let polarity = self.effective_polarity();
        self.shapes.push(self.finish(&merged, polarity)?);
        Ok(())
    }
}

/// Compile a sequence of Gerber commands into polygons in absolute pixel
/// coordinates, under `converter`'s units/DPI/scale and with `grow` pixels
/// of outward compensation applied to every emitted shape.
pub fn interpret(
    commands: &[GerberCommand],
    converter: CoordinateConverter,
    grow: f64,
) -> Result<GerberLayerOutput, GerberError> {
    let mut interp = Interpreter::new(converter, grow);

    for cmd in commands {
        interp.process(cmd)?;
    }

    if interp.region_active {
        interp.flush_region_end()?;
    }
    interp.close_sr_block();

    Ok(GerberLayerOutput {
        polygons: interp.shapes,
        image_polarity_dark: interp.image_polarity_dark,
        warnings: interp.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gerber::coord::{CoordinateFormat, Units};

    fn raw(value: i64, digits: u8) -> RawCoord {
        RawCoord { value, digits }
    }

    fn converter() -> CoordinateConverter {
        CoordinateConverter {
            image_dpi: 1.0,
            units: Units::Millimeters,
            ..CoordinateConverter::default()
        }
    }

    fn setup_commands() -> Vec<GerberCommand> {
        vec![
            GerberCommand::FormatSpec(CoordinateFormat {
                x_integer: 2,
                x_decimal: 4,
                y_integer: 2,
                y_decimal: 4,
                zero_suppression: super::super::coord::ZeroSuppression::Leading,
                coordinate_mode: super::super::coord::CoordinateMode::Absolute,
            }),
            GerberCommand::Units(Units::Millimeters),
            GerberCommand::ApertureDefine {
                code: 10,
                template: ApertureTemplate::Circle {
                    diameter: 0.1,
                    hole: None,
                },
            },
            GerberCommand::SelectAperture(10),
            GerberCommand::LinearMode,
        ]
    }

    #[test]
    fn test_format_not_set_is_fatal() {
        let cmds = vec![GerberCommand::Move {
            x: Some(raw(0, 1)),
            y: Some(raw(0, 1)),
        }];
        let result = interpret(&cmds, converter(), 0.0);
        assert!(matches!(result, Err(GerberError::FormatNotSet)));
    }

    #[test]
    fn test_linear_segment_produces_one_polygon() {
        let mut cmds = setup_commands();
        cmds.push(GerberCommand::Move {
            x: Some(raw(0, 1)),
            y: Some(raw(0, 1)),
        });
        cmds.push(GerberCommand::Interpolate {
            x: Some(raw(10000, 5)), // 1.0 mm
            y: Some(raw(0, 1)),
            i: None,
            j: None,
        });

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        let (x0, y0, x1, y1) = output.polygons[0].bbox;
        assert!((x1 - x0 - 1.0).abs() < 0.2, "stroke should span ~1mm plus width");
        assert!((y1 - y0).abs() < 0.2, "stroke is thin, near zero height");
    }

    #[test]
    fn test_flash_circle_bbox() {
        let mut cmds = setup_commands();
        cmds.push(GerberCommand::Flash {
            x: Some(raw(10000, 5)),
            y: Some(raw(20000, 5)),
        });

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        let (x0, y0, x1, y1) = output.polygons[0].bbox;
        assert!((x1 - x0 - 0.1).abs() < 1e-3);
        assert!((y1 - y0 - 0.1).abs() < 1e-3);
        assert!((x0 - 0.95).abs() < 1e-3);
        assert!((y0 - 1.95).abs() < 1e-3);
    }

    #[test]
    fn test_flash_rectangle_bbox() {
        let mut cmds = vec![
            GerberCommand::FormatSpec(CoordinateFormat::default()),
            GerberCommand::Units(Units::Millimeters),
            GerberCommand::ApertureDefine {
                code: 11,
                template: ApertureTemplate::Rectangle {
                    x_size: 0.5,
                    y_size: 0.3,
                    hole: None,
                },
            },
            GerberCommand::SelectAperture(11),
        ];
        cmds.push(GerberCommand::Flash {
            x: Some(raw(10000, 5)),
            y: Some(raw(10000, 5)),
        });

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        let (x0, y0, x1, y1) = output.polygons[0].bbox;
        assert!((x0 - 0.75).abs() < 1e-6);
        assert!((y0 - 0.85).abs() < 1e-6);
        assert!((x1 - 1.25).abs() < 1e-6);
        assert!((y1 - 1.15).abs() < 1e-6);
    }

    #[test]
    fn test_region_single_contour() {
        let mut cmds = setup_commands();
        cmds.extend([
            GerberCommand::RegionBegin,
            GerberCommand::Move {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
            },
            GerberCommand::Interpolate {
                x: Some(raw(10000, 5)),
                y: Some(raw(0, 1)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(10000, 5)),
                y: Some(raw(10000, 5)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(0, 1)),
                y: Some(raw(10000, 5)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
                i: None,
                j: None,
            },
            GerberCommand::RegionEnd,
        ]);

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        assert_eq!(output.polygons[0].bbox, (0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_region_with_hole_merges_to_single_polygon() {
        let mut cmds = setup_commands();
        cmds.extend([
            GerberCommand::RegionBegin,
            GerberCommand::Move {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
            },
            GerberCommand::Interpolate {
                x: Some(raw(100000, 6)),
                y: Some(raw(0, 1)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(100000, 6)),
                y: Some(raw(100000, 6)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(0, 1)),
                y: Some(raw(100000, 6)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
                i: None,
                j: None,
            },
            GerberCommand::Move {
                x: Some(raw(20000, 5)),
                y: Some(raw(20000, 5)),
            },
            GerberCommand::Interpolate {
                x: Some(raw(80000, 5)),
                y: Some(raw(20000, 5)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(80000, 5)),
                y: Some(raw(80000, 5)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(20000, 5)),
                y: Some(raw(80000, 5)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(20000, 5)),
                y: Some(raw(20000, 5)),
                i: None,
                j: None,
            },
            GerberCommand::RegionEnd,
        ]);

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        assert_eq!(output.polygons[0].bbox, (0.0, 0.0, 10.0, 10.0));
        let mut scan = output.polygons[0].scan();
        // At y=5 (through the hole) there should be two spans (annulus), not one.
        let spans = scan.spans_at(5.0);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_clear_polarity_emits_clear_polygon_not_nothing() {
        let mut cmds = setup_commands();
        cmds.extend([
            GerberCommand::Polarity(Polarity::Clear),
            GerberCommand::Flash {
                x: Some(raw(20000, 5)),
                y: Some(raw(0, 1)),
            },
        ]);

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        assert_eq!(output.polygons[0].polarity, FillPolarity::Clear);
    }

    #[test]
    fn test_multiple_segments() {
        let mut cmds = setup_commands();
        cmds.extend([
            GerberCommand::Move {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
            },
            GerberCommand::Interpolate {
                x: Some(raw(10000, 5)),
                y: Some(raw(0, 1)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(10000, 5)),
                y: Some(raw(10000, 5)),
                i: None,
                j: None,
            },
            GerberCommand::Interpolate {
                x: Some(raw(0, 1)),
                y: Some(raw(10000, 5)),
                i: None,
                j: None,
            },
        ]);

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 3);
    }

    #[test]
    fn test_inches_conversion() {
        let cmds = vec![
            GerberCommand::FormatSpec(CoordinateFormat {
                x_integer: 2,
                x_decimal: 4,
                y_integer: 2,
                y_decimal: 4,
                zero_suppression: super::super::coord::ZeroSuppression::Leading,
                coordinate_mode: super::super::coord::CoordinateMode::Absolute,
            }),
            GerberCommand::Units(Units::Inches),
            GerberCommand::ApertureDefine {
                code: 10,
                template: ApertureTemplate::Circle {
                    diameter: 0.01,
                    hole: None,
                },
            },
            GerberCommand::SelectAperture(10),
            GerberCommand::LinearMode,
            GerberCommand::Move {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
            },
            GerberCommand::Interpolate {
                x: Some(raw(10000, 5)), // 1.0000 inch
                y: Some(raw(0, 1)),
                i: None,
                j: None,
            },
        ];

        let mut conv = converter();
        conv.units = Units::Inches;
        let output = interpret(&cmds, conv, 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        let (_, _, x1, _) = output.polygons[0].bbox;
        assert!((x1 - 25.4).abs() < 0.05);
    }

    #[test]
    fn test_flash_macro_aperture() {
        let mut cmds = vec![
            GerberCommand::FormatSpec(CoordinateFormat::default()),
            GerberCommand::Units(Units::Millimeters),
            GerberCommand::MacroDefine {
                name: "MYCIRC".to_string(),
                body: vec!["1,1,$1,0,0".to_string()],
            },
            GerberCommand::ApertureDefine {
                code: 20,
                template: ApertureTemplate::Macro {
                    name: "MYCIRC".to_string(),
                    params: vec![0.5],
                },
            },
            GerberCommand::SelectAperture(20),
        ];
        cmds.push(GerberCommand::Flash {
            x: Some(raw(10000, 5)),
            y: Some(raw(20000, 5)),
        });

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        let (x0, y0, x1, y1) = output.polygons[0].bbox;
        assert!((x1 - x0 - 0.5).abs() < 1e-3);
        assert!((y1 - y0 - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_undefined_aperture_flash_is_fatal() {
        let mut cmds = setup_commands();
        cmds.push(GerberCommand::SelectAperture(999));
        cmds.push(GerberCommand::Flash {
            x: Some(raw(0, 1)),
            y: Some(raw(0, 1)),
        });
        let result = interpret(&cmds, converter(), 0.0);
        assert!(matches!(result, Err(GerberError::UnknownAperture(999))));
    }

    #[test]
    fn test_step_repeat_2x2() {
        let mut cmds = setup_commands();
        cmds.extend([
            GerberCommand::StepRepeat {
                x_repeat: 2,
                y_repeat: 2,
                x_step: 3.0,
                y_step: 4.0,
            },
            GerberCommand::Flash {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
            },
            GerberCommand::StepRepeat {
                x_repeat: 1,
                y_repeat: 1,
                x_step: 0.0,
                y_step: 0.0,
            },
        ]);

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 4, "2x2 SR should produce 4 flashes");

        let mut origins: Vec<(f64, f64)> = output
            .polygons
            .iter()
            .map(|p| (p.bbox.0, p.bbox.1))
            .collect();
        origins.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.partial_cmp(&b.1).unwrap()));
        let expected = [(0.0, 0.0), (0.0, 4.0), (3.0, 0.0), (3.0, 4.0)];
        for (got, exp) in origins.iter().zip(expected.iter()) {
            assert!((got.0 - exp.0).abs() < 1e-6);
            assert!((got.1 - exp.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_step_repeat_implicit_close_at_eof() {
        let mut cmds = setup_commands();
        cmds.extend([
            GerberCommand::StepRepeat {
                x_repeat: 3,
                y_repeat: 1,
                x_step: 2.0,
                y_step: 0.0,
            },
            GerberCommand::Flash {
                x: Some(raw(0, 1)),
                y: Some(raw(0, 1)),
            },
        ]);

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 3, "implicit close should replicate 3x1");
    }

    #[test]
    fn test_clockwise_arc_draw_produces_polygon() {
        let mut cmds = setup_commands();
        cmds.push(GerberCommand::ClockwiseArcMode);
        cmds.push(GerberCommand::Move {
            x: Some(raw(10000, 5)),
            y: Some(raw(0, 1)),
        });
        cmds.push(GerberCommand::Interpolate {
            x: Some(raw(0, 1)),
            y: Some(raw(10000, 5)),
            i: Some(raw(-10000, 5)),
            j: Some(raw(0, 1)),
        });

        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert_eq!(output.polygons.len(), 1);
        let (x0, y0, x1, y1) = output.polygons[0].bbox;
        assert!(x1 > x0);
        assert!(y1 > y0);
    }

    #[test]
    fn test_image_polarity_negative_tracked() {
        let mut cmds = setup_commands();
        cmds.insert(0, GerberCommand::ImagePolarity(false));
        let output = interpret(&cmds, converter(), 0.0).unwrap();
        assert!(!output.image_polarity_dark);
    }
}
