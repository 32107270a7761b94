use std::collections::HashMap;
use std::f64::consts::PI;

use crate::error::GerberError;
use crate::polygon::FillPolarity;

use super::geometry;

/// A single primitive within an aperture macro definition.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroPrimitive {
    /// Code 0: Comment (ignored during evaluation)
    Comment,
    /// `$k=<expr>`: defines a macro variable, evaluated in place and bound
    /// for every primitive (and later variable definition) that follows it.
    VarDef(u32, Expr),
    /// Code 1: Circle
    Circle {
        exposure: Expr,
        diameter: Expr,
        center_x: Expr,
        center_y: Expr,
        rotation: Option<Expr>,
    },
    /// Code 20 (or 2): Vector line
    VectorLine {
        exposure: Expr,
        width: Expr,
        start_x: Expr,
        start_y: Expr,
        end_x: Expr,
        end_y: Expr,
        rotation: Expr,
    },
    /// Code 21: Center line (rectangle by center)
    CenterLine {
        exposure: Expr,
        width: Expr,
        height: Expr,
        center_x: Expr,
        center_y: Expr,
        rotation: Expr,
    },
    /// Code 4: Outline (arbitrary polygon)
    Outline {
        exposure: Expr,
        num_points: Expr,
        points: Vec<Expr>, // pairs of (x, y) coordinates, trailing rotation
        rotation: Expr,
    },
    /// Code 5: Regular polygon
    Polygon {
        exposure: Expr,
        num_vertices: Expr,
        center_x: Expr,
        center_y: Expr,
        diameter: Expr,
        rotation: Expr,
    },
    /// Code 6: Moire (concentric rings plus a crosshair, always exposure-on)
    Moire {
        center_x: Expr,
        center_y: Expr,
        outer_diameter: Expr,
        ring_thickness: Expr,
        ring_gap: Expr,
        max_rings: Expr,
        crosshair_thickness: Expr,
        crosshair_length: Expr,
        rotation: Expr,
    },
    /// Code 7: Thermal (ring with four gaps, always exposure-on)
    Thermal {
        center_x: Expr,
        center_y: Expr,
        outer_diameter: Expr,
        inner_diameter: Expr,
        gap_thickness: Expr,
        rotation: Expr,
    },
}

/// Expression node for macro parameter evaluation.
/// Supports: literals, variable references ($1, $2, ...), and arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Variable(u32), // $1 = Variable(1)
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate the expression with the given parameter bindings.
    pub fn eval(&self, params: &[f64]) -> f64 {
        match self {
            Expr::Literal(v) => *v,
            Expr::Variable(idx) => {
                if *idx == 0 || *idx as usize > params.len() {
                    0.0
                } else {
                    params[*idx as usize - 1]
                }
            }
            Expr::Add(a, b) => a.eval(params) + b.eval(params),
            Expr::Sub(a, b) => a.eval(params) - b.eval(params),
            Expr::Mul(a, b) => a.eval(params) * b.eval(params),
            Expr::Div(a, b) => {
                let denom = b.eval(params);
                if denom.abs() < 1e-15 {
                    0.0
                } else {
                    a.eval(params) / denom
                }
            }
        }
    }
}

/// An aperture macro definition (from %AM...% blocks).
#[derive(Debug, Clone)]
pub struct ApertureMacro {
    pub name: String,
    pub primitives: Vec<MacroPrimitive>,
}

/// Table of macro definitions, keyed by name.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<String, ApertureMacro>,
}

impl MacroTable {
    pub fn define(&mut self, name: String, mac: ApertureMacro) {
        self.macros.insert(name, mac);
    }

    pub fn get(&self, name: &str) -> Option<&ApertureMacro> {
        self.macros.get(name)
    }
}

// ─── Expression Parser ──────────────────────────────────────────────

/// Parse a Gerber macro expression string into an Expr tree.
/// Gerber uses 'x' or 'X' for multiplication (not '*' which is the statement terminator).
pub fn parse_expr(s: &str) -> Result<Expr, GerberError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Expr::Literal(0.0));
    }
    let tokens = tokenize_expr(s)?;
    let (expr, rest) = parse_add_sub(&tokens)?;
    if !rest.is_empty() {
        return Err(GerberError::ArithmeticInMacro(format!(
            "unexpected tokens after expression: {s}"
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone)]
enum ExprToken {
    Num(f64),
    Var(u32),
    Plus,
    Minus,
    Mul,
    Div,
    LParen,
    RParen,
}

fn tokenize_expr(s: &str) -> Result<Vec<ExprToken>, GerberError> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(ExprToken::Plus);
            }
            '-' => {
                chars.next();
                // Negative number if preceded by operator or at start
                let is_unary = matches!(
                    tokens.last(),
                    None | Some(ExprToken::Plus)
                        | Some(ExprToken::Minus)
                        | Some(ExprToken::Mul)
                        | Some(ExprToken::Div)
                        | Some(ExprToken::LParen)
                );
                if is_unary
                    && chars
                        .peek()
                        .is_some_and(|c| c.is_ascii_digit() || *c == '.')
                {
                    let mut num_str = String::from('-');
                    while chars
                        .peek()
                        .is_some_and(|c| c.is_ascii_digit() || *c == '.')
                    {
                        num_str.push(chars.next().unwrap());
                    }
                    let val: f64 = num_str.parse().map_err(|_| {
                        GerberError::ArithmeticInMacro(format!("bad number: {num_str}"))
                    })?;
                    tokens.push(ExprToken::Num(val));
                } else {
                    tokens.push(ExprToken::Minus);
                }
            }
            'x' | 'X' => {
                chars.next();
                tokens.push(ExprToken::Mul);
            }
            '/' => {
                chars.next();
                tokens.push(ExprToken::Div);
            }
            '(' => {
                chars.next();
                tokens.push(ExprToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(ExprToken::RParen);
            }
            '$' => {
                chars.next(); // consume '$'
                let mut num_str = String::new();
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    num_str.push(chars.next().unwrap());
                }
                let idx: u32 = num_str.parse().map_err(|_| {
                    GerberError::ArithmeticInMacro(format!("bad variable: ${num_str}"))
                })?;
                tokens.push(ExprToken::Var(idx));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut num_str = String::new();
                while chars
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || *c == '.')
                {
                    num_str.push(chars.next().unwrap());
                }
                let val: f64 = num_str.parse().map_err(|_| {
                    GerberError::ArithmeticInMacro(format!("bad number: {num_str}"))
                })?;
                tokens.push(ExprToken::Num(val));
            }
            _ => {
                return Err(GerberError::ArithmeticInMacro(format!(
                    "unexpected char '{ch}' in: {s}"
                )));
            }
        }
    }

    Ok(tokens)
}

// Recursive descent: add/sub -> mul/div -> atom
fn parse_add_sub(tokens: &[ExprToken]) -> Result<(Expr, &[ExprToken]), GerberError> {
    let (mut left, mut rest) = parse_mul_div(tokens)?;
    loop {
        match rest.first() {
            Some(ExprToken::Plus) => {
                let (right, r) = parse_mul_div(&rest[1..])?;
                left = Expr::Add(Box::new(left), Box::new(right));
                rest = r;
            }
            Some(ExprToken::Minus) => {
                let (right, r) = parse_mul_div(&rest[1..])?;
                left = Expr::Sub(Box::new(left), Box::new(right));
                rest = r;
            }
            _ => break,
        }
    }
    Ok((left, rest))
}

fn parse_mul_div(tokens: &[ExprToken]) -> Result<(Expr, &[ExprToken]), GerberError> {
    let (mut left, mut rest) = parse_atom(tokens)?;
    loop {
        match rest.first() {
            Some(ExprToken::Mul) => {
                let (right, r) = parse_atom(&rest[1..])?;
                left = Expr::Mul(Box::new(left), Box::new(right));
                rest = r;
            }
            Some(ExprToken::Div) => {
                let (right, r) = parse_atom(&rest[1..])?;
                left = Expr::Div(Box::new(left), Box::new(right));
                rest = r;
            }
            _ => break,
        }
    }
    Ok((left, rest))
}

fn parse_atom(tokens: &[ExprToken]) -> Result<(Expr, &[ExprToken]), GerberError> {
    match tokens.first() {
        Some(ExprToken::Num(v)) => Ok((Expr::Literal(*v), &tokens[1..])),
        Some(ExprToken::Var(idx)) => Ok((Expr::Variable(*idx), &tokens[1..])),
        Some(ExprToken::LParen) => {
            let (expr, rest) = parse_add_sub(&tokens[1..])?;
            match rest.first() {
                Some(ExprToken::RParen) => Ok((expr, &rest[1..])),
                _ => Err(GerberError::ArithmeticInMacro(
                    "missing closing paren".into(),
                )),
            }
        }
        _ => Err(GerberError::ArithmeticInMacro(
            "unexpected end of expression".into(),
        )),
    }
}

// ─── Macro Primitive Parser ─────────────────────────────────────────

/// Parse the body lines of an aperture macro into primitives.
/// Each line is a comma-separated list like "5,1,8,0,0,1.08239X$1,22.5"
pub fn parse_macro_body(lines: &[String]) -> Result<Vec<MacroPrimitive>, GerberError> {
    let mut primitives = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Comment lines start with "0 "
        if trimmed.starts_with("0 ") || trimmed == "0" {
            primitives.push(MacroPrimitive::Comment);
            continue;
        }

        // Variable definition: "$k=<expr>", e.g. "$4=$1x0.75".
        if let Some(after_dollar) = trimmed.strip_prefix('$') {
            if let Some(eq_pos) = after_dollar.find('=') {
                let index_str = &after_dollar[..eq_pos];
                if !index_str.is_empty() && index_str.chars().all(|c| c.is_ascii_digit()) {
                    let index: u32 = index_str.parse().map_err(|_| {
                        GerberError::MalformedMacro(
                            "variable".into(),
                            format!("bad variable index: ${index_str}"),
                        )
                    })?;
                    let expr = parse_expr(&after_dollar[eq_pos + 1..])?;
                    primitives.push(MacroPrimitive::VarDef(index, expr));
                    continue;
                }
            }
        }

        let parts: Vec<&str> = trimmed.split(',').collect();
        if parts.is_empty() {
            continue;
        }

        let code: u32 = parts[0].trim().parse().map_err(|_| {
            GerberError::MalformedMacro("body".into(), format!("bad primitive code: {}", parts[0]))
        })?;

        let exprs: Vec<Expr> = parts[1..]
            .iter()
            .map(|p| parse_expr(p))
            .collect::<Result<Vec<_>, _>>()?;

        let prim = match code {
            1 => {
                // Circle: exposure, diameter, center_x, center_y [, rotation]
                if exprs.len() < 4 {
                    return Err(GerberError::MalformedMacro(
                        "circle".into(),
                        "need at least 4 params".into(),
                    ));
                }
                MacroPrimitive::Circle {
                    exposure: exprs[0].clone(),
                    diameter: exprs[1].clone(),
                    center_x: exprs[2].clone(),
                    center_y: exprs[3].clone(),
                    rotation: exprs.get(4).cloned(),
                }
            }
            2 | 20 => {
                // Vector line: exposure, width, start_x, start_y, end_x, end_y, rotation
                if exprs.len() < 7 {
                    return Err(GerberError::MalformedMacro(
                        "vector line".into(),
                        "need 7 params".into(),
                    ));
                }
                MacroPrimitive::VectorLine {
                    exposure: exprs[0].clone(),
                    width: exprs[1].clone(),
                    start_x: exprs[2].clone(),
                    start_y: exprs[3].clone(),
                    end_x: exprs[4].clone(),
                    end_y: exprs[5].clone(),
                    rotation: exprs[6].clone(),
                }
            }
            21 => {
                // Center line: exposure, width, height, center_x, center_y, rotation
                if exprs.len() < 6 {
                    return Err(GerberError::MalformedMacro(
                        "center line".into(),
                        "need 6 params".into(),
                    ));
                }
                MacroPrimitive::CenterLine {
                    exposure: exprs[0].clone(),
                    width: exprs[1].clone(),
                    height: exprs[2].clone(),
                    center_x: exprs[3].clone(),
                    center_y: exprs[4].clone(),
                    rotation: exprs[5].clone(),
                }
            }
            4 => {
                // Outline: exposure, n_vertices, x0, y0, x1, y1, ..., rotation
                if exprs.len() < 2 {
                    return Err(GerberError::MalformedMacro(
                        "outline".into(),
                        "need at least 2 params".into(),
                    ));
                }
                MacroPrimitive::Outline {
                    exposure: exprs[0].clone(),
                    num_points: exprs[1].clone(),
                    points: exprs[2..].to_vec(),
                    rotation: exprs.last().cloned().unwrap_or(Expr::Literal(0.0)),
                }
            }
            5 => {
                // Polygon: exposure, n_vertices, center_x, center_y, diameter, rotation
                if exprs.len() < 6 {
                    return Err(GerberError::MalformedMacro(
                        "polygon".into(),
                        "need 6 params".into(),
                    ));
                }
                MacroPrimitive::Polygon {
                    exposure: exprs[0].clone(),
                    num_vertices: exprs[1].clone(),
                    center_x: exprs[2].clone(),
                    center_y: exprs[3].clone(),
                    diameter: exprs[4].clone(),
                    rotation: exprs[5].clone(),
                }
            }
            6 => {
                // Moire: center_x, center_y, outer_d, ring_thickness, ring_gap,
                // max_rings, crosshair_thickness, crosshair_length, rotation
                if exprs.len() < 9 {
                    return Err(GerberError::MalformedMacro(
                        "moire".into(),
                        "need 9 params".into(),
                    ));
                }
                MacroPrimitive::Moire {
                    center_x: exprs[0].clone(),
                    center_y: exprs[1].clone(),
                    outer_diameter: exprs[2].clone(),
                    ring_thickness: exprs[3].clone(),
                    ring_gap: exprs[4].clone(),
                    max_rings: exprs[5].clone(),
                    crosshair_thickness: exprs[6].clone(),
                    crosshair_length: exprs[7].clone(),
                    rotation: exprs[8].clone(),
                }
            }
            7 => {
                // Thermal: center_x, center_y, outer_d, inner_d, gap, rotation
                if exprs.len() < 6 {
                    return Err(GerberError::MalformedMacro(
                        "thermal".into(),
                        "need 6 params".into(),
                    ));
                }
                MacroPrimitive::Thermal {
                    center_x: exprs[0].clone(),
                    center_y: exprs[1].clone(),
                    outer_diameter: exprs[2].clone(),
                    inner_diameter: exprs[3].clone(),
                    gap_thickness: exprs[4].clone(),
                    rotation: exprs[5].clone(),
                }
            }
            _ => {
                // Unknown primitive code, skip
                continue;
            }
        };

        primitives.push(prim);
    }

    Ok(primitives)
}

// ─── Macro Evaluation (flash-time) ──────────────────────────────────

fn exposure_polarity(exp: f64) -> FillPolarity {
    if exp < 0.5 {
        FillPolarity::Xor
    } else {
        FillPolarity::Dark
    }
}

/// Build the `$k` environment an expression sees at a given point in a
/// macro body: `$k` resolves to the binding most recently set by a `$k=`
/// line if one has run, falling back to the positional call-site argument
/// `a_k`, and to `0.0` beyond both.
fn resolve_env(params: &[f64], vars: &HashMap<u32, f64>) -> Vec<f64> {
    let max_index = vars.keys().copied().max().unwrap_or(0).max(params.len() as u32);
    (1..=max_index)
        .map(|k| {
            vars.get(&k)
                .copied()
                .unwrap_or_else(|| params.get(k as usize - 1).copied().unwrap_or(0.0))
        })
        .collect()
}

/// Evaluate an aperture macro at a given flash position, producing vertex
/// loops in absolute pixel coordinates together with each shape's local
/// exposure polarity (exposure 1 -> Dark, exposure 0 -> Xor). The caller
/// is responsible for inverting these when the enclosing layer itself has
/// clear polarity, and for building [`crate::polygon::PolygonShape`]s (so
/// that the document-wide "grow" compensation can be applied uniformly to
/// every vertex loop at one place).
///
/// `$k=<expr>` variable-definition lines are threaded through as an
/// evolving binding table: each is evaluated against the params plus every
/// binding defined earlier in the body, then folded into the env used by
/// every primitive (and variable definition) that follows.
pub fn evaluate_macro(
    mac: &ApertureMacro,
    params: &[f64],
    flash_x: f64,
    flash_y: f64,
) -> Result<Vec<(Vec<(f64, f64)>, FillPolarity)>, GerberError> {
    let mut shapes = Vec::new();
    let mut vars: HashMap<u32, f64> = HashMap::new();

    for prim in &mac.primitives {
        let env = resolve_env(params, &vars);
        match prim {
            MacroPrimitive::Comment => {}
            MacroPrimitive::VarDef(index, expr) => {
                vars.insert(*index, expr.eval(&env));
            }
            MacroPrimitive::Circle {
                exposure,
                diameter,
                center_x,
                center_y,
                rotation,
            } => {
                let polarity = exposure_polarity(exposure.eval(&env));
                let d = diameter.eval(&env);
                let cx = center_x.eval(&env);
                let cy = center_y.eval(&env);
                let rot = rotation.as_ref().map(|r| r.eval(&env)).unwrap_or(0.0);
                let (rx, ry) = geometry::rotate((cx, cy), rot);
                let pts = geometry::circle_points(flash_x + rx, flash_y + ry, d.abs() / 2.0);
                shapes.push((pts, polarity));
            }
            MacroPrimitive::VectorLine {
                exposure,
                width,
                start_x,
                start_y,
                end_x,
                end_y,
                rotation,
            } => {
                let polarity = exposure_polarity(exposure.eval(&env));
                let w = width.eval(&env);
                let sx = start_x.eval(&env);
                let sy = start_y.eval(&env);
                let ex = end_x.eval(&env);
                let ey = end_y.eval(&env);
                let rot = rotation.eval(&env);

                let (rsx, rsy) = geometry::rotate((sx, sy), rot);
                let (rex, rey) = geometry::rotate((ex, ey), rot);
                let pts = geometry::stroke_round(
                    flash_x + rsx,
                    flash_y + rsy,
                    flash_x + rex,
                    flash_y + rey,
                    w,
                );
                shapes.push((pts, polarity));
            }
            MacroPrimitive::CenterLine {
                exposure,
                width,
                height,
                center_x,
                center_y,
                rotation,
            } => {
                let polarity = exposure_polarity(exposure.eval(&env));
                let w = width.eval(&env);
                let h = height.eval(&env);
                let cx = center_x.eval(&env);
                let cy = center_y.eval(&env);
                let rot = rotation.eval(&env);

                let corners = geometry::rect_points(0.0, 0.0, w, h);
                let pts: Vec<(f64, f64)> = corners
                    .into_iter()
                    .map(|(px, py)| geometry::rotate((px + cx, py + cy), rot))
                    .map(|(x, y)| (flash_x + x, flash_y + y))
                    .collect();
                shapes.push((pts, polarity));
            }
            MacroPrimitive::Outline {
                exposure,
                num_points,
                points: point_exprs,
                rotation: _,
            } => {
                let polarity = exposure_polarity(exposure.eval(&env));
                let n = num_points.eval(&env) as usize;
                // point_exprs holds (n+1) coordinate pairs followed by a trailing rotation.
                let coord_count = (n + 1) * 2;
                if point_exprs.len() < coord_count + 1 {
                    continue; // malformed; not enough points for the declared count
                }

                let rot = point_exprs[coord_count].eval(&env);
                let mut pts = Vec::with_capacity(n + 1);
                for k in 0..=n {
                    let px = point_exprs[k * 2].eval(&env);
                    let py = point_exprs[k * 2 + 1].eval(&env);
                    let (rx, ry) = geometry::rotate((px, py), rot);
                    pts.push((flash_x + rx, flash_y + ry));
                }
                shapes.push((pts, polarity));
            }
            MacroPrimitive::Polygon {
                exposure,
                num_vertices,
                center_x,
                center_y,
                diameter,
                rotation,
            } => {
                let polarity = exposure_polarity(exposure.eval(&env));
                let n = (num_vertices.eval(&env) as usize).max(3);
                let cx = center_x.eval(&env);
                let cy = center_y.eval(&env);
                let d = diameter.eval(&env);
                let rot = rotation.eval(&env);

                let pts: Vec<(f64, f64)> = geometry::regular_polygon_points(0.0, 0.0, d, n, 0.0)
                    .into_iter()
                    .map(|(px, py)| geometry::rotate((px + cx, py + cy), rot))
                    .map(|(x, y)| (flash_x + x, flash_y + y))
                    .collect();
                shapes.push((pts, polarity));
            }
            MacroPrimitive::Moire {
                center_x,
                center_y,
                outer_diameter,
                ring_thickness,
                ring_gap,
                max_rings,
                crosshair_thickness,
                crosshair_length,
                rotation,
            } => {
                let cx = center_x.eval(&env);
                let cy = center_y.eval(&env);
                let outer_d = outer_diameter.eval(&env);
                let thickness = ring_thickness.eval(&env);
                let gap = ring_gap.eval(&env);
                let max_rings = (max_rings.eval(&env) as i64).max(0);
                let ch_thickness = crosshair_thickness.eval(&env);
                let ch_length = crosshair_length.eval(&env);
                let rot = rotation.eval(&env);

                let mut outer_r = outer_d / 2.0;
                for _ in 0..max_rings {
                    if outer_r <= 0.0 {
                        break;
                    }
                    let inner_r = (outer_r - thickness).max(0.0);
                    let outer = geometry::circle_points(0.0, 0.0, outer_r);
                    let ring_pts = if inner_r > 1e-9 {
                        let inner = geometry::circle_points(0.0, 0.0, inner_r);
                        geometry::bridge_hole(&outer, &inner)
                    } else {
                        outer
                    };
                    let placed: Vec<(f64, f64)> = ring_pts
                        .into_iter()
                        .map(|p| geometry::rotate(p, rot))
                        .map(|(x, y)| (flash_x + cx + x, flash_y + cy + y))
                        .collect();
                    shapes.push((placed, FillPolarity::Dark));
                    outer_r -= thickness + gap;
                }

                let horiz = geometry::rect_points(0.0, 0.0, ch_length, ch_thickness);
                let vert = geometry::rect_points(0.0, 0.0, ch_thickness, ch_length);
                for arm in [horiz, vert] {
                    let placed: Vec<(f64, f64)> = arm
                        .into_iter()
                        .map(|p| geometry::rotate(p, rot))
                        .map(|(x, y)| (flash_x + cx + x, flash_y + cy + y))
                        .collect();
                    shapes.push((placed, FillPolarity::Dark));
                }
            }
            MacroPrimitive::Thermal {
                center_x,
                center_y,
                outer_diameter,
                inner_diameter,
                gap_thickness,
                rotation,
            } => {
                let cx = center_x.eval(&env);
                let cy = center_y.eval(&env);
                let od = outer_diameter.eval(&env);
                let id = inner_diameter.eval(&env);
                let gap = gap_thickness.eval(&env);
                let rot = rotation.eval(&env);

                let outer_r = od / 2.0;
                let inner_r = id / 2.0;
                let mid_r = (outer_r + inner_r) / 2.0;

                if mid_r < 1e-9 || outer_r <= inner_r {
                    continue;
                }

                // Half-angle subtended by the gap at the mid-radius.
                let gap_half_angle = ((gap / (2.0 * mid_r)).clamp(-1.0, 1.0)).asin();
                let rot_rad = rot.to_radians();

                for quadrant in 0..4u32 {
                    let base = rot_rad + (quadrant as f64) * PI / 2.0;
                    let start_rad = base + gap_half_angle;
                    let end_rad = base + PI / 2.0 - gap_half_angle;
                    if end_rad <= start_rad {
                        continue;
                    }
                    let pts = geometry::annular_sector(
                        flash_x + cx,
                        flash_y + cy,
                        inner_r,
                        outer_r,
                        start_rad,
                        end_rad,
                    );
                    shapes.push((pts, FillPolarity::Dark));
                }
            }
        }
    }

    Ok(shapes)
}
