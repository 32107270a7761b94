use crate::error::GerberError;

use super::coord::{CoordinateFormat, CoordinateMode, RawCoord, Units, ZeroSuppression};
use super::lexer::GerberToken;

/// An optional hole cut from a standard aperture template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hole {
    Circular(f64),
    Rectangular { width: f64, height: f64 },
}

/// Aperture shape template from an %AD command.
#[derive(Debug, Clone, PartialEq)]
pub enum ApertureTemplate {
    Circle {
        diameter: f64,
        hole: Option<Hole>,
    },
    Rectangle {
        x_size: f64,
        y_size: f64,
        hole: Option<Hole>,
    },
    Obround {
        x_size: f64,
        y_size: f64,
        hole: Option<Hole>,
    },
    Polygon {
        outer_diameter: f64,
        num_vertices: u32,
        rotation: f64,
        hole: Option<Hole>,
    },
    /// Reference to a user-defined aperture macro.
    Macro { name: String, params: Vec<f64> },
}

/// Layer polarity from %LP command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Dark,
    Clear,
}

/// A fully parsed Gerber command.
#[derive(Debug, Clone, PartialEq)]
pub enum GerberCommand {
    /// %FS - Format specification
    FormatSpec(CoordinateFormat),
    /// %MO - Unit mode
    Units(Units),
    /// %AD - Aperture definition
    ApertureDefine {
        code: u32,
        template: ApertureTemplate,
    },
    /// Dnn (n >= 10) - Select aperture
    SelectAperture(u32),
    /// D01 - Interpolate (draw)
    Interpolate {
        x: Option<RawCoord>,
        y: Option<RawCoord>,
        i: Option<RawCoord>,
        j: Option<RawCoord>,
    },
    /// D02 - Move
    Move {
        x: Option<RawCoord>,
        y: Option<RawCoord>,
    },
    /// D03 - Flash
    Flash {
        x: Option<RawCoord>,
        y: Option<RawCoord>,
    },
    /// G01 - Linear interpolation mode
    LinearMode,
    /// G02 - Clockwise circular interpolation
    ClockwiseArcMode,
    /// G03 - Counter-clockwise circular interpolation
    CounterClockwiseArcMode,
    /// G36 - Begin region
    RegionBegin,
    /// G37 - End region
    RegionEnd,
    /// G74 - Single quadrant arc mode
    SingleQuadrant,
    /// G75 - Multi quadrant arc mode
    MultiQuadrant,
    /// %LP - Layer polarity
    Polarity(Polarity),
    /// %IP - Image polarity. true = positive (dark), false = negative (clear).
    ImagePolarity(bool),
    /// %OF - Axis offset, in file units.
    Offset { a: f64, b: f64 },
    /// %AM - Aperture macro definition
    MacroDefine { name: String, body: Vec<String> },
    /// %SR - Step-and-repeat block.
    /// When x_repeat=1 AND y_repeat=1 this closes (or resets) any open SR block.
    /// Otherwise it opens a new block that will be tiled x_repeat × y_repeat times
    /// with x_step / y_step spacing (in file units, mm or inch).
    StepRepeat {
        x_repeat: u32,
        y_repeat: u32,
        x_step: f64,
        y_step: f64,
    },
    /// %MI - Image mirroring (deprecated but still in legacy files)
    /// A=true mirrors about the Y-axis (flips X), B=true mirrors about the X-axis (flips Y).
    ImageMirror { a: bool, b: bool },
    /// %SF - Image scaling (deprecated but still in legacy files)
    /// a scales the X axis, b scales the Y axis.
    ImageScale { a: f64, b: f64 },
    /// %IN / %IR / %AS / %IJ / %KO - recognized but not acted on. The string
    /// is the two-letter parameter code, reported to the warning channel.
    IgnoredParameter(String),
    /// M02 - End of file
    EndOfFile,
}

/// Parse a token stream into a sequence of Gerber commands.
///
/// Recoverable anomalies (unknown extended parameter, malformed numeric
/// field skipped) are appended to `warnings` rather than aborting the parse.
pub fn parse_commands(
    tokens: &[GerberToken],
    warnings: &mut Vec<String>,
) -> Result<Vec<GerberCommand>, GerberError> {
    let mut commands = Vec::new();
    let mut macro_name: Option<String> = None;
    let mut macro_body: Vec<String> = Vec::new();

    for token in tokens {
        match token {
            GerberToken::Extended(content) => {
                if content.starts_with("AM") && content.len() > 2 {
                    if let Some(name) = macro_name.take() {
                        commands.push(GerberCommand::MacroDefine {
                            name,
                            body: std::mem::take(&mut macro_body),
                        });
                    }
                    macro_name = Some(content[2..].to_string());
                    macro_body.clear();
                    continue;
                }

                if macro_name.is_some() {
                    let trimmed = content.trim();
                    if trimmed.starts_with(|c: char| c.is_ascii_digit()) || trimmed.starts_with('$')
                    {
                        macro_body.push(trimmed.to_string());
                        continue;
                    }
                    let name = macro_name.take().unwrap();
                    commands.push(GerberCommand::MacroDefine {
                        name,
                        body: std::mem::take(&mut macro_body),
                    });
                }

                match parse_extended(content) {
                    Ok(Some(cmd)) => commands.push(cmd),
                    Ok(None) => {}
                    Err(GerberError::ParseError(msg)) => {
                        warnings.push(format!("ignoring malformed parameter block '{content}': {msg}"));
                    }
                    Err(e) => return Err(e),
                }
            }
            GerberToken::Word(word) => {
                if let Some(name) = macro_name.take() {
                    commands.push(GerberCommand::MacroDefine {
                        name,
                        body: std::mem::take(&mut macro_body),
                    });
                }

                let cmds = parse_word(word)?;
                commands.extend(cmds);
            }
        }
    }

    if let Some(name) = macro_name.take() {
        commands.push(GerberCommand::MacroDefine {
            name,
            body: macro_body,
        });
    }

    Ok(commands)
}

/// Parse an extended command (content between % delimiters).
fn parse_extended(content: &str) -> Result<Option<GerberCommand>, GerberError> {
    if content.starts_with("FS") {
        return Ok(Some(parse_format_spec(content)?));
    }
    if content == "MOMM" {
        return Ok(Some(GerberCommand::Units(Units::Millimeters)));
    }
    if content == "MOIN" {
        return Ok(Some(GerberCommand::Units(Units::Inches)));
    }
    if content.starts_with("AD") {
        return Ok(Some(parse_aperture_define(content)?));
    }
    if content == "LPD" {
        return Ok(Some(GerberCommand::Polarity(Polarity::Dark)));
    }
    if content == "LPC" {
        return Ok(Some(GerberCommand::Polarity(Polarity::Clear)));
    }
    if content == "IPPOS" {
        return Ok(Some(GerberCommand::ImagePolarity(true)));
    }
    if content == "IPNEG" {
        return Ok(Some(GerberCommand::ImagePolarity(false)));
    }
    if content.starts_with("OF") {
        return Ok(Some(parse_offset(content)?));
    }
    if content.starts_with("SR") {
        return Ok(Some(parse_step_repeat(content)?));
    }
    if content.starts_with("MI") {
        return Ok(Some(parse_image_mirror(content)?));
    }
    if content.starts_with("SF") {
        return Ok(Some(parse_image_scale(content)?));
    }
    if content.starts_with("AM") {
        // Handled by the caller's macro-body collector; reaching here means
        // an empty or malformed macro header.
        return Ok(None);
    }
    for ignored in ["IN", "IR", "AS", "IJ", "KO"] {
        if content.starts_with(ignored) {
            return Ok(Some(GerberCommand::IgnoredParameter(ignored.to_string())));
        }
    }
    // Any other extended block (TF, TA, TD, TO X2 attributes, etc.) is
    // outside the recognized parameter set; skip silently.
    Ok(None)
}

/// Parse %FS command. Example: `FSLAX24Y24`
fn parse_format_spec(content: &str) -> Result<GerberCommand, GerberError> {
    // Expected format: FS[L|T][A|I]X<n><m>Y<n><m>
    let s = &content[2..]; // skip "FS"

    let zero_suppression = match s.chars().next() {
        Some('L') => ZeroSuppression::Leading,
        Some('T') => ZeroSuppression::Trailing,
        _ => ZeroSuppression::None,
    };
    let s = s.trim_start_matches(['L', 'T']);
    let coordinate_mode = match s.chars().next() {
        Some('I') => CoordinateMode::Incremental,
        _ => CoordinateMode::Absolute,
    };
    let s = s.trim_start_matches(['A', 'I']);

    let x_pos = s
        .find('X')
        .ok_or_else(|| GerberError::BadFormatSpec("missing X".into()))?;
    let y_pos = s
        .find('Y')
        .ok_or_else(|| GerberError::BadFormatSpec("missing Y".into()))?;

    let x_part = &s[x_pos + 1..y_pos];
    let y_part = &s[y_pos + 1..];

    if x_part.len() < 2 || y_part.len() < 2 {
        return Err(GerberError::BadFormatSpec(format!(
            "invalid format digits: X={x_part} Y={y_part}"
        )));
    }

    let x_integer = x_part[..x_part.len() - 1]
        .parse::<u8>()
        .map_err(|_| GerberError::BadFormatSpec(format!("bad X integer: {x_part}")))?;
    let x_decimal = x_part[x_part.len() - 1..]
        .parse::<u8>()
        .map_err(|_| GerberError::BadFormatSpec(format!("bad X decimal: {x_part}")))?;
    let y_integer = y_part[..y_part.len() - 1]
        .parse::<u8>()
        .map_err(|_| GerberError::BadFormatSpec(format!("bad Y integer: {y_part}")))?;
    let y_decimal = y_part[y_part.len() - 1..]
        .parse::<u8>()
        .map_err(|_| GerberError::BadFormatSpec(format!("bad Y decimal: {y_part}")))?;

    Ok(GerberCommand::FormatSpec(CoordinateFormat {
        x_integer,
        x_decimal,
        y_integer,
        y_decimal,
        zero_suppression,
        coordinate_mode,
    }))
}

/// Parse %OF command. Example: `OFA0.5B-0.25`.
fn parse_offset(content: &str) -> Result<GerberCommand, GerberError> {
    let s = &content[2..]; // skip "OF"
    let a = parse_ab_float(s, 'A').unwrap_or(0.0);
    let b = parse_ab_float(s, 'B').unwrap_or(0.0);
    Ok(GerberCommand::Offset { a, b })
}

/// Parse %AD command. Example: `ADD10C,0.020` or `ADD11R,0.040X0.020`
fn parse_aperture_define(content: &str) -> Result<GerberCommand, GerberError> {
    let s = &content[2..]; // skip "AD"

    if !s.starts_with('D') {
        return Err(GerberError::ParseError(format!("AD: expected D, got: {s}")));
    }
    let s = &s[1..]; // skip 'D'

    let type_pos = s
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| GerberError::ParseError(format!("AD: no template type in: {s}")))?;

    let code: u32 = s[..type_pos]
        .parse()
        .map_err(|_| GerberError::ParseError(format!("AD: bad aperture code: {s}")))?;

    let rest = &s[type_pos..];
    let template = parse_aperture_template(rest)?;

    Ok(GerberCommand::ApertureDefine { code, template })
}

/// Parse aperture template. Example: `C,0.020` or `R,0.040X0.020X0.010`
fn parse_aperture_template(s: &str) -> Result<ApertureTemplate, GerberError> {
    let (type_char, params_str) = if let Some(comma_pos) = s.find(',') {
        (&s[..comma_pos], &s[comma_pos + 1..])
    } else {
        (s, "")
    };

    let params: Vec<f64> = if params_str.is_empty() {
        Vec::new()
    } else {
        params_str
            .split('X')
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| GerberError::ParseError(format!("AD: bad param: {p}")))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    match type_char {
        "C" => {
            let diameter = params
                .first()
                .copied()
                .ok_or_else(|| GerberError::ParseError("AD C: missing diameter".into()))?;
            let hole = circle_hole(&params[1..]);
            Ok(ApertureTemplate::Circle { diameter, hole })
        }
        "R" => {
            if params.len() < 2 {
                return Err(GerberError::ParseError("AD R: need x_size and y_size".into()));
            }
            let hole = circle_hole(&params[2..]);
            Ok(ApertureTemplate::Rectangle {
                x_size: params[0],
                y_size: params[1],
                hole,
            })
        }
        "O" => {
            if params.len() < 2 {
                return Err(GerberError::ParseError("AD O: need x_size and y_size".into()));
            }
            let hole = circle_hole(&params[2..]);
            Ok(ApertureTemplate::Obround {
                x_size: params[0],
                y_size: params[1],
                hole,
            })
        }
        "P" => {
            if params.len() < 2 {
                return Err(GerberError::ParseError(
                    "AD P: need diameter and num_vertices".into(),
                ));
            }
            let rotation = params.get(2).copied().unwrap_or(0.0);
            let hole = circle_hole(&params[3.min(params.len())..]);
            Ok(ApertureTemplate::Polygon {
                outer_diameter: params[0],
                num_vertices: params[1] as u32,
                rotation,
                hole,
            })
        }
        _ => Ok(ApertureTemplate::Macro {
            name: type_char.to_string(),
            params,
        }),
    }
}

/// A standard aperture's trailing parameter, if present, is always a single
/// circular hole diameter (a rectangular hole is only expressible via a
/// macro in the standard, so this is the full extent of the "optional hole"
/// clause for built-in templates).
fn circle_hole(trailing: &[f64]) -> Option<Hole> {
    trailing.first().copied().map(Hole::Circular)
}

/// Parse %SR command.  Example: `SRX3Y2I5.0J10.0` or bare `SR` (close/reset).
fn parse_step_repeat(content: &str) -> Result<GerberCommand, GerberError> {
    let s = &content[2..]; // skip "SR"
    if s.is_empty() {
        return Ok(GerberCommand::StepRepeat {
            x_repeat: 1,
            y_repeat: 1,
            x_step: 0.0,
            y_step: 0.0,
        });
    }
    let x_repeat = parse_sr_uint(s, 'X').unwrap_or(1);
    let y_repeat = parse_sr_uint(s, 'Y').unwrap_or(1);
    let x_step = parse_sr_float(s, 'I').unwrap_or(0.0);
    let y_step = parse_sr_float(s, 'J').unwrap_or(0.0);
    Ok(GerberCommand::StepRepeat {
        x_repeat,
        y_repeat,
        x_step,
        y_step,
    })
}

fn parse_sr_uint(s: &str, key: char) -> Option<u32> {
    let pos = s.find(key)?;
    let after = &s[pos + 1..];
    let end = after
        .find(|c: char| c.is_alphabetic())
        .unwrap_or(after.len());
    after[..end].parse().ok()
}

fn parse_sr_float(s: &str, key: char) -> Option<f64> {
    let pos = s.find(key)?;
    let after = &s[pos + 1..];
    let end = after
        .find(|c: char| c.is_alphabetic())
        .unwrap_or(after.len());
    after[..end].parse().ok()
}

/// Parse %MI command.  Example: `MIA1B0` (mirror X only).
fn parse_image_mirror(content: &str) -> Result<GerberCommand, GerberError> {
    let s = &content[2..]; // skip "MI"
    let a = s
        .find('A')
        .and_then(|p| s[p + 1..].chars().next())
        .map(|c| c == '1')
        .unwrap_or(false);
    let b = s
        .find('B')
        .and_then(|p| s[p + 1..].chars().next())
        .map(|c| c == '1')
        .unwrap_or(false);
    Ok(GerberCommand::ImageMirror { a, b })
}

/// Parse %SF command.  Example: `SFA1.5B2.0`.
fn parse_image_scale(content: &str) -> Result<GerberCommand, GerberError> {
    let s = &content[2..]; // skip "SF"
    let a = parse_ab_float(s, 'A').unwrap_or(1.0);
    let b = parse_ab_float(s, 'B').unwrap_or(1.0);
    Ok(GerberCommand::ImageScale { a, b })
}

fn parse_ab_float(s: &str, key: char) -> Option<f64> {
    let pos = s.find(key)?;
    let after = &s[pos + 1..];
    let end = after
        .find(|c: char| c.is_alphabetic())
        .unwrap_or(after.len());
    after[..end].parse().ok()
}

/// Parse a word command (e.g., "D10", "X100Y200D01", "G01", "M02").
///
/// A single word may contain an embedded G-code prefix (e.g., "G01X100Y200D01").
fn parse_word(word: &str) -> Result<Vec<GerberCommand>, GerberError> {
    let mut commands = Vec::new();
    let mut remaining = word;

    if remaining.starts_with('G') || remaining.starts_with('g') {
        let g_end = remaining[1..]
            .find(|c: char| !c.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(remaining.len());
        let g_code = &remaining[..g_end];
        if let Some(cmd) = parse_g_code(g_code) {
            commands.push(cmd);
        }
        remaining = &remaining[g_end..];
        if remaining.is_empty() {
            return Ok(commands);
        }
    }

    if remaining.starts_with('M') || remaining.starts_with('m') {
        let code = remaining[1..].parse::<u32>().unwrap_or(0);
        if code == 2 {
            commands.push(GerberCommand::EndOfFile);
        }
        return Ok(commands);
    }

    let mut x: Option<RawCoord> = None;
    let mut y: Option<RawCoord> = None;
    let mut i: Option<RawCoord> = None;
    let mut j: Option<RawCoord> = None;
    let mut d_code: Option<u32> = None;

    let s = remaining;
    let mut pos = 0;
    let bytes = s.as_bytes();

    while pos < bytes.len() {
        let key = bytes[pos] as char;
        pos += 1;

        match key.to_ascii_uppercase() {
            'X' | 'Y' | 'I' | 'J' => {
                let mut negative = false;
                if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
                    negative = bytes[pos] == b'-';
                    pos += 1;
                }
                let digit_start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                let digits = &s[digit_start..pos];
                let magnitude: i64 = digits
                    .parse()
                    .map_err(|_| GerberError::ParseError(format!("bad coord in: {word}")))?;
                let coord = RawCoord {
                    value: if negative { -magnitude } else { magnitude },
                    digits: digits.len() as u8,
                };
                match key.to_ascii_uppercase() {
                    'X' => x = Some(coord),
                    'Y' => y = Some(coord),
                    'I' => i = Some(coord),
                    'J' => j = Some(coord),
                    _ => unreachable!(),
                }
            }
            'D' | 'd' => {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                d_code = Some(
                    s[start..pos]
                        .parse()
                        .map_err(|_| GerberError::ParseError(format!("bad D-code in: {word}")))?,
                );
            }
            _ => {}
        }
    }

    match d_code {
        Some(1) => commands.push(GerberCommand::Interpolate { x, y, i, j }),
        Some(2) => commands.push(GerberCommand::Move { x, y }),
        Some(3) => commands.push(GerberCommand::Flash { x, y }),
        Some(code) if code >= 10 => commands.push(GerberCommand::SelectAperture(code)),
        _ => {
            // Bare coordinates without D-code: the previous D-code persists.
            if x.is_some() || y.is_some() {
                commands.push(GerberCommand::Interpolate { x, y, i, j });
            }
        }
    }

    Ok(commands)
}

fn parse_g_code(s: &str) -> Option<GerberCommand> {
    let code: u32 = s[1..].parse().ok()?;
    match code {
        1 => Some(GerberCommand::LinearMode),
        2 => Some(GerberCommand::ClockwiseArcMode),
        3 => Some(GerberCommand::CounterClockwiseArcMode),
        36 => Some(GerberCommand::RegionBegin),
        37 => Some(GerberCommand::RegionEnd),
        74 => Some(GerberCommand::SingleQuadrant),
        75 => Some(GerberCommand::MultiQuadrant),
        _ => None, // G04, G54, G70, G71, etc., comments or deprecated, handled elsewhere
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gerber::lexer::tokenize;

    fn parse(input: &str) -> Vec<GerberCommand> {
        let tokens = tokenize(input);
        let mut warnings = Vec::new();
        parse_commands(&tokens, &mut warnings).unwrap()
    }

    #[test]
    fn test_format_spec() {
        let cmds = parse("%FSLAX24Y24*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::FormatSpec(CoordinateFormat {
                x_integer: 2,
                x_decimal: 4,
                y_integer: 2,
                y_decimal: 4,
                zero_suppression: ZeroSuppression::Leading,
                coordinate_mode: CoordinateMode::Absolute,
            })]
        );
    }

    #[test]
    fn test_format_spec_trailing_incremental() {
        let cmds = parse("%FSTIX35Y35*%\n");
        match &cmds[0] {
            GerberCommand::FormatSpec(fmt) => {
                assert_eq!(fmt.zero_suppression, ZeroSuppression::Trailing);
                assert_eq!(fmt.coordinate_mode, CoordinateMode::Incremental);
                assert_eq!(fmt.x_integer, 3);
                assert_eq!(fmt.x_decimal, 5);
            }
            other => panic!("expected FormatSpec, got {other:?}"),
        }
    }

    #[test]
    fn test_aperture_define_rectangle() {
        let cmds = parse("%ADD11R,0.040X0.020*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::ApertureDefine {
                code: 11,
                template: ApertureTemplate::Rectangle {
                    x_size: 0.040,
                    y_size: 0.020,
                    hole: None,
                },
            }]
        );
    }

    #[test]
    fn test_aperture_define_obround() {
        let cmds = parse("%ADD12O,0.050X0.030*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::ApertureDefine {
                code: 12,
                template: ApertureTemplate::Obround {
                    x_size: 0.050,
                    y_size: 0.030,
                    hole: None,
                },
            }]
        );
    }

    #[test]
    fn test_aperture_define_polygon() {
        let cmds = parse("%ADD13P,0.080X6*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::ApertureDefine {
                code: 13,
                template: ApertureTemplate::Polygon {
                    outer_diameter: 0.080,
                    num_vertices: 6,
                    rotation: 0.0,
                    hole: None,
                },
            }]
        );
    }

    #[test]
    fn test_aperture_define_circle_with_hole() {
        let cmds = parse("%ADD10C,0.020X0.010*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::ApertureDefine {
                code: 10,
                template: ApertureTemplate::Circle {
                    diameter: 0.020,
                    hole: Some(Hole::Circular(0.010)),
                },
            }]
        );
    }

    #[test]
    fn test_interpolate() {
        let cmds = parse("X100Y200D01*\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::Interpolate {
                x: Some(RawCoord { value: 100, digits: 3 }),
                y: Some(RawCoord { value: 200, digits: 3 }),
                i: None,
                j: None,
            }]
        );
    }

    #[test]
    fn test_move() {
        let cmds = parse("X100Y200D02*\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::Move {
                x: Some(RawCoord { value: 100, digits: 3 }),
                y: Some(RawCoord { value: 200, digits: 3 }),
            }]
        );
    }

    #[test]
    fn test_flash() {
        let cmds = parse("X100Y200D03*\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::Flash {
                x: Some(RawCoord { value: 100, digits: 3 }),
                y: Some(RawCoord { value: 200, digits: 3 }),
            }]
        );
    }

    #[test]
    fn test_interpolate_with_ij() {
        let cmds = parse("X200Y100I50J-30D01*\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::Interpolate {
                x: Some(RawCoord { value: 200, digits: 3 }),
                y: Some(RawCoord { value: 100, digits: 3 }),
                i: Some(RawCoord { value: 50, digits: 2 }),
                j: Some(RawCoord { value: -30, digits: 2 }),
            }]
        );
    }

    #[test]
    fn test_gcode_prefix() {
        let cmds = parse("G01X100Y200D01*\n");
        assert_eq!(
            cmds,
            vec![
                GerberCommand::LinearMode,
                GerberCommand::Interpolate {
                    x: Some(RawCoord { value: 100, digits: 3 }),
                    y: Some(RawCoord { value: 200, digits: 3 }),
                    i: None,
                    j: None,
                },
            ]
        );
    }

    #[test]
    fn test_step_repeat() {
        let cmds = parse("%SRX3Y2I5.0J10.0*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::StepRepeat {
                x_repeat: 3,
                y_repeat: 2,
                x_step: 5.0,
                y_step: 10.0,
            }]
        );
    }

    #[test]
    fn test_image_polarity() {
        assert_eq!(parse("%IPPOS*%\n"), vec![GerberCommand::ImagePolarity(true)]);
        assert_eq!(
            parse("%IPNEG*%\n"),
            vec![GerberCommand::ImagePolarity(false)]
        );
    }

    #[test]
    fn test_offset() {
        let cmds = parse("%OFA0.5B-0.25*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::Offset { a: 0.5, b: -0.25 }]
        );
    }

    #[test]
    fn test_ignored_parameter() {
        let cmds = parse("%IN PanelName*%\n");
        assert_eq!(
            cmds,
            vec![GerberCommand::IgnoredParameter("IN".to_string())]
        );
    }

    #[test]
    fn test_end_of_file() {
        assert_eq!(parse("M02*\n"), vec![GerberCommand::EndOfFile]);
    }

    #[test]
    fn test_malformed_parameter_becomes_warning_not_error() {
        let tokens = tokenize("%ADD10C,notanumber*%\nD10*\n");
        let mut warnings = Vec::new();
        let cmds = parse_commands(&tokens, &mut warnings).unwrap();
        assert!(!warnings.is_empty());
        assert_eq!(cmds, vec![GerberCommand::SelectAperture(10)]);
    }
}
