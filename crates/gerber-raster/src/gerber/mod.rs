//! Gerber RS-274X compiler: lexer, command parser, plotter state machine,
//! aperture store, and macro expansion. Together these turn one Gerber byte
//! stream into a [`crate::document::GerberDocument`] of polygons in
//! real-valued pixel coordinates, ready for [`crate::raster::Rasterizer`].

pub mod apertures;
pub mod commands;
pub mod coord;
pub mod geometry;
pub mod interpreter;
pub mod lexer;
pub mod macros;

use crate::config::RenderConfig;
use crate::document::GerberDocument;
use crate::error::GerberError;

use self::coord::CoordinateConverter;

/// Compile one Gerber source into a document: its polygons, its `%IP` image
/// polarity, and every warning collected along the way (parse-time and
/// interpret-time warnings are merged, in the order they were produced).
///
/// Every warning is also emitted at [`log::warn!`] level as it surfaces, so a
/// caller tailing logs sees it live in addition to the structured result.
pub fn compile(input: &[u8], config: &RenderConfig) -> Result<GerberDocument, GerberError> {
    let text = std::str::from_utf8(input)
        .map_err(|e| GerberError::ParseError(format!("input is not valid UTF-8: {e}")))?;

    let tokens = lexer::tokenize(text);
    let mut warnings = Vec::new();
    let commands = commands::parse_commands(&tokens, &mut warnings)?;

    let converter = CoordinateConverter {
        image_dpi: config.image_dpi,
        scale_x: config.scale_x,
        scale_y: config.scale_y,
        ..CoordinateConverter::default()
    };
    let grow = config.grow_pixels();

    let output = interpreter::interpret(&commands, converter, grow)?;
    warnings.extend(output.warnings);
    for warning in &warnings {
        log::warn!("{warning}");
    }

    Ok(GerberDocument {
        polygons: output.polygons,
        image_polarity_dark: output.image_polarity_dark,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_empty_flash() {
        let src = b"%FSLAX24Y24*%\n%MOIN*%\n%ADD10C,0.010*%\nD10*\nX0Y0D03*\nM02*\n";
        let config = RenderConfig {
            image_dpi: 1000.0,
            ..RenderConfig::default()
        };
        let doc = compile(src, &config).unwrap();
        assert_eq!(doc.polygons.len(), 1);
        assert!(doc.image_polarity_dark);
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_compile_reports_malformed_block_as_warning() {
        let src = b"%FSLAX24Y24*%\n%MOIN*%\n%ADD10C,notanumber*%\nD10*\nX0Y0D03*\nM02*\n";
        let config = RenderConfig {
            image_dpi: 1000.0,
            ..RenderConfig::default()
        };
        let result = compile(src, &config);
        // Aperture never got defined, so flashing it is fatal.
        assert!(matches!(result, Err(GerberError::UnknownAperture(10))));
    }

    #[test]
    fn test_compile_invalid_utf8_is_parse_error() {
        let src: &[u8] = &[0xFF, 0xFE, 0xFD];
        let config = RenderConfig::default();
        let result = compile(src, &config);
        assert!(matches!(result, Err(GerberError::ParseError(_))));
    }

    #[test]
    fn test_compile_format_not_set_is_fatal() {
        let src = b"D10*\nX0Y0D03*\nM02*\n";
        let config = RenderConfig::default();
        let result = compile(src, &config);
        assert!(matches!(result, Err(GerberError::FormatNotSet)));
    }
}
