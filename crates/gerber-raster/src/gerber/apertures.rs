use std::collections::HashMap;

use crate::error::GerberError;

use super::commands::ApertureTemplate;

/// An aperture in the aperture table.
#[derive(Debug, Clone)]
pub struct Aperture {
    pub template: ApertureTemplate,
}

/// Aperture table built from %AD commands.
#[derive(Debug, Default)]
pub struct ApertureTable {
    apertures: HashMap<u32, Aperture>,
}

impl ApertureTable {
    pub fn define(&mut self, code: u32, template: ApertureTemplate) {
        self.apertures.insert(code, Aperture { template });
    }

    pub fn get(&self, code: u32) -> Option<&Aperture> {
        self.apertures.get(&code)
    }

    /// Look up an aperture, failing with `UnknownAperture` if the D-code was
    /// never defined by an %AD command. A D-code selecting an undefined
    /// aperture is fatal: there is no reasonable stroke or flash geometry to
    /// fall back to.
    pub fn get_or_err(&self, code: u32) -> Result<&Aperture, GerberError> {
        self.apertures
            .get(&code)
            .ok_or(GerberError::UnknownAperture(code))
    }

    /// The effective stroke width for an aperture used in a D01 draw.
    /// For circles, this is the diameter; for rectangles/obrounds, the
    /// minimum dimension, which only matters for the round-aperture stroke
    /// path; rectangular apertures build their swept hull from the full
    /// template instead of this scalar width.
    pub fn stroke_width(&self, code: u32) -> Result<f64, GerberError> {
        let ap = self.get_or_err(code)?;
        Ok(match &ap.template {
            ApertureTemplate::Circle { diameter, .. } => *diameter,
            ApertureTemplate::Rectangle { x_size, y_size, .. } => x_size.min(*y_size),
            ApertureTemplate::Obround { x_size, y_size, .. } => x_size.min(*y_size),
            ApertureTemplate::Polygon { outer_diameter, .. } => *outer_diameter,
            ApertureTemplate::Macro { .. } => 0.0, // macros are flash-only
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut table = ApertureTable::default();
        table.define(
            10,
            ApertureTemplate::Circle {
                diameter: 0.5,
                hole: None,
            },
        );
        let ap = table.get(10).unwrap();
        assert!(
            matches!(ap.template, ApertureTemplate::Circle { diameter, .. } if (diameter - 0.5).abs() < 1e-9)
        );
    }

    #[test]
    fn test_get_missing() {
        let table = ApertureTable::default();
        assert!(table.get(10).is_none());
    }

    #[test]
    fn test_stroke_width_circle() {
        let mut table = ApertureTable::default();
        table.define(
            10,
            ApertureTemplate::Circle {
                diameter: 0.254,
                hole: None,
            },
        );
        assert!((table.stroke_width(10).unwrap() - 0.254).abs() < 1e-9);
    }

    #[test]
    fn test_stroke_width_rect() {
        let mut table = ApertureTable::default();
        table.define(
            11,
            ApertureTemplate::Rectangle {
                x_size: 0.5,
                y_size: 0.3,
                hole: None,
            },
        );
        assert!((table.stroke_width(11).unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_stroke_width_missing_is_fatal() {
        let table = ApertureTable::default();
        assert!(matches!(
            table.stroke_width(99),
            Err(GerberError::UnknownAperture(99))
        ));
    }

    #[test]
    fn test_get_undefined_aperture() {
        let table = ApertureTable::default();
        assert!(table.get(42).is_none());
        assert!(matches!(
            table.get_or_err(42),
            Err(GerberError::UnknownAperture(42))
        ));
    }

    #[test]
    fn test_circle_with_hole_roundtrip() {
        let mut table = ApertureTable::default();
        table.define(
            20,
            ApertureTemplate::Circle {
                diameter: 1.0,
                hole: Some(super::super::commands::Hole::Circular(0.2)),
            },
        );
        let ap = table.get(20).unwrap();
        match &ap.template {
            ApertureTemplate::Circle { hole, .. } => {
                assert!(hole.is_some());
            }
            _ => panic!("expected circle"),
        }
    }
}
