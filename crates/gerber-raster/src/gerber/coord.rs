/// Zero-suppression mode from the %FS command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroSuppression {
    /// `L`: leading zeros are omitted; the digits present are right-aligned.
    Leading,
    /// `T`: trailing zeros are omitted; the digits present are left-aligned.
    Trailing,
    /// No suppression; every digit is present.
    None,
}

/// Coordinate mode from the %FS command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateMode {
    Absolute,
    Incremental,
}

/// Coordinate format from the %FS (Format Specification) command.
///
/// Example: `%FSLAX24Y24*%` means leading-zero suppression, absolute mode,
/// 2 integer digits + 4 decimal digits for both X and Y.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateFormat {
    pub x_integer: u8,
    pub x_decimal: u8,
    pub y_integer: u8,
    pub y_decimal: u8,
    pub zero_suppression: ZeroSuppression,
    pub coordinate_mode: CoordinateMode,
}

impl Default for CoordinateFormat {
    fn default() -> Self {
        // Common default: 2.4 format (FSLAX24Y24)
        Self {
            x_integer: 2,
            x_decimal: 4,
            y_integer: 2,
            y_decimal: 4,
            zero_suppression: ZeroSuppression::Leading,
            coordinate_mode: CoordinateMode::Absolute,
        }
    }
}

/// Unit system from the %MO command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

/// A coordinate field as lexed from the data stream: the signed magnitude of
/// the digit string together with the count of digits actually written
/// (excluding the sign). The digit count is what distinguishes leading from
/// trailing zero suppression when decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCoord {
    pub value: i64,
    pub digits: u8,
}

/// Converts raw Gerber coordinate fields to real-valued pixel coordinates.
#[derive(Debug, Clone)]
pub struct CoordinateConverter {
    pub format: CoordinateFormat,
    pub units: Units,
    pub image_dpi: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for CoordinateConverter {
    fn default() -> Self {
        Self {
            format: CoordinateFormat::default(),
            units: Units::default(),
            image_dpi: 1000.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl CoordinateConverter {
    /// Decode a raw coordinate field into file-native units (inches or mm),
    /// honoring the format's zero-suppression mode.
    ///
    /// Pad to `integer_digits + decimal_digits` total digits by adding zeros
    /// on the side opposite the suppression, then divide by 10^decimal_digits.
    pub fn decode_field(&self, raw: RawCoord, is_x: bool) -> f64 {
        let (integer_digits, decimal_digits) = if is_x {
            (self.format.x_integer, self.format.x_decimal)
        } else {
            (self.format.y_integer, self.format.y_decimal)
        };
        let total_digits = integer_digits + decimal_digits;

        let scaled_value = match self.format.zero_suppression {
            // Leading zeros were stripped from the left: the digits present
            // are already the low-order (rightmost) digits, so the literal
            // value is already correct relative to the declared decimal width.
            ZeroSuppression::Leading | ZeroSuppression::None => raw.value,
            // Trailing zeros were stripped from the right: the digits present
            // are the high-order digits, so pad with zeros on the right to
            // reach the declared total width.
            ZeroSuppression::Trailing => {
                let missing = total_digits.saturating_sub(raw.digits);
                raw.value * 10i64.pow(missing as u32)
            }
        };

        scaled_value as f64 / 10f64.powi(decimal_digits as i32)
    }

    /// Convert a file-native-unit value (inches or mm) to real-valued pixels,
    /// applying DPI and the per-axis scale factor.
    pub fn to_pixels(&self, native: f64, is_x: bool) -> f64 {
        let inches = match self.units {
            Units::Inches => native,
            Units::Millimeters => native / 25.4,
        };
        let scale = if is_x { self.scale_x } else { self.scale_y };
        inches * self.image_dpi * scale
    }

    /// Decode a raw coordinate field straight to pixel units.
    pub fn to_pixel_coord(&self, raw: RawCoord, is_x: bool) -> f64 {
        self.to_pixels(self.decode_field(raw, is_x), is_x)
    }
}
