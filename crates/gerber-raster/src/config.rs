use serde::{Deserialize, Serialize};

/// The Input configuration record consumed by the JSON/DLL front end.
///
/// Field names match the original JSON config verbatim so a caller's wire
/// format round-trips through this struct unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    #[serde(rename = "imageDPI")]
    pub image_dpi: f64,
    #[serde(default)]
    pub grow_size: f64,
    #[serde(default, rename = "growUnitsMM")]
    pub grow_units_mm: bool,
    #[serde(default)]
    pub border: f64,
    #[serde(default, rename = "borderUnitsMM")]
    pub border_units_mm: bool,
    #[serde(default)]
    pub invert_polarity: bool,
    #[serde(default = "default_rows_per_strip")]
    pub rows_per_strip: u32,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
}

fn default_rows_per_strip() -> u32 {
    512
}

fn default_scale() -> f64 {
    1.0
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_dpi: 2400.0,
            grow_size: 0.0,
            grow_units_mm: false,
            border: 0.0,
            border_units_mm: false,
            invert_polarity: false,
            rows_per_strip: default_rows_per_strip(),
            scale_x: default_scale(),
            scale_y: default_scale(),
        }
    }
}

impl RenderConfig {
    /// Grow offset in pixels, using `image_dpi` to convert from mm when needed.
    pub fn grow_pixels(&self) -> f64 {
        if self.grow_units_mm {
            self.grow_size / 25.4 * self.image_dpi
        } else {
            self.grow_size
        }
    }

    /// Border in pixels, using `image_dpi` to convert from mm when needed.
    pub fn border_pixels(&self) -> f64 {
        if self.border_units_mm {
            self.border / 25.4 * self.image_dpi
        } else {
            self.border
        }
    }
}

/// Process exit codes for the CLI/DLL boundary, mirrored from the reference
/// implementation's `error_codes.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    NoError = 0,
    FileOpenFailed = 2,
    GerberProcessing = 3,
    InvalidParameters = 4,
    NoImage = 5,
    MemoryAllocation = 6,
    OutputFileCreation = 7,
    JsonProcessing = 8,
    Unknown = 9999,
}
