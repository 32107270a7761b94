use thiserror::Error;

/// Fatal error kinds surfaced by the Gerber compiler and rasterizer.
///
/// All are fatal at document scope: once set, a document stops producing
/// polygons. The rasterizer itself only ever raises `MemoryAllocation`.
#[derive(Error, Debug)]
pub enum GerberError {
    #[error("no format specification (%FS) before first coordinate")]
    FormatNotSet,

    #[error("bad format specification: {0}")]
    BadFormatSpec(String),

    #[error("D-code selects undefined aperture D{0}")]
    UnknownAperture(u32),

    #[error("malformed aperture macro '{0}': {1}")]
    MalformedMacro(String, String),

    #[error("arc parameters inconsistent with declared quadrant mode: {0}")]
    ArcInconsistentWithQuadrant(String),

    #[error("unexpected end of Gerber stream")]
    UnexpectedEndOfStream,

    #[error("no polygons produced for this document")]
    EmptyImage,

    #[error("arithmetic error evaluating macro expression: {0}")]
    ArithmeticInMacro(String),

    #[error("failed to allocate strip buffer: {0}")]
    MemoryAllocation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    ParseError(String),
}
