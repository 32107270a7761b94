use clap::Parser;
use gerber_raster::config::{ExitCode, RenderConfig};
use gerber_raster::error::GerberError;
use std::path::PathBuf;
use std::process::exit;

/// Demonstration harness around the `gerber_raster` library: reads one or
/// more Gerber RS-274X files, compiles and rasterizes them, and writes the
/// resulting bit-packed monochrome strips to a file.
///
/// This writes raw packed rows, not a TIFF or BMP container; wrapping the
/// bytes in an actual image format is left to the caller.
#[derive(Parser)]
#[command(name = "gerber-raster", about = "Compile Gerber RS-274X into a monochrome raster")]
struct Cli {
    /// Input Gerber file(s), composited in the order given
    inputs: Vec<PathBuf>,

    /// Output file for the packed raster rows
    #[arg(short, long)]
    output: PathBuf,

    /// Optional JSON config file overriding the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 2400.0)]
    dpi: f64,

    #[arg(long, default_value_t = 0.0)]
    grow: f64,

    #[arg(long)]
    grow_mm: bool,

    #[arg(long, default_value_t = 0.0)]
    border: f64,

    #[arg(long)]
    border_mm: bool,

    #[arg(long)]
    invert: bool,

    #[arg(long, default_value_t = 512)]
    rows_per_strip: u32,

    #[arg(long, default_value_t = 1.0)]
    scale_x: f64,

    #[arg(long, default_value_t = 1.0)]
    scale_y: f64,
}

impl Cli {
    fn render_config(&self) -> Result<RenderConfig, GerberError> {
        if let Some(path) = &self.config {
            let text = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&text)?);
        }
        Ok(RenderConfig {
            image_dpi: self.dpi,
            grow_size: self.grow,
            grow_units_mm: self.grow_mm,
            border: self.border,
            border_units_mm: self.border_mm,
            invert_polarity: self.invert,
            rows_per_strip: self.rows_per_strip,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
        })
    }
}

fn exit_code_for(err: &GerberError) -> ExitCode {
    match err {
        GerberError::EmptyImage => ExitCode::NoImage,
        GerberError::MemoryAllocation(_) => ExitCode::MemoryAllocation,
        GerberError::Json(_) => ExitCode::JsonProcessing,
        _ => ExitCode::GerberProcessing,
    }
}

fn run(cli: &Cli) -> Result<(), ExitCode> {
    let config = cli.render_config().map_err(|e| {
        eprintln!("Error: {e}");
        exit_code_for(&e)
    })?;

    if cli.inputs.is_empty() {
        eprintln!("Error: no input files given");
        return Err(ExitCode::InvalidParameters);
    }

    let mut sources = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        log::info!("reading {}", path.display());
        let bytes = std::fs::read(path).map_err(|e| {
            eprintln!("Error: failed to read {}: {e}", path.display());
            ExitCode::FileOpenFailed
        })?;
        sources.push(bytes);
    }

    let image = gerber_raster::render(&sources, &config).map_err(|e| {
        eprintln!("Error: {e}");
        exit_code_for(&e)
    })?;
    log::info!(
        "rasterized {}x{} image from {} source(s)",
        image.width,
        image.height,
        sources.len()
    );

    let row_bytes = gerber_raster::raster::RasterImage::row_bytes(image.width);
    let mut packed = Vec::with_capacity(row_bytes * image.height as usize);
    for row in &image.rows {
        packed.extend_from_slice(row);
    }
    std::fs::write(&cli.output, &packed).map_err(|e| {
        eprintln!("Error: failed to write {}: {e}", cli.output.display());
        ExitCode::OutputFileCreation
    })?;
    log::info!("wrote {} bytes to {}", packed.len(), cli.output.display());

    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => exit(ExitCode::NoError as i32),
        Err(code) => exit(code as i32),
    }
}
