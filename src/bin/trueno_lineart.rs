//! trueno-lineart: trace a PNG into hatched line art.
//!
//! Run: `trueno-lineart photo.png -o photo.svg`

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use trueno_lineart::config::Config;
use trueno_lineart::decode::load_png;
use trueno_lineart::output::{render_raster, render_svg, OutputFormat, PngEncoder};
use trueno_lineart::trace::ScanMode;

/// Log levels accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Scan modes accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScanArg {
    Joint,
    Independent,
}

impl From<ScanArg> for ScanMode {
    fn from(mode: ScanArg) -> Self {
        match mode {
            ScanArg::Joint => ScanMode::Joint,
            ScanArg::Independent => ScanMode::Independent,
        }
    }
}

/// trueno-lineart: trace a PNG into hatched line art
#[derive(Parser, Debug)]
#[command(name = "trueno-lineart")]
#[command(author = "PAIML Team")]
#[command(version)]
#[command(about = "Trace images into threshold line art", long_about = None)]
struct Cli {
    /// Input PNG image
    input: PathBuf,

    /// Output file (.svg or .png)
    #[arg(short, long)]
    output: PathBuf,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cascade layer count (ignored when the config lists layers)
    #[arg(long)]
    layers: Option<usize>,

    /// Spacing between neighbouring rays of cascade layers
    #[arg(long)]
    offset_step: Option<f32>,

    /// Distance between samples along a ray
    #[arg(long)]
    march_step: Option<f32>,

    /// When to stop adding offset rays
    #[arg(long, value_enum)]
    scan_mode: Option<ScanArg>,

    /// Output width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

impl Cli {
    /// Apply flags on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(count) = self.layers {
            config.cascade_count = count;
        }
        if let Some(step) = self.offset_step {
            config.cascade_offset_step = step;
        }
        if let Some(step) = self.march_step {
            config.trace.march_step = step;
        }
        if let Some(mode) = self.scan_mode {
            config.trace.scan_mode = mode.into();
        }
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }
    }
}

fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level.into());

    let format = OutputFormat::from_path(&cli.output)?;

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let field = Arc::new(
        load_png(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?,
    );
    let stats = field.stats();
    info!(
        "{}: {}x{}, brightness {:.1}..{:.1} (mean {:.1})",
        cli.input.display(),
        field.width(),
        field.height(),
        stats.min,
        stats.max,
        stats.mean
    );

    let set = config.layer_set(Arc::clone(&field))?;
    let traced = set.trace_all()?;
    for (i, layer) in traced.iter().enumerate() {
        info!(
            "layer {i}: {} rays, {} segments",
            layer.stats.rays, layer.stats.segments
        );
    }

    let written = match format {
        OutputFormat::Svg => {
            render_svg(&config.render, &field, &traced)?.write_to_file(&cli.output)
        }
        OutputFormat::Png => {
            PngEncoder::write_to_file(&render_raster(&config.render, &traced)?, &cli.output)
        }
    };
    written.with_context(|| format!("writing {}", cli.output.display()))?;

    info!("wrote {}", cli.output.display());
    Ok(())
}
