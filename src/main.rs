use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use skycam_rs::capture::{CaptureEvent, CaptureSession, MockCaptureSource, SessionConfig, SessionStats};
use skycam_rs::image_pipeline::{
    ConversionConfig, DebayerStrategy, FitsReader, OutputFormat, RawLoaderReader, RawToRgbPipeline,
};
use skycam_rs::logger;

#[derive(Parser)]
#[command(name = "skycam", about = "Debayers raw astronomical camera frames into viewable images")]
struct Cli {
    /// Log at debug level, including per-stage span timings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one raw capture (FITS or camera RAW) into an RGB image
    Convert {
        input: PathBuf,
        /// Defaults to the input path with the output format's extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum)]
        strategy: Option<Strategy>,
        #[arg(short, long, value_enum)]
        format: Option<Format>,
        /// TOML file with conversion settings; flags take precedence
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run a capture session against the built-in mock camera
    Simulate {
        /// TOML session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short = 'n', long, default_value_t = 5)]
        frames: u32,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Decimate,
    Interpolate,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Tiff,
}

/// Container of a capture file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Fits,
    CameraRaw,
}

impl InputKind {
    fn of(path: &Path) -> Self {
        let is_fits = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "fit" | "fits" | "fts"));
        if is_fits { InputKind::Fits } else { InputKind::CameraRaw }
    }
}

/// Output path for `input`, defaulting to the input with the format's
/// extension. Never the input itself.
fn resolve_output(input: &Path, output: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<PathBuf> {
    let output = output.unwrap_or_else(|| input.with_extension(format.extension()));
    if output == input {
        bail!("output path {} would overwrite the input", output.display());
    }
    Ok(output)
}

fn load_conversion_config(path: Option<&Path>) -> anyhow::Result<ConversionConfig> {
    let Some(path) = path else {
        return Ok(ConversionConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn convert(
    input: &Path,
    output: Option<PathBuf>,
    strategy: Option<Strategy>,
    format: Option<Format>,
    config_path: Option<&Path>,
) -> anyhow::Result<PathBuf> {
    let mut config = load_conversion_config(config_path)?;
    if let Some(strategy) = strategy {
        config.strategy = match strategy {
            Strategy::Decimate => DebayerStrategy::Decimate,
            Strategy::Interpolate => DebayerStrategy::Interpolate,
        };
    }
    if let Some(format) = format {
        config.output_format = match format {
            Format::Png => OutputFormat::Png,
            Format::Tiff => OutputFormat::Tiff,
        };
    }

    let output = resolve_output(input, output, config.output_format)?;

    info!(
        strategy = ?config.strategy,
        format = ?config.output_format,
        "Conversion pipeline initialized"
    );

    match InputKind::of(input) {
        InputKind::Fits => {
            RawToRgbPipeline::with_reader(FitsReader, config).convert_file(input, &output)?
        }
        InputKind::CameraRaw => {
            RawToRgbPipeline::with_reader(RawLoaderReader, config).convert_file(input, &output)?
        }
    }

    info!(output = %output.display(), "Conversion successful");
    Ok(output)
}

fn simulate(
    config_path: Option<&Path>,
    frames: u32,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<SessionStats> {
    let mut config = match config_path {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let mut session = CaptureSession::new(MockCaptureSource::new(), config)?;
    session.handle_event(CaptureEvent::Connection { connected: true })?;
    session.handle_event(CaptureEvent::FrameProperty)?;
    session.handle_event(CaptureEvent::ExposureProperty)?;

    for _ in 0..frames {
        let Some(event) = session.source_mut().next_event() else {
            warn!("Mock camera has no exposure pending");
            break;
        };
        if let Some(path) = session.handle_event(event)? {
            info!(path = %path.display(), "Frame stored");
        }
    }

    let stats = session.stats();
    info!(
        saved = stats.saved,
        stored_raw = stats.stored_raw,
        failed = stats.failed,
        "Simulation finished"
    );
    Ok(stats)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(if cli.verbose { "debug" } else { "info" });

    match cli.command {
        Command::Convert { input, output, strategy, format, config } => {
            convert(&input, output, strategy, format, config.as_deref()).map(|_| ())
        }
        Command::Simulate { config, frames, output_dir } => {
            simulate(config.as_deref(), frames, output_dir).map(|_| ())
        }
    }
}
