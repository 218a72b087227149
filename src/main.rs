use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use memmap2::Mmap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use texprobe::{
    Dispatcher, ErrorKind, ImageFormat, ImageHeader, ProbeConfig, ProbeError, TextureDescriptor,
    TextureLoader,
};

#[derive(Parser)]
#[command(name = "texprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate JPEG and PNG headers before decoding or texture upload")]
struct Cli {
    /// Files to validate
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON file with probe settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject PNG files whose IHDR CRC does not match
    #[arg(long)]
    verify_crc: bool,

    /// Accept IHDR field combinations the PNG standard does not define
    #[arg(long)]
    lenient: bool,

    /// Reject images wider or taller than this
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Formats to try, in order
    #[arg(long, value_delimiter = ',')]
    formats: Option<Vec<ImageFormat>>,

    /// Print a JSON array instead of one line per file
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct FileReport {
    path: String,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Outcome {
    Valid {
        header: ImageHeader,
        texture: TextureDescriptor,
        decoded_bytes: Option<u64>,
    },
    Invalid {
        kind: Option<ErrorKind>,
        error: String,
    },
}

impl Outcome {
    fn from_probe(result: Result<std::result::Result<TextureLoader, ProbeError>>) -> Self {
        match result {
            Ok(Ok(loader)) => Outcome::Valid {
                header: *loader.header(),
                texture: loader.descriptor(),
                decoded_bytes: loader.decoded_size(),
            },
            Ok(Err(e)) => Outcome::Invalid {
                kind: Some(e.kind()),
                error: e.to_string(),
            },
            Err(e) => Outcome::Invalid {
                kind: None,
                error: format!("{e:#}"),
            },
        }
    }

    fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid { .. })
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    let dispatcher = Dispatcher::from_config(config);
    info!(
        files = cli.files.len(),
        formats = ?dispatcher.formats(),
        "probing"
    );

    let reports: Vec<FileReport> = cli
        .files
        .par_iter()
        .map(|path| FileReport {
            path: path.display().to_string(),
            outcome: Outcome::from_probe(probe_file(&dispatcher, path)),
        })
        .collect();

    let failed = failed_count(&reports);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", render_line(report));
        }
    }

    if failed > 0 {
        warn!(failed, total = reports.len(), "some files failed validation");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn failed_count(reports: &[FileReport]) -> usize {
    reports.iter().filter(|r| !r.outcome.is_valid()).count()
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,texprobe=debug"
    } else {
        "warn,texprobe=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<ProbeConfig> {
    let mut config = match &cli.config {
        Some(path) => ProbeConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ProbeConfig::default(),
    };

    if cli.verify_crc {
        config = config.with_crc_verification(true);
    }
    if cli.lenient {
        config = config.with_png_field_checks(false);
    }
    if let Some(max) = cli.max_dimension {
        config = config.with_max_dimension(max);
    }
    if let Some(formats) = &cli.formats {
        config = config.with_formats(formats);
    }
    Ok(config)
}

/// Maps the file read-only and probes it. I/O failures are the outer error.
fn probe_file(
    dispatcher: &Dispatcher,
    path: &Path,
) -> Result<std::result::Result<TextureLoader, ProbeError>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        bail!("Failed to probe {:?}: not a regular file", path);
    }

    if metadata.len() == 0 {
        return Ok(dispatcher.probe(&[]));
    }

    // SAFETY: the mapping is read-only and dropped before this function
    // returns; the file is not modified through this process.
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to map {:?}", path))?;
    Ok(dispatcher.probe(&mmap))
}

fn render_line(report: &FileReport) -> String {
    match &report.outcome {
        Outcome::Valid {
            header,
            texture,
            decoded_bytes,
        } => {
            let decoded = decoded_bytes
                .map(|b| format!("{b} bytes decoded"))
                .unwrap_or_else(|| "decoded size overflows u64".to_string());
            format!(
                "{}: {} {}x{}, {} channels, {}-bit, {:?} ({})",
                report.path,
                header.format(),
                header.width(),
                header.height(),
                header.channels(),
                header.bits_per_sample(),
                texture.format,
                decoded
            )
        }
        Outcome::Invalid { kind, error } => match kind {
            Some(kind) => format!("{}: {} ({})", report.path, error, kind),
            None => format!("{}: {}", report.path, error),
        },
    }
}
