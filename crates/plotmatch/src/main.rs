//! plotmatch: find the candidate raster that best matches a parcel.
//!
//! Reads one parcel geometry from a features file, builds its reference
//! mask, and ranks every candidate raster found under a survey tree
//! laid out as `<root>/<group>/<subdir>/*.<ext>`.
//!
//! Two methods are available:
//!
//! - `standard` (default): IoU and Hausdorff distance under four flips,
//!   over numeric text masks (`<group>/dat/*.dat`).
//! - `embedding`: cosine similarity of image embeddings, over scanned
//!   images (`<group>/dat_image/*.png`), each flipped vertically first.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin plotmatch -- [OPTIONS] --candidates <DIR> <FEATURES>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use plotmatch_io::RasterFile;
use plotmatch_pipeline::geometry::select_feature;
use plotmatch_pipeline::{
    CancelFlag, Candidate, Mask, MatchConfig, ProfileEmbedder, rank, rank_by_embedding,
    reference_mask_from_geometry,
};

/// Match a parcel polygon against a corpus of candidate parcel rasters.
///
/// Prints the top matches and the best match. A run in which no
/// candidate could be scored reports "No match found" and still exits
/// successfully.
#[derive(Parser)]
#[command(name = "plotmatch", version)]
struct Cli {
    /// JSON file holding an array of parcel geometries.
    features: PathBuf,

    /// Index of the parcel to match within the features file.
    #[arg(long, default_value_t = 0)]
    index: usize,

    /// Root of the survey tree (one directory per group).
    #[arg(long)]
    candidates: PathBuf,

    /// Scoring method.
    #[arg(long, value_enum, default_value_t = Method::Standard)]
    method: Method,

    /// Per-group subdirectory holding mask rasters (standard method).
    #[arg(long, default_value = "dat")]
    mask_subdir: String,

    /// Extension of mask rasters, without the dot.
    #[arg(long, default_value = "dat")]
    mask_extension: String,

    /// Per-group subdirectory holding scanned images (embedding method).
    #[arg(long, default_value = "dat_image")]
    image_subdir: String,

    /// Extension of scanned images, without the dot.
    #[arg(long, default_value = "png")]
    image_extension: String,

    /// Side length of every mask in pixels.
    #[arg(long, default_value_t = MatchConfig::DEFAULT_IMAGE_SIZE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    image_size: u32,

    /// Fraction of the raster left empty on each side of the reference.
    #[arg(long, default_value_t = MatchConfig::DEFAULT_PADDING_RATIO)]
    padding_ratio: f64,

    /// IoU margin within which the vertical flip is preferred.
    #[arg(long, default_value_t = MatchConfig::DEFAULT_IOU_TOLERANCE)]
    iou_tolerance: f64,

    /// Hausdorff margin (pixels) within which the vertical flip is preferred.
    #[arg(long, default_value_t = MatchConfig::DEFAULT_HAUSDORFF_TOLERANCE)]
    hausdorff_tolerance: f64,

    /// Full match config as a JSON string.
    ///
    /// When provided, the individual config flags are ignored. Missing
    /// fields take their default values.
    #[arg(long)]
    config_json: Option<String>,

    /// Profile resolution of the built-in embedder.
    #[arg(long, default_value_t = ProfileEmbedder::DEFAULT_RESOLUTION)]
    embedding_resolution: u32,

    /// Number of matches to list.
    #[arg(long, default_value_t = 5)]
    top_n: usize,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Save the rendered reference mask as a PNG.
    #[arg(long)]
    save_reference: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Scoring method selection.
#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// IoU and Hausdorff distance under four flips.
    Standard,
    /// Cosine similarity of image embeddings.
    Embedding,
}

/// Install a stderr `fmt` subscriber at the level chosen by `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Build a [`MatchConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual config flags are ignored. Either way the result is
/// validated.
fn config_from_cli(cli: &Cli) -> Result<MatchConfig, String> {
    let config: MatchConfig = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        MatchConfig {
            image_size: cli.image_size,
            padding_ratio: cli.padding_ratio,
            iou_tolerance: cli.iou_tolerance,
            hausdorff_tolerance: cli.hausdorff_tolerance,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Read the features file and build the chosen parcel's reference mask.
fn load_reference(cli: &Cli, config: &MatchConfig) -> Result<Mask, String> {
    let features = plotmatch_io::read_features(&cli.features)
        .map_err(|e| format!("Error reading {}: {e}", cli.features.display()))?;
    let feature = select_feature(&features, cli.index).map_err(|e| e.to_string())?;
    reference_mask_from_geometry(feature, config)
        .map_err(|e| format!("Cannot build reference for parcel {}: {e}", cli.index))
}

/// List candidates, turning a scan failure into a message.
fn discover(
    root: &Path,
    subdir: &str,
    extension: &str,
) -> Result<Vec<Candidate<RasterFile>>, String> {
    plotmatch_io::discover(root, subdir, extension)
        .map_err(|e| format!("Error scanning {}: {e}", root.display()))
}

/// Rank mask rasters and render the report.
fn run_standard(cli: &Cli, config: &MatchConfig, reference: &Mask) -> Result<String, String> {
    let candidates = discover(&cli.candidates, &cli.mask_subdir, &cli.mask_extension)?;
    let ranking = rank(reference, &candidates, config, &CancelFlag::new());

    if cli.json {
        plotmatch_export::to_json(&ranking).map_err(|e| format!("Error serializing report: {e}"))
    } else {
        Ok(plotmatch_export::to_text_report(&ranking, cli.top_n))
    }
}

/// Rank scanned images by embedding similarity and render the report.
fn run_embedding(cli: &Cli, reference: &Mask) -> Result<String, String> {
    let candidates = discover(&cli.candidates, &cli.image_subdir, &cli.image_extension)?;
    let embedder = ProfileEmbedder::new(cli.embedding_resolution);
    let ranking = rank_by_embedding(
        &reference.to_gray_image(),
        &candidates,
        &embedder,
        &CancelFlag::new(),
    )
    .map_err(|e| e.to_string())?;

    if cli.json {
        plotmatch_export::embedding_to_json(&ranking)
            .map_err(|e| format!("Error serializing report: {e}"))
    } else {
        Ok(plotmatch_export::to_embedding_text_report(&ranking, cli.top_n))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let reference = match load_reference(&cli, &config) {
        Ok(mask) => mask,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref path) = cli.save_reference {
        match plotmatch_io::write_png(&reference.to_gray_image(), path) {
            Ok(()) => eprintln!("Reference mask written to {}", path.display()),
            Err(e) => {
                eprintln!("Error writing reference mask to {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let report = match cli.method {
        Method::Standard => run_standard(&cli, &config, &reference),
        Method::Embedding => run_embedding(&cli, &reference),
    };
    match report {
        Ok(report) => {
            print!("{report}");
            if cli.json {
                println!();
            }
            ExitCode::SUCCESS
        }
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
