// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk command-line front end.
//
// Entry point. Initialises logging, loads the configuration, and dispatches
// the detect/rectify/scan subcommands.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{PageSizing, PaperSize, Point, Quad, ScanConfig};
use scanwerk_document::image::codec;
use scanwerk_document::{DocumentDetector, PdfWriter, RgbaRaster, ScanPipeline, rectify_with};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "scanwerk")]
#[command(about = "Find documents in photos, straighten them, and write PDFs")]
#[command(version)]
struct Cli {
    /// JSON configuration file; missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate the document and print its corners as JSON.
    Detect(DetectArgs),

    /// Rectify one image into an upright page image.
    Rectify(RectifyArgs),

    /// Capture one or more images into a PDF.
    Scan(ScanArgs),
}

#[derive(Debug, Args)]
struct DetectArgs {
    image: PathBuf,

    /// Report every candidate of the winning attempt, best first.
    #[arg(long)]
    all: bool,

    /// Write the JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RectifyArgs {
    image: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(long)]
    out: PathBuf,

    /// Corners as `x,y x,y x,y x,y`. Detected when omitted.
    #[arg(long, value_parser = parse_quad)]
    quad: Option<Quad>,

    /// Longer output side in pixels.
    #[arg(long)]
    max_dimension: Option<u32>,
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Input images, one page each, in page order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output PDF.
    #[arg(long)]
    out: PathBuf,

    /// Place pages on fixed-size paper instead of sizing them to the image.
    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    #[arg(long)]
    title: Option<String>,

    /// Also save each rectified page as PNG into this directory.
    #[arg(long)]
    pages_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => PaperSize::A3,
            PaperArg::A4 => PaperSize::A4,
            PaperArg::A5 => PaperSize::A5,
            PaperArg::Letter => PaperSize::Letter,
            PaperArg::Legal => PaperSize::Legal,
            PaperArg::Tabloid => PaperSize::Tabloid,
        }
    }
}

/// Parse `x,y x,y x,y x,y` (corners a, b, c, d).
fn parse_quad(text: &str) -> std::result::Result<Quad, String> {
    let corners = text
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| format!("expected x,y but got {pair:?}"))?;
            let coord = |v: &str| {
                v.trim()
                    .parse::<f32>()
                    .map_err(|err| format!("bad coordinate {v:?}: {err}"))
            };
            Ok(Point::new(coord(x)?, coord(y)?))
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;
    let corners: [Point; 4] = corners
        .try_into()
        .map_err(|v: Vec<Point>| format!("expected 4 corners, got {}", v.len()))?;
    Ok(Quad::from_corners(corners))
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            ScanConfig::from_file(path)
        }
        None => Ok(ScanConfig::default()),
    }
}

fn write_output(json: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, json).map_err(ScanwerkError::from),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(config: ScanConfig, args: &DetectArgs) -> Result<()> {
    let raster = codec::open(&args.image)?;
    let mut detector = DocumentDetector::new(config.detector)?;
    let json = if args.all {
        let candidates = detector.candidates(&raster);
        info!(count = candidates.len(), "Candidates ranked");
        serde_json::to_string_pretty(&candidates)?
    } else {
        let detection = detector.detect_scored(&raster);
        if detection.is_none() {
            warn!(image = %args.image.display(), "No document found");
        }
        serde_json::to_string_pretty(&detection)?
    };
    write_output(&json, args.out.as_deref())
}

// ── rectify ────────────────────────────────────────────────────────────

fn run_rectify(mut config: ScanConfig, args: &RectifyArgs) -> Result<()> {
    if let Some(max) = args.max_dimension {
        config.rectify.max_output_dimension = max;
    }
    let raster = codec::open(&args.image)?;
    let page = match args.quad {
        Some(quad) => rectify_with(&raster, &quad, &config.rectify)?,
        None => ScanPipeline::new(config)?.capture(&raster)?.page,
    };
    codec::save(&page, &args.out)?;
    info!(
        out = %args.out.display(),
        width = page.width(),
        height = page.height(),
        "Page written"
    );
    Ok(())
}

// ── scan ───────────────────────────────────────────────────────────────

fn run_scan(mut config: ScanConfig, args: &ScanArgs) -> Result<()> {
    if let Some(paper) = args.paper {
        config.pdf.page_sizing = PageSizing::Paper(paper.into());
    }
    if let Some(title) = &args.title {
        config.pdf.title = title.clone();
    }
    let frames = args
        .images
        .iter()
        .map(codec::open)
        .collect::<Result<Vec<RgbaRaster>>>()?;

    let pipeline = ScanPipeline::new(config)?;
    let captures = pipeline.capture_batch(&frames)?;
    for (path, capture) in args.images.iter().zip(&captures) {
        if capture.detection.is_none() {
            warn!(image = %path.display(), "No document found, keeping the full frame");
        }
    }
    let pages: Vec<RgbaRaster> = captures.into_iter().map(|c| c.page).collect();

    if let Some(dir) = &args.pages_dir {
        std::fs::create_dir_all(dir)?;
        for (i, page) in pages.iter().enumerate() {
            codec::save(page, dir.join(format!("page-{:03}.png", i + 1)))?;
        }
    }

    PdfWriter::new(pipeline.config().pdf.clone()).write_to_file(&pages, &args.out)?;
    info!(out = %args.out.display(), pages = pages.len(), "PDF written");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect(args) => run_detect(config, &args),
        Commands::Rectify(args) => run_rectify(config, &args),
        Commands::Scan(args) => run_scan(config, &args),
    }
}
