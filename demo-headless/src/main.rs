mod input;
mod synthetic;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use stormcast_core::tracking::FormationTracker;
use stormcast_core::verification::{
    mse_by_ranges, weighted_mse, RangeError, VerificationScorer, DEFAULT_HIGH_WEIGHT,
    DEFAULT_INTENSITY_RANGES, DEFAULT_WEIGHT_THRESHOLD,
};
use stormcast_core::{
    FieldSequence, FormationEvent, NowcastConfig, StormDetector, StormList, VerificationReport,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::synthetic::Scenario;

/// Storm nowcast verification with configurable thresholds
#[derive(Parser, Debug)]
#[command(name = "stormcast-demo")]
#[command(about = "Detect new storm formations and score a nowcast against observations", long_about = None)]
struct Args {
    /// Observed reflectivity sequence (JSON: width, height, frames)
    #[arg(long, required_unless_present = "synthetic")]
    truth: Option<PathBuf>,

    /// Predicted reflectivity sequence (JSON: width, height, frames)
    #[arg(long, required_unless_present = "synthetic")]
    pred: Option<PathBuf>,

    /// Generate a seeded synthetic scenario instead of reading files
    #[arg(long, conflicts_with_all = ["truth", "pred"])]
    synthetic: bool,

    /// Full pipeline config (JSON); individual overrides below take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reflectivity threshold in dBZ
    #[arg(long)]
    reflectivity_threshold: Option<f32>,

    /// Minimum storm area in pixels
    #[arg(long)]
    area_threshold: Option<usize>,

    /// Dilation iterations before contour tracing
    #[arg(long)]
    dilation_iterations: Option<usize>,

    /// Overlap ratio at or below which a storm counts as newly formed
    #[arg(long)]
    formation_overlap: Option<f64>,

    /// Overlap ratio a prediction needs to match a true storm
    #[arg(long)]
    verification_overlap: Option<f64>,

    /// Synthetic grid width
    #[arg(long, default_value_t = 96)]
    width: usize,

    /// Synthetic grid height
    #[arg(long, default_value_t = 96)]
    height: usize,

    /// Synthetic sequence length
    #[arg(long, default_value_t = 12)]
    frames: usize,

    /// Number of synthetic storm cells
    #[arg(long, default_value_t = 4)]
    cells: usize,

    /// Frames by which synthetic predicted storms form late
    #[arg(long, default_value_t = 1)]
    lag: usize,

    /// Random seed for the synthetic scenario
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    config: NowcastConfig,
    true_events: Vec<FormationEvent>,
    pred_events: Vec<FormationEvent>,
    report: VerificationReport,
    pixel_errors: Vec<RangeError>,
    weighted_mse: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stormcast_core=info,demo_headless=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let (truth, pred) = load_inputs(&args)?;
    info!(frames = truth.len(), shape = ?truth.shape(), "Loaded sequences");

    let detector = StormDetector::new(config.detection)?;
    let tracker = FormationTracker::new(config.formation)?;
    let scorer = VerificationScorer::new(config.verification)?;

    let true_storms = detector.detect(&truth);
    let pred_storms = detector.detect(&pred);
    let true_events = tracker.track(&true_storms)?;
    let pred_events = tracker.track(&pred_storms)?;
    let report = scorer.evaluate(&pred_events, &true_events)?;

    let pixel_errors = mse_by_ranges(&pred, &truth, &DEFAULT_INTENSITY_RANGES)?;
    let weighted = weighted_mse(&pred, &truth, DEFAULT_WEIGHT_THRESHOLD, DEFAULT_HIGH_WEIGHT)?;

    if args.json {
        let summary = Summary {
            config,
            true_events,
            pred_events,
            report,
            pixel_errors,
            weighted_mse: weighted,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== Storm Nowcast Verification ===\n");
    println!(
        "Detection: > {:.1} dBZ, area >= {} px, {} dilation steps",
        config.detection.reflectivity_threshold,
        config.detection.area_threshold,
        config.detection.dilation_iterations
    );
    println!(
        "Overlap thresholds: formation {:.2}, verification {:.2}\n",
        config.formation.overlap_threshold, config.verification.overlap_threshold
    );

    print_frame_table(&true_storms, &true_events, &pred_storms, &pred_events);
    println!("\n{report}\n");
    print_pixel_errors(&pixel_errors, weighted);
    Ok(())
}

fn build_config(args: &Args) -> Result<NowcastConfig> {
    let mut config = match &args.config {
        Some(path) => input::load_config(path)?,
        None => NowcastConfig::default(),
    };

    if let Some(value) = args.reflectivity_threshold {
        config.detection.reflectivity_threshold = value;
    }
    if let Some(value) = args.area_threshold {
        config.detection.area_threshold = value;
    }
    if let Some(value) = args.dilation_iterations {
        config.detection.dilation_iterations = value;
    }
    if let Some(value) = args.formation_overlap {
        config.formation.overlap_threshold = value;
    }
    if let Some(value) = args.verification_overlap {
        config.verification.overlap_threshold = value;
    }

    config.validate().context("invalid pipeline config")?;
    Ok(config)
}

fn load_inputs(args: &Args) -> Result<(FieldSequence, FieldSequence)> {
    if args.synthetic {
        if args.width == 0 || args.height == 0 || args.frames == 0 {
            bail!("synthetic grid needs non-zero width, height and frames");
        }
        let scenario = Scenario {
            width: args.width,
            height: args.height,
            frames: args.frames,
            cells: args.cells,
            lag: args.lag,
            seed: args.seed,
        };
        info!(?scenario, "Generating synthetic scenario");
        return Ok(scenario.generate()?);
    }

    let (Some(truth_path), Some(pred_path)) = (&args.truth, &args.pred) else {
        bail!("both --truth and --pred are required without --synthetic");
    };
    let truth = input::load_sequence(truth_path)?;
    let pred = input::load_sequence(pred_path)?;
    if truth.len() != pred.len() || truth.shape() != pred.shape() {
        bail!(
            "truth ({} frames, {:?}) and prediction ({} frames, {:?}) differ in shape",
            truth.len(),
            truth.shape(),
            pred.len(),
            pred.shape()
        );
    }
    Ok((truth, pred))
}

fn print_frame_table(
    true_storms: &[StormList],
    true_events: &[FormationEvent],
    pred_storms: &[StormList],
    pred_events: &[FormationEvent],
) {
    println!("Time | Storms(true) | New(true) | Storms(pred) | New(pred)");
    println!("-----|--------------|-----------|--------------|----------");
    for (t, (true_frame, pred_frame)) in true_storms.iter().zip(pred_storms).enumerate() {
        println!(
            "{:4} | {:12} | {:9} | {:12} | {:9}",
            t,
            true_frame.storm_count(),
            true_events.get(t).map_or(0, |e| e.new_storm_count),
            pred_frame.storm_count(),
            pred_events.get(t).map_or(0, |e| e.new_storm_count),
        );
    }
}

fn print_pixel_errors(errors: &[RangeError], weighted: f64) {
    println!("Pixel error by target intensity");
    println!("Range (dBZ) |   Pixels |      MSE |      MAE");
    println!("------------|----------|----------|---------");
    for error in errors {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        println!(
            "{:>5}-{:<5} | {:8} | {:>8} | {:>8}",
            error.range.min,
            error.range.max,
            error.pixel_count,
            fmt(error.mse),
            fmt(error.mae),
        );
    }
    println!(
        "\nWeighted MSE (x{} above {} dBZ): {:.2}",
        DEFAULT_HIGH_WEIGHT, DEFAULT_WEIGHT_THRESHOLD, weighted
    );
}
