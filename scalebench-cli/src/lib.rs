#![warn(missing_docs)]
//! ScaleBench CLI Library
//!
//! Drives the collection and reporting pipeline from the command line:
//!
//! - `scalebench collect <technology>` builds the technology's program, sweeps
//!   its levels as child processes and writes `<data_dir>/<slug>_results.csv`
//! - `scalebench report` normalizes every artifact found, renders the
//!   comparison chart and prints the speedup table (or JSON/CSV)
//! - `scalebench init` writes a commented `scale.toml`
//!
//! # Example
//!
//! ```ignore
//! fn main() {
//!     if let Err(e) = scalebench_cli::run() {
//!         eprintln!("Error: {e:#}");
//!         std::process::exit(1);
//!     }
//! }
//! ```

mod config;
mod executor;
mod planner;
mod supervisor;

pub use config::*;
pub use executor::{
    ProgressObserver, baseline_for_speedup, build_report_meta, current_baseline,
    format_human_output, format_sweep_summary,
};
pub use planner::{PlanError, PlanOverrides, SweepPlan, build_plan};
pub use supervisor::*;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scalebench_core::{Collection, Collector, Technology};
use scalebench_report::{
    ChartLayout, ComparisonReport, OutputFormat, Report, ScalingChart, generate_csv_report,
    generate_json_report, render_chart, render_scaling_chart,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// ScaleBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "scalebench")]
#[command(
    author,
    version,
    about = "ScaleBench - speedup comparison across parallel implementations"
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: discover scale.toml upwards from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep one technology and write its result file
    Collect(CollectArgs),
    /// Normalize all result files and produce the comparison
    Report(ReportArgs),
    /// Write a default scale.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Arguments of `scalebench collect`
#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    /// Technology: baseline, shared-memory, distributed-memory, accelerator
    /// (aliases: serial, openmp, mpi, gpu, cuda)
    #[arg(value_parser = parse_technology)]
    pub technology: Technology,

    /// Worker counts to sweep, comma separated
    #[arg(long, value_delimiter = ',')]
    pub levels: Option<Vec<u32>>,

    /// Search target fed to every trial
    #[arg(long)]
    pub target: Option<String>,

    /// Number of baseline runs
    #[arg(long)]
    pub runs: Option<u32>,

    /// Directory for result files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Timeout per trial (e.g. "30s", "10m")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Do not run the configured build command
    #[arg(long)]
    pub skip_build: bool,

    /// Render a time/speedup chart of this sweep (.png or .svg)
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments of `scalebench report`
#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Directory holding the result files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Comparison chart path (.png or .svg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the unified dataset as CSV
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Output format: human, json, csv
    #[arg(long, default_value = "human")]
    pub format: String,

    /// Baseline seconds when no baseline results exist
    #[arg(long)]
    pub fallback_baseline: Option<f64>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_chart: bool,
}

fn parse_technology(s: &str) -> Result<Technology, String> {
    s.parse()
}

/// Run the ScaleBench CLI with process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the ScaleBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("scalebench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("scalebench=info")
            .init();
    }

    if let Commands::Init { force } = &cli.command {
        return init_config(Path::new(CONFIG_FILE), *force);
    }

    // Explicit --config must load; a discovered file falls back to defaults
    let config = match &cli.config {
        Some(path) => ScaleConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ScaleConfig::discover().unwrap_or_default(),
    };

    match &cli.command {
        Commands::Collect(args) => collect_technology(args, &config).map(|_| ()),
        Commands::Report(args) => report_comparison(args, &config),
        Commands::Init { .. } => Ok(()),
    }
}

/// Write the default configuration to `path`
pub fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    std::fs::write(path, ScaleConfig::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration written to: {}", path.display());
    Ok(())
}

/// Build, sweep and persist one technology
pub fn collect_technology(args: &CollectArgs, config: &ScaleConfig) -> anyhow::Result<Collection> {
    let technology = args.technology;
    let overrides = PlanOverrides {
        levels: args.levels.clone(),
        target: args.target.clone(),
        runs: args.runs,
    };
    let plan = build_plan(technology, config, &overrides)?;
    let settings = config.technology(technology);
    let label = config.label(technology);

    let data_dir = args.data_dir.clone().unwrap_or_else(|| config.data_dir());
    let store = config.store(&data_dir);
    let timeout_spec = args.timeout.as_deref().unwrap_or(&config.collect.timeout);
    let timeout = Duration::from_nanos(ScaleConfig::parse_duration(timeout_spec)?);

    if !args.skip_build {
        if let Some(build) = &settings.build {
            run_build(build, settings.workdir.as_deref().map(Path::new))?;
        }
    }

    let normalize_config = config.normalize_config();
    let baseline = baseline_for_speedup(technology, &store, &normalize_config)?;
    let extractor = config.extractor()?;
    let mut runner = ProcessTrialRunner::from_config(
        technology.slug(),
        &settings,
        plan.targets.clone(),
        timeout,
    )?;

    println!(
        "Collecting {} ({} levels: {:?})",
        label,
        plan.levels.len(),
        plan.levels
    );

    let mut observer = if args.no_progress {
        ProgressObserver::hidden(technology)
    } else {
        ProgressObserver::new(technology, plan.levels.len())
    };
    let collection = Collector::new(technology, &extractor, &store)
        .targets(plan.targets.clone())
        .baseline_seconds(baseline.map(|b| b.seconds))
        .run(&plan.levels, &mut runner, &mut observer)?;
    observer.finish();

    print!("{}", format_sweep_summary(&collection.sweep, &label));
    println!("Results written to: {}", collection.path.display());

    if let Some(path) = &args.chart {
        render_sweep_chart(&collection, &label, path, config, &store)?;
    }

    Ok(collection)
}

fn render_sweep_chart(
    collection: &Collection,
    label: &str,
    path: &Path,
    config: &ScaleConfig,
    store: &scalebench_core::ArtifactStore,
) -> anyhow::Result<()> {
    let sweep = &collection.sweep;
    if sweep.trials.is_empty() {
        tracing::warn!("No successful trials; skipping chart {}", path.display());
        return Ok(());
    }

    // A baseline sweep is charted against its own mean
    let baseline_seconds = if sweep.technology == Technology::Baseline {
        let times: Vec<f64> = sweep.trials.iter().map(|t| t.elapsed_seconds).collect();
        scalebench_stats::mean(&times).unwrap_or(config.report.fallback_baseline_seconds)
    } else {
        current_baseline(store, &config.normalize_config())?.seconds
    };

    let chart = ScalingChart::from_trials(sweep.technology, label, &sweep.trials, baseline_seconds);
    render_scaling_chart(&chart, path, (config.visuals.width, config.visuals.height))?;
    println!("Chart written to: {}", path.display());
    Ok(())
}

/// Normalize all artifacts, render the chart and print the comparison
pub fn report_comparison(args: &ReportArgs, config: &ScaleConfig) -> anyhow::Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let data_dir = args.data_dir.clone().unwrap_or_else(|| config.data_dir());
    let store = config.store(&data_dir);

    let mut normalize_config = config.normalize_config();
    if let Some(seconds) = args.fallback_baseline {
        normalize_config.fallback_baseline_seconds = seconds;
    }

    let normalized = scalebench_report::Normalizer::new(normalize_config).normalize(&store)?;
    let comparison = ComparisonReport::build(&normalized)?;

    let export_path = args.export.clone().or_else(|| {
        config
            .report
            .export
            .as_ref()
            .map(|name| data_dir.join(name))
    });
    if let Some(path) = export_path {
        let csv = generate_csv_report(&comparison)?;
        let mut file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(csv.as_bytes())?;
        eprintln!("Unified dataset written to: {}", path.display());
    }

    let report = Report::new(build_report_meta(), &comparison);
    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Csv => generate_csv_report(&comparison)?,
        OutputFormat::Human => format_human_output(&report),
    };
    print!("{}", output);

    // The table and export are already out, so a drawing failure only warns
    if !args.no_chart {
        let chart_path = args
            .output
            .clone()
            .unwrap_or_else(|| data_dir.join(&config.report.chart));
        let layout = ChartLayout::from_report(&comparison, config.report.title.clone());
        match render_chart(
            &layout,
            &chart_path,
            (config.visuals.width, config.visuals.height),
        ) {
            Ok(()) => eprintln!("Chart written to: {}", chart_path.display()),
            Err(e) => tracing::warn!("Chart not written: {}", e),
        }
    }

    Ok(())
}
