//! Configuration loading from scale.toml
//!
//! ScaleBench configuration can be specified in a `scale.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use scalebench_core::{ArtifactStore, Extractor, TargetPlan, Technology};
use scalebench_report::{
    DEFAULT_ACCELERATOR_GAP, DEFAULT_ACCELERATOR_LABEL, DEFAULT_CHART_FILE,
    DEFAULT_FALLBACK_BASELINE_SECONDS, DEFAULT_HARDEST_TARGET, NormalizeConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name looked up by [`ScaleConfig::discover`]
pub const CONFIG_FILE: &str = "scale.toml";

/// ScaleBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScaleConfig {
    /// Collection configuration
    #[serde(default)]
    pub collect: CollectConfig,
    /// Result extraction patterns
    #[serde(default)]
    pub extract: ExtractConfig,
    /// Normalization and report configuration
    #[serde(default)]
    pub report: ReportConfig,
    /// Visualization configuration
    #[serde(default)]
    pub visuals: VisualsConfig,
    /// Per-technology settings keyed by slug
    #[serde(default)]
    pub technologies: BTreeMap<String, TechnologyConfig>,
}

/// Sweep configuration shared by all technologies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Search target fed to every trial on stdin
    #[serde(default = "default_target")]
    pub target: String,
    /// Worker counts swept for shared- and distributed-memory runs
    #[serde(default = "default_levels")]
    pub levels: Vec<u32>,
    /// Number of repeated baseline runs
    #[serde(default = "default_baseline_runs")]
    pub baseline_runs: u32,
    /// Timeout for a single trial (e.g., "10m", "30s")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Directory holding the per-technology result files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            levels: default_levels(),
            baseline_runs: default_baseline_runs(),
            timeout: default_timeout(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_target() -> String {
    DEFAULT_HARDEST_TARGET.to_string()
}
fn default_levels() -> Vec<u32> {
    vec![1, 2, 4, 8, 16]
}
fn default_baseline_runs() -> u32 {
    3
}
fn default_timeout() -> String {
    "10m".to_string()
}
fn default_data_dir() -> String {
    "data".to_string()
}

/// Patterns used to read trial output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Regex with one capture group holding the elapsed seconds
    #[serde(default = "default_timing_pattern")]
    pub timing_pattern: String,
    /// Regex marking a trial that did not find its target
    #[serde(default = "default_not_found_pattern")]
    pub not_found_pattern: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            timing_pattern: default_timing_pattern(),
            not_found_pattern: default_not_found_pattern(),
        }
    }
}

fn default_timing_pattern() -> String {
    scalebench_core::DEFAULT_TIMING_PATTERN.to_string()
}
fn default_not_found_pattern() -> String {
    scalebench_core::DEFAULT_NOT_FOUND_PATTERN.to_string()
}

/// Normalization and output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Baseline time used when no baseline results exist
    #[serde(default = "default_fallback_baseline")]
    pub fallback_baseline_seconds: f64,
    /// Accelerator target whose timing is preferred
    #[serde(default = "default_hardest_target")]
    pub hardest_target: String,
    /// Distance between the largest worker count and the accelerator position
    #[serde(default = "default_accelerator_gap")]
    pub accelerator_gap: u32,
    /// Axis label of the accelerator position
    #[serde(default = "default_accelerator_label")]
    pub accelerator_label: String,
    /// Comparison chart path, relative to the data directory
    #[serde(default = "default_chart")]
    pub chart: String,
    /// Unified CSV export path (uncomment in scale.toml to enable)
    #[serde(default)]
    pub export: Option<String>,
    /// Chart caption
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fallback_baseline_seconds: default_fallback_baseline(),
            hardest_target: default_hardest_target(),
            accelerator_gap: default_accelerator_gap(),
            accelerator_label: default_accelerator_label(),
            chart: default_chart(),
            export: None,
            title: default_title(),
        }
    }
}

fn default_fallback_baseline() -> f64 {
    DEFAULT_FALLBACK_BASELINE_SECONDS
}
fn default_hardest_target() -> String {
    DEFAULT_HARDEST_TARGET.to_string()
}
fn default_accelerator_gap() -> u32 {
    DEFAULT_ACCELERATOR_GAP
}
fn default_accelerator_label() -> String {
    DEFAULT_ACCELERATOR_LABEL.to_string()
}
fn default_chart() -> String {
    DEFAULT_CHART_FILE.to_string()
}
fn default_title() -> String {
    "Parallel Implementation Comparison".to_string()
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualsConfig {
    /// Chart width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Chart height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for VisualsConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> u32 {
    1200
}
fn default_height() -> u32 {
    700
}

/// How to build and run one technology's implementation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnologyConfig {
    /// Display label (e.g., "OpenMP")
    #[serde(default)]
    pub label: Option<String>,
    /// Result file name inside the data directory
    #[serde(default)]
    pub artifact: Option<String>,
    /// Executable to run for each trial
    #[serde(default)]
    pub program: Option<String>,
    /// Arguments; `{level}` and `{target}` are substituted per trial
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for build and trials
    #[serde(default)]
    pub workdir: Option<String>,
    /// Shell command run once before the sweep
    #[serde(default)]
    pub build: Option<String>,
    /// Accelerator targets, one trial each
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}

impl ScaleConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Reject unknown technology tables
    pub fn validate(&self) -> anyhow::Result<()> {
        for key in self.technologies.keys() {
            key.parse::<Technology>()
                .map_err(|e| anyhow::anyhow!("[technologies.{}]: {}", key, e))?;
        }
        Ok(())
    }

    /// Settings of one technology (defaults if not configured)
    pub fn technology(&self, technology: Technology) -> TechnologyConfig {
        self.technologies
            .iter()
            .find(|(key, _)| key.parse::<Technology>().ok() == Some(technology))
            .map(|(_, cfg)| cfg.clone())
            .unwrap_or_default()
    }

    /// Display label of a technology
    pub fn label(&self, technology: Technology) -> String {
        self.technology(technology)
            .label
            .unwrap_or_else(|| technology.default_label().to_string())
    }

    /// Artifact store for a data directory, honoring per-technology file names
    pub fn store(&self, data_dir: &Path) -> ArtifactStore {
        Technology::ALL
            .into_iter()
            .fold(ArtifactStore::new(data_dir), |store, technology| {
                match self.technology(technology).artifact {
                    Some(name) => store.with_file_name(technology, name),
                    None => store,
                }
            })
    }

    /// Data directory from configuration
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.collect.data_dir)
    }

    /// Extractor built from the configured patterns
    pub fn extractor(&self) -> anyhow::Result<Extractor> {
        Ok(Extractor::new(
            &self.extract.timing_pattern,
            &self.extract.not_found_pattern,
        )?)
    }

    /// Target plan of a technology: the accelerator sweeps its target list,
    /// everything else searches for the single configured target
    pub fn target_plan(&self, technology: Technology) -> TargetPlan {
        if technology == Technology::Accelerator {
            let targets = self
                .technology(technology)
                .targets
                .unwrap_or_else(|| vec!["0001".to_string(), self.collect.target.clone()]);
            TargetPlan::PerLevel(targets)
        } else {
            TargetPlan::Fixed(self.collect.target.clone())
        }
    }

    /// Normalizer settings
    pub fn normalize_config(&self) -> NormalizeConfig {
        NormalizeConfig {
            fallback_baseline_seconds: self.report.fallback_baseline_seconds,
            hardest_target: self.report.hardest_target.clone(),
            accelerator_gap: self.report.accelerator_gap,
            accelerator_label: self.report.accelerator_label.clone(),
            labels: Technology::ALL
                .into_iter()
                .filter_map(|t| self.technology(t).label.map(|label| (t, label)))
                .collect(),
        }
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# ScaleBench Configuration
# https://github.com/ml-rust/scalebench

[collect]
# Search target written to every trial's stdin
target = "9999"
# Worker counts swept for shared- and distributed-memory runs
levels = [1, 2, 4, 8, 16]
# Repeated baseline runs (their mean is the baseline time)
baseline_runs = 3
# Timeout for a single trial
timeout = "10m"
# Directory holding the per-technology result files
data_dir = "data"

[extract]
# Regex whose first capture group is the elapsed time in seconds
timing_pattern = 'Execution Time:\s*(\d+(?:\.\d*)?|\.\d+)\s*seconds'
# Regex marking a trial that did not find its target (a whole output line)
not_found_pattern = '(?im)^\s*\w+\s+not\s+found\.?\s*$'

[report]
# Baseline time used when no baseline results exist
fallback_baseline_seconds = 17.8
# Accelerator target whose timing is preferred
hardest_target = "9999"
# Accelerator axis position = largest worker count + gap
accelerator_gap = 2
# Axis label of the accelerator position
accelerator_label = "GPU"
# Comparison chart (.png or .svg), relative to data_dir
chart = "master_comparison_graph.png"
# Unified CSV export (uncomment to enable)
# export = "unified_results.csv"
title = "Parallel Implementation Comparison"

[visuals]
# Chart dimensions
width = 1200
height = 700

[technologies.baseline]
label = "Serial"
workdir = "Serial"
build = "gcc serial_cracker.c -o serial_cracker -lssl -lcrypto -O3"
program = "./serial_cracker"

[technologies.shared-memory]
label = "OpenMP"
workdir = "OpenMP"
build = "gcc -fopenmp omp_cracker.c -o omp_cracker -lssl -lcrypto -O3"
program = "./omp_cracker"
args = ["{level}"]

[technologies.distributed-memory]
label = "MPI"
workdir = "MPI"
build = "mpicc mpi_cracker.c -o mpi_cracker -lssl -lcrypto"
program = "mpirun"
args = ["--oversubscribe", "-n", "{level}", "./mpi_cracker"]

[technologies.accelerator]
label = "CUDA (GPU)"
workdir = "CUDA"
build = "nvcc cuda_cracker.cu -o cuda_cracker"
program = "./cuda_cracker"
# One trial per target
targets = ["0001", "9999"]
"#
        .to_string()
    }

    /// Parse duration string (e.g., "30s", "500ms", "10m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}
