//! Sweep Planner
//!
//! Builds the ordered level list for one technology's collection:
//! - Baseline: run indices `1..=baseline_runs`
//! - Shared/distributed memory: the configured (or `--levels`) worker counts
//! - Accelerator: one level per configured target, `1..=targets.len()`
//!
//! Levels keep their given order; repeated levels are dropped (first wins).

use crate::config::ScaleConfig;
use scalebench_core::{TargetPlan, Technology};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("No levels to run for {0}")]
    Empty(Technology),

    #[error("Level 0 is not a valid worker count")]
    ZeroLevel,
}

/// Execution plan for one technology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    /// Technology to collect
    pub technology: Technology,
    /// Levels in execution order
    pub levels: Vec<u32>,
    /// Target fed to each level
    pub targets: TargetPlan,
}

/// Command-line overrides of the configured plan
#[derive(Debug, Clone, Default)]
pub struct PlanOverrides {
    /// `--levels`
    pub levels: Option<Vec<u32>>,
    /// `--target`
    pub target: Option<String>,
    /// `--runs`
    pub runs: Option<u32>,
}

/// Build the sweep plan for a technology
pub fn build_plan(
    technology: Technology,
    config: &ScaleConfig,
    overrides: &PlanOverrides,
) -> Result<SweepPlan, PlanError> {
    let targets = match (&overrides.target, technology) {
        (Some(target), Technology::Accelerator) => TargetPlan::PerLevel(vec![target.clone()]),
        (Some(target), _) => TargetPlan::Fixed(target.clone()),
        (None, _) => config.target_plan(technology),
    };

    let requested: Vec<u32> = match technology {
        Technology::Baseline => {
            let runs = overrides.runs.unwrap_or(config.collect.baseline_runs);
            (1..=runs).collect()
        }
        Technology::Accelerator => targets.implied_levels().unwrap_or_default(),
        Technology::SharedMemory | Technology::DistributedMemory => overrides
            .levels
            .clone()
            .unwrap_or_else(|| config.collect.levels.clone()),
    };

    if requested.contains(&0) {
        return Err(PlanError::ZeroLevel);
    }

    let mut levels = Vec::with_capacity(requested.len());
    for level in requested {
        if levels.contains(&level) {
            tracing::warn!("{}: level {} listed more than once, running it once", technology, level);
        } else {
            levels.push(level);
        }
    }

    if levels.is_empty() {
        return Err(PlanError::Empty(technology));
    }

    Ok(SweepPlan {
        technology,
        levels,
        targets,
    })
}
