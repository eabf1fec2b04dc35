//! Trial Runner Capability
//!
//! A trial runner executes one parameterized trial of one implementation and
//! hands back whatever it printed. How it does so (subprocess, simulation,
//! fixture replay) is up to the implementor.

use thiserror::Error;

/// Captured output of a completed trial
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialOutput {
    /// Everything written to stdout
    pub stdout: String,
    /// Everything written to stderr
    pub stderr: String,
    /// Exit code; `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl TrialOutput {
    /// Output of a trial that exited cleanly
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Whether the trial exited with code 0
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failure to obtain any output from a trial
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("Failed to launch trial: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Trial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trial timed out after {seconds:.1}s")]
    Timeout { seconds: f64 },

    #[error("{0}")]
    Other(String),
}

/// Runs one trial at a given parallelism level.
///
/// Implementations must not return until the trial has fully completed,
/// including draining both output streams, so trials never overlap.
pub trait TrialRunner {
    /// Execute the trial for `level` and capture its output
    fn run_trial(&mut self, level: u32) -> Result<TrialOutput, TrialError>;
}

impl<F> TrialRunner for F
where
    F: FnMut(u32) -> Result<TrialOutput, TrialError>,
{
    fn run_trial(&mut self, level: u32) -> Result<TrialOutput, TrialError> {
        self(level)
    }
}

/// Which search target a trial receives on stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPlan {
    /// Every trial searches for the same target
    Fixed(String),
    /// Level `i` (1-based) searches for the `i`-th target
    PerLevel(Vec<String>),
}

impl TargetPlan {
    /// Target for a given level, if the plan defines one
    pub fn target_for(&self, level: u32) -> Option<&str> {
        match self {
            TargetPlan::Fixed(target) => Some(target),
            TargetPlan::PerLevel(targets) => level
                .checked_sub(1)
                .and_then(|idx| targets.get(idx as usize))
                .map(String::as_str),
        }
    }

    /// Levels implied by a per-level plan (`1..=n`), `None` for fixed plans
    pub fn implied_levels(&self) -> Option<Vec<u32>> {
        match self {
            TargetPlan::Fixed(_) => None,
            TargetPlan::PerLevel(targets) => Some((1..=targets.len() as u32).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_runner() {
        let mut runner = |level: u32| -> Result<TrialOutput, TrialError> {
            Ok(TrialOutput::success(format!("level {}", level)))
        };
        let out = runner.run_trial(8).unwrap();
        assert_eq!(out.stdout, "level 8");
        assert!(out.exited_cleanly());
    }

    #[test]
    fn test_fixed_target() {
        let plan = TargetPlan::Fixed("9999".to_string());
        assert_eq!(plan.target_for(1), Some("9999"));
        assert_eq!(plan.target_for(16), Some("9999"));
        assert!(plan.implied_levels().is_none());
    }

    #[test]
    fn test_per_level_target() {
        let plan = TargetPlan::PerLevel(vec!["0001".to_string(), "9999".to_string()]);
        assert_eq!(plan.target_for(0), None);
        assert_eq!(plan.target_for(1), Some("0001"));
        assert_eq!(plan.target_for(2), Some("9999"));
        assert_eq!(plan.target_for(3), None);
        assert_eq!(plan.implied_levels(), Some(vec![1, 2]));
    }
}
