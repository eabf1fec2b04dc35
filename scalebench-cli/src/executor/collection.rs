//! Sweep Execution Helpers
//!
//! Progress reporting for a running sweep and the baseline lookup used to
//! fill the speedup column of freshly collected artifacts.

use indicatif::{ProgressBar, ProgressStyle};
use scalebench_core::{ArtifactStore, SkippedTrial, Sweep, SweepObserver, Technology, Trial};
use scalebench_report::{BaselineTime, NormalizeConfig, NormalizeError, Normalizer, Sources};
use scalebench_stats::compute_summary;

/// Progress bar over the levels of one sweep
pub struct ProgressObserver {
    pb: ProgressBar,
    technology: Technology,
}

impl ProgressObserver {
    /// Bar sized for `levels` trials
    pub fn new(technology: Technology, levels: usize) -> Self {
        let pb = ProgressBar::new(levels as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { pb, technology }
    }

    /// Hidden bar, for quiet or non-interactive runs
    pub fn hidden(technology: Technology) -> Self {
        Self {
            pb: ProgressBar::hidden(),
            technology,
        }
    }

    /// Close the bar
    pub fn finish(&self) {
        self.pb.finish_with_message("Complete");
    }
}

impl SweepObserver for ProgressObserver {
    fn on_trial_start(&mut self, level: u32) {
        self.pb
            .set_message(format!("{} level {}", self.technology, level));
    }

    fn on_trial_complete(&mut self, trial: &Trial) {
        self.pb.println(format!(
            "  level {:>4}: {:.4}s",
            trial.level, trial.elapsed_seconds
        ));
        self.pb.inc(1);
    }

    fn on_trial_skipped(&mut self, skipped: &SkippedTrial) {
        self.pb.println(format!(
            "  level {:>4}: skipped ({})",
            skipped.level, skipped.reason
        ));
        self.pb.inc(1);
    }
}

/// Current baseline time: the baseline artifact's mean, or the fallback.
///
/// Only the baseline artifact is read, so a broken artifact of another
/// technology does not block collection.
pub fn current_baseline(
    store: &ArtifactStore,
    config: &NormalizeConfig,
) -> Result<BaselineTime, NormalizeError> {
    let mut sources = Sources::new();
    sources.set_location(Technology::Baseline, store.path(Technology::Baseline));
    match store.read(Technology::Baseline) {
        Ok(Some(set)) => sources.insert(set),
        Ok(None) => {}
        Err(source) => {
            return Err(NormalizeError::Decode {
                technology: Technology::Baseline,
                source,
            });
        }
    }

    Ok(Normalizer::new(config.clone())
        .normalize_sources(&sources)
        .baseline)
}

/// Baseline time for the speedup column of a worker-scaled sweep; `None`
/// for technologies whose artifacts carry no speedup column.
pub fn baseline_for_speedup(
    technology: Technology,
    store: &ArtifactStore,
    config: &NormalizeConfig,
) -> Result<Option<BaselineTime>, NormalizeError> {
    if !technology.is_worker_scaled() {
        return Ok(None);
    }

    let baseline = current_baseline(store, config)?;
    if baseline.is_fallback() {
        tracing::warn!(
            "No usable baseline runs in {}; speedup uses fallback {:.2}s",
            store.path(Technology::Baseline).display(),
            baseline.seconds
        );
    }
    Ok(Some(baseline))
}

/// Terminal summary of a finished sweep
pub fn format_sweep_summary(sweep: &Sweep, label: &str) -> String {
    let summary = sweep.summary();
    let mut output = String::new();

    output.push_str(&format!(
        "\n{}: {}/{} levels succeeded\n",
        label, summary.succeeded, summary.attempted
    ));
    if summary.skipped() > 0 {
        output.push_str(&format!(
            "  skipped: {} unparseable, {} target not found, {} launch failures\n",
            summary.unparseable, summary.not_found, summary.launch_failed
        ));
        for skipped in &sweep.skipped {
            output.push_str(&format!("    level {}: {}\n", skipped.level, skipped.reason));
        }
    }

    let times: Vec<f64> = sweep.trials.iter().map(|t| t.elapsed_seconds).collect();
    if sweep.technology == Technology::Baseline {
        if let Some(stats) = compute_summary(&times) {
            output.push_str(&format!(
                "  mean: {:.4}s  median: {:.4}s  stddev: {:.4}s ({:.1}% cv)\n",
                stats.mean,
                stats.median,
                stats.std_dev,
                stats.coefficient_of_variation()
            ));
        }
    } else if let Some(fastest) = sweep
        .trials
        .iter()
        .min_by(|a, b| a.elapsed_seconds.total_cmp(&b.elapsed_seconds))
    {
        output.push_str(&format!(
            "  fastest: level {} at {:.4}s\n",
            fastest.level, fastest.elapsed_seconds
        ));
    }

    output
}
