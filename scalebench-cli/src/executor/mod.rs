//! Collection and Report Pipeline
//!
//! Glue between the library crates and the terminal:
//!
//! ```text
//!  scale.toml + flags
//!       │
//!       ▼
//! ┌─────────────┐
//! │ collection  │  Baseline lookup, progress bar, sweep summary
//! └──────┬──────┘
//!        │  <data_dir>/*.csv
//!        ▼
//! ┌─────────────┐
//! │  metadata   │  Git and host details for the JSON report
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```

mod collection;
mod formatting;
mod metadata;

pub use collection::{
    ProgressObserver, baseline_for_speedup, current_baseline, format_sweep_summary,
};
pub use formatting::format_human_output;
pub use metadata::build_report_meta;
