//! System Metadata Collection
//!
//! Git commit/branch plus host details for the JSON report. Linux-specific
//! data (CPU model, memory) degrades to "Unknown" or 0 elsewhere.

use chrono::Utc;
use scalebench_report::{ReportMeta, SCHEMA_VERSION, SystemInfo};

/// Build report metadata including system info and git details
pub fn build_report_meta() -> ReportMeta {
    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
        memory_gb: get_memory_gb().unwrap_or(0.0),
    };

    ReportMeta {
        schema_version: SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit: git(&["rev-parse", "HEAD"]),
        git_branch: git(&["rev-parse", "--abbrev-ref", "HEAD"]),
        system,
    }
}

fn git(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Value after the `:` of the first `/proc/<file>` line starting with `key`
#[cfg(target_os = "linux")]
fn proc_field(file: &str, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(format!("/proc/{}", file)).ok()?;
    content
        .lines()
        .find(|l| l.starts_with(key))
        .and_then(|l| l.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(not(target_os = "linux"))]
fn proc_field(_file: &str, _key: &str) -> Option<String> {
    None
}

fn get_cpu_model() -> Option<String> {
    proc_field("cpuinfo", "model name")
}

fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// `MemTotal` is reported in kB
fn get_memory_gb() -> Option<f64> {
    proc_field("meminfo", "MemTotal")?
        .split_whitespace()
        .next()?
        .parse::<u64>()
        .ok()
        .map(|kb| kb as f64 / 1024.0 / 1024.0)
}
