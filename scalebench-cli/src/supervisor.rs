//! Trial Process Supervisor
//!
//! Runs one trial of an external implementation as a child process:
//!
//! ```text
//! spawn (own process group) ──► stdin: "<target>\n" ──► wait ≤ timeout
//!        │                                               │
//!        ├── stdout reader thread ─┐                     ├─ exited: collect output
//!        └── stderr reader thread ─┴── joined ◄──────────┴─ timeout: SIGTERM, 500ms, SIGKILL
//! ```
//!
//! The child is always reaped and both readers always joined before
//! `run_trial` returns, so trials never overlap. Group members that outlive
//! the leader and keep its pipes open are killed after a short drain.

use crate::config::TechnologyConfig;
use scalebench_core::{TargetPlan, TrialError, TrialOutput, TrialRunner};
use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Interval between exit checks
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Time a terminated trial gets to exit before SIGKILL
const TERM_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to spawn build: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Build failed (`{command}`, exit {code:?}):\n{stderr}")]
    BuildFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("No program configured for {0}; set `program` under [technologies.{0}]")]
    MissingProgram(String),
}

/// Send a signal to every process in the group led by `pid`
fn signal_group(pid: u32, signal: libc::c_int) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(-(pid as libc::pid_t), signal) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<std::io::Result<String>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn join_reader(handle: Option<JoinHandle<std::io::Result<String>>>) -> Result<String, TrialError> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| TrialError::Other("output reader panicked".to_string()))?
            .map_err(TrialError::Io),
        None => Ok(String::new()),
    }
}

/// A running trial; terminated and reaped on drop
struct TrialProcess {
    child: Child,
    stdout: Option<JoinHandle<std::io::Result<String>>>,
    stderr: Option<JoinHandle<std::io::Result<String>>>,
    reaped: bool,
}

impl TrialProcess {
    fn spawn(command: &mut Command) -> Result<Self, TrialError> {
        let mut child = command.spawn().map_err(TrialError::Spawn)?;
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);
        Ok(Self {
            child,
            stdout,
            stderr,
            reaped: false,
        })
    }

    /// Write the target line and close stdin
    fn feed(&mut self, target: &str) -> Result<(), TrialError> {
        if let Some(mut stdin) = self.child.stdin.take() {
            match stdin.write_all(format!("{}\n", target).as_bytes()) {
                Ok(()) => {}
                // Child exited or never reads stdin
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(TrialError::Io(e)),
            }
        }
        Ok(())
    }

    fn wait_with_timeout(&mut self, timeout: Duration) -> Result<ExitStatus, TrialError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                self.reaped = true;
                return Ok(status);
            }
            if Instant::now() >= deadline {
                tracing::debug!("Trial pid {} timed out, terminating", self.child.id());
                self.terminate();
                return Err(TrialError::Timeout {
                    seconds: timeout.as_secs_f64(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// SIGTERM the group, wait out the grace period, then SIGKILL and reap
    fn terminate(&mut self) {
        let pid = self.child.id();
        let _ = signal_group(pid, libc::SIGTERM);

        let grace = Instant::now() + TERM_GRACE;
        while Instant::now() < grace {
            if let Ok(Some(_)) = self.child.try_wait() {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        // Leader may be gone while helpers in its group still hold the pipes
        let _ = signal_group(pid, libc::SIGKILL);
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }

    fn readers_finished(&self) -> bool {
        [&self.stdout, &self.stderr]
            .into_iter()
            .all(|reader| reader.as_ref().is_none_or(JoinHandle::is_finished))
    }

    /// Join both readers; helpers still holding the pipes after a short
    /// drain are killed with the rest of the group
    fn collect_output(&mut self) -> Result<(String, String), TrialError> {
        let drain = Instant::now() + TERM_GRACE;
        while !self.readers_finished() && Instant::now() < drain {
            std::thread::sleep(POLL_INTERVAL);
        }
        if !self.readers_finished() {
            tracing::debug!(
                "Trial pid {} exited but its group still holds the output pipes, killing",
                self.child.id()
            );
            let _ = signal_group(self.child.id(), libc::SIGKILL);
        }

        let stdout = join_reader(self.stdout.take())?;
        let stderr = join_reader(self.stderr.take())?;
        Ok((stdout, stderr))
    }
}

impl Drop for TrialProcess {
    fn drop(&mut self) {
        if !self.reaped {
            self.terminate();
        }
        let _ = join_reader(self.stdout.take());
        let _ = join_reader(self.stderr.take());
    }
}

/// Runs trials as child processes
#[derive(Debug, Clone)]
pub struct ProcessTrialRunner {
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
    targets: TargetPlan,
    timeout: Duration,
}

impl ProcessTrialRunner {
    /// Runner for `program` with argument templates
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        targets: TargetPlan,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: None,
            targets,
            timeout,
        }
    }

    /// Runner from a `[technologies.<slug>]` table
    pub fn from_config(
        slug: &str,
        config: &TechnologyConfig,
        targets: TargetPlan,
        timeout: Duration,
    ) -> Result<Self, SupervisorError> {
        let program = config
            .program
            .clone()
            .ok_or_else(|| SupervisorError::MissingProgram(slug.to_string()))?;
        let runner = Self::new(program, config.args.clone(), targets, timeout);
        Ok(match &config.workdir {
            Some(dir) => runner.workdir(dir),
            None => runner,
        })
    }

    /// Run trials in `dir`
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Argument list with `{level}` and `{target}` substituted
    pub fn expand_args(&self, level: u32, target: &str) -> Vec<String> {
        let level = level.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace("{level}", &level).replace("{target}", target))
            .collect()
    }

    fn command(&self, level: u32, target: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.expand_args(level, target))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        command
    }
}

impl TrialRunner for ProcessTrialRunner {
    fn run_trial(&mut self, level: u32) -> Result<TrialOutput, TrialError> {
        let target = self
            .targets
            .target_for(level)
            .ok_or_else(|| TrialError::Other(format!("No target configured for level {}", level)))?
            .to_string();

        tracing::debug!(
            "Spawning {} {:?} (level {}, target {})",
            self.program,
            self.expand_args(level, &target),
            level,
            target
        );

        let mut process = TrialProcess::spawn(&mut self.command(level, &target))?;
        process.feed(&target)?;
        let status = process.wait_with_timeout(self.timeout)?;
        let (stdout, stderr) = process.collect_output()?;

        Ok(TrialOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

/// Run a technology's build command through `sh -c`.
///
/// A non-zero exit aborts collection with the compiler's stderr.
pub fn run_build(command: &str, workdir: Option<&Path>) -> Result<(), SupervisorError> {
    tracing::info!("Building: {}", command);
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }

    let output = cmd.output()?;
    if !output.status.success() {
        return Err(SupervisorError::BuildFailed {
            command: command.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
