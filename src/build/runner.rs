//! External process execution
//!
//! Every native build script and compiler call goes through a
//! `CommandRunner`. The production `ProcessRunner` spawns real processes;
//! tests substitute fakes that record commands and return canned output.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Runtime;

/// A program invocation: executable, arguments and extra environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Extra environment variables set for the child only
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Start a command with no arguments
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add environment variables for the child process
    #[must_use]
    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(vars);
        self
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-like rendering for logs. Long inline scripts are shortened.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            let first_line = arg.lines().next().unwrap_or_default();
            if first_line.len() < arg.len() {
                write!(f, " '{first_line} ...'")?;
            } else if arg.contains(' ') {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// What a finished process left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured stdout followed by stderr
    pub output: String,
}

impl ProcessOutput {
    /// Whether the process exited with status zero
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Human-readable exit status for error messages
    #[must_use]
    pub fn describe_exit(&self) -> String {
        self.exit_code.map_or_else(
            || "terminated by signal".to_string(),
            |code| format!("exit code {code}"),
        )
    }
}

/// Errors starting or supervising a process
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` did not finish within {} seconds", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

/// Capability to run an external command to completion
pub trait CommandRunner: fmt::Debug {
    /// Run `command` in `working_dir` and capture its output.
    ///
    /// A non-zero exit is not an error here; callers inspect
    /// [`ProcessOutput::success`].
    fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput, RunError>;
}

/// Runs commands as real child processes
///
/// Processes run on a private single-threaded tokio runtime so an optional
/// timeout can be enforced. A timed-out child is killed.
#[derive(Debug)]
pub struct ProcessRunner {
    /// Runtime driving child processes
    runtime: Runtime,
    /// Upper bound on each process, if any
    timeout: Option<Duration>,
    /// Show a spinner while a process runs
    progress: bool,
}

impl ProcessRunner {
    /// Create a runner.
    ///
    /// A spinner is shown while processes run if stderr is a terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the process runtime cannot be created.
    pub fn new(timeout: Option<Duration>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            timeout,
            progress: io::stderr().is_terminal(),
        })
    }

    /// Enable or disable the spinner
    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn spinner(&self, command: &CommandSpec) -> Option<ProgressBar> {
        if !self.progress || crate::debug::is_verbose() {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(command.program.clone());
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    }

    async fn run_async(
        &self,
        command: &CommandSpec,
        working_dir: &Path,
    ) -> Result<ProcessOutput, RunError> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // A timed command gets its own process group so the whole tree can be
        // killed, not just the direct child
        #[cfg(unix)]
        if self.timeout.is_some() {
            cmd.process_group(0);
        }

        let spawn_error = |source: io::Error| RunError::Spawn {
            program: command.program.clone(),
            source,
        };
        let child = cmd.spawn().map_err(spawn_error)?;
        let pid = child.id();
        let mut pending = std::pin::pin!(child.wait_with_output());

        let result = match self.timeout {
            Some(limit) => {
                if let Ok(result) = tokio::time::timeout(limit, pending.as_mut()).await {
                    result
                } else {
                    if let Some(pid) = pid {
                        kill_process_tree(pid).await;
                    }
                    return Err(RunError::TimedOut {
                        program: command.program.clone(),
                        timeout: limit,
                    });
                }
            }
            None => pending.await,
        };
        let output = result.map_err(spawn_error)?;

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            output: captured,
        })
    }
}

/// Kill a timed-out child together with everything it started
#[cfg(unix)]
async fn kill_process_tree(pid: u32) {
    let group = format!("-{pid}");
    let status = tokio::process::Command::new("kill")
        .args(["-KILL", "--", &group])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        crate::debug!("failed to kill process group {pid}: {e}");
    }
}

/// Kill a timed-out child together with everything it started
#[cfg(windows)]
async fn kill_process_tree(pid: u32) {
    let pid = pid.to_string();
    let status = tokio::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        crate::debug!("failed to kill process tree {pid}: {e}");
    }
}

#[cfg(not(any(unix, windows)))]
#[allow(clippy::unused_async)]
async fn kill_process_tree(_pid: u32) {}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &CommandSpec, working_dir: &Path) -> Result<ProcessOutput, RunError> {
        crate::verbose!("  Running: {command}");
        crate::verbose!("  Working directory: {}", working_dir.display());
        crate::debug!("spawning {:?} (timeout: {:?})", command.program, self.timeout);

        let spinner = self.spinner(command);
        let result = self.runtime.block_on(self.run_async(command, working_dir));
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        if let Ok(output) = &result {
            crate::debug!("{} finished with {}", command.program, output.describe_exit());
            if crate::debug::is_verbose() && !output.output.is_empty() {
                println!("{}", output.output.trim_end());
            }
        }

        result
    }
}
