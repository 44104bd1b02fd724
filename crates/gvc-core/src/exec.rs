//! External process execution with explicit working directory and environment.
//!
//! Every command the engine runs goes through a [`ProcessRunner`]. A
//! [`CommandSpec`] always names its working directory and carries its full
//! environment; nothing is inherited from the invoking process.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors produced while running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{}: working directory is not set", .args.join(" "))]
    MissingWorkingDir { args: Vec<String> },

    #[error("{}: failed to start: {source}", .args.join(" "))]
    Spawn {
        args: Vec<String>,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .args.join(" "))]
    Io {
        args: Vec<String>,
        #[source]
        source: io::Error,
    },

    #[error("{}", render_exited(.args, .code, .stdout, .stderr))]
    Exited {
        args: Vec<String>,
        code: Option<i32>,
        stdout: Vec<String>,
        stderr: Vec<String>,
    },

    #[error("{}: cancelled", .args.join(" "))]
    Cancelled { args: Vec<String> },
}

fn render_exited(
    args: &[String],
    code: &Option<i32>,
    stdout: &[String],
    stderr: &[String],
) -> String {
    let mut msg = match code {
        Some(code) => format!("{}: exit status {code}", args.join(" ")),
        None => format!("{}: terminated by signal", args.join(" ")),
    };
    for line in stdout.iter().chain(stderr) {
        msg.push('\n');
        msg.push_str(line);
    }
    msg
}

impl ProcessError {
    /// The command line that failed, program first.
    pub fn args(&self) -> &[String] {
        match self {
            ProcessError::MissingWorkingDir { args }
            | ProcessError::Spawn { args, .. }
            | ProcessError::Io { args, .. }
            | ProcessError::Exited { args, .. }
            | ProcessError::Cancelled { args } => args,
        }
    }

    /// True when the command ran to completion and reported failure through
    /// its exit status.
    pub fn is_exit_failure(&self) -> bool {
        matches!(self, ProcessError::Exited { .. })
    }

    /// Captured stdout followed by stderr, one line per entry.
    ///
    /// Empty for failures that never produced output.
    pub fn captured_text(&self) -> String {
        match self {
            ProcessError::Exited { stdout, stderr, .. } => stdout
                .iter()
                .chain(stderr)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
    dir: PathBuf,
    env: BTreeMap<String, OsString>,
}

impl CommandSpec {
    /// Create a command that runs `program` inside `dir` with an empty environment.
    pub fn new(program: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: dir.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set one environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.env.insert(key.into(), value.as_ref().to_os_string());
        self
    }

    /// Set `PATH` for the child when a search path is configured.
    pub fn search_path(self, path: Option<&OsStr>) -> Self {
        match path {
            Some(path) => self.env("PATH", path),
            None => self,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn envs(&self) -> &BTreeMap<String, OsString> {
        &self.env
    }

    /// Program and arguments as display strings.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect()
    }
}

/// Output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Cooperative cancellation flag shared between the caller and running commands.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capability to run external commands.
///
/// Implementations must run the command in [`CommandSpec::dir`] with exactly
/// [`CommandSpec::envs`] as its environment, and must return
/// [`ProcessError::Exited`] for a non-zero exit status.
pub trait ProcessRunner {
    fn run(&self, cmd: &CommandSpec, cancel: &CancellationToken)
        -> Result<RunOutput, ProcessError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(
        &self,
        cmd: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, ProcessError> {
        (**self).run(cmd, cancel)
    }
}

/// Runs commands as real child processes of the current process.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    poll_interval: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, ProcessError> {
        let args = cmd.argv();

        if cmd.dir().as_os_str().is_empty() {
            return Err(ProcessError::MissingWorkingDir { args });
        }
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled { args });
        }

        debug!(command = %args.join(" "), dir = %cmd.dir().display(), "running");

        let mut child = Command::new(cmd.program())
            .args(&cmd.args)
            .current_dir(cmd.dir())
            .env_clear()
            .envs(cmd.envs())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                args: args.clone(),
                source,
            })?;

        // Drain both pipes on helper threads so a chatty child never blocks
        // while this thread polls for exit or cancellation.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Cancelled { args });
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(self.poll_interval),
                Err(source) => {
                    let _ = child.kill();
                    return Err(ProcessError::Io { args, source });
                }
            }
        };

        let stdout = collect(stdout).map_err(|source| ProcessError::Io {
            args: args.clone(),
            source,
        })?;
        let stderr = collect(stderr).map_err(|source| ProcessError::Io {
            args: args.clone(),
            source,
        })?;

        // A terminal interrupt reaches the child too; its failure is not a verdict.
        if !status.success() && cancel.is_cancelled() {
            return Err(ProcessError::Cancelled { args });
        }
        if !status.success() {
            return Err(ProcessError::Exited {
                args,
                code: status.code(),
                stdout,
                stderr,
            });
        }

        Ok(RunOutput { stdout, stderr })
    }
}

type Drain = thread::JoinHandle<io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Drain {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<Drain>) -> io::Result<Vec<String>> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
    Ok(split_lines(&String::from_utf8_lossy(&bytes)))
}

/// Split captured output into lines, dropping surrounding whitespace.
///
/// Blank output yields no lines at all.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.lines().map(str::to_string).collect()
}
