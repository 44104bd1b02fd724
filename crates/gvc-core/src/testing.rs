//! Deterministic process runner for unit tests.

use crate::exec::{CancellationToken, CommandSpec, ProcessError, ProcessRunner, RunOutput};
use std::cell::RefCell;

type Responder = Box<dyn Fn(&CommandSpec) -> Result<RunOutput, ProcessError>>;

/// Answers commands from a closure and records every call.
pub struct ScriptedRunner {
    respond: Responder,
    calls: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<RunOutput, ProcessError> + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, ProcessError> {
        self.calls.borrow_mut().push(cmd.clone());
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled { args: cmd.argv() });
        }
        (self.respond)(cmd)
    }
}

pub fn stdout(lines: &[&str]) -> Result<RunOutput, ProcessError> {
    Ok(RunOutput {
        stdout: lines.iter().map(|l| l.to_string()).collect(),
        stderr: Vec::new(),
    })
}

pub fn exited(cmd: &CommandSpec, stderr: &[&str]) -> Result<RunOutput, ProcessError> {
    Err(ProcessError::Exited {
        args: cmd.argv(),
        code: Some(1),
        stdout: Vec::new(),
        stderr: stderr.iter().map(|l| l.to_string()).collect(),
    })
}

pub fn spawn_failure(cmd: &CommandSpec) -> Result<RunOutput, ProcessError> {
    Err(ProcessError::Spawn {
        args: cmd.argv(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    })
}
