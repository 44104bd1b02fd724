//! Commit range enumeration via `git rev-list`.

use crate::error::{ChainError, Phase};
use crate::exec::{CancellationToken, CommandSpec, ProcessError, ProcessRunner};
use crate::types::{CommitId, CommitRange};
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// Resolves commit ranges into ordered commit identifiers.
#[derive(Debug, Clone)]
pub struct CommitEnumerator<R> {
    runner: R,
    git: String,
    search_path: Option<OsString>,
}

impl<R: ProcessRunner> CommitEnumerator<R> {
    pub fn new(runner: R, git_program: impl Into<String>) -> Self {
        Self {
            runner,
            git: git_program.into(),
            search_path: None,
        }
    }

    /// Value of `PATH` for every command this runs.
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    /// List commits reachable from `range.to` but not from `range.from`.
    ///
    /// Commits come back in the order `git rev-list` yields them, newest
    /// first. An empty range is not an error.
    pub fn enumerate(
        &self,
        repo: &Path,
        range: &CommitRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<CommitId>, ChainError> {
        let cmd = CommandSpec::new(&self.git, repo)
            .arg("rev-list")
            .arg("--end-of-options")
            .arg(range.revision())
            .search_path(self.search_path.as_deref());

        let output = self
            .runner
            .run(&cmd, cancel)
            .map_err(|source| match source {
                ProcessError::Exited { .. } => ChainError::RangeResolution {
                    range: range.clone(),
                    source,
                },
                source => ChainError::process(Phase::Enumerate, source),
            })?;

        let commits = output
            .stdout
            .into_iter()
            .map(|line| {
                let line = line.trim().to_string();
                if is_object_name(&line) {
                    Ok(CommitId::new(line))
                } else {
                    Err(ChainError::MalformedRevList {
                        range: range.clone(),
                        line,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(range = %range, count = commits.len(), "enumerated commits");
        Ok(commits)
    }
}

/// SHA-1 or SHA-256 object name in lowercase hex.
fn is_object_name(s: &str) -> bool {
    matches!(s.len(), 40 | 64) && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
