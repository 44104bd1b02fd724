//! Commit chain signature verification.
//!
//! Verification runs as a small state machine:
//!
//! - `BulkAttempt`: one `git verify-commit` call covering every commit.
//! - `Diagnose`: entered only when the bulk call fails; checks commits one by
//!   one in range order and stops at the first rejection.
//! - `Done`: carries the final [`VerificationOutcome`].
//!
//! A bulk failure followed by a diagnosis that rejects nothing is reported as
//! [`ChainError::ConsistencyFault`], never as success.

use crate::error::{ChainError, Phase};
use crate::exec::{CancellationToken, CommandSpec, ProcessError, ProcessRunner};
use crate::keyring::{require_absolute, GNUPGHOME};
use crate::types::{CommitId, VerificationOutcome};
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info, warn};

enum State {
    BulkAttempt,
    Diagnose,
    Done(VerificationOutcome),
}

/// Checks commit signatures against a keyring.
#[derive(Debug, Clone)]
pub struct ChainVerifier<R> {
    runner: R,
    git: String,
    search_path: Option<OsString>,
}

impl<R: ProcessRunner> ChainVerifier<R> {
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

    /// Verify every commit in `commits` against the keyring at `keyring_dir`.
    ///
    /// `commits` must be in range order; on failure the first rejected commit
    /// in that order is reported. An empty list verifies trivially without
    /// running anything.
    pub fn verify(
        &self,
        repo: &Path,
        commits: &[CommitId],
        keyring_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<VerificationOutcome, ChainError> {
        require_absolute(keyring_dir)?;

        if commits.is_empty() {
            info!("no commits in range, nothing to verify");
            return Ok(VerificationOutcome::AllVerified);
        }

        let mut state = State::BulkAttempt;
        loop {
            state = match state {
                State::BulkAttempt => self.bulk_attempt(repo, commits, keyring_dir, cancel)?,
                State::Diagnose => self.diagnose(repo, commits, keyring_dir, cancel)?,
                State::Done(outcome) => return Ok(outcome),
            };
        }
    }

    fn bulk_attempt(
        &self,
        repo: &Path,
        commits: &[CommitId],
        keyring_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<State, ChainError> {
        info!(count = commits.len(), "verifying commits");
        let cmd = self
            .verify_command(repo, keyring_dir)
            .args(commits.iter().map(CommitId::as_str));

        match self.check(&cmd, Phase::BulkAttempt, cancel)? {
            None => {
                info!(count = commits.len(), "all commits verified");
                Ok(State::Done(VerificationOutcome::AllVerified))
            }
            Some(_) => {
                info!("bulk verification failed, checking commits one by one");
                Ok(State::Diagnose)
            }
        }
    }

    fn diagnose(
        &self,
        repo: &Path,
        commits: &[CommitId],
        keyring_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<State, ChainError> {
        for commit in commits {
            let cmd = self
                .verify_command(repo, keyring_dir)
                .arg("--verbose")
                .arg(commit.as_str());

            if let Some(rejection) = self.check(&cmd, Phase::Diagnose, cancel)? {
                warn!(%commit, "commit failed verification");
                return Ok(State::Done(VerificationOutcome::FirstBadCommit {
                    commit: commit.clone(),
                    diagnostic: rejection.captured_text(),
                }));
            }
            debug!(%commit, "commit verified");
        }

        Err(ChainError::ConsistencyFault {
            commits: commits.len(),
        })
    }

    fn verify_command(&self, repo: &Path, keyring_dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.git, repo)
            .arg("verify-commit")
            .env(GNUPGHOME, keyring_dir)
            .search_path(self.search_path.as_deref())
    }

    /// Run one verification. `Ok(Some(_))` is a rejection by git; anything
    /// that kept git from giving an answer is an error.
    fn check(
        &self,
        cmd: &CommandSpec,
        phase: Phase,
        cancel: &CancellationToken,
    ) -> Result<Option<ProcessError>, ChainError> {
        match self.runner.run(cmd, cancel) {
            Ok(_) => Ok(None),
            Err(rejection @ ProcessError::Exited { .. }) => Ok(Some(rejection)),
            Err(source) => Err(ChainError::process(phase, source)),
        }
    }
}
