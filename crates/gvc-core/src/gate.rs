//! Release gate entry points wiring enumeration, keyrings, and verification.

use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::exec::{CancellationToken, ProcessRunner};
use crate::git::CommitEnumerator;
use crate::keyring::{discover_key_files, require_absolute, EphemeralKeyring, KeyringBuilder};
use crate::report::VerificationReport;
use crate::types::{CommitRange, TrustSource, VerificationOutcome};
use crate::verify::ChainVerifier;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

/// Keyring used by one run.
enum Keyring {
    Existing(PathBuf),
    Ephemeral(EphemeralKeyring),
}

impl Keyring {
    fn path(&self) -> &Path {
        match self {
            Keyring::Existing(path) => path,
            Keyring::Ephemeral(keyring) => keyring.path(),
        }
    }
}

/// Verifies commit ranges using one process runner and configuration.
#[derive(Debug, Clone)]
pub struct Gate<R> {
    runner: R,
    config: ChainConfig,
}

impl<R: ProcessRunner> Gate<R> {
    pub fn new(runner: R, config: ChainConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Verify `range` in `repo` against the existing keyring at `gpg_home`.
    pub fn verify_with_keyring(
        &self,
        repo: &Path,
        range: &CommitRange,
        gpg_home: &Path,
        cancel: &CancellationToken,
    ) -> Result<VerificationReport, ChainError> {
        require_absolute(gpg_home)?;
        let trust = TrustSource::Keyring {
            home: gpg_home.to_path_buf(),
        };
        self.run(repo, range, trust, cancel, |_| {
            Ok(Keyring::Existing(gpg_home.to_path_buf()))
        })
    }

    /// Verify `range` in `repo` against a fresh keyring built from the key
    /// files in `keys_dir`.
    ///
    /// The keyring exists only for the duration of this call.
    pub fn verify_with_files(
        &self,
        repo: &Path,
        range: &CommitRange,
        keys_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<VerificationReport, ChainError> {
        let keys = discover_key_files(keys_dir, &self.config.key_extension)?;
        if keys.is_empty() {
            return Err(ChainError::KeyDiscovery {
                dir: keys_dir.to_path_buf(),
                reason: format!("no *.{} files found", self.config.key_extension),
            });
        }
        info!(dir = %keys_dir.display(), count = keys.len(), "using public key files");

        let trust = TrustSource::Files {
            dir: keys_dir.to_path_buf(),
            imported: keys.len(),
        };

        self.run(repo, range, trust, cancel, |cancel| {
            let keyring = EphemeralKeyring::create()?;
            KeyringBuilder::new(&self.runner, &self.config.gpg_program)
                .with_search_path(self.config.path_env())
                .build(keyring.path(), &keys, cancel)?;
            Ok(Keyring::Ephemeral(keyring))
        })
    }

    /// Enumerate the range, then obtain a keyring only if there is something
    /// to verify.
    fn run<F>(
        &self,
        repo: &Path,
        range: &CommitRange,
        trust: TrustSource,
        cancel: &CancellationToken,
        provision: F,
    ) -> Result<VerificationReport, ChainError>
    where
        F: FnOnce(&CancellationToken) -> Result<Keyring, ChainError>,
    {
        let commits = CommitEnumerator::new(&self.runner, &self.config.git_program)
            .with_search_path(self.config.path_env())
            .enumerate(repo, range, cancel)?;

        let outcome = if commits.is_empty() {
            info!(%range, "range is empty");
            VerificationOutcome::AllVerified
        } else {
            // Dropped after verification, which removes an ephemeral keyring.
            let keyring = provision(cancel)?;
            ChainVerifier::new(&self.runner, &self.config.git_program)
                .with_search_path(self.config.path_env())
                .verify(repo, &commits, keyring.path(), cancel)?
        };

        Ok(VerificationReport {
            repo: repo.to_path_buf(),
            range: range.clone(),
            trust,
            commits: commits.len(),
            outcome,
            checked_at: Utc::now(),
        })
    }
}
