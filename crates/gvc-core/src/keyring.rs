//! Ephemeral GnuPG keyrings built from exported public key files.

use crate::error::{ChainError, Phase};
use crate::exec::{CancellationToken, CommandSpec, ProcessError, ProcessRunner};
use crate::types::KeySource;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Environment variable naming the GnuPG home directory.
pub const GNUPGHOME: &str = "GNUPGHOME";

const KEYRING_PREFIX: &str = "git-verify-chain-keyring-";

/// Import flags that keep gpg away from keyservers, WKD, and the agent.
const IMPORT_FLAGS: &[&str] = &[
    "--no-auto-key-locate",
    "--no-auto-key-retrieve",
    "--no-autostart",
    "--import",
];

/// A keyring directory owned by a single verification run.
///
/// The directory and everything gpg wrote into it are removed when the value
/// is dropped.
#[derive(Debug)]
pub struct EphemeralKeyring {
    dir: TempDir,
}

impl EphemeralKeyring {
    /// Create a fresh, empty keyring directory under the system temp dir.
    pub fn create() -> Result<Self, ChainError> {
        let dir = tempfile::Builder::new()
            .prefix(KEYRING_PREFIX)
            .tempdir()
            .map_err(|e| ChainError::InvalidPath {
                path: std::env::temp_dir(),
                reason: format!("failed to create keyring directory: {e}"),
            })?;
        let keyring = Self { dir };
        require_absolute(keyring.path())?;
        debug!(dir = %keyring.path().display(), "created ephemeral keyring");
        Ok(keyring)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Imports public keys into an isolated keyring.
#[derive(Debug, Clone)]
pub struct KeyringBuilder<R> {
    runner: R,
    gpg: String,
    search_path: Option<OsString>,
}

impl<R: ProcessRunner> KeyringBuilder<R> {
    pub fn new(runner: R, gpg_program: impl Into<String>) -> Self {
        Self {
            runner,
            gpg: gpg_program.into(),
            search_path: None,
        }
    }

    /// Value of `PATH` for every command this runs.
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Import every file in `keys`, in order, into the keyring at `keyring_dir`.
    ///
    /// `keyring_dir` must be an absolute, empty directory. Stops at the first
    /// file gpg refuses; keys imported before it stay in the keyring.
    pub fn build(
        &self,
        keyring_dir: &Path,
        keys: &KeySource,
        cancel: &CancellationToken,
    ) -> Result<(), ChainError> {
        require_absolute(keyring_dir)?;
        require_empty_dir(keyring_dir)?;

        for file in keys.files() {
            let cmd = CommandSpec::new(&self.gpg, keyring_dir)
                .args(IMPORT_FLAGS)
                .arg(file)
                .env(GNUPGHOME, keyring_dir)
                .search_path(self.search_path.as_deref());

            self.runner.run(&cmd, cancel).map_err(|source| match source {
                ProcessError::Exited { .. } => ChainError::Import {
                    file: file.clone(),
                    source,
                },
                source => ChainError::process(Phase::Import, source),
            })?;
            debug!(file = %file.display(), "imported key");
        }

        info!(count = keys.len(), dir = %keyring_dir.display(), "keyring ready");
        Ok(())
    }
}

/// Find key files named `*.<extension>` directly inside `dir`, sorted by path.
pub fn discover_key_files(dir: &Path, extension: &str) -> Result<KeySource, ChainError> {
    require_absolute(dir)?;
    if !dir.is_dir() {
        return Err(ChainError::KeyDiscovery {
            dir: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{escaped}/*.{extension}");

    let mut files = glob::glob(&pattern)
        .map_err(|e| ChainError::KeyDiscovery {
            dir: dir.to_path_buf(),
            reason: e.to_string(),
        })?
        .map(|entry| {
            entry.map_err(|e| ChainError::KeyDiscovery {
                dir: dir.to_path_buf(),
                reason: e.to_string(),
            })
        })
        .filter(|entry| entry.as_ref().map_or(true, |p| p.is_file()))
        .collect::<Result<Vec<PathBuf>, _>>()?;
    files.sort();

    debug!(dir = %dir.display(), count = files.len(), "discovered key files");
    Ok(KeySource::new(files))
}

/// Reject relative paths before any process is spawned.
pub fn require_absolute(path: &Path) -> Result<(), ChainError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(ChainError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path must be absolute".to_string(),
        })
    }
}

fn require_empty_dir(path: &Path) -> Result<(), ChainError> {
    let invalid = |reason: String| ChainError::InvalidPath {
        path: path.to_path_buf(),
        reason,
    };
    let mut entries = fs::read_dir(path).map_err(|e| invalid(format!("cannot read directory: {e}")))?;
    if entries.next().is_some() {
        return Err(invalid("keyring directory must be empty".to_string()));
    }
    Ok(())
}
