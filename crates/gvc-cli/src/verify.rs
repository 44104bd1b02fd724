//! The verify command: wires arguments into the gate and classifies failures.

use crate::args::Args;
use crate::gpg_home::default_gpg_home;
use crate::user_config::user_config_path;
use anyhow::{anyhow, Context, Result};
use gvc_core::{
    CancellationToken, ChainConfig, ChainError, CommitRange, Gate, SystemRunner,
    VerificationReport,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// How a run ended, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Every commit verified.
    Verified,
    /// A commit failed verification.
    BadCommit,
    /// Bad arguments, paths, range, config, or key material.
    Setup,
    /// The tools misbehaved or the engine hit an internal inconsistency.
    Internal,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Exit::Verified => 0,
            Exit::BadCommit => 1,
            Exit::Setup => 2,
            Exit::Internal => 3,
        }
    }

    /// Classify an error returned by [`run`].
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ChainError>() {
            Some(ChainError::CommitVerification { .. }) => Exit::BadCommit,
            Some(e) if !e.is_setup_failure() => Exit::Internal,
            _ => Exit::Setup,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Run one verification described by `args`.
///
/// A bad commit is reported through the returned report, not as an error.
pub fn run(args: &Args, cancel: &CancellationToken) -> Result<VerificationReport> {
    let repo = resolve_repo(args.repo.as_deref())?;
    let config = load_config(args, user_config_path().as_deref())?;
    let range = CommitRange::new(&args.from, &args.to);
    let gate = Gate::new(SystemRunner::new(), config);

    let report = match &args.keys_dir {
        Some(keys_dir) => {
            info!("Verifying using public keys from {} ...", keys_dir.display());
            gate.verify_with_files(&repo, &range, keys_dir, cancel)?
        }
        None => {
            let gpg_home = match &args.gpg_home {
                Some(home) => home.clone(),
                None => default_gpg_home()
                    .ok_or_else(|| anyhow!("cannot determine GnuPG home; pass --gpg-home"))?,
            };
            info!("Verifying using GnuPG keyring from {} ...", gpg_home.display());
            gate.verify_with_keyring(&repo, &range, &gpg_home, cancel)?
        }
    };

    Ok(report)
}

fn resolve_repo(repo: Option<&Path>) -> Result<PathBuf> {
    let repo = match repo {
        Some(repo) => repo.to_path_buf(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    repo.canonicalize()
        .with_context(|| format!("repository {} is not accessible", repo.display()))
}

/// `--config` if given, else the per-user file. Never read from `repo`.
fn load_config(args: &Args, user_config: Option<&Path>) -> Result<ChainConfig> {
    let config = match &args.config {
        Some(path) => ChainConfig::load(path)?,
        None => ChainConfig::load_or_default(user_config)?,
    };
    match &args.key_ext {
        Some(ext) => Ok(config.with_key_extension(ext.as_str())?),
        None => Ok(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use gvc_core::ConfigError;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["git-verify-chain", "--from", "v1"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Exit::Verified.code(), 0);
        assert_eq!(Exit::BadCommit.code(), 1);
        assert_eq!(Exit::Setup.code(), 2);
        assert_eq!(Exit::Internal.code(), 3);
    }

    #[test]
    fn test_classify_errors() {
        let fault = anyhow::Error::from(ChainError::ConsistencyFault { commits: 2 });
        assert_eq!(Exit::from_error(&fault), Exit::Internal);

        let path = anyhow::Error::from(ChainError::InvalidPath {
            path: PathBuf::from("keys"),
            reason: "path must be absolute".to_string(),
        });
        assert_eq!(Exit::from_error(&path), Exit::Setup);

        let config = anyhow::Error::from(ConfigError::InvalidKeyExtension("".to_string()));
        assert_eq!(Exit::from_error(&config), Exit::Setup);
    }

    #[test]
    fn test_key_ext_override() {
        let config = load_config(&args(&["--key-ext", "pgp"]), None).unwrap();
        assert_eq!(config.key_extension, "pgp");

        assert!(load_config(&args(&["--key-ext", "*.pgp"]), None).is_err());
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "key_extension = \"asc\"\n").unwrap();

        let config = load_config(&args(&["--config", path.to_str().unwrap()]), None).unwrap();
        assert_eq!(config.key_extension, "asc");
    }

    #[test]
    fn test_user_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gpg_program = \"/opt/gnupg/bin/gpg\"\n").unwrap();

        let config = load_config(&args(&[]), Some(path.as_path())).unwrap();
        assert_eq!(config.gpg_program, "/opt/gnupg/bin/gpg");
    }

    #[test]
    fn test_config_in_repo_is_ignored() {
        let repo = TempDir::new().unwrap();
        for name in [".git-verify-chain.toml", "config.toml"] {
            std::fs::write(repo.path().join(name), "git_program = \"/bin/true\"\n").unwrap();
        }

        let config = load_config(
            &args(&["--repo", repo.path().to_str().unwrap()]),
            None,
        )
        .unwrap();
        assert_eq!(config, ChainConfig::default());
    }

    #[test]
    fn test_resolve_repo_missing() {
        assert!(resolve_repo(Some(Path::new("/nonexistent/gvc-repo"))).is_err());
    }

    #[test]
    fn test_relative_gpg_home_is_setup_failure() {
        let repo = TempDir::new().unwrap();
        let err = run(
            &args(&[
                "--repo",
                repo.path().to_str().unwrap(),
                "--gpg-home",
                "relative/.gnupg",
            ]),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert_eq!(Exit::from_error(&err), Exit::Setup);
        assert!(err.to_string().contains("path must be absolute"));
    }
}
