//! Commit chain signature verification for release gates.
//!
//! Every commit in a range must carry a signature trusted by the supplied
//! keyring, not just the tip. Verification first checks the whole range with
//! a single `git verify-commit` call and, only if that fails, checks commits
//! one at a time to name the first offender.
//!
//! # Example
//!
//! ```no_run
//! use gvc_core::{CancellationToken, ChainConfig, CommitRange, Gate, SystemRunner};
//! use std::path::Path;
//!
//! let gate = Gate::new(SystemRunner::new(), ChainConfig::default());
//! let report = gate.verify_with_files(
//!     Path::new("/src/project"),
//!     &CommitRange::to_head("v1.0.0"),
//!     Path::new("/src/project/keys"),
//!     &CancellationToken::new(),
//! )?;
//! report.outcome.into_result()?;
//! # Ok::<(), gvc_core::ChainError>(())
//! ```

mod config;
mod error;
mod exec;
mod gate;
mod git;
mod keyring;
mod report;
mod types;
mod verify;

#[cfg(test)]
mod testing;

pub use config::{ChainConfig, ConfigError};
pub use error::{ChainError, Phase};
pub use exec::{CancellationToken, CommandSpec, ProcessError, ProcessRunner, RunOutput, SystemRunner};
pub use gate::Gate;
pub use git::CommitEnumerator;
pub use keyring::{discover_key_files, require_absolute, EphemeralKeyring, KeyringBuilder, GNUPGHOME};
pub use report::VerificationReport;
pub use types::{CommitId, CommitRange, KeySource, TrustSource, VerificationOutcome};
pub use verify::ChainVerifier;
