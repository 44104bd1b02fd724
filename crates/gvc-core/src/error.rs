//! Error taxonomy for chain verification.

use crate::exec::ProcessError;
use crate::types::{CommitId, CommitRange};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stage of a verification run, used to give process failures context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enumerate,
    Import,
    BulkAttempt,
    Diagnose,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Enumerate => "enumerate",
            Phase::Import => "import",
            Phase::BulkAttempt => "bulk verification",
            Phase::Diagnose => "diagnosis",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while verifying a commit chain.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    #[error("failed to resolve commit range {range}:\n{source}")]
    RangeResolution {
        range: CommitRange,
        #[source]
        source: ProcessError,
    },

    #[error("failed to resolve commit range {range}: unexpected rev-list output {line:?}")]
    MalformedRevList { range: CommitRange, line: String },

    #[error("failed to find key files in {}: {reason}", .dir.display())]
    KeyDiscovery { dir: PathBuf, reason: String },

    #[error("failed to import key file {}:\n{source}", .file.display())]
    Import {
        file: PathBuf,
        #[source]
        source: ProcessError,
    },

    #[error("failed to verify commit \"{commit}\":\n{diagnostic}")]
    CommitVerification { commit: CommitId, diagnostic: String },

    #[error("{phase} failed to run:\n{source}")]
    Process {
        phase: Phase,
        #[source]
        source: ProcessError,
    },

    #[error(
        "internal consistency fault: bulk verification of {commits} commits failed \
         but every commit verified individually"
    )]
    ConsistencyFault { commits: usize },

    #[error("{phase} cancelled")]
    Cancelled { phase: Phase },
}

impl ChainError {
    /// Wrap a process failure that happened during `phase`.
    pub(crate) fn process(phase: Phase, source: ProcessError) -> Self {
        match source {
            ProcessError::Cancelled { .. } => ChainError::Cancelled { phase },
            source => ChainError::Process { phase, source },
        }
    }

    /// True for failures detected before any commit was checked: bad paths,
    /// bad ranges, and unusable key material.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            ChainError::InvalidPath { .. }
                | ChainError::RangeResolution { .. }
                | ChainError::MalformedRevList { .. }
                | ChainError::KeyDiscovery { .. }
                | ChainError::Import { .. }
        )
    }

    /// The offending commit, for verification failures.
    pub fn commit(&self) -> Option<&CommitId> {
        match self {
            ChainError::CommitVerification { commit, .. } => Some(commit),
            _ => None,
        }
    }
}
