//! Commit range and verification result data structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier of a commit, as printed by `git rev-list`.
///
/// Values are only produced by enumerating a [`CommitRange`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub(crate) fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reference range to verify: commits reachable from `to` but not from `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRange {
    /// Exclusive start (tag, branch, or hash).
    pub from: String,
    /// Inclusive end.
    pub to: String,
}

impl CommitRange {
    /// Default end of a range when none is given.
    pub const HEAD: &'static str = "HEAD";

    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Range from `from` up to the current `HEAD`.
    pub fn to_head(from: impl Into<String>) -> Self {
        Self::new(from, Self::HEAD)
    }

    /// The revision expression understood by `git rev-list`.
    pub fn revision(&self) -> String {
        format!("{}..{}", self.from, self.to)
    }
}

impl fmt::Display for CommitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// Ordered set of public key files to import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySource {
    files: Vec<PathBuf>,
}

impl KeySource {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<PathBuf> for KeySource {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Result of verifying a chain of commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Every commit in the range carries a trusted signature.
    AllVerified,
    /// The earliest commit, in range order, that failed verification.
    FirstBadCommit {
        commit: CommitId,
        /// Raw output of the failed individual check.
        diagnostic: String,
    },
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::AllVerified)
    }

    /// Convert a bad commit into [`crate::ChainError::CommitVerification`].
    pub fn into_result(self) -> Result<(), crate::ChainError> {
        match self {
            VerificationOutcome::AllVerified => Ok(()),
            VerificationOutcome::FirstBadCommit { commit, diagnostic } => {
                Err(crate::ChainError::CommitVerification { commit, diagnostic })
            }
        }
    }
}

/// Where trust for a run comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrustSource {
    /// A fresh keyring built from key files in a directory.
    Files { dir: PathBuf, imported: usize },
    /// An existing keyring used as is.
    Keyring { home: PathBuf },
}

impl TrustSource {
    pub fn path(&self) -> &Path {
        match self {
            TrustSource::Files { dir, .. } => dir,
            TrustSource::Keyring { home } => home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_revision() {
        let range = CommitRange::new("v0.12.0-beta.1", "v0.12.0-beta.2");
        assert_eq!(range.revision(), "v0.12.0-beta.1..v0.12.0-beta.2");
        assert_eq!(CommitRange::to_head("v1").to, "HEAD");
    }

    #[test]
    fn test_outcome_into_result() {
        assert!(VerificationOutcome::AllVerified.into_result().is_ok());

        let bad = VerificationOutcome::FirstBadCommit {
            commit: CommitId::new("1ed5e545385e160fe3b61e6dbbcaa8a701437b62"),
            diagnostic: "gpg: Can't check signature: No public key".to_string(),
        };
        let err = bad.into_result().unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to verify commit \"1ed5e545385e160fe3b61e6dbbcaa8a701437b62\""));
    }

    #[test]
    fn test_outcome_json_shape() {
        let bad = VerificationOutcome::FirstBadCommit {
            commit: CommitId::new("abc"),
            diagnostic: "no key".to_string(),
        };
        let json = serde_json::to_value(&bad).unwrap();
        assert_eq!(json["status"], "first_bad_commit");
        assert_eq!(json["commit"], "abc");

        let ok = serde_json::to_value(VerificationOutcome::AllVerified).unwrap();
        assert_eq!(ok["status"], "all_verified");
    }
}
