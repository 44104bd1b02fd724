//! Summary of a completed verification run.

use crate::types::{CommitRange, TrustSource, VerificationOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a caller needs to report on one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub repo: PathBuf,
    pub range: CommitRange,
    pub trust: TrustSource,
    /// Number of commits in the range.
    pub commits: usize,
    pub outcome: VerificationOutcome,
    pub checked_at: DateTime<Utc>,
}

impl VerificationReport {
    pub fn is_verified(&self) -> bool {
        self.outcome.is_verified()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
