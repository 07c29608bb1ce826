use serde::Deserialize;
use std::fmt;

/// One entry of the GitHub "list pull request files" response.
/// Fields the reviewer does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    /// File path (e.g., "src/auth/session.rs")
    pub filename: String,
    /// added, modified, removed, renamed, ...
    #[serde(default)]
    pub status: String,
    /// Hunks-only unified diff. Absent for binary files and very large diffs.
    #[serde(default)]
    pub patch: Option<String>,
}

impl ChangedFile {
    /// The patch text, when there is one to review.
    pub fn reviewable_patch(&self) -> Option<&str> {
        self.patch.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl fmt::Display for PrUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pr_number)
    }
}
