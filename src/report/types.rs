use std::fmt;

use crate::diff::{IntegrityWarning, MalformedPatch};
use crate::review::validate::Rejected;
use crate::review::ReviewComment;

/// How a review run ended. Every variant is a normal end of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The PR had no files with a reviewable patch
    NoFiles,
    /// No proposed comment survived validation
    NothingToSubmit,
    /// Posting was skipped on request
    DryRun { comments: usize },
    Submitted { comments: usize },
    /// The single review failed and only some per-file reviews went through
    PartiallySubmitted { posted: usize, failed: usize },
    SubmissionFailed { reason: String },
}

impl RunOutcome {
    /// Whether the run left the PR without any of the comments it meant to post.
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::SubmissionFailed { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NoFiles => write!(f, "no files to review"),
            RunOutcome::NothingToSubmit => write!(f, "nothing to submit"),
            RunOutcome::DryRun { comments } => {
                write!(f, "dry run: {} comment(s) not posted", comments)
            }
            RunOutcome::Submitted { comments } => write!(f, "posted {} comment(s)", comments),
            RunOutcome::PartiallySubmitted { posted, failed } => write!(
                f,
                "partially posted: {} comment(s) posted, {} failed",
                posted, failed
            ),
            RunOutcome::SubmissionFailed { reason } => write!(f, "submission failed: {}", reason),
        }
    }
}

/// Why a changed file was left out of the review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Binary or oversized file: the listing carries no patch
    NoPatch,
    Malformed(MalformedPatch),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoPatch => write!(f, "no patch available"),
            SkipReason::Malformed(err) => write!(f, "{}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIntegrity {
    pub filename: String,
    pub warning: IntegrityWarning,
}

/// Result of posting one file's comments after the single review failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePosting {
    pub path: String,
    pub comments: usize,
    /// GitHub's error message when the post failed
    pub error: Option<String>,
}

/// Everything a review run did, for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// owner/repo#number
    pub pr: String,
    pub files_fetched: usize,
    pub files_reviewed: usize,
    pub skipped: Vec<SkippedFile>,
    pub integrity: Vec<FileIntegrity>,
    pub accepted: Vec<ReviewComment>,
    pub rejected: Vec<Rejected>,
    /// Per-file fallback results; empty when the single review succeeded
    pub postings: Vec<FilePosting>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn new(pr: String) -> Self {
        Self {
            pr,
            files_fetched: 0,
            files_reviewed: 0,
            skipped: Vec::new(),
            integrity: Vec::new(),
            accepted: Vec::new(),
            rejected: Vec::new(),
            postings: Vec::new(),
            outcome: RunOutcome::NoFiles,
        }
    }
}
