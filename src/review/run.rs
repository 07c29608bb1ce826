use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::proposal::{ProposalError, ReviewProposer};
use super::submission::{format_submission, group_by_path, Submission};
use super::validate::validate;
use crate::diff::FilePatch;
use crate::pr::{ChangedFile, CodeHost, PrError, PrUrl};
use crate::report::types::{
    FileIntegrity, FilePosting, RunOutcome, RunReport, SkipReason, SkippedFile,
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to fetch PR files: {0}")]
    Fetch(#[from] PrError),

    #[error("Review proposer failed: {0}")]
    Proposal(#[from] ProposalError),
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Body of the posted review
    pub summary: String,
    /// Validate and report, but never call the poster
    pub dry_run: bool,
}

/// Parsed patches of the reviewable files, plus what was left out.
#[derive(Debug, Default)]
pub struct Prepared {
    pub patches: Vec<FilePatch>,
    pub skipped: Vec<SkippedFile>,
    pub integrity: Vec<FileIntegrity>,
}

/// Parse every changed file's patch independently. A file without a patch or
/// with a malformed one is skipped; the others are unaffected.
pub fn prepare_patches(files: &[ChangedFile]) -> Prepared {
    let mut prepared = Prepared::default();

    for file in files {
        let Some(patch) = file.reviewable_patch() else {
            info!(file = %file.filename, status = %file.status, "skipping file without patch");
            prepared.skipped.push(SkippedFile {
                filename: file.filename.clone(),
                reason: SkipReason::NoPatch,
            });
            continue;
        };

        match FilePatch::parse(&file.filename, patch) {
            Ok(parsed) => {
                debug!(
                    file = %file.filename,
                    hunks = parsed.hunks.len(),
                    added = parsed.line_index().added_lines().count(),
                    "parsed patch"
                );
                for warning in parsed.integrity_warnings() {
                    warn!(file = %file.filename, %warning, "hunk counts disagree with header");
                    prepared.integrity.push(FileIntegrity {
                        filename: file.filename.clone(),
                        warning,
                    });
                }
                prepared.patches.push(parsed);
            }
            Err(err) => {
                warn!(file = %file.filename, error = %err, "skipping file with malformed patch");
                prepared.skipped.push(SkippedFile {
                    filename: file.filename.clone(),
                    reason: SkipReason::Malformed(err),
                });
            }
        }
    }

    prepared
}

/// Review one PR: fetch, parse, propose, validate, then post what survives.
///
/// Only a failed fetch or a failed proposer ends the run with an error.
/// Skipped files, rejected comments and posting failures are all recorded in
/// the returned report.
#[instrument(skip_all, fields(pr = %pr, proposer = proposer.name()))]
pub async fn run_review(
    pr: &PrUrl,
    host: &dyn CodeHost,
    proposer: &dyn ReviewProposer,
    options: &RunOptions,
) -> Result<RunReport, RunError> {
    let mut report = RunReport::new(pr.to_string());

    let files = host.fetch_files(pr).await?;
    report.files_fetched = files.len();
    info!(files = files.len(), "fetched PR files");

    let prepared = prepare_patches(&files);
    report.skipped = prepared.skipped;
    report.integrity = prepared.integrity;
    report.files_reviewed = prepared.patches.len();
    if prepared.patches.is_empty() {
        info!("no files to review");
        report.outcome = RunOutcome::NoFiles;
        return Ok(report);
    }

    let candidates = proposer.propose(&prepared.patches).await?;
    info!(candidates = candidates.len(), "received proposed comments");

    let patches: HashMap<String, FilePatch> = prepared
        .patches
        .into_iter()
        .map(|p| (p.filename.clone(), p))
        .collect();
    let validation = validate(candidates, &patches);
    for rejected in &validation.rejected {
        warn!(
            path = %rejected.comment.path,
            line = rejected.comment.line,
            reason = %rejected.reason,
            "dropping proposed comment"
        );
    }
    report.accepted = validation.accepted;
    report.rejected = validation.rejected;

    let payload = match format_submission(&report.accepted) {
        Submission::NothingToSubmit => {
            info!("nothing to submit");
            report.outcome = RunOutcome::NothingToSubmit;
            return Ok(report);
        }
        Submission::Ready(payload) => payload,
    };

    if options.dry_run {
        info!(comments = payload.len(), "dry run, not posting");
        report.outcome = RunOutcome::DryRun {
            comments: payload.len(),
        };
        return Ok(report);
    }

    let first_error = match host.post_review(pr, &options.summary, &payload).await {
        Ok(()) => {
            info!(comments = payload.len(), "review posted");
            report.outcome = RunOutcome::Submitted {
                comments: payload.len(),
            };
            return Ok(report);
        }
        Err(err) => err,
    };
    warn!(error = %first_error, "posting review failed, retrying per file");

    let mut posted = 0;
    let mut failed = 0;
    for (path, batch) in group_by_path(&payload) {
        let error = match host.post_review(pr, &options.summary, &batch).await {
            Ok(()) => {
                posted += batch.len();
                None
            }
            Err(err) => {
                warn!(%path, error = %err, "posting file comments failed");
                failed += batch.len();
                Some(err.to_string())
            }
        };
        report.postings.push(FilePosting {
            path,
            comments: batch.len(),
            error,
        });
    }

    report.outcome = match (posted, failed) {
        (_, 0) => RunOutcome::Submitted { comments: posted },
        (0, _) => RunOutcome::SubmissionFailed {
            reason: first_error.to_string(),
        },
        _ => RunOutcome::PartiallySubmitted { posted, failed },
    };
    Ok(report)
}
