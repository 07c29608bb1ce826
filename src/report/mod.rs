pub mod types;

use types::{RunOutcome, RunReport};

use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(pr = %report.pr, outcome = %report.outcome))]
pub fn output(report: &RunReport, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(report, path)
        }
    }
}

/// Print the run summary to stdout:
///
/// Review of org/repo#42
/// Files fetched: 3 | Reviewed: 2 | Skipped: 1
///
/// ═══ Accepted comments (2) ═══
///   • src/auth/session.rs:11 Pass a user id instead of the name
///
/// ═══ Outcome: posted 2 comment(s) ═══
fn print_terminal_report(report: &RunReport) {
    println!();
    println!("Review of {}", report.pr);
    println!(
        "Files fetched: {} | Reviewed: {} | Skipped: {}",
        report.files_fetched,
        report.files_reviewed,
        report.skipped.len()
    );
    println!();

    if !report.skipped.is_empty() {
        println!("═══ Skipped files ═══");
        for skipped in &report.skipped {
            println!("  • {} ({})", skipped.filename, skipped.reason);
        }
        println!();
    }

    if !report.integrity.is_empty() {
        println!("═══ Integrity warnings ═══");
        for note in &report.integrity {
            println!("  • {}: {}", note.filename, note.warning.to_string().yellow());
        }
        println!();
    }

    println!("═══ Accepted comments ({}) ═══", report.accepted.len());
    for comment in &report.accepted {
        println!("  • {}:{} {}", comment.path, comment.line, first_line(&comment.body));
    }
    println!();

    if !report.rejected.is_empty() {
        println!("═══ Rejected comments ({}) ═══", report.rejected.len());
        for rejected in &report.rejected {
            println!(
                "  • {}:{} {}",
                rejected.comment.path,
                rejected.comment.line,
                rejected.reason.to_string().yellow()
            );
        }
        println!();
    }

    for posting in &report.postings {
        match &posting.error {
            None => println!(
                "  {} {} ({} comment(s))",
                "posted".green(),
                posting.path,
                posting.comments
            ),
            Some(err) => println!("  {} {}: {}", "failed".red(), posting.path, err),
        }
    }

    println!("═══ Outcome: {} ═══", colorize_outcome(&report.outcome));
    println!();
}

/// Write the report as a markdown file.
fn write_markdown_report(report: &RunReport, path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, render_markdown(report))?;
    Ok(())
}

fn render_markdown(report: &RunReport) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Review of {}\n", report.pr);
    let _ = writeln!(
        md,
        "**Files fetched:** {} | **Reviewed:** {} | **Skipped:** {}\n",
        report.files_fetched,
        report.files_reviewed,
        report.skipped.len()
    );

    if !report.skipped.is_empty() {
        md.push_str("## Skipped files\n\n");
        for skipped in &report.skipped {
            let _ = writeln!(md, "- `{}`: {}", skipped.filename, skipped.reason);
        }
        md.push('\n');
    }

    if !report.integrity.is_empty() {
        md.push_str("## Integrity warnings\n\n");
        for note in &report.integrity {
            let _ = writeln!(md, "- `{}`: {}", note.filename, note.warning);
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## Accepted comments ({})\n", report.accepted.len());
    if report.accepted.is_empty() {
        md.push_str("None.\n\n");
    } else {
        for comment in &report.accepted {
            let body = first_line(&comment.body);
            let _ = writeln!(md, "- `{}:{}` {}", comment.path, comment.line, body);
        }
        md.push('\n');
    }

    if !report.rejected.is_empty() {
        let _ = writeln!(md, "## Rejected comments ({})\n", report.rejected.len());
        for rejected in &report.rejected {
            let _ = writeln!(
                md,
                "- `{}:{}` **{}**",
                rejected.comment.path, rejected.comment.line, rejected.reason
            );
        }
        md.push('\n');
    }

    if !report.postings.is_empty() {
        md.push_str("## Per-file postings\n\n");
        for posting in &report.postings {
            match &posting.error {
                None => {
                    let _ = writeln!(
                        md,
                        "- `{}`: posted {} comment(s)",
                        posting.path, posting.comments
                    );
                }
                Some(err) => {
                    let _ = writeln!(md, "- `{}`: failed ({})", posting.path, err);
                }
            }
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## Outcome: {}", report.outcome);
    md
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or_default()
}

fn colorize_outcome(outcome: &RunOutcome) -> colored::ColoredString {
    let text = outcome.to_string();
    match outcome {
        RunOutcome::Submitted { .. } => text.green().bold(),
        RunOutcome::SubmissionFailed { .. } => text.red().bold(),
        RunOutcome::PartiallySubmitted { .. } => text.yellow().bold(),
        RunOutcome::NoFiles | RunOutcome::NothingToSubmit | RunOutcome::DryRun { .. } => {
            text.normal()
        }
    }
}
