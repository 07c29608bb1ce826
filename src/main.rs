mod config;
mod diff;
mod pr;
mod report;
mod review;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use pr::{ChangedFile, CodeHost, GitHubClient, PrError, PrUrl};
use review::proposal::ReplySource;
use review::submission::CommentPayload;
use review::{ModelReply, RunOptions};

const MOCK_FILES: &str = include_str!("../tests/fixtures/pr_files.json");
const MOCK_REPLY: &str = include_str!("../tests/fixtures/model_reply.md");

/// PR Inline Reviewer: checks model-proposed review comments against the
/// lines a GitHub Pull Request actually adds, then posts the valid ones inline.
#[derive(Parser, Debug)]
#[command(name = "pr-inline-reviewer", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print review instructions and the PR's patches annotated with new-file line numbers
    Prompt {
        /// GitHub Pull Request URL. Falls back to GITHUB_REPO and PR_NUMBER.
        pr_url: Option<String>,

        /// Use built-in mock PR files (no GitHub token needed)
        #[arg(long)]
        r#mock: bool,
    },

    /// Validate a model's proposed comments and post the valid ones as a review
    Review {
        /// GitHub Pull Request URL. Falls back to GITHUB_REPO and PR_NUMBER.
        pr_url: Option<String>,

        /// File holding the model reply, or `-` for stdin
        #[arg(short, long)]
        comments: Option<String>,

        /// Use built-in mock PR files and reply; nothing is sent to GitHub
        #[arg(long)]
        r#mock: bool,

        /// Validate and report without posting
        #[arg(long)]
        dry_run: bool,

        /// Optional output file path for a markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;

    match cli.command {
        Command::Prompt { pr_url, r#mock } => {
            let (target, host) = connect(pr_url.as_deref(), r#mock, &config)?;
            let span = info_span!("prompt", pr = %target);
            let files = host.fetch_files(&target).instrument(span).await?;
            let prepared = review::run::prepare_patches(&files);
            debug!(
                reviewable = prepared.patches.len(),
                skipped = prepared.skipped.len(),
                "prepared patches"
            );
            print!("{}", review::prompt::render(&prepared.patches));
        }
        Command::Review {
            pr_url,
            comments,
            r#mock,
            dry_run,
            output,
        } => {
            let (target, host) = connect(pr_url.as_deref(), r#mock, &config)?;
            let proposer = match (comments.as_deref(), r#mock) {
                (Some(arg), _) => ModelReply::from_arg(arg),
                (None, true) => ModelReply::new(ReplySource::Text(MOCK_REPLY.to_string())),
                (None, false) => {
                    return Err("--comments is required unless --mock is used. \
                                Usage: pr-inline-reviewer review <URL> --comments reply.json"
                        .into())
                }
            };
            let options = RunOptions {
                summary: config.review.summary().to_string(),
                dry_run,
            };

            let span = info_span!("review", pr = %target, dry_run);
            let run_report = review::run_review(&target, host.as_ref(), &proposer, &options)
                .instrument(span)
                .await?;

            report::output(&run_report, output.as_deref())?;
            if run_report.outcome.is_failure() {
                warn!(outcome = %run_report.outcome, "no comments were posted");
            } else {
                info!(outcome = %run_report.outcome, "done");
            }
        }
    }

    Ok(())
}

/// Resolve the PR and the host to talk to. Mock mode never needs a token.
fn connect(
    pr_url: Option<&str>,
    mock: bool,
    config: &config::Config,
) -> Result<(PrUrl, Box<dyn CodeHost>), PrError> {
    if mock {
        info!("using mock PR data for demo");
        let target = match pr_url {
            Some(url) => pr::parse_pr_url(url)?,
            None => PrUrl {
                owner: "acme".to_string(),
                repo: "webapp".to_string(),
                pr_number: 42,
            },
        };
        let host: Box<dyn CodeHost> = Box::new(FixtureHost);
        return Ok((target, host));
    }

    let target = match pr_url {
        Some(url) => pr::parse_pr_url(url)?,
        None => pr::target_from_env()?,
    };
    debug!(owner = %target.owner, repo = %target.repo, pr = target.pr_number, "resolved PR");
    let host: Box<dyn CodeHost> = Box::new(GitHubClient::from_config(config)?);
    Ok((target, host))
}

/// Serves the embedded files listing and logs posts instead of sending them.
struct FixtureHost;

#[async_trait]
impl CodeHost for FixtureHost {
    async fn fetch_files(&self, _pr: &PrUrl) -> Result<Vec<ChangedFile>, PrError> {
        serde_json::from_str(MOCK_FILES).map_err(|e| PrError::ApiStatus {
            status: 200,
            body: format!("invalid mock fixture: {}", e),
        })
    }

    async fn post_review(
        &self,
        pr: &PrUrl,
        summary: &str,
        comments: &[CommentPayload],
    ) -> Result<(), PrError> {
        info!(%pr, %summary, comments = comments.len(), "mock mode, review not sent");
        Ok(())
    }
}
