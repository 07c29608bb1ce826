pub mod types;

pub use types::{ChangedFile, PrUrl};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::review::submission::CommentPayload;

/// GitHub caps the files listing at 3000 entries.
const PER_PAGE: u32 = 100;
const MAX_PAGES: u32 = 30;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("No PR given: pass a PR URL or set GITHUB_REPO and PR_NUMBER")]
    MissingTarget,

    #[error("GitHub token not found in config or environment")]
    MissingToken,
}

/// The two calls a review run makes against the code host.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Changed files of the PR with their hunks-only patches.
    async fn fetch_files(&self, pr: &PrUrl) -> Result<Vec<ChangedFile>, PrError>;

    /// Post one review carrying the given inline comments.
    async fn post_review(
        &self,
        pr: &PrUrl,
        summary: &str,
        comments: &[CommentPayload],
    ) -> Result<(), PrError>;
}

/// Parse a GitHub PR URL into its component parts.
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Resolve the PR from `GITHUB_REPO` (`owner/repo`) and `PR_NUMBER`,
/// the way CI jobs usually provide it.
pub fn target_from_env() -> Result<PrUrl, PrError> {
    target_from_vars(
        std::env::var("GITHUB_REPO").ok(),
        std::env::var("PR_NUMBER").ok(),
    )
}

fn target_from_vars(repo: Option<String>, number: Option<String>) -> Result<PrUrl, PrError> {
    let (repo, number) = match (repo, number) {
        (Some(repo), Some(number)) => (repo, number),
        _ => return Err(PrError::MissingTarget),
    };
    let invalid = || PrError::InvalidUrl(format!("{}#{}", repo, number));

    let (owner, name) = repo.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return Err(invalid());
    }
    let pr_number = number.trim().parse::<u64>().map_err(|_| invalid())?;

    Ok(PrUrl {
        owner: owner.to_string(),
        repo: name.to_string(),
        pr_number,
    })
}

#[derive(Serialize)]
struct ReviewRequest<'a> {
    body: &'a str,
    event: &'static str,
    comments: &'a [CommentPayload],
}

/// REST client for api.github.com (or a GitHub Enterprise base URL).
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl GitHubClient {
    pub fn from_config(config: &Config) -> Result<Self, PrError> {
        let token = config.github_token().ok_or(PrError::MissingToken)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_base: config.github.api_base().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn pull_url(&self, pr: &PrUrl, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}/{}",
            self.api_base, pr.owner, pr.repo, pr.pr_number, tail
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("User-Agent", "pr-inline-reviewer")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
    }
}

/// Turn a non-2xx response into an error that keeps GitHub's message.
async fn check_status(response: Response) -> Result<Response, PrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PrError::ApiStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CodeHost for GitHubClient {
    #[instrument(skip_all, fields(pr = %pr))]
    async fn fetch_files(&self, pr: &PrUrl) -> Result<Vec<ChangedFile>, PrError> {
        let url = self.pull_url(pr, "files");
        let mut files = Vec::new();

        for page in 1..=MAX_PAGES {
            debug!(page, "fetching PR files page");
            let response = self
                .request(Method::GET, &url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            let batch: Vec<ChangedFile> = check_status(response).await?.json().await?;
            let last_page = batch.len() < PER_PAGE as usize;
            files.extend(batch);
            if last_page {
                break;
            }
        }

        debug!(files = files.len(), "received PR files");
        Ok(files)
    }

    #[instrument(skip_all, fields(pr = %pr, comments = comments.len()))]
    async fn post_review(
        &self,
        pr: &PrUrl,
        summary: &str,
        comments: &[CommentPayload],
    ) -> Result<(), PrError> {
        let request = ReviewRequest {
            body: summary,
            event: "COMMENT",
            comments,
        };
        let response = self
            .request(Method::POST, &self.pull_url(pr, "reviews"))
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        debug!("review posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_pr_url() {
        let url = parse_pr_url("https://github.com/org/repo/pull/42").unwrap();
        assert_eq!(url.owner, "org");
        assert_eq!(url.repo, "repo");
        assert_eq!(url.pr_number, 42);
    }

    #[test]
    fn test_parse_invalid_pr_url() {
        assert!(parse_pr_url("https://example.com").is_err());
        assert!(parse_pr_url("not-a-url").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pulls/42").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pull/abc").is_err());
    }

    #[test]
    fn test_target_from_vars() {
        let pr = target_from_vars(Some("org/repo".to_string()), Some("7".to_string())).unwrap();
        assert_eq!(pr.to_string(), "org/repo#7");
    }

    #[test]
    fn test_target_from_vars_missing_or_invalid() {
        assert!(matches!(
            target_from_vars(None, Some("7".to_string())),
            Err(PrError::MissingTarget)
        ));
        assert!(matches!(
            target_from_vars(Some("repo".to_string()), Some("7".to_string())),
            Err(PrError::InvalidUrl(_))
        ));
        assert!(matches!(
            target_from_vars(Some("org/repo".to_string()), Some("seven".to_string())),
            Err(PrError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_review_request_shape() {
        let comments = vec![CommentPayload {
            path: "a.rs".to_string(),
            line: 3,
            body: "nit".to_string(),
        }];
        let request = ReviewRequest {
            body: "AI Code Review",
            event: "COMMENT",
            comments: &comments,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["event"], "COMMENT");
        assert_eq!(json["body"], "AI Code Review");
        assert_eq!(json["comments"][0]["line"], 3);
    }

    #[test]
    fn test_client_pull_url_uses_api_base() {
        let mut config = Config::default();
        config.github.token = Some("t0ken".to_string());
        config.github.api_base = Some("https://ghe.example.com/api/v3/".to_string());
        let client = GitHubClient::from_config(&config).unwrap();
        let pr = PrUrl {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 5,
        };
        assert_eq!(
            client.pull_url(&pr, "files"),
            "https://ghe.example.com/api/v3/repos/org/repo/pulls/5/files"
        );
    }
}
