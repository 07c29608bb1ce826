use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::ReviewComment;
use crate::diff::FilePatch;

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("Failed to read model reply: {0}")]
    Read(#[from] std::io::Error),

    #[error("Model reply is not a list of {{path, line, body}} comments: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can propose inline comments for a set of patches.
///
/// Proposed line numbers are not trusted; every candidate is re-checked
/// against the diff before it is posted.
#[async_trait]
pub trait ReviewProposer: Send + Sync {
    fn name(&self) -> &str;

    async fn propose(&self, files: &[FilePatch]) -> Result<Vec<ReviewComment>, ProposalError>;
}

/// Where a model's reply text comes from.
#[derive(Debug, Clone)]
pub enum ReplySource {
    File(PathBuf),
    Stdin,
    Text(String),
}

/// Proposer backed by a reply a model has already produced, e.g. from
/// running the output of `prompt` through an LLM.
#[derive(Debug, Clone)]
pub struct ModelReply {
    source: ReplySource,
}

impl ModelReply {
    pub fn new(source: ReplySource) -> Self {
        Self { source }
    }

    /// `-` reads from stdin, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::new(ReplySource::Stdin)
        } else {
            Self::new(ReplySource::File(PathBuf::from(arg)))
        }
    }

    async fn read(&self) -> Result<String, ProposalError> {
        match &self.source {
            ReplySource::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            ReplySource::Stdin => {
                let mut raw = String::new();
                tokio::io::stdin().read_to_string(&mut raw).await?;
                Ok(raw)
            }
            ReplySource::Text(text) => Ok(text.clone()),
        }
    }
}

#[async_trait]
impl ReviewProposer for ModelReply {
    fn name(&self) -> &str {
        "model reply"
    }

    async fn propose(&self, files: &[FilePatch]) -> Result<Vec<ReviewComment>, ProposalError> {
        let raw = self.read().await?;
        debug!(bytes = raw.len(), files = files.len(), "read model reply");
        parse_reply(&raw)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply {
    List(Vec<ReviewComment>),
    Wrapped { comments: Vec<ReviewComment> },
}

/// Parse a reply that is either `[{path, line, body}, ...]` or
/// `{"comments": [...]}`, optionally wrapped in a markdown code fence.
pub fn parse_reply(raw: &str) -> Result<Vec<ReviewComment>, ProposalError> {
    let reply: Reply = serde_json::from_str(strip_markdown_fences(raw))?;
    Ok(match reply {
        Reply::List(comments) | Reply::Wrapped { comments } => comments,
    })
}

/// Inner content of a ```` ```json ... ``` ```` fence, or the trimmed input when unfenced.
fn strip_markdown_fences(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening fence line
    let Some((_, body)) = rest.split_once('\n') else {
        return "";
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
