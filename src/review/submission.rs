use serde::Serialize;

use super::ReviewComment;

/// One inline comment in the shape the review endpoint accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentPayload {
    pub path: String,
    pub line: usize,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// No accepted comments; the poster must not be called.
    NothingToSubmit,
    Ready(Vec<CommentPayload>),
}

/// Flatten accepted comments into the posting payload, preserving order.
pub fn format_submission(accepted: &[ReviewComment]) -> Submission {
    if accepted.is_empty() {
        return Submission::NothingToSubmit;
    }

    Submission::Ready(
        accepted
            .iter()
            .map(|c| CommentPayload {
                path: c.path.clone(),
                line: c.line,
                body: c.body.clone(),
            })
            .collect(),
    )
}

/// Split a payload into per-file batches, files in first-appearance order.
pub fn group_by_path(payload: &[CommentPayload]) -> Vec<(String, Vec<CommentPayload>)> {
    let mut groups: Vec<(String, Vec<CommentPayload>)> = Vec::new();
    for comment in payload {
        match groups.iter_mut().find(|(path, _)| *path == comment.path) {
            Some((_, batch)) => batch.push(comment.clone()),
            None => groups.push((comment.path.clone(), vec![comment.clone()])),
        }
    }
    groups
}
