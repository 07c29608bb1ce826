use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use super::ReviewComment;
use crate::diff::{FilePatch, LineIndex};

/// Where a rejected line sits relative to the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePosition {
    /// Present in the new file but unchanged
    Context,
    /// Removed-only, or not covered by any hunk
    OutsideDiff,
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinePosition::Context => write!(f, "an unchanged context line"),
            LinePosition::OutsideDiff => write!(f, "not part of the diff"),
        }
    }
}

/// Why a single proposed comment was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("no patch for file {path}")]
    UnknownFile { path: String },

    #[error("line {line} is {position}, not an added line")]
    LineNotAdded { line: usize, position: LinePosition },

    #[error("comment body is empty")]
    EmptyBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub comment: ReviewComment,
    pub reason: RejectReason,
}

/// Outcome of validating a batch of proposed comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub accepted: Vec<ReviewComment>,
    pub rejected: Vec<Rejected>,
}

/// Check every comment against the patch of the file it targets.
///
/// A failure rejects only that comment; accepted comments keep their order
/// and pass through unchanged.
pub fn validate(comments: Vec<ReviewComment>, patches: &HashMap<String, FilePatch>) -> Validation {
    let indexes: HashMap<&str, LineIndex<'_>> = patches
        .iter()
        .map(|(name, patch)| (name.as_str(), patch.line_index()))
        .collect();

    let mut validation = Validation::default();
    for comment in comments {
        match check(&comment, &indexes) {
            Ok(()) => validation.accepted.push(comment),
            Err(reason) => validation.rejected.push(Rejected { comment, reason }),
        }
    }
    validation
}

fn check(
    comment: &ReviewComment,
    indexes: &HashMap<&str, LineIndex<'_>>,
) -> Result<(), RejectReason> {
    let index = indexes
        .get(comment.path.as_str())
        .ok_or_else(|| RejectReason::UnknownFile {
            path: comment.path.clone(),
        })?;

    if index.added(comment.line).is_none() {
        let position = match index.new_file(comment.line) {
            Some(_) => LinePosition::Context,
            None => LinePosition::OutsideDiff,
        };
        return Err(RejectReason::LineNotAdded {
            line: comment.line,
            position,
        });
    }

    if comment.body.trim().is_empty() {
        return Err(RejectReason::EmptyBody);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Added lines at 4 and 6; 5 is context, old line 5 is removed.
    const PATCH: &str = "@@ -3,3 +3,4 @@\n context3\n+added4\n context5\n-removed\n+added6";

    fn patches() -> HashMap<String, FilePatch> {
        let patch = FilePatch::parse("src/order.cs", PATCH).unwrap();
        HashMap::from([(patch.filename.clone(), patch)])
    }

    #[test]
    fn test_context_line_rejected_added_line_accepted() {
        let comments = vec![
            ReviewComment::new("src/order.cs", 5, "Rename this"),
            ReviewComment::new("src/order.cs", 6, "Use a StringBuilder"),
        ];
        let result = validate(comments, &patches());

        assert_eq!(
            result.accepted,
            vec![ReviewComment::new("src/order.cs", 6, "Use a StringBuilder")]
        );
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].comment.line, 5);
        assert_eq!(
            result.rejected[0].reason,
            RejectReason::LineNotAdded {
                line: 5,
                position: LinePosition::Context
            }
        );
    }

    #[test]
    fn test_nonexistent_line_rejected() {
        let result = validate(vec![ReviewComment::new("src/order.cs", 40, "Hmm")], &patches());
        assert!(result.accepted.is_empty());
        assert_eq!(
            result.rejected[0].reason,
            RejectReason::LineNotAdded {
                line: 40,
                position: LinePosition::OutsideDiff
            }
        );
        assert_eq!(
            result.rejected[0].reason.to_string(),
            "line 40 is not part of the diff, not an added line"
        );
    }

    #[test]
    fn test_removed_only_line_rejected() {
        let patch = FilePatch::parse("src/order.cs", "@@ -1,2 +1,1 @@\n a\n-b").unwrap();
        let patches = HashMap::from([(patch.filename.clone(), patch)]);
        let comments = vec![ReviewComment::new("src/order.cs", 2, "Why remove this?")];
        let result = validate(comments, &patches);

        assert!(result.accepted.is_empty());
        assert_eq!(
            result.rejected[0].reason,
            RejectReason::LineNotAdded {
                line: 2,
                position: LinePosition::OutsideDiff
            }
        );
    }

    #[test]
    fn test_unknown_file_rejected() {
        let result = validate(vec![ReviewComment::new("src/other.cs", 4, "Hmm")], &patches());
        assert_eq!(
            result.rejected[0].reason,
            RejectReason::UnknownFile {
                path: "src/other.cs".to_string()
            }
        );
    }

    #[test]
    fn test_blank_body_rejected() {
        let result = validate(vec![ReviewComment::new("src/order.cs", 4, " \n\t ")], &patches());
        assert_eq!(result.rejected[0].reason, RejectReason::EmptyBody);
    }

    #[test]
    fn test_mixed_batch_keeps_order() {
        let comments = vec![
            ReviewComment::new("src/order.cs", 6, "second"),
            ReviewComment::new("src/order.cs", 3, "context"),
            ReviewComment::new("src/order.cs", 4, "first"),
        ];
        let result = validate(comments, &patches());
        let bodies: Vec<&str> = result.accepted.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["second", "first"]);
        assert_eq!(result.rejected.len(), 1);
    }

    #[test]
    fn test_no_patches_rejects_everything() {
        let result = validate(vec![ReviewComment::new("a.rs", 1, "x")], &HashMap::new());
        assert!(result.accepted.is_empty());
        assert_eq!(result.rejected.len(), 1);
    }
}
