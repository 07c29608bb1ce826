pub mod prompt;
pub mod proposal;
pub mod run;
pub mod submission;
pub mod validate;

pub use proposal::ModelReply;
pub use run::{run_review, RunOptions};

use serde::{Deserialize, Serialize};

/// An inline comment proposed for a file and new-file line.
/// Never repaired: a comment either passes validation as-is or is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub path: String,
    pub line: usize,
    pub body: String,
}

impl ReviewComment {
    pub fn new(path: &str, line: usize, body: &str) -> Self {
        Self {
            path: path.to_string(),
            line,
            body: body.to_string(),
        }
    }
}
