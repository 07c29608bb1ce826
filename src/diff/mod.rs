pub mod resolve;

pub use resolve::LineIndex;

use std::fmt;
use thiserror::Error;

/// A hunk header or line sequence that cannot be read as a unified diff.
/// The whole file's patch is unusable when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed patch at line {line}: {reason}")]
pub struct MalformedPatch {
    /// 1-based line of the patch text where parsing stopped
    pub line: usize,
    pub reason: String,
}

/// How a physical patch line relates to the old and new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Added,
    Removed,
    Context,
}

/// One physical line inside a hunk, with its diff marker stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine {
    pub kind: LineKind,
    /// Absolute 1-based line in the new file (Added and Context only)
    pub new_line: Option<usize>,
    /// Absolute 1-based line in the old file (Removed and Context only)
    pub old_line: Option<usize>,
    pub text: String,
}

/// A contiguous region of changes, headed by `@@ -old_start,old_count +new_start,new_count @@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<PatchLine>,
}

/// Declared hunk counts that disagree with the lines actually present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityWarning {
    /// 0-based position of the hunk within its file patch
    pub hunk: usize,
    pub declared_old: usize,
    pub actual_old: usize,
    pub declared_new: usize,
    pub actual_new: usize,
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hunk #{} declares -{} +{} but contains -{} +{}",
            self.hunk + 1,
            self.declared_old,
            self.declared_new,
            self.actual_old,
            self.actual_new
        )
    }
}

/// The parsed patch of a single changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    pub filename: String,
    pub hunks: Vec<Hunk>,
}

impl FilePatch {
    pub fn parse(filename: &str, patch: &str) -> Result<FilePatch, MalformedPatch> {
        Ok(FilePatch {
            filename: filename.to_string(),
            hunks: parse_patch(patch)?,
        })
    }

    /// Build the new-file line maps for this patch.
    pub fn line_index(&self) -> LineIndex<'_> {
        LineIndex::build(self)
    }

    pub fn integrity_warnings(&self) -> Vec<IntegrityWarning> {
        self.hunks
            .iter()
            .enumerate()
            .filter_map(|(i, hunk)| hunk.integrity(i))
            .collect()
    }
}

impl Hunk {
    /// Compare the walked lines against the header's declared counts.
    pub fn integrity(&self, position: usize) -> Option<IntegrityWarning> {
        let mut actual_old = 0;
        let mut actual_new = 0;
        for line in &self.lines {
            match line.kind {
                LineKind::Added => actual_new += 1,
                LineKind::Removed => actual_old += 1,
                LineKind::Context => {
                    actual_old += 1;
                    actual_new += 1;
                }
            }
        }

        if actual_old == self.old_count && actual_new == self.new_count {
            return None;
        }
        Some(IntegrityWarning {
            hunk: position,
            declared_old: self.old_count,
            actual_old,
            declared_new: self.new_count,
            actual_new,
        })
    }
}

/// Parse the hunks-only patch text of one file (the `patch` field of a PR
/// files listing) into hunks with absolute line numbers.
///
/// Lines are classified by their first character:
///   '+' added, '-' removed, anything else (space, empty line) context.
///
/// `\ No newline at end of file` markers are skipped. Declared hunk counts do
/// not drive the walk; see [`Hunk::integrity`].
pub fn parse_patch(patch: &str) -> Result<Vec<Hunk>, MalformedPatch> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut old_cursor = 0;
    let mut new_cursor = 0;

    for (i, line) in patch.lines().enumerate() {
        if line.starts_with("@@") {
            let (old_start, old_count, new_start, new_count) =
                parse_hunk_header(line).map_err(|reason| MalformedPatch { line: i + 1, reason })?;
            old_cursor = old_start;
            new_cursor = new_start;
            hunks.push(Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            });
            continue;
        }

        let Some(hunk) = hunks.last_mut() else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(MalformedPatch {
                line: i + 1,
                reason: "content before the first hunk header".to_string(),
            });
        };

        if line.starts_with('\\') {
            continue;
        }

        let overflow = || MalformedPatch {
            line: i + 1,
            reason: "line number overflow".to_string(),
        };
        let patch_line = if let Some(text) = line.strip_prefix('+') {
            let new_line = new_cursor;
            new_cursor = new_cursor.checked_add(1).ok_or_else(overflow)?;
            PatchLine {
                kind: LineKind::Added,
                new_line: Some(new_line),
                old_line: None,
                text: text.to_string(),
            }
        } else if let Some(text) = line.strip_prefix('-') {
            let old_line = old_cursor;
            old_cursor = old_cursor.checked_add(1).ok_or_else(overflow)?;
            PatchLine {
                kind: LineKind::Removed,
                new_line: None,
                old_line: Some(old_line),
                text: text.to_string(),
            }
        } else {
            let text = line.strip_prefix(' ').unwrap_or(line);
            let (old_line, new_line) = (old_cursor, new_cursor);
            old_cursor = old_cursor.checked_add(1).ok_or_else(overflow)?;
            new_cursor = new_cursor.checked_add(1).ok_or_else(overflow)?;
            PatchLine {
                kind: LineKind::Context,
                new_line: Some(new_line),
                old_line: Some(old_line),
                text: text.to_string(),
            }
        };
        hunk.lines.push(patch_line);
    }

    Ok(hunks)
}

fn parse_hunk_header(line: &str) -> Result<(usize, usize, usize, usize), String> {
    let header = line
        .strip_prefix("@@")
        .ok_or_else(|| format!("invalid hunk header `{}`", line))?;
    let mut parts = header.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| format!("missing old range in `{}`", line))?;
    let new_part = parts
        .next()
        .ok_or_else(|| format!("missing new range in `{}`", line))?;
    if parts.next() != Some("@@") {
        return Err(format!("missing closing @@ in `{}`", line));
    }

    let (old_start, old_count) = parse_range(old_part, '-')?;
    let (new_start, new_count) = parse_range(new_part, '+')?;

    Ok((old_start, old_count, new_start, new_count))
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize), String> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| format!("range `{}` must start with `{}`", part, prefix))?;
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| format!("invalid range start in `{}`", part))?;
    let count = count_str
        .parse::<usize>()
        .map_err(|_| format!("invalid range count in `{}`", part))?;
    Ok((start, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED_PATCH: &str = "@@ -5,2 +5,3 @@\n context1\n-removed1\n+added1\n context2";

    fn new_lines(hunk: &Hunk) -> Vec<usize> {
        hunk.lines.iter().filter_map(|l| l.new_line).collect()
    }

    #[test]
    fn test_new_file_patch_numbers_added_lines() {
        let hunks = parse_patch("@@ -0,0 +1,3 @@\n+a\n+b\n+c").unwrap();
        assert_eq!(hunks.len(), 1);
        let lines = &hunks[0].lines;
        assert!(lines.iter().all(|l| l.kind == LineKind::Added));
        assert_eq!(new_lines(&hunks[0]), vec![1, 2, 3]);
        assert_eq!(lines[2].text, "c");
        assert!(lines.iter().all(|l| l.old_line.is_none()));
    }

    #[test]
    fn test_mixed_hunk_line_numbers() {
        let hunks = parse_patch(MIXED_PATCH).unwrap();
        let lines = &hunks[0].lines;
        assert_eq!(lines.len(), 4);

        assert_eq!(lines[0].kind, LineKind::Context);
        assert_eq!(lines[0].text, "context1");
        assert_eq!((lines[0].new_line, lines[0].old_line), (Some(5), Some(5)));

        assert_eq!(lines[1].kind, LineKind::Removed);
        assert_eq!((lines[1].new_line, lines[1].old_line), (None, Some(6)));

        assert_eq!(lines[2].kind, LineKind::Added);
        assert_eq!(lines[2].text, "added1");
        assert_eq!((lines[2].new_line, lines[2].old_line), (Some(6), None));

        assert_eq!(lines[3].kind, LineKind::Context);
        assert_eq!((lines[3].new_line, lines[3].old_line), (Some(7), Some(6)));
    }

    #[test]
    fn test_declared_counts_match_walked_lines() {
        let hunks = parse_patch(MIXED_PATCH).unwrap();
        assert_eq!(hunks[0].integrity(0), None);
    }

    #[test]
    fn test_count_mismatch_is_reported() {
        let patch = FilePatch::parse("a.rs", "@@ -1,3 +1,3 @@\n one\n+two").unwrap();
        let warnings = patch.integrity_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].declared_new, 3);
        assert_eq!(warnings[0].actual_new, 2);
        assert_eq!(warnings[0].actual_old, 1);
        assert_eq!(
            warnings[0].to_string(),
            "hunk #1 declares -3 +3 but contains -1 +2"
        );
    }

    #[test]
    fn test_counts_default_to_one() {
        let hunks = parse_patch("@@ -3 +3 @@\n-old\n+new").unwrap();
        assert_eq!(hunks[0].old_count, 1);
        assert_eq!(hunks[0].new_count, 1);
        assert_eq!(hunks[0].integrity(0), None);
        assert_eq!(hunks[0].lines[1].new_line, Some(3));
    }

    #[test]
    fn test_header_with_section_heading() {
        let patch = "@@ -10,1 +10,2 @@ fn main() {\n     let x = 1;\n+    let y = 2;";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks[0].new_start, 10);
        assert_eq!(new_lines(&hunks[0]), vec![10, 11]);
        assert_eq!(hunks[0].lines[0].text, "    let x = 1;");
    }

    #[test]
    fn test_multiple_hunks_reset_cursors() {
        let patch = "@@ -1,2 +1,2 @@\n a\n-b\n+B\n@@ -20,2 +20,3 @@\n x\n+y\n z";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks.len(), 2);
        assert_eq!(new_lines(&hunks[0]), vec![1, 2]);
        assert_eq!(new_lines(&hunks[1]), vec![20, 21, 22]);
        assert_eq!(hunks[1].lines[2].old_line, Some(21));
    }

    #[test]
    fn test_new_lines_increase_by_one_from_new_start() {
        let patch = "@@ -4,5 +4,6 @@\n a\n-b\n-c\n+B\n+C\n+D\n d\n\n e";
        let hunks = parse_patch(patch).unwrap();
        let numbers = new_lines(&hunks[0]);
        assert_eq!(numbers.first(), Some(&hunks[0].new_start));
        assert!(numbers.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_empty_line_is_context() {
        let hunks = parse_patch("@@ -1,3 +1,3 @@\n a\n\n b").unwrap();
        let blank = &hunks[0].lines[1];
        assert_eq!(blank.kind, LineKind::Context);
        assert_eq!(blank.text, "");
        assert_eq!(blank.new_line, Some(2));
        assert_eq!(hunks[0].integrity(0), None);
    }

    #[test]
    fn test_no_newline_marker_is_skipped() {
        let patch = "@@ -1 +1 @@\n-old\n\\ No newline at end of file\n\
                     +new\n\\ No newline at end of file";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks[0].lines.len(), 2);
        assert_eq!(hunks[0].integrity(0), None);
    }

    #[test]
    fn test_malformed_header() {
        let err = parse_patch("@@ -a,b +1,2 @@\n+x").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.reason.contains("-a,b"));

        let err = parse_patch("@@ -1,1 +1,2 @@\n x\n@@ -9,1 @@\n+y").unwrap_err();
        assert_eq!(err.line, 3);

        assert!(parse_patch("@@ -1,1 +1,1\n x").is_err());
    }

    #[test]
    fn test_line_number_overflow_is_malformed() {
        let err = parse_patch("@@ -1 +18446744073709551615 @@\n+a").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.reason, "line number overflow");

        let err = parse_patch("@@ -18446744073709551615 +1 @@\n x").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_content_before_first_header() {
        let err = parse_patch("diff --git a/x b/x\n@@ -1 +1 @@\n+x").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_empty_patch() {
        assert!(parse_patch("").unwrap().is_empty());
        assert!(parse_patch("\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = FilePatch::parse("src/main.rs", MIXED_PATCH).unwrap();
        let second = FilePatch::parse("src/main.rs", MIXED_PATCH).unwrap();
        assert_eq!(first, second);
    }
}
