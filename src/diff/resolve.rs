use std::collections::BTreeMap;

use super::{FilePatch, LineKind, PatchLine};

/// New-file line lookups for one parsed file patch.
///
/// `added` holds the only lines a review comment may target. `new_file` also
/// holds context lines, so a rejected position can be explained.
#[derive(Debug, Clone, Default)]
pub struct LineIndex<'a> {
    added: BTreeMap<usize, &'a PatchLine>,
    new_file: BTreeMap<usize, &'a PatchLine>,
}

impl<'a> LineIndex<'a> {
    pub fn build(patch: &'a FilePatch) -> Self {
        let mut index = LineIndex::default();
        for line in patch.hunks.iter().flat_map(|h| h.lines.iter()) {
            let Some(number) = line.new_line else {
                continue;
            };
            if line.kind == LineKind::Added {
                index.added.insert(number, line);
            }
            index.new_file.insert(number, line);
        }
        index
    }

    /// The added line at `line` in the new file, if the patch adds one there.
    pub fn added(&self, line: usize) -> Option<&'a PatchLine> {
        self.added.get(&line).copied()
    }

    /// Any Added or Context line at `line` in the new file.
    pub fn new_file(&self, line: usize) -> Option<&'a PatchLine> {
        self.new_file.get(&line).copied()
    }

    /// New-file numbers of all added lines, ascending.
    pub fn added_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.added.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_map_excludes_context_and_removed() {
        let patch =
            FilePatch::parse("a.rs", "@@ -5,2 +5,3 @@\n context1\n-removed1\n+added1\n context2")
                .unwrap();
        let index = patch.line_index();

        assert_eq!(index.added_lines().collect::<Vec<_>>(), vec![6]);
        assert_eq!(index.added(6).map(|l| l.text.as_str()), Some("added1"));
        assert!(index.added(5).is_none());
        assert!(index.added(7).is_none());

        assert_eq!(index.new_file(5).map(|l| l.kind), Some(LineKind::Context));
        assert_eq!(index.new_file(7).map(|l| l.text.as_str()), Some("context2"));
        assert!(index.new_file(8).is_none());
    }

    #[test]
    fn test_index_spans_all_hunks() {
        let text = "@@ -0,0 +1,2 @@\n+a\n+b\n@@ -10,1 +12,2 @@\n x\n+y";
        let patch = FilePatch::parse("a.rs", text).unwrap();
        let index = patch.line_index();
        assert_eq!(index.added_lines().collect::<Vec<_>>(), vec![1, 2, 13]);
        assert!(index.new_file(12).is_some());
        assert!(index.new_file(3).is_none());
    }

    #[test]
    fn test_empty_patch_has_no_lines() {
        let patch = FilePatch::parse("a.rs", "").unwrap();
        let index = patch.line_index();
        assert_eq!(index.added_lines().count(), 0);
        assert!(index.new_file(1).is_none());
    }
}
