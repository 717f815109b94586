//! Line diffs between the manifest on disk and its migrated form

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Kind of a diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    Equal,
    Delete,
    Insert,
}

/// One line of a diff, without its trailing newline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

/// Line diff of two manifest texts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    pub lines: Vec<DiffLine>,
}

impl ManifestDiff {
    /// Compute a line diff from `before` to `after`
    pub fn compute(before: &str, after: &str) -> Self {
        let diff = TextDiff::from_lines(before, after);
        let lines = diff
            .iter_all_changes()
            .map(|change| DiffLine {
                tag: match change.tag() {
                    ChangeTag::Equal => LineTag::Equal,
                    ChangeTag::Delete => LineTag::Delete,
                    ChangeTag::Insert => LineTag::Insert,
                },
                text: change.value().trim_end_matches(['\n', '\r']).to_string(),
            })
            .collect();
        Self { lines }
    }

    pub fn insertions(&self) -> usize {
        self.count(LineTag::Insert)
    }

    pub fn deletions(&self) -> usize {
        self.count(LineTag::Delete)
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|l| l.tag != LineTag::Equal)
    }

    /// Changed lines only, prefixed with `+`/`-`
    pub fn changed_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter().filter_map(|line| match line.tag {
            LineTag::Equal => None,
            LineTag::Delete => Some(format!("- {}", line.text)),
            LineTag::Insert => Some(format!("+ {}", line.text)),
        })
    }

    fn count(&self, tag: LineTag) -> usize {
        self.lines.iter().filter(|l| l.tag == tag).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_counts_changes() {
        let diff =
            ManifestDiff::compute("name: a\nversion: 1\n", "name: a\nversion: 2\nprofile: p\n");
        assert!(diff.has_changes());
        assert_eq!(diff.deletions(), 1);
        assert_eq!(diff.insertions(), 2);
        let changed: Vec<_> = diff.changed_lines().collect();
        assert_eq!(changed, vec!["- version: 1", "+ version: 2", "+ profile: p"]);
    }

    #[test]
    fn test_identical_texts() {
        let diff = ManifestDiff::compute("a: 1\n", "a: 1\n");
        assert!(!diff.has_changes());
        assert_eq!(diff.changed_lines().count(), 0);
    }
}
