//! Type definitions for structural document deltas.

use serde::Serialize;
use serde_yaml::Value;

use crate::events::HeadingLevel;
use crate::outline::SectionPath;

/// What happened to one section, property, or code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeAction {
    /// Present only in the new document.
    Added,

    /// Present only in the old document.
    Removed,

    /// Title changed while the body stayed byte-identical. Also used for
    /// code blocks whose info string changed with unchanged content.
    Renamed,

    /// Substantive body changes.
    ContentModified,

    /// Raw hashes differ but trimmed hashes match.
    WhitespaceOnly,

    /// A frontmatter property was added.
    PropertyAdded,

    /// A frontmatter property was removed.
    PropertyRemoved,

    /// A frontmatter property value changed.
    PropertyUpdated,

    /// The same property keys appear in a different insertion order.
    PropertyReordered,
}

/// A change to one frontmatter property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontmatterChange {
    pub action: ChangeAction,
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl FrontmatterChange {
    pub fn added(key: impl Into<String>, value: Value) -> Self {
        Self {
            action: ChangeAction::PropertyAdded,
            key: key.into(),
            old_value: None,
            new_value: Some(value),
        }
    }

    pub fn removed(key: impl Into<String>, value: Value) -> Self {
        Self {
            action: ChangeAction::PropertyRemoved,
            key: key.into(),
            old_value: Some(value),
            new_value: None,
        }
    }

    pub fn updated(key: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            action: ChangeAction::PropertyUpdated,
            key: key.into(),
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }

    pub fn reordered(key: impl Into<String>) -> Self {
        Self {
            action: ChangeAction::PropertyReordered,
            key: key.into(),
            old_value: None,
            new_value: None,
        }
    }
}

/// A change to one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentChange {
    pub action: ChangeAction,

    /// The section's address: its old path for removals and modifications,
    /// its new path for additions.
    pub path: SectionPath,

    /// The new address, when it differs from `path` (renames matched by
    /// position).
    pub new_path: Option<SectionPath>,

    /// Heading title (the new title for renames).
    pub title: String,

    pub old_level: Option<HeadingLevel>,
    pub new_level: Option<HeadingLevel>,
    pub old_line: Option<usize>,
    pub new_line: Option<usize>,
}

impl ContentChange {
    pub fn added(path: SectionPath, title: String, level: HeadingLevel, line: usize) -> Self {
        Self {
            action: ChangeAction::Added,
            path,
            new_path: None,
            title,
            old_level: None,
            new_level: Some(level),
            old_line: None,
            new_line: Some(line),
        }
    }

    pub fn removed(path: SectionPath, title: String, level: HeadingLevel, line: usize) -> Self {
        Self {
            action: ChangeAction::Removed,
            path,
            new_path: None,
            title,
            old_level: Some(level),
            new_level: None,
            old_line: Some(line),
            new_line: None,
        }
    }
}

/// A subtree that moved with byte-identical content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovedSection {
    /// The subtree fingerprint, identical on both sides.
    pub subtree_hash: u64,

    pub old_path: SectionPath,
    pub new_path: SectionPath,

    /// Level change: negative when promoted, positive when demoted.
    pub level_delta: i8,

    pub old_line: usize,
    pub new_line: usize,
}

impl MovedSection {
    /// Moved to a shallower level.
    pub fn was_promoted(&self) -> bool {
        self.level_delta < 0
    }

    /// Moved to a deeper level.
    pub fn was_demoted(&self) -> bool {
        self.level_delta > 0
    }

    /// Moved without a level change.
    pub fn was_reordered(&self) -> bool {
        self.level_delta == 0
    }
}

/// A change to one code block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBlockChange {
    pub action: ChangeAction,
    pub language: Option<String>,
    pub section_path: SectionPath,
    pub old_line: Option<usize>,
    pub new_line: Option<usize>,
}

/// An internal link of the old document whose target vanished in the new.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenLink {
    pub link_text: String,
    pub target_slug: String,

    /// Line of the link in the old document.
    pub line: usize,

    /// Slug of a section in the new document whose trimmed title hash
    /// matches the original target, when one exists. Best-effort only:
    /// exact title-hash matching, no similarity search.
    pub suggested_replacement: Option<String>,
}

/// Aggregate counts for one delta.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DeltaStatistics {
    pub old_section_count: usize,
    pub new_section_count: usize,

    pub sections_added: usize,
    pub sections_removed: usize,
    pub sections_modified: usize,
    pub sections_moved: usize,
    pub sections_unchanged: usize,

    /// Modified sections whose change was substantive (content or title).
    pub content_only_changes: usize,

    /// Modified sections whose change was whitespace only.
    pub whitespace_only_changes: usize,

    pub code_blocks_added: usize,
    pub code_blocks_removed: usize,
    pub code_blocks_modified: usize,

    pub broken_link_count: usize,

    /// `(added + removed + modified) / |old ∪ new sections|`, in `[0, 1]`.
    pub content_change_ratio: f32,
}

/// High-level classification of a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentChange {
    /// Bodies are byte-identical and frontmatter is unchanged.
    NoChange,

    /// Only whitespace differs; rendered output would be identical.
    WhitespaceOnly,

    /// The body is byte-identical; only frontmatter changed.
    FrontmatterOnly,

    /// Sections moved but no content changed.
    StructuralOnly,

    /// Under 10% of sections changed.
    ContentMinor,

    /// 10-40% of sections changed.
    ContentModerate,

    /// 40-80% of sections changed.
    ContentMajor,

    /// Over 80% of sections changed.
    Rewritten,
}

/// Complete structural comparison of two document versions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDelta {
    pub classification: DocumentChange,
    pub statistics: DeltaStatistics,

    pub frontmatter_changed: bool,

    /// True when frontmatter changes leave the canonical form intact
    /// (reordering, formatting).
    pub frontmatter_formatting_only: bool,

    pub frontmatter_changes: Vec<FrontmatterChange>,

    pub preamble_changed: bool,
    pub preamble_whitespace_only: bool,

    /// Sections present only in the new document.
    pub added: Vec<ContentChange>,

    /// Sections present only in the old document.
    pub removed: Vec<ContentChange>,

    /// Sections present in both with differing content or title.
    pub modified: Vec<ContentChange>,

    /// Subtrees that moved without content changes.
    pub moved: Vec<MovedSection>,

    pub code_block_changes: Vec<CodeBlockChange>,

    pub broken_links: Vec<BrokenLink>,
}

impl Default for DocumentDelta {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentDelta {
    /// An empty delta (no changes).
    pub fn new() -> Self {
        Self {
            classification: DocumentChange::NoChange,
            statistics: DeltaStatistics::default(),
            frontmatter_changed: false,
            frontmatter_formatting_only: false,
            frontmatter_changes: Vec::new(),
            preamble_changed: false,
            preamble_whitespace_only: false,
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
            moved: Vec::new(),
            code_block_changes: Vec::new(),
            broken_links: Vec::new(),
        }
    }

    /// Whether the two versions are identical.
    pub fn is_unchanged(&self) -> bool {
        matches!(self.classification, DocumentChange::NoChange)
    }

    /// Whether every difference is cosmetic.
    pub fn is_cosmetic_only(&self) -> bool {
        matches!(
            self.classification,
            DocumentChange::NoChange | DocumentChange::WhitespaceOnly
        )
    }

    /// Whether any old internal link broke.
    pub fn has_broken_links(&self) -> bool {
        !self.broken_links.is_empty()
    }

    /// Total number of recorded changes.
    pub fn change_count(&self) -> usize {
        self.added.len()
            + self.removed.len()
            + self.modified.len()
            + self.moved.len()
            + self.frontmatter_changes.len()
            + self.code_block_changes.len()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let stats = &self.statistics;
        format!(
            "{:?}: {} added, {} removed, {} modified, {} moved ({:.1}% changed)",
            self.classification,
            stats.sections_added,
            stats.sections_removed,
            stats.sections_modified,
            stats.sections_moved,
            stats.content_change_ratio * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmatter_change_constructors() {
        let added = FrontmatterChange::added("title", Value::from("Hello"));
        assert_eq!(added.action, ChangeAction::PropertyAdded);
        assert!(added.old_value.is_none());
        assert!(added.new_value.is_some());

        let removed = FrontmatterChange::removed("title", Value::from("Hello"));
        assert_eq!(removed.action, ChangeAction::PropertyRemoved);
        assert!(removed.old_value.is_some());

        let updated = FrontmatterChange::updated("title", Value::from("a"), Value::from("b"));
        assert_eq!(updated.action, ChangeAction::PropertyUpdated);
        assert!(updated.old_value.is_some() && updated.new_value.is_some());
    }

    #[test]
    fn content_change_constructors() {
        let added = ContentChange::added(
            vec!["new".to_string()],
            "New".to_string(),
            HeadingLevel::H2,
            10,
        );
        assert_eq!(added.action, ChangeAction::Added);
        assert!(added.old_level.is_none());
        assert_eq!(added.new_line, Some(10));

        let removed = ContentChange::removed(
            vec!["old".to_string()],
            "Old".to_string(),
            HeadingLevel::H2,
            5,
        );
        assert_eq!(removed.action, ChangeAction::Removed);
        assert!(removed.new_level.is_none());
    }

    #[test]
    fn moved_section_direction() {
        let base = MovedSection {
            subtree_hash: 1,
            old_path: vec!["a".to_string()],
            new_path: vec!["b".to_string(), "a".to_string()],
            level_delta: 0,
            old_line: 1,
            new_line: 9,
        };

        assert!(base.was_reordered());
        assert!(MovedSection { level_delta: -1, ..base.clone() }.was_promoted());
        assert!(MovedSection { level_delta: 1, ..base }.was_demoted());
    }

    #[test]
    fn empty_delta() {
        let delta = DocumentDelta::new();
        assert!(delta.is_unchanged());
        assert!(delta.is_cosmetic_only());
        assert!(!delta.has_broken_links());
        assert_eq!(delta.change_count(), 0);
        assert!(delta.summary().contains("NoChange"));
    }
}
