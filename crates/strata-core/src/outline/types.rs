//! Type definitions for the document outline.

use serde::Serialize;
use std::collections::HashMap;

use crate::document::Frontmatter;
use crate::events::{HeadingLevel, SourceSpan};
use crate::hashing::{hash_fast, hash_fast_bytes, hash_fast_normalized, hash_fast_trimmed};

/// The address of a section: slugs from a root down to the node.
///
/// Paths are recomputed top-down when needed rather than stored as live
/// parent references, so the tree stays a tree.
pub type SectionPath = Vec<String>;

/// A node in the outline: one heading plus the content it directly owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// Heading level (1-6).
    pub level: HeadingLevel,

    /// Heading text with inline formatting preserved as raw markdown.
    pub title: String,

    /// Fast hash of the title.
    pub title_hash: u64,

    /// Fast hash of the trimmed title.
    pub title_hash_trimmed: u64,

    /// URL-safe anchor slug, disambiguated within one outline.
    pub slug: String,

    /// Byte range from the heading line to the next heading at the same or
    /// shallower level (or end of document).
    pub source_span: SourceSpan,

    /// 1-indexed line range `[start, end)` covering the same extent.
    pub line_range: (usize, usize),

    /// Content owned by this section alone: everything between its heading
    /// and its first child heading (or its closing boundary). Empty when the
    /// heading has no body of its own; never absent, so hashing stays
    /// uniform.
    pub own_content: String,

    /// Fast hash of `own_content`.
    pub own_content_hash: u64,

    /// Fast hash of the trimmed `own_content`.
    pub own_content_hash_trimmed: u64,

    /// Fast hash of `own_content` with blank lines removed.
    pub own_content_hash_normalized: u64,

    /// Merkle-style fingerprint of this node and every descendant, in
    /// document order. Equal subtree hashes mean provably identical
    /// subtrees.
    pub subtree_hash: u64,

    /// Subtree fingerprint over the trimmed hashes.
    pub subtree_hash_trimmed: u64,

    /// Child sections, owned exclusively by this node.
    pub children: Vec<Section>,
}

impl Section {
    /// Creates a section for a heading; content and subtree hashes are
    /// filled in by the builder.
    pub fn new(
        level: HeadingLevel,
        title: String,
        slug: String,
        source_span: SourceSpan,
        line: usize,
    ) -> Self {
        let title_hash = hash_fast(&title);
        let title_hash_trimmed = hash_fast_trimmed(&title);

        Self {
            level,
            title,
            title_hash,
            title_hash_trimmed,
            slug,
            source_span,
            line_range: (line, line),
            own_content: String::new(),
            own_content_hash: hash_fast(""),
            own_content_hash_trimmed: hash_fast_trimmed(""),
            own_content_hash_normalized: hash_fast_normalized(""),
            subtree_hash: 0,
            subtree_hash_trimmed: 0,
            children: Vec::new(),
        }
    }

    /// Sets the owned content and recomputes its hashes.
    pub fn set_own_content(&mut self, content: String) {
        self.own_content_hash = hash_fast(&content);
        self.own_content_hash_trimmed = hash_fast_trimmed(&content);
        self.own_content_hash_normalized = hash_fast_normalized(&content);
        self.own_content = content;
    }

    /// Computes subtree hashes bottom-up (post-order).
    ///
    /// `subtree_hash` is a pure function of the node's own hashes and its
    /// children's subtree hashes in child order:
    /// `hash_fast(title_hash ∥ own_content_hash ∥ children's subtree hashes)`
    /// over little-endian bytes.
    pub fn compute_subtree_hash(&mut self) {
        for child in &mut self.children {
            child.compute_subtree_hash();
        }

        let mut raw = Vec::with_capacity(16 + 8 * self.children.len());
        let mut trimmed = Vec::with_capacity(16 + 8 * self.children.len());
        raw.extend_from_slice(&self.title_hash.to_le_bytes());
        raw.extend_from_slice(&self.own_content_hash.to_le_bytes());
        trimmed.extend_from_slice(&self.title_hash_trimmed.to_le_bytes());
        trimmed.extend_from_slice(&self.own_content_hash_trimmed.to_le_bytes());
        for child in &self.children {
            raw.extend_from_slice(&child.subtree_hash.to_le_bytes());
            trimmed.extend_from_slice(&child.subtree_hash_trimmed.to_le_bytes());
        }

        self.subtree_hash = hash_fast_bytes(&raw);
        self.subtree_hash_trimmed = hash_fast_bytes(&trimmed);
    }

    /// Number of sections in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Section::node_count).sum::<usize>()
    }

    /// Deepest heading level in this subtree.
    pub fn max_level(&self) -> HeadingLevel {
        self.children
            .iter()
            .map(Section::max_level)
            .max()
            .map_or(self.level, |child_max| self.level.max(child_max))
    }

    /// Finds a section by slug within this subtree.
    pub fn find_by_slug(&self, slug: &str) -> Option<&Section> {
        if self.slug == slug {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_slug(slug))
    }
}

/// A fenced (or indented) code block recorded during outline construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBlock {
    /// Language identifier, if the fence named one.
    pub language: Option<String>,

    /// Full fence info string (language plus attributes).
    pub info: String,

    /// Raw block content, fence markers excluded.
    pub content: String,

    /// Fast hash of the content.
    pub content_hash: u64,

    /// Fast hash of the trimmed content.
    pub content_hash_trimmed: u64,

    /// Byte range of the fence opening in the source.
    pub span: SourceSpan,

    /// 1-indexed line range `[start, end)`.
    pub line_range: (usize, usize),

    /// Path of the section whose extent contains this block; empty for
    /// blocks in the preamble.
    pub section_path: SectionPath,
}

/// An intra-document anchor link (`[text](#slug)`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorLink {
    /// The link text.
    pub text: String,

    /// Target slug, leading `#` stripped.
    pub target_slug: String,

    /// 1-indexed line where the link appears.
    pub line: usize,

    /// Byte offset of the link in the source.
    pub byte_offset: usize,

    /// Path of the section containing the link; empty for the preamble.
    pub section_path: SectionPath,

    /// Whether the target slug exists in this outline. An unresolved link is
    /// data, not an error.
    pub resolved: bool,
}

/// Structural view of one document: heading forest plus auxiliary indexes.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Outline {
    /// Title of the first H1 root, or of the first heading when the
    /// document is not H1-rooted.
    pub title: Option<String>,

    /// Fast hash of the whole body (frontmatter excluded).
    pub page_hash: u64,

    /// Fast hash of the trimmed body.
    pub page_hash_trimmed: u64,

    /// Snapshot of the document's frontmatter, kept so two outlines can be
    /// compared key-by-key without the source documents.
    pub frontmatter: Frontmatter,

    /// Fast hash of the raw frontmatter YAML; zero when absent.
    pub frontmatter_hash: u64,

    /// Fast hash of the canonical (order-erased) frontmatter form.
    pub frontmatter_hash_normalized: u64,

    /// Content before the first heading.
    pub preamble: String,

    /// Fast hash of the preamble.
    pub preamble_hash: u64,

    /// Fast hash of the trimmed preamble.
    pub preamble_hash_trimmed: u64,

    /// Root sections in document order. A document need not start at H1,
    /// and a later heading at or above the first root's level starts a new
    /// root.
    pub roots: Vec<Section>,

    /// Code blocks in document order, regardless of nesting depth.
    pub code_blocks: Vec<CodeBlock>,

    /// Intra-document links in document order.
    pub links: Vec<AnchorLink>,

    /// Slug lookup: slug to `(section path, occurrence index)`. Duplicate
    /// titles get disambiguated slugs, so entries never collide silently.
    pub slug_index: HashMap<String, Vec<(SectionPath, usize)>>,
}

impl Outline {
    /// Total number of headings.
    pub fn heading_count(&self) -> usize {
        self.roots.iter().map(Section::node_count).sum()
    }

    /// Level of the first heading, if any.
    pub fn root_level(&self) -> Option<HeadingLevel> {
        self.roots.first().map(|n| n.level)
    }

    /// Deepest heading level in the document, if any.
    pub fn max_level(&self) -> Option<HeadingLevel> {
        self.roots.iter().map(Section::max_level).max()
    }

    /// Finds a section by slug.
    pub fn find_by_slug(&self, slug: &str) -> Option<&Section> {
        self.roots.iter().find_map(|n| n.find_by_slug(slug))
    }

    /// Pre-order walk of every section with its path.
    pub fn walk(&self) -> Vec<(SectionPath, &Section)> {
        fn visit<'a>(
            node: &'a Section,
            prefix: &SectionPath,
            out: &mut Vec<(SectionPath, &'a Section)>,
        ) {
            let mut path = prefix.clone();
            path.push(node.slug.clone());
            out.push((path.clone(), node));
            for child in &node.children {
                visit(child, &path, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            visit(root, &Vec::new(), &mut out);
        }
        out
    }

    /// Links whose target slug does not exist in this outline.
    pub fn broken_links(&self) -> Vec<&AnchorLink> {
        self.links.iter().filter(|l| !l.resolved).collect()
    }

    /// Whether any internal link is unresolved.
    pub fn has_broken_links(&self) -> bool {
        self.links.iter().any(|l| !l.resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash_fast_bytes;

    fn section(level: HeadingLevel, title: &str, slug: &str) -> Section {
        Section::new(
            level,
            title.to_string(),
            slug.to_string(),
            SourceSpan::new(0, 0),
            1,
        )
    }

    #[test]
    fn new_section_hashes_title() {
        let node = section(HeadingLevel::H2, "Test Heading", "test-heading");
        assert_eq!(node.title_hash, hash_fast("Test Heading"));
        assert_eq!(node.title_hash_trimmed, hash_fast_trimmed("Test Heading"));
        assert!(node.children.is_empty());
    }

    #[test]
    fn set_own_content_updates_hashes() {
        let mut node = section(HeadingLevel::H2, "Test", "test");
        node.set_own_content("Hello world".to_string());

        assert_eq!(node.own_content, "Hello world");
        assert_eq!(node.own_content_hash, hash_fast("Hello world"));
        assert_eq!(
            node.own_content_hash_trimmed,
            hash_fast_trimmed("Hello world")
        );
    }

    #[test]
    fn subtree_hash_matches_reconstruction() {
        let mut root = section(HeadingLevel::H1, "Root", "root");
        root.set_own_content("intro".to_string());
        let mut child = section(HeadingLevel::H2, "Child", "child");
        child.set_own_content("body".to_string());
        root.children.push(child);
        root.compute_subtree_hash();

        // Reconstruct the child hash independently.
        let child = &root.children[0];
        let mut child_buf = Vec::new();
        child_buf.extend_from_slice(&child.title_hash.to_le_bytes());
        child_buf.extend_from_slice(&child.own_content_hash.to_le_bytes());
        assert_eq!(child.subtree_hash, hash_fast_bytes(&child_buf));

        // Then the root from its fields plus the child fingerprint.
        let mut root_buf = Vec::new();
        root_buf.extend_from_slice(&root.title_hash.to_le_bytes());
        root_buf.extend_from_slice(&root.own_content_hash.to_le_bytes());
        root_buf.extend_from_slice(&child.subtree_hash.to_le_bytes());
        assert_eq!(root.subtree_hash, hash_fast_bytes(&root_buf));
    }

    #[test]
    fn subtree_hash_sensitive_to_child_order() {
        let mut a = section(HeadingLevel::H1, "Root", "root");
        a.children.push(section(HeadingLevel::H2, "One", "one"));
        a.children.push(section(HeadingLevel::H2, "Two", "two"));
        a.compute_subtree_hash();

        let mut b = section(HeadingLevel::H1, "Root", "root");
        b.children.push(section(HeadingLevel::H2, "Two", "two"));
        b.children.push(section(HeadingLevel::H2, "One", "one"));
        b.compute_subtree_hash();

        assert_ne!(a.subtree_hash, b.subtree_hash);
    }

    #[test]
    fn node_count_counts_subtree() {
        let mut root = section(HeadingLevel::H1, "Root", "root");
        let mut mid = section(HeadingLevel::H2, "Mid", "mid");
        mid.children.push(section(HeadingLevel::H3, "Leaf", "leaf"));
        root.children.push(mid);

        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn find_by_slug_searches_depth_first() {
        let mut root = section(HeadingLevel::H1, "Root", "root");
        root.children
            .push(section(HeadingLevel::H2, "Child", "child"));

        assert!(root.find_by_slug("child").is_some());
        assert!(root.find_by_slug("missing").is_none());
    }

    #[test]
    fn outline_heading_count_and_levels() {
        let mut outline = Outline::default();
        let mut root = section(HeadingLevel::H2, "Root", "root");
        root.children.push(section(HeadingLevel::H4, "Deep", "deep"));
        outline.roots.push(root);

        assert_eq!(outline.heading_count(), 2);
        assert_eq!(outline.root_level(), Some(HeadingLevel::H2));
        assert_eq!(outline.max_level(), Some(HeadingLevel::H4));
    }

    #[test]
    fn outline_walk_yields_paths_in_document_order() {
        let mut outline = Outline::default();
        let mut root = section(HeadingLevel::H1, "Root", "root");
        let mut mid = section(HeadingLevel::H2, "Mid", "mid");
        mid.children.push(section(HeadingLevel::H3, "Leaf", "leaf"));
        root.children.push(mid);
        outline.roots.push(root);
        outline.roots.push(section(HeadingLevel::H1, "Next", "next"));

        let paths: Vec<SectionPath> = outline.walk().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![
                vec!["root".to_string()],
                vec!["root".to_string(), "mid".to_string()],
                vec!["root".to_string(), "mid".to_string(), "leaf".to_string()],
                vec!["next".to_string()],
            ]
        );
    }

    #[test]
    fn empty_outline() {
        let outline = Outline::default();
        assert_eq!(outline.heading_count(), 0);
        assert!(outline.root_level().is_none());
        assert!(outline.max_level().is_none());
        assert!(outline.walk().is_empty());
    }
}
