//! Outline construction: turning a flat scan-event stream into a heading
//! tree with content fingerprints.
//!
//! The builder keeps an explicit stack of open sections rather than
//! recursing, the standard flatten-to-hierarchy pattern: a heading at level
//! `L` closes every open section at level `>= L`, then attaches itself to
//! the section left on top (or becomes a new root). Content runs accumulate
//! into whichever section is open; once the tree is complete, subtree
//! hashes are computed bottom-up and the auxiliary indexes (slugs, code
//! blocks, links) are derived.
//!
//! Construction is total: any well-formed event sequence produces an
//! outline. Odd documents (no headings, empty titles, duplicate titles,
//! dangling links) are all representable results, not errors.

mod types;

pub use types::{AnchorLink, CodeBlock, Outline, Section, SectionPath};

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::document::Document;
use crate::events::{HeadingLevel, ScanEvent, SourceSpan};
use crate::hashing::{hash_fast, hash_fast_trimmed};

/// Generates a URL-safe slug from heading text.
///
/// Lowercases alphanumerics and collapses every other run of characters
/// into a single hyphen.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Hands out slugs, disambiguating duplicates with a numeric suffix.
#[derive(Default)]
struct SlugAllocator {
    counts: HashMap<String, usize>,
    used: HashSet<String>,
}

impl SlugAllocator {
    fn assign(&mut self, title: &str) -> String {
        let base = slugify(title);
        let mut count = self.counts.get(&base).copied().unwrap_or(0);
        let mut candidate = if count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        // A literal "foo-1" heading may already occupy the next candidate.
        while self.used.contains(&candidate) {
            count += 1;
            candidate = format!("{base}-{count}");
        }
        self.counts.insert(base, count + 1);
        self.used.insert(candidate.clone());
        candidate
    }
}

/// A section still open on the builder stack, with its content accumulator.
struct Frame {
    section: Section,
    buffer: String,
}

/// A code block whose closing fence has not been seen yet.
struct OpenCode {
    language: Option<String>,
    info: String,
    content: String,
    span: SourceSpan,
    start_line: usize,
}

/// A fully scanned code block awaiting its section path.
struct PendingCode {
    language: Option<String>,
    info: String,
    content: String,
    span: SourceSpan,
    start_line: usize,
    end_line: usize,
}

impl OpenCode {
    fn close(self, end_line: usize) -> PendingCode {
        PendingCode {
            language: self.language,
            info: self.info,
            content: self.content,
            span: self.span,
            start_line: self.start_line,
            end_line: end_line.max(self.start_line),
        }
    }
}

impl Outline {
    /// Builds the outline of `document` from its scan events.
    ///
    /// The document supplies the body text for page, preamble, and
    /// frontmatter hashes; the events supply everything structural. Never
    /// fails.
    pub fn build(document: &Document, events: &[ScanEvent]) -> Outline {
        let content = document.content();
        let eof = content.len();
        let last_line = content.lines().count() + 1;

        let mut outline = Outline {
            page_hash: hash_fast(content),
            page_hash_trimmed: hash_fast_trimmed(content),
            ..Outline::default()
        };

        let fm = document.frontmatter();
        if !fm.is_empty() {
            let raw = fm.to_yaml().unwrap_or_default();
            outline.frontmatter_hash = hash_fast(&raw);
            outline.frontmatter_hash_normalized = hash_fast(&fm.canonical_json());
        }
        outline.frontmatter = fm.clone();

        let mut slugs = SlugAllocator::default();
        let mut roots: Vec<Section> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut pending_code: Vec<PendingCode> = Vec::new();
        let mut pending_links: Vec<AnchorLink> = Vec::new();
        let mut open_code: Option<OpenCode> = None;
        let mut first_heading_start: Option<usize> = None;

        for event in events {
            match event {
                ScanEvent::HeadingStart {
                    level,
                    title,
                    span,
                    line,
                } => {
                    first_heading_start.get_or_insert(span.start);
                    while stack.last().is_some_and(|f| f.section.level >= *level) {
                        if let Some(frame) = stack.pop() {
                            close_frame(frame, span.start, *line, &mut stack, &mut roots);
                        }
                    }
                    let slug = slugs.assign(title);
                    let section = Section::new(*level, title.clone(), slug, *span, *line);
                    stack.push(Frame {
                        section,
                        buffer: String::new(),
                    });
                }
                ScanEvent::HeadingEnd => {}
                ScanEvent::Text { text, .. } => {
                    if let Some(code) = open_code.as_mut() {
                        code.content.push_str(text);
                    }
                    if let Some(frame) = stack.last_mut() {
                        if !frame.buffer.is_empty() {
                            frame.buffer.push_str("\n\n");
                        }
                        frame.buffer.push_str(text);
                    }
                }
                ScanEvent::CodeFenceStart {
                    language,
                    info,
                    span,
                    line,
                } => {
                    open_code = Some(OpenCode {
                        language: language.clone(),
                        info: info.clone(),
                        content: String::new(),
                        span: *span,
                        start_line: *line,
                    });
                }
                ScanEvent::CodeFenceEnd { line } => {
                    if let Some(code) = open_code.take() {
                        pending_code.push(code.close(*line));
                    }
                }
                ScanEvent::Link {
                    text,
                    target,
                    span,
                    line,
                } => {
                    if let Some(slug) = target.strip_prefix('#') {
                        pending_links.push(AnchorLink {
                            text: text.clone(),
                            target_slug: slug.to_string(),
                            line: *line,
                            byte_offset: span.start,
                            section_path: Vec::new(),
                            resolved: false,
                        });
                    }
                }
            }
        }

        // Dangling fence at end of stream.
        if let Some(code) = open_code.take() {
            pending_code.push(code.close(last_line));
        }

        // End of stream closes every open section back to the root.
        while let Some(frame) = stack.pop() {
            close_frame(frame, eof, last_line, &mut stack, &mut roots);
        }

        for root in &mut roots {
            root.compute_subtree_hash();
        }

        let cut = first_heading_start.unwrap_or(eof).min(eof);
        outline.preamble = content.get(..cut).unwrap_or("").to_string();
        outline.preamble_hash = hash_fast(&outline.preamble);
        outline.preamble_hash_trimmed = hash_fast_trimmed(&outline.preamble);

        outline.title = roots
            .iter()
            .find(|n| n.level == HeadingLevel::H1)
            .or_else(|| roots.first())
            .map(|n| n.title.clone());
        outline.roots = roots;

        let mut slug_index: HashMap<String, Vec<(SectionPath, usize)>> = HashMap::new();
        for (path, node) in outline.walk() {
            let entry = slug_index.entry(node.slug.clone()).or_default();
            let occurrence = entry.len();
            entry.push((path, occurrence));
        }
        outline.slug_index = slug_index;

        let code_blocks: Vec<CodeBlock> = pending_code
            .into_iter()
            .map(|code| CodeBlock {
                content_hash: hash_fast(&code.content),
                content_hash_trimmed: hash_fast_trimmed(&code.content),
                section_path: section_path_for_line(&outline, code.start_line),
                line_range: (code.start_line, code.end_line),
                language: code.language,
                info: code.info,
                content: code.content,
                span: code.span,
            })
            .collect();
        outline.code_blocks = code_blocks;

        let links: Vec<AnchorLink> = pending_links
            .into_iter()
            .map(|mut link| {
                link.resolved = outline.slug_index.contains_key(&link.target_slug);
                link.section_path = section_path_for_line(&outline, link.line);
                link
            })
            .collect();
        outline.links = links;

        debug!(
            headings = outline.heading_count(),
            code_blocks = outline.code_blocks.len(),
            links = outline.links.len(),
            "outline built"
        );

        outline
    }
}

/// Finalizes a popped frame and attaches it to its parent (or the roots).
fn close_frame(
    mut frame: Frame,
    end_byte: usize,
    end_line: usize,
    stack: &mut Vec<Frame>,
    roots: &mut Vec<Section>,
) {
    frame.section.set_own_content(std::mem::take(&mut frame.buffer));
    frame.section.source_span.end = end_byte.max(frame.section.source_span.start);
    frame.section.line_range.1 = end_line.max(frame.section.line_range.0);
    match stack.last_mut() {
        Some(parent) => parent.section.children.push(frame.section),
        None => roots.push(frame.section),
    }
}

/// Path of the deepest section whose line range contains `line`; empty for
/// preamble positions.
fn section_path_for_line(outline: &Outline, line: usize) -> SectionPath {
    let mut best: SectionPath = Vec::new();
    for (path, node) in outline.walk() {
        if node.line_range.0 <= line && line < node.line_range.1 && path.len() > best.len() {
            best = path;
        }
    }
    best
}
