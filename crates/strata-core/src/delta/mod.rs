//! Structural comparison of two document outlines.
//!
//! Matching runs in two passes, Merkle-style. The first pass indexes both
//! trees by subtree hash: an identical fingerprint at the same path is a
//! provably unchanged subtree and is skipped whole; at a different path it
//! is a move, also skipped whole. The second pass works positionally over
//! whatever remains, pairing sections by path (and by parent-plus-position
//! for renames) and classifying each pair by comparing title and content
//! hashes. Neither input is ever mutated and the comparison never fails.

mod types;

pub use types::{
    BrokenLink, ChangeAction, CodeBlockChange, ContentChange, DeltaStatistics, DocumentChange,
    DocumentDelta, FrontmatterChange, MovedSection,
};

use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::outline::{CodeBlock, Outline, Section, SectionPath};

/// One section in pre-order, with the bookkeeping the matcher needs.
struct FlatSection<'a> {
    path: SectionPath,
    parent: SectionPath,
    sibling_index: usize,
    node: &'a Section,
    /// Nodes in this subtree; the subtree occupies `i..i + subtree_size`
    /// in the flat order.
    subtree_size: usize,
}

fn flatten(outline: &Outline) -> Vec<FlatSection<'_>> {
    fn visit<'a>(
        node: &'a Section,
        parent: &SectionPath,
        sibling_index: usize,
        out: &mut Vec<FlatSection<'a>>,
    ) {
        let mut path = parent.clone();
        path.push(node.slug.clone());
        out.push(FlatSection {
            path: path.clone(),
            parent: parent.clone(),
            sibling_index,
            node,
            subtree_size: node.node_count(),
        });
        for (i, child) in node.children.iter().enumerate() {
            visit(child, &path, i, out);
        }
    }

    let mut out = Vec::new();
    for (i, root) in outline.roots.iter().enumerate() {
        visit(root, &Vec::new(), i, &mut out);
    }
    out
}

/// Compares two outlines and produces a structured delta.
pub fn compute_delta(old: &Outline, new: &Outline) -> DocumentDelta {
    let mut delta = DocumentDelta::new();

    compare_frontmatter(old, new, &mut delta);
    compare_preamble(old, new, &mut delta);
    compare_sections(old, new, &mut delta);
    compare_code_blocks(old, new, &mut delta);
    detect_broken_links(old, new, &mut delta);

    finish_statistics(&mut delta);
    delta.classification = classify(old, new, &delta);

    debug!(
        classification = ?delta.classification,
        added = delta.added.len(),
        removed = delta.removed.len(),
        modified = delta.modified.len(),
        moved = delta.moved.len(),
        "delta computed"
    );

    delta
}

fn compare_frontmatter(old: &Outline, new: &Outline, delta: &mut DocumentDelta) {
    let old_fm = &old.frontmatter;
    let new_fm = &new.frontmatter;
    let old_keys = old_fm.keys();
    let new_keys = new_fm.keys();

    for key in &old_keys {
        match new_fm.value(key) {
            None => {
                let value = old_fm.value(key).cloned().unwrap_or(Value::Null);
                delta
                    .frontmatter_changes
                    .push(FrontmatterChange::removed(key.clone(), value));
            }
            Some(new_value) => {
                if old_fm.value(key) != Some(new_value) {
                    let old_value = old_fm.value(key).cloned().unwrap_or(Value::Null);
                    delta.frontmatter_changes.push(FrontmatterChange::updated(
                        key.clone(),
                        old_value,
                        new_value.clone(),
                    ));
                }
            }
        }
    }

    for key in &new_keys {
        if old_fm.value(key).is_none() {
            let value = new_fm.value(key).cloned().unwrap_or(Value::Null);
            delta
                .frontmatter_changes
                .push(FrontmatterChange::added(key.clone(), value));
        }
    }

    // Same keys, different insertion order.
    if old_keys != new_keys {
        let old_set: HashSet<&String> = old_keys.iter().collect();
        let new_set: HashSet<&String> = new_keys.iter().collect();
        if old_set == new_set {
            if let Some(key) = old_keys
                .iter()
                .zip(&new_keys)
                .find(|(a, b)| a != b)
                .map(|(a, _)| a.clone())
            {
                delta
                    .frontmatter_changes
                    .push(FrontmatterChange::reordered(key));
            }
        }
    }

    delta.frontmatter_changed = !delta.frontmatter_changes.is_empty();
    if delta.frontmatter_changed {
        delta.frontmatter_formatting_only =
            old.frontmatter_hash_normalized == new.frontmatter_hash_normalized;
    }
}

fn compare_preamble(old: &Outline, new: &Outline, delta: &mut DocumentDelta) {
    delta.preamble_changed = old.preamble_hash != new.preamble_hash;
    if delta.preamble_changed {
        delta.preamble_whitespace_only = old.preamble_hash_trimmed == new.preamble_hash_trimmed;
    }
}

fn compare_sections(old: &Outline, new: &Outline, delta: &mut DocumentDelta) {
    let old_flat = flatten(old);
    let new_flat = flatten(new);
    delta.statistics.old_section_count = old_flat.len();
    delta.statistics.new_section_count = new_flat.len();

    let mut old_matched = vec![false; old_flat.len()];
    let mut new_matched = vec![false; new_flat.len()];

    // Pass 1: whole-subtree matches by fingerprint. Same path means
    // unchanged; a different path means the subtree moved. Either way the
    // entire subtree is consumed and never revisited.
    let mut new_by_hash: HashMap<u64, Vec<usize>> = HashMap::new();
    for (j, entry) in new_flat.iter().enumerate() {
        new_by_hash
            .entry(entry.node.subtree_hash)
            .or_default()
            .push(j);
    }

    for i in 0..old_flat.len() {
        if old_matched[i] {
            continue;
        }
        let entry = &old_flat[i];
        let Some(candidates) = new_by_hash.get(&entry.node.subtree_hash) else {
            continue;
        };
        let pick = candidates
            .iter()
            .find(|&&j| !new_matched[j] && new_flat[j].path == entry.path)
            .or_else(|| candidates.iter().find(|&&j| !new_matched[j]))
            .copied();
        let Some(j) = pick else {
            continue;
        };

        // Equal fingerprints imply equal shapes, so both ranges have the
        // same extent; consume each from its own bookkeeping anyway.
        let size = entry.subtree_size;
        for flag in old_matched.iter_mut().skip(i).take(size) {
            *flag = true;
        }
        for flag in new_matched.iter_mut().skip(j).take(new_flat[j].subtree_size) {
            *flag = true;
        }

        let target = &new_flat[j];
        if target.path == entry.path {
            delta.statistics.sections_unchanged += size;
        } else {
            delta.moved.push(MovedSection {
                subtree_hash: entry.node.subtree_hash,
                old_path: entry.path.clone(),
                new_path: target.path.clone(),
                level_delta: entry.node.level.delta_to(target.node.level),
                old_line: entry.node.line_range.0,
                new_line: target.node.line_range.0,
            });
            delta.statistics.sections_moved += 1;
            // Descendants came along unchanged.
            delta.statistics.sections_unchanged += size - 1;
        }
    }

    // Pass 2a: positional matching by identical path.
    let new_by_path: HashMap<&SectionPath, usize> = new_flat
        .iter()
        .enumerate()
        .filter(|(j, _)| !new_matched[*j])
        .map(|(j, entry)| (&entry.path, j))
        .collect();

    for i in 0..old_flat.len() {
        if old_matched[i] {
            continue;
        }
        let Some(&j) = new_by_path.get(&old_flat[i].path) else {
            continue;
        };
        if new_matched[j] {
            continue;
        }
        old_matched[i] = true;
        new_matched[j] = true;
        classify_pair(&old_flat[i], &new_flat[j], delta);
    }

    // Pass 2b: renames keep their parent and position but change their
    // slug, so match leftovers by (parent, sibling index). The body must
    // have survived byte-for-byte; anything weaker stays an add/remove.
    let new_by_position: HashMap<(&SectionPath, usize), usize> = new_flat
        .iter()
        .enumerate()
        .filter(|(j, _)| !new_matched[*j])
        .map(|(j, entry)| ((&entry.parent, entry.sibling_index), j))
        .collect();

    for i in 0..old_flat.len() {
        if old_matched[i] {
            continue;
        }
        let entry = &old_flat[i];
        let Some(&j) = new_by_position.get(&(&entry.parent, entry.sibling_index)) else {
            continue;
        };
        if new_matched[j] {
            continue;
        }
        let target = &new_flat[j];
        if entry.node.own_content_hash == target.node.own_content_hash
            && entry.node.title_hash != target.node.title_hash
        {
            old_matched[i] = true;
            new_matched[j] = true;
            delta.modified.push(ContentChange {
                action: ChangeAction::Renamed,
                path: entry.path.clone(),
                new_path: Some(target.path.clone()),
                title: target.node.title.clone(),
                old_level: Some(entry.node.level),
                new_level: Some(target.node.level),
                old_line: Some(entry.node.line_range.0),
                new_line: Some(target.node.line_range.0),
            });
            delta.statistics.sections_modified += 1;
            delta.statistics.content_only_changes += 1;
        }
    }

    // Whatever is left exists on one side only.
    for (i, entry) in old_flat.iter().enumerate() {
        if !old_matched[i] {
            delta.removed.push(ContentChange::removed(
                entry.path.clone(),
                entry.node.title.clone(),
                entry.node.level,
                entry.node.line_range.0,
            ));
            delta.statistics.sections_removed += 1;
        }
    }
    for (j, entry) in new_flat.iter().enumerate() {
        if !new_matched[j] {
            delta.added.push(ContentChange::added(
                entry.path.clone(),
                entry.node.title.clone(),
                entry.node.level,
                entry.node.line_range.0,
            ));
            delta.statistics.sections_added += 1;
        }
    }
}

/// Classifies a path-matched pair whose subtrees differ somewhere.
fn classify_pair(old: &FlatSection<'_>, new: &FlatSection<'_>, delta: &mut DocumentDelta) {
    let title_changed = old.node.title_hash != new.node.title_hash;
    let content_changed = old.node.own_content_hash != new.node.own_content_hash;

    if !title_changed && !content_changed {
        // The difference lives in a descendant; this node itself is intact.
        delta.statistics.sections_unchanged += 1;
        return;
    }

    // Trimmed catches edge whitespace, normalized catches blank-line noise
    // in the middle of a section.
    let whitespace_only = old.node.own_content_hash_trimmed == new.node.own_content_hash_trimmed
        || old.node.own_content_hash_normalized == new.node.own_content_hash_normalized;

    let action = if content_changed && whitespace_only && !title_changed {
        ChangeAction::WhitespaceOnly
    } else if title_changed && !content_changed {
        ChangeAction::Renamed
    } else {
        ChangeAction::ContentModified
    };

    match action {
        ChangeAction::WhitespaceOnly => delta.statistics.whitespace_only_changes += 1,
        _ => delta.statistics.content_only_changes += 1,
    }
    delta.statistics.sections_modified += 1;

    delta.modified.push(ContentChange {
        action,
        path: old.path.clone(),
        new_path: None,
        title: new.node.title.clone(),
        old_level: Some(old.node.level),
        new_level: Some(new.node.level),
        old_line: Some(old.node.line_range.0),
        new_line: Some(new.node.line_range.0),
    });
}

fn compare_code_blocks(old: &Outline, new: &Outline, delta: &mut DocumentDelta) {
    let group = |blocks: &[CodeBlock]| {
        let mut by_section: HashMap<SectionPath, Vec<usize>> = HashMap::new();
        for (i, block) in blocks.iter().enumerate() {
            by_section
                .entry(block.section_path.clone())
                .or_default()
                .push(i);
        }
        by_section
    };

    let old_groups = group(&old.code_blocks);
    let new_groups = group(&new.code_blocks);

    for (section, old_ids) in &old_groups {
        let empty = Vec::new();
        let new_ids = new_groups.get(section).unwrap_or(&empty);

        for (pos, &old_id) in old_ids.iter().enumerate() {
            let old_block = &old.code_blocks[old_id];
            match new_ids.get(pos) {
                Some(&new_id) => {
                    let new_block = &new.code_blocks[new_id];
                    let content_changed =
                        old_block.content_hash_trimmed != new_block.content_hash_trimmed;
                    let info_changed = old_block.info != new_block.info;
                    if !content_changed && !info_changed {
                        continue;
                    }
                    let action = if content_changed {
                        ChangeAction::ContentModified
                    } else {
                        ChangeAction::Renamed
                    };
                    if content_changed {
                        delta.statistics.code_blocks_modified += 1;
                    }
                    delta.code_block_changes.push(CodeBlockChange {
                        action,
                        language: new_block.language.clone(),
                        section_path: section.clone(),
                        old_line: Some(old_block.line_range.0),
                        new_line: Some(new_block.line_range.0),
                    });
                }
                None => {
                    delta.statistics.code_blocks_removed += 1;
                    delta.code_block_changes.push(CodeBlockChange {
                        action: ChangeAction::Removed,
                        language: old_block.language.clone(),
                        section_path: section.clone(),
                        old_line: Some(old_block.line_range.0),
                        new_line: None,
                    });
                }
            }
        }
    }

    for (section, new_ids) in &new_groups {
        let old_len = old_groups.get(section).map_or(0, Vec::len);
        for &new_id in new_ids.iter().skip(old_len) {
            let new_block = &new.code_blocks[new_id];
            delta.statistics.code_blocks_added += 1;
            delta.code_block_changes.push(CodeBlockChange {
                action: ChangeAction::Added,
                language: new_block.language.clone(),
                section_path: section.clone(),
                old_line: None,
                new_line: Some(new_block.line_range.0),
            });
        }
    }
}

fn detect_broken_links(old: &Outline, new: &Outline, delta: &mut DocumentDelta) {
    for link in &old.links {
        if new.slug_index.contains_key(&link.target_slug) {
            continue;
        }

        // Best-effort repair: the original target's exact trimmed title may
        // live on under a different slug (typically after duplicate-slug
        // reshuffling). No fuzzy matching beyond that.
        let suggested = old.find_by_slug(&link.target_slug).and_then(|old_target| {
            new.walk()
                .into_iter()
                .find(|(_, node)| node.title_hash_trimmed == old_target.title_hash_trimmed)
                .map(|(_, node)| node.slug.clone())
        });

        delta.broken_links.push(BrokenLink {
            link_text: link.text.clone(),
            target_slug: link.target_slug.clone(),
            line: link.line,
            suggested_replacement: suggested,
        });
    }
    delta.statistics.broken_link_count = delta.broken_links.len();
}

fn finish_statistics(delta: &mut DocumentDelta) {
    let stats = &mut delta.statistics;
    let union = stats.sections_unchanged
        + stats.sections_moved
        + stats.sections_modified
        + stats.sections_added
        + stats.sections_removed;
    if union > 0 {
        let changed = stats.sections_added + stats.sections_removed + stats.sections_modified;
        stats.content_change_ratio = changed as f32 / union as f32;
    }
}

fn classify(old: &Outline, new: &Outline, delta: &DocumentDelta) -> DocumentChange {
    let stats = &delta.statistics;

    if old.page_hash == new.page_hash {
        return if delta.frontmatter_changed {
            DocumentChange::FrontmatterOnly
        } else {
            DocumentChange::NoChange
        };
    }

    if old.page_hash_trimmed == new.page_hash_trimmed {
        return DocumentChange::WhitespaceOnly;
    }

    let no_structure_changes = stats.sections_added == 0
        && stats.sections_removed == 0
        && stats.sections_moved == 0;

    // Interior whitespace shifts the raw page hash without surviving the
    // section-level trimmed comparison.
    if no_structure_changes
        && stats.content_only_changes == 0
        && stats.whitespace_only_changes > 0
        && (!delta.preamble_changed || delta.preamble_whitespace_only)
    {
        return DocumentChange::WhitespaceOnly;
    }

    if stats.sections_moved > 0 && stats.sections_modified == 0 && stats.sections_added == 0
        && stats.sections_removed == 0
    {
        return DocumentChange::StructuralOnly;
    }

    match stats.content_change_ratio {
        r if r < 0.10 => DocumentChange::ContentMinor,
        r if r < 0.40 => DocumentChange::ContentModerate,
        r if r < 0.80 => DocumentChange::ContentMajor,
        _ => DocumentChange::Rewritten,
    }
}
