//! Heading-structure validation.
//!
//! A single read-only pass over a flat heading sequence (document order)
//! that reports hierarchy problems as data. Validation always terminates
//! with a report; malformed structure is a finding, never a failure.

use serde::Serialize;
use std::fmt;

use crate::events::HeadingLevel;
use crate::outline::{Outline, Section};

/// A heading as seen by the validator: level, title, and source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingSummary {
    pub level: HeadingLevel,
    pub title: String,
    pub line: usize,
}

impl HeadingSummary {
    /// Creates a summary.
    pub fn new(level: HeadingLevel, title: impl Into<String>, line: usize) -> Self {
        Self {
            level,
            title: title.into(),
            line,
        }
    }
}

/// Kinds of structural problems a document can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StructureIssueKind {
    /// A later heading is shallower than the document's root level.
    HierarchyViolation,

    /// A heading is more than one level deeper than its predecessor.
    SkippedLevel,

    /// More than one H1 heading.
    MultipleH1,

    /// The document has no headings at all.
    NoHeadings,

    /// A heading would leave the 1-6 range under a requested re-leveling.
    LevelOverflow,
}

impl fmt::Display for StructureIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HierarchyViolation => write!(f, "hierarchy violation"),
            Self::SkippedLevel => write!(f, "skipped level"),
            Self::MultipleH1 => write!(f, "multiple H1 headings"),
            Self::NoHeadings => write!(f, "no headings"),
            Self::LevelOverflow => write!(f, "level overflow"),
        }
    }
}

/// One structural problem, tied to the heading where it was observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureIssue {
    pub kind: StructureIssueKind,

    /// Title of the offending heading; empty for document-wide issues.
    pub heading_title: String,

    /// 1-indexed source line; zero for document-wide issues.
    pub line: usize,

    pub description: String,

    /// Suggested fix, when one is obvious.
    pub suggestion: Option<String>,
}

impl StructureIssue {
    /// Creates an issue.
    pub fn new(
        kind: StructureIssueKind,
        heading_title: impl Into<String>,
        line: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            heading_title: heading_title.into(),
            line,
            description: description.into(),
            suggestion: None,
        }
    }

    /// Attaches a suggested fix.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of a structure validation pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StructureReport {
    /// Level of the first heading, if any.
    pub root_level: Option<HeadingLevel>,

    /// Shallowest level present.
    pub min_level: Option<HeadingLevel>,

    /// Deepest level present.
    pub max_level: Option<HeadingLevel>,

    /// Total headings seen.
    pub heading_count: usize,

    /// Problems found, in document order.
    pub issues: Vec<StructureIssue>,
}

impl StructureReport {
    /// Whether no issues were found.
    pub fn is_well_formed(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of one kind.
    pub fn issues_of_kind(&self, kind: StructureIssueKind) -> Vec<&StructureIssue> {
        self.issues.iter().filter(|i| i.kind == kind).collect()
    }

    /// Whether a uniform shift to `target` keeps every heading inside 1-6.
    pub fn can_relevel_to(&self, target: HeadingLevel) -> bool {
        let (Some(root), Some(min), Some(max)) = (self.root_level, self.min_level, self.max_level)
        else {
            return false;
        };
        let adjustment = root.delta_to(target);
        let deepest = max.as_u8() as i8 + adjustment;
        let shallowest = min.as_u8() as i8 + adjustment;
        (1..=6).contains(&deepest) && (1..=6).contains(&shallowest)
    }
}

/// Validates a flat heading-level sequence in document order.
pub fn validate_levels(headings: &[HeadingSummary]) -> StructureReport {
    let mut report = StructureReport::default();

    let Some(first) = headings.first() else {
        report.issues.push(StructureIssue::new(
            StructureIssueKind::NoHeadings,
            "",
            0,
            "document has no headings",
        ));
        return report;
    };

    report.heading_count = headings.len();
    report.root_level = Some(first.level);
    report.min_level = headings.iter().map(|h| h.level).min();
    report.max_level = headings.iter().map(|h| h.level).max();

    let root_level = first.level;

    for heading in &headings[1..] {
        if heading.level < root_level {
            report.issues.push(
                StructureIssue::new(
                    StructureIssueKind::HierarchyViolation,
                    heading.title.clone(),
                    heading.line,
                    format!(
                        "heading '{}' at {} is shallower than the root level {}",
                        heading.title, heading.level, root_level
                    ),
                )
                .with_suggestion(format!("use {} or deeper", root_level)),
            );
        }
    }

    let h1_count = headings
        .iter()
        .filter(|h| h.level == HeadingLevel::H1)
        .count();
    if h1_count > 1 {
        report.issues.push(StructureIssue::new(
            StructureIssueKind::MultipleH1,
            "",
            0,
            format!("document has {h1_count} H1 headings (expected at most 1)"),
        ));
    }

    let mut prev_level = root_level;
    for heading in &headings[1..] {
        let jump = prev_level.delta_to(heading.level);
        if jump > 1 {
            let issue = StructureIssue::new(
                StructureIssueKind::SkippedLevel,
                heading.title.clone(),
                heading.line,
                format!(
                    "heading '{}' jumps from {} to {}, skipping {} level(s)",
                    heading.title,
                    prev_level,
                    heading.level,
                    jump - 1
                ),
            );
            let issue = match prev_level.deeper() {
                Some(next) => issue.with_suggestion(format!("insert an {next} heading first")),
                None => issue,
            };
            report.issues.push(issue);
        }
        prev_level = heading.level;
    }

    report
}

/// Flattens an outline into validator input via a pre-order walk.
pub fn heading_summaries(outline: &Outline) -> Vec<HeadingSummary> {
    fn visit(node: &Section, out: &mut Vec<HeadingSummary>) {
        out.push(HeadingSummary::new(
            node.level,
            node.title.clone(),
            node.line_range.0,
        ));
        for child in &node.children {
            visit(child, out);
        }
    }

    let mut out = Vec::new();
    for root in &outline.roots {
        visit(root, &mut out);
    }
    out
}

impl Outline {
    /// Validates this outline's heading structure.
    pub fn validate_structure(&self) -> StructureReport {
        validate_levels(&heading_summaries(self))
    }
}
