//! Heading re-leveling and normalization.
//!
//! Both operations compute one uniform signed shift from the document's
//! root level to a target level and rewrite every ATX heading marker by
//! that amount. The rewrite is all-or-nothing: if any heading would leave
//! the H1-H6 range, the whole operation is rejected and the document is
//! untouched.

use serde::Serialize;
use thiserror::Error;

use crate::document::Document;
use crate::events::{HeadingLevel, ScanEvent};
use crate::structure::{
    validate_levels, HeadingSummary, StructureIssue, StructureIssueKind, StructureReport,
};

/// Errors produced by re-leveling. Everything else the normalizer can
/// observe (skipped levels, duplicate H1s) is reported as data instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    /// Re-leveling was requested on a document with no headings.
    #[error("document has no headings")]
    NoHeadings,

    /// The shift would push at least one heading outside H1-H6. The
    /// operation is rejected atomically.
    #[error(
        "cannot re-level to {target}: {affected_count} heading(s) would leave the H1-H6 range \
         ('{deepest_title}' would become H{would_become})"
    )]
    LevelOverflow {
        target: HeadingLevel,
        affected_count: usize,
        deepest_title: String,
        would_become: i8,
    },

    /// Pre-existing structural issues make a root-relative shift ambiguous.
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

/// Details of a rejected shift, in report form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverflowInfo {
    pub target: HeadingLevel,
    pub affected_count: usize,
    pub deepest_title: String,
    pub would_become: i8,
}

impl OverflowInfo {
    /// Renders the overflow as a structure issue for report consumers.
    pub fn to_issue(&self) -> StructureIssue {
        StructureIssue::new(
            StructureIssueKind::LevelOverflow,
            self.deepest_title.clone(),
            0,
            format!(
                "re-leveling to {} would make '{}' H{}",
                self.target, self.deepest_title, self.would_become
            ),
        )
    }
}

/// One heading's level change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingAdjustment {
    pub title: String,
    pub line: usize,
    pub from: HeadingLevel,
    pub to: HeadingLevel,
}

/// Report of a normalization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationReport {
    /// Root level before the shift.
    pub original_root_level: Option<HeadingLevel>,

    /// Requested root level.
    pub target_level: HeadingLevel,

    /// The uniform shift applied: positive demotes, negative promotes.
    pub adjustment: i8,

    /// Every heading that changed level, in document order.
    pub adjustments: Vec<HeadingAdjustment>,

    /// Pre-existing structural issues carried over from validation so
    /// callers can decide whether to repair them separately. Closing level
    /// gaps is out of scope here.
    pub structure_issues: Vec<StructureIssue>,

    /// Populated when the report describes a rejected shift.
    pub overflow: Option<OverflowInfo>,
}

impl NormalizationReport {
    /// Whether the run changed any heading.
    pub fn has_changes(&self) -> bool {
        !self.adjustments.is_empty()
    }

    /// Report form of a rejected re-leveling, for serialization alongside
    /// successful runs.
    pub fn rejected(
        original_root_level: Option<HeadingLevel>,
        target_level: HeadingLevel,
        error: &NormalizationError,
    ) -> Self {
        let overflow = match error {
            NormalizationError::LevelOverflow {
                target,
                affected_count,
                deepest_title,
                would_become,
            } => Some(OverflowInfo {
                target: *target,
                affected_count: *affected_count,
                deepest_title: deepest_title.clone(),
                would_become: *would_become,
            }),
            _ => None,
        };
        let structure_issues = overflow.iter().map(OverflowInfo::to_issue).collect();

        Self {
            original_root_level,
            target_level,
            adjustment: 0,
            adjustments: Vec::new(),
            structure_issues,
            overflow,
        }
    }
}

/// A heading observed in the event stream.
#[derive(Debug, Clone)]
struct EventHeading {
    level: HeadingLevel,
    title: String,
    line: usize,
}

fn event_headings(events: &[ScanEvent]) -> Vec<EventHeading> {
    events
        .iter()
        .filter_map(|event| match event {
            ScanEvent::HeadingStart {
                level, title, line, ..
            } => Some(EventHeading {
                level: *level,
                title: title.clone(),
                line: *line,
            }),
            _ => None,
        })
        .collect()
}

fn summaries(headings: &[EventHeading]) -> Vec<HeadingSummary> {
    headings
        .iter()
        .map(|h| HeadingSummary::new(h.level, h.title.clone(), h.line))
        .collect()
}

/// Finds the heading that would land furthest outside H1-H6, if any.
fn shift_overflow(
    headings: &[EventHeading],
    target: HeadingLevel,
    adjustment: i8,
) -> Option<OverflowInfo> {
    let affected: Vec<&EventHeading> = headings
        .iter()
        .filter(|h| !(1..=6).contains(&(h.level.as_u8() as i8 + adjustment)))
        .collect();
    let worst = affected.iter().max_by_key(|h| {
        let shifted = h.level.as_u8() as i8 + adjustment;
        // distance outside the valid range, in either direction
        (shifted - 6).max(1 - shifted)
    })?;

    Some(OverflowInfo {
        target,
        affected_count: affected.len(),
        deepest_title: worst.title.clone(),
        would_become: worst.level.as_u8() as i8 + adjustment,
    })
}

/// Rewrites the ATX heading markers on the given lines by `adjustment`.
fn apply_shift(content: &str, headings: &[EventHeading], adjustment: i8) -> String {
    let mut lines: Vec<String> = content.split('\n').map(String::from).collect();

    for heading in headings {
        let Some(line) = heading.line.checked_sub(1).and_then(|i| lines.get_mut(i)) else {
            continue;
        };
        let stripped = line.trim_start_matches('#');
        let old_count = line.len() - stripped.len();
        if old_count == 0 {
            continue;
        }
        let new_count = (old_count as i8 + adjustment).clamp(1, 6) as usize;
        *line = format!("{}{}", "#".repeat(new_count), stripped);
    }

    lines.join("\n")
}

fn plan(
    events: &[ScanEvent],
    target: HeadingLevel,
) -> Result<(Vec<EventHeading>, i8), NormalizationError> {
    let headings = event_headings(events);
    let Some(first) = headings.first() else {
        return Err(NormalizationError::NoHeadings);
    };
    let adjustment = first.level.delta_to(target);

    if let Some(overflow) = shift_overflow(&headings, target, adjustment) {
        return Err(NormalizationError::LevelOverflow {
            target: overflow.target,
            affected_count: overflow.affected_count,
            deepest_title: overflow.deepest_title,
            would_become: overflow.would_become,
        });
    }
    Ok((headings, adjustment))
}

/// Shifts every heading so the document's root lands on `target`.
///
/// Returns the new document and the signed adjustment that was applied.
/// The input document is never modified, even on failure.
pub fn relevel(
    document: &Document,
    events: &[ScanEvent],
    target: HeadingLevel,
) -> Result<(Document, i8), NormalizationError> {
    let (headings, adjustment) = plan(events, target)?;
    if adjustment == 0 {
        return Ok((document.clone(), 0));
    }
    let content = apply_shift(document.content(), &headings, adjustment);
    Ok((document.with_content(content), adjustment))
}

/// In-place variant of [`relevel`]. The receiver is only modified when the
/// whole shift succeeds.
pub fn relevel_in_place(
    document: &mut Document,
    events: &[ScanEvent],
    target: HeadingLevel,
) -> Result<i8, NormalizationError> {
    let (headings, adjustment) = plan(events, target)?;
    if adjustment != 0 {
        *document.content_mut() = apply_shift(document.content(), &headings, adjustment);
    }
    Ok(adjustment)
}

/// Like [`relevel`], but validates structure first and carries the findings
/// in the returned report.
///
/// Skipped levels and duplicate H1s do not block the shift; they are
/// surfaced so the caller can decide whether to repair them. A heading
/// shallower than the document root does block it: with more than one
/// effective root there is no single meaningful adjustment.
pub fn normalize(
    document: &Document,
    events: &[ScanEvent],
    target: HeadingLevel,
) -> Result<(Document, NormalizationReport), NormalizationError> {
    let (headings, adjustment, validation) = validated_plan(events, target)?;

    let adjustments = adjustment_records(&headings, adjustment);
    let content = if adjustment == 0 {
        document.content().to_string()
    } else {
        apply_shift(document.content(), &headings, adjustment)
    };

    let report = NormalizationReport {
        original_root_level: validation.root_level,
        target_level: target,
        adjustment,
        adjustments,
        structure_issues: validation.issues,
        overflow: None,
    };
    Ok((document.with_content(content), report))
}

/// In-place variant of [`normalize`].
pub fn normalize_in_place(
    document: &mut Document,
    events: &[ScanEvent],
    target: HeadingLevel,
) -> Result<NormalizationReport, NormalizationError> {
    let (updated, report) = normalize(document, events, target)?;
    *document.content_mut() = updated.content().to_string();
    Ok(report)
}

fn validated_plan(
    events: &[ScanEvent],
    target: HeadingLevel,
) -> Result<(Vec<EventHeading>, i8, StructureReport), NormalizationError> {
    let headings = event_headings(events);
    if headings.is_empty() {
        return Err(NormalizationError::NoHeadings);
    }

    let validation = validate_levels(&summaries(&headings));
    if !validation
        .issues_of_kind(StructureIssueKind::HierarchyViolation)
        .is_empty()
    {
        return Err(NormalizationError::ValidationFailed(
            "headings shallower than the document root make a root-relative shift ambiguous"
                .to_string(),
        ));
    }

    let (headings, adjustment) = plan(events, target)?;
    Ok((headings, adjustment, validation))
}

fn adjustment_records(headings: &[EventHeading], adjustment: i8) -> Vec<HeadingAdjustment> {
    if adjustment == 0 {
        return Vec::new();
    }
    headings
        .iter()
        .filter_map(|h| {
            let to = HeadingLevel::new((h.level.as_u8() as i8 + adjustment) as u8)?;
            Some(HeadingAdjustment {
                title: h.title.clone(),
                line: h.line,
                from: h.level,
                to,
            })
        })
        .collect()
}
