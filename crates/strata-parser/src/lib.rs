//! Strata markdown adapter.
//!
//! Bridges real markdown source onto the `strata-core` event contract and
//! offers one-call entry points for the common flows: build an outline,
//! validate structure, re-level headings, or diff two versions.
//!
//! ```
//! let toc = strata_parser::outline("# Intro\n\nWelcome.\n\n## Setup\n\nDo X.\n");
//! assert_eq!(toc.heading_count(), 2);
//! assert_eq!(toc.title.as_deref(), Some("Intro"));
//! ```

pub mod scan;

pub use scan::scan;

use strata_core::delta::{compute_delta, DocumentDelta};
use strata_core::document::Document;
use strata_core::events::{HeadingLevel, ScanEvent};
use strata_core::normalize::{NormalizationError, NormalizationReport};
use strata_core::outline::Outline;
use strata_core::structure::StructureReport;

/// A document paired with its scan events, ready for the core algorithms.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    pub events: Vec<ScanEvent>,
}

impl ParsedDocument {
    /// Builds this document's outline.
    pub fn outline(&self) -> Outline {
        Outline::build(&self.document, &self.events)
    }
}

/// Splits frontmatter and scans the body into events.
pub fn parse(source: &str) -> ParsedDocument {
    let document = Document::from(source);
    let events = scan(document.content());
    ParsedDocument { document, events }
}

/// Builds the outline of a markdown source string.
pub fn outline(source: &str) -> Outline {
    parse(source).outline()
}

/// Validates the heading structure of a markdown source string.
pub fn validate(source: &str) -> StructureReport {
    outline(source).validate_structure()
}

/// Shifts a document so its root heading lands on `target`.
pub fn relevel(
    source: &str,
    target: HeadingLevel,
) -> Result<(Document, i8), NormalizationError> {
    let parsed = parse(source);
    strata_core::normalize::relevel(&parsed.document, &parsed.events, target)
}

/// Validates, then shifts a document to `target`, reporting carried issues.
pub fn normalize(
    source: &str,
    target: HeadingLevel,
) -> Result<(Document, NormalizationReport), NormalizationError> {
    let parsed = parse(source);
    strata_core::normalize::normalize(&parsed.document, &parsed.events, target)
}

/// Compares two versions of a markdown source.
pub fn delta(old_source: &str, new_source: &str) -> DocumentDelta {
    compute_delta(&outline(old_source), &outline(new_source))
}
