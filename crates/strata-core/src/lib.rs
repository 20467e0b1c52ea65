//! Strata core: a hierarchical structure model for markdown documents.
//!
//! This crate turns a parsed document into an [`outline::Outline`], a
//! heading tree with Merkle-style content fingerprints, and compares two
//! outlines into a structured [`delta::DocumentDelta`]. Around that core it
//! provides content hashing, heading-structure validation, and uniform
//! re-leveling.
//!
//! Parsing itself lives behind the [`events::ScanEvent`] contract: any
//! CommonMark parser that can emit the event shape can drive this crate.
//! The `strata-parser` crate supplies the standard adapter.
//!
//! Everything here is synchronous, allocation-only, and side-effect-free:
//! pure functions over immutable inputs producing new immutable outputs.
//! Independent documents can be processed from as many threads as you
//! like with no shared state.

pub mod delta;
pub mod document;
pub mod events;
pub mod hashing;
pub mod normalize;
pub mod outline;
pub mod structure;

// Re-export the main types for convenience
pub use delta::{
    compute_delta, BrokenLink, ChangeAction, CodeBlockChange, ContentChange, DeltaStatistics,
    DocumentChange, DocumentDelta, FrontmatterChange, MovedSection,
};
pub use document::{Document, DocumentError, Frontmatter, MergeStrategy};
pub use events::{HeadingLevel, InvalidLevel, ScanEvent, SourceSpan};
pub use hashing::{
    hash_fast, hash_fast_bytes, hash_fast_normalized, hash_fast_trimmed, hash_secure,
    hash_secure_bytes, hash_secure_normalized, hash_secure_trimmed, SecureHash,
};
pub use normalize::{
    normalize, normalize_in_place, relevel, relevel_in_place, HeadingAdjustment,
    NormalizationError, NormalizationReport, OverflowInfo,
};
pub use outline::{AnchorLink, CodeBlock, Outline, Section, SectionPath};
pub use structure::{
    validate_levels, HeadingSummary, StructureIssue, StructureIssueKind, StructureReport,
};
