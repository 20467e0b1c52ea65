//! The document value: ordered frontmatter plus body content.
//!
//! A [`Document`] is constructed once from a source representation and
//! treated as an immutable value; operations that change a document (such as
//! re-leveling) produce a new one. The outline and delta layers only ever
//! read it.

mod frontmatter;

pub use frontmatter::{Frontmatter, MergeStrategy};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors produced by document construction and frontmatter access.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Frontmatter was present but not valid YAML.
    #[error("invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    /// A merge hit a conflicting key under `MergeStrategy::ErrorOnConflict`.
    #[error("frontmatter merge conflict on key '{0}'")]
    MergeConflict(String),

    /// A merge source did not serialize to a key/value mapping.
    #[error("expected a mapping for frontmatter merge, got '{0}'")]
    NotAMapping(String),
}

/// A markdown document: ordered frontmatter plus raw body text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Document {
    frontmatter: Frontmatter,
    content: String,
}

impl Document {
    /// Creates a document with empty frontmatter.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            frontmatter: Frontmatter::new(),
            content: content.into(),
        }
    }

    /// Creates a document from parts.
    pub fn with_frontmatter(frontmatter: Frontmatter, content: impl Into<String>) -> Self {
        Self {
            frontmatter,
            content: content.into(),
        }
    }

    /// Parses a source string, splitting a leading `---` YAML frontmatter
    /// block from the body.
    ///
    /// ## Errors
    ///
    /// Returns [`DocumentError::Frontmatter`] when a frontmatter block is
    /// present but its YAML does not parse. Use the `From<&str>` conversion
    /// for the lenient variant that falls back to treating the whole input
    /// as content.
    pub fn parse(source: &str) -> Result<Self, DocumentError> {
        match split_frontmatter(source) {
            Some((yaml, body)) => {
                let mapping = if yaml.trim().is_empty() {
                    Default::default()
                } else {
                    serde_yaml::from_str(yaml)?
                };
                Ok(Self::with_frontmatter(
                    Frontmatter::from_mapping(mapping),
                    body,
                ))
            }
            None => Ok(Self::new(source)),
        }
    }

    /// Returns the frontmatter.
    pub fn frontmatter(&self) -> &Frontmatter {
        &self.frontmatter
    }

    /// Returns the frontmatter for mutation.
    pub fn frontmatter_mut(&mut self) -> &mut Frontmatter {
        &mut self.frontmatter
    }

    /// Returns the body content (frontmatter excluded).
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the body content for mutation.
    pub fn content_mut(&mut self) -> &mut String {
        &mut self.content
    }

    /// Produces a new document with the same frontmatter and new content.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            frontmatter: self.frontmatter.clone(),
            content: content.into(),
        }
    }

    /// Gets a typed frontmatter value.
    pub fn fm_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DocumentError> {
        self.frontmatter.get(key)
    }

    /// Inserts a frontmatter value.
    pub fn fm_insert<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), DocumentError> {
        self.frontmatter.insert(key, value)
    }

    /// Merges external data into the frontmatter.
    pub fn fm_merge_with<T: Serialize>(
        &mut self,
        other: T,
        strategy: MergeStrategy,
    ) -> Result<(), DocumentError> {
        self.frontmatter.merge_with(other, strategy)
    }

    /// Fills in missing frontmatter keys from defaults.
    pub fn fm_set_defaults<T: Serialize>(&mut self, defaults: T) -> Result<(), DocumentError> {
        self.frontmatter.set_defaults(defaults)
    }

    /// Re-emits the document as a string, frontmatter block included.
    pub fn as_string(&self) -> String {
        if self.frontmatter.is_empty() {
            return self.content.clone();
        }
        let yaml = self.frontmatter.to_yaml().unwrap_or_default();
        format!("---\n{}---\n{}", yaml, self.content)
    }
}

impl From<&str> for Document {
    fn from(source: &str) -> Self {
        Self::parse(source).unwrap_or_else(|_| Self::new(source))
    }
}

impl From<String> for Document {
    fn from(source: String) -> Self {
        match Self::parse(&source) {
            Ok(doc) => doc,
            Err(_) => Self::new(source),
        }
    }
}

/// Splits `---`-delimited frontmatter from the body. Returns `None` when the
/// source has no frontmatter block.
fn split_frontmatter(source: &str) -> Option<(&str, &str)> {
    let rest = source.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;

    for (offset, line) in line_offsets(rest) {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let after = &rest[offset + line.len()..];
            let body = after.strip_prefix('\n').unwrap_or(after);
            return Some((yaml, body));
        }
    }
    None
}

/// Iterates lines with their byte offsets, newline excluded from the line
/// but accounted for in the following offset.
fn line_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw.trim_end_matches('\n'))
    })
}
