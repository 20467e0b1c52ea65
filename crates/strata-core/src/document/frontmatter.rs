//! Frontmatter storage and merge helpers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::DocumentError;

/// Strategy for merging external data into existing frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Error if a key exists on both sides.
    ErrorOnConflict,
    /// Prefer the incoming value on conflict.
    PreferExternal,
    /// Keep the document's existing value on conflict.
    PreferDocument,
}

/// An ordered key/value preamble attached to a document.
///
/// Keys keep their insertion order, which is what lets the delta engine
/// distinguish a genuine property change from a pure reordering.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Frontmatter(Mapping);

impl Frontmatter {
    /// Creates empty frontmatter.
    pub fn new() -> Self {
        Self(Mapping::new())
    }

    /// Wraps an existing mapping.
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self(mapping)
    }

    /// Whether no keys are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// String keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0
            .keys()
            .filter_map(|k| k.as_str().map(ToOwned::to_owned))
            .collect()
    }

    /// Raw value lookup.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Gets a typed value.
    ///
    /// ## Examples
    ///
    /// ```
    /// use strata_core::document::Frontmatter;
    ///
    /// let mut fm = Frontmatter::new();
    /// fm.insert("title", "Hello").unwrap();
    /// let title: Option<String> = fm.get("title").unwrap();
    /// assert_eq!(title, Some("Hello".to_string()));
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DocumentError> {
        match self.0.get(key) {
            Some(value) => Ok(Some(serde_yaml::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Inserts a value, replacing any existing entry for the key.
    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), DocumentError> {
        let value = serde_yaml::to_value(value)?;
        self.0.insert(Value::String(key.to_string()), value);
        Ok(())
    }

    /// Removes a key, returning its value if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Merges another serializable value into this frontmatter.
    ///
    /// The value must serialize to a mapping. Conflicts are resolved per the
    /// given [`MergeStrategy`].
    pub fn merge_with<T: Serialize>(
        &mut self,
        other: T,
        strategy: MergeStrategy,
    ) -> Result<(), DocumentError> {
        for (key, value) in into_mapping(other)? {
            if self.0.contains_key(&key) {
                match strategy {
                    MergeStrategy::ErrorOnConflict => {
                        return Err(DocumentError::MergeConflict(describe_key(&key)));
                    }
                    MergeStrategy::PreferExternal => {
                        self.0.insert(key, value);
                    }
                    MergeStrategy::PreferDocument => {}
                }
            } else {
                self.0.insert(key, value);
            }
        }
        Ok(())
    }

    /// Fills in missing keys from a serializable defaults value.
    pub fn set_defaults<T: Serialize>(&mut self, defaults: T) -> Result<(), DocumentError> {
        for (key, value) in into_mapping(defaults)? {
            if !self.0.contains_key(&key) {
                self.0.insert(key, value);
            }
        }
        Ok(())
    }

    /// Returns the underlying ordered mapping.
    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Serializes to a YAML string (no delimiters).
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Canonical JSON form: key order and YAML formatting are erased, so two
    /// frontmatters with the same values always produce the same string.
    pub fn canonical_json(&self) -> String {
        serde_json::to_value(&self.0)
            .and_then(|v| serde_json::to_string(&v))
            .unwrap_or_default()
    }
}

fn into_mapping<T: Serialize>(value: T) -> Result<Mapping, DocumentError> {
    match serde_yaml::to_value(value)? {
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(DocumentError::NotAMapping(describe_key(&other))),
    }
}

fn describe_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}
