use serde_yaml::{Mapping, Value as Yaml};
use thiserror::Error;

use super::Value;

/// Error returned when YAML that should describe a record is not a mapping.
#[derive(Debug, Error, PartialEq)]
pub enum RecordShapeError {
    /// The top-level YAML value is a scalar or sequence.
    #[error("expected a key-value mapping, found {found}")]
    NotAMapping { found: &'static str },

    /// A mapping key is itself a sequence, mapping or null.
    #[error("unsupported mapping key: {key}")]
    UnsupportedKey { key: String },
}

/// Ordered key-value metadata, as stored in a note's front matter.
///
/// Keys keep their insertion order so that re-encoding a record produces the
/// same header. Keys are arbitrary and carried opaquely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    entries: Vec<(String, Value)>,
}

impl MetadataRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces a value.
    ///
    /// A replaced key keeps its original position; a new key is appended.
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns the labels stored under `tags`, or nothing if the key is absent.
    pub fn tags(&self) -> Vec<String> {
        self.get("tags").map(Value::labels).unwrap_or_default()
    }

    /// Converts the record into a YAML mapping, preserving key order.
    pub fn to_yaml(&self) -> Yaml {
        let mut mapping = Mapping::new();
        for (key, value) in &self.entries {
            mapping.insert(Yaml::String(key.clone()), value.to_yaml());
        }
        Yaml::Mapping(mapping)
    }
}

impl TryFrom<Yaml> for MetadataRecord {
    type Error = RecordShapeError;

    /// Builds a record from a parsed YAML document.
    ///
    /// Only mappings are accepted. Keys with a `null` value are dropped;
    /// string, number and boolean keys are kept as text.
    fn try_from(value: Yaml) -> Result<Self, Self::Error> {
        let mapping = match value {
            Yaml::Mapping(mapping) => mapping,
            other => {
                return Err(RecordShapeError::NotAMapping {
                    found: kind_of(&other),
                });
            }
        };

        let mut record = Self::new();
        for (key, value) in mapping {
            let key = match key {
                Yaml::String(s) => s,
                Yaml::Number(n) => n.to_string(),
                Yaml::Bool(b) => b.to_string(),
                other => {
                    return Err(RecordShapeError::UnsupportedKey {
                        key: format!("{other:?}"),
                    });
                }
            };
            if let Some(value) = Value::from_yaml(value) {
                record.insert(key, value);
            }
        }
        Ok(record)
    }
}

impl<K, V> FromIterator<(K, V)> for MetadataRecord
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

fn kind_of(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Bool(_) => "a boolean",
        Yaml::Number(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Sequence(_) => "a sequence",
        Yaml::Mapping(_) => "a mapping",
        Yaml::Tagged(_) => "a tagged value",
    }
}
