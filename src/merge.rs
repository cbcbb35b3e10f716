//! Reconciling existing front matter with generated metadata.
//!
//! [`apply_policy`] picks the outcome for a run's [`MergeMode`];
//! [`merge_records`] is the outer join used by `MergeMode::Merge`.
//!
//! | existing | mode     | result                    | action        |
//! |----------|----------|---------------------------|---------------|
//! | none     | any      | generated                 | Added YAML    |
//! | present  | Additive | generated                 | Added YAML    |
//! | present  | Merge    | `merge_records(..)`       | Merged YAML   |
//! | present  | Replace  | generated                 | Replaced YAML |

use std::collections::HashSet;

use serde_yaml::Value as Yaml;

use crate::models::{AuditAction, MergeMode, MetadataRecord, Value};

/// The record to write and the action that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub record: MetadataRecord,
    pub action: AuditAction,
}

/// Combines a note's existing front matter with generated metadata.
///
/// # Examples
///
/// ```
/// use notetag::{AuditAction, MergeMode, MetadataRecord, apply_policy};
///
/// let existing: MetadataRecord = [("category", "Technology")].into_iter().collect();
/// let mut generated = MetadataRecord::new();
/// generated.insert("tags", vec!["AI"]);
///
/// let outcome = apply_policy(Some(&existing), &generated, MergeMode::Replace);
/// assert_eq!(outcome.record, generated);
/// assert_eq!(outcome.action, AuditAction::Replaced);
/// ```
pub fn apply_policy(
    existing: Option<&MetadataRecord>,
    generated: &MetadataRecord,
    mode: MergeMode,
) -> MergeOutcome {
    let (record, action) = match (existing, mode) {
        (None, _) | (Some(_), MergeMode::Additive) => (generated.clone(), AuditAction::Added),
        (Some(existing), MergeMode::Merge) => {
            (merge_records(existing, generated), AuditAction::Merged)
        }
        (Some(_), MergeMode::Replace) => (generated.clone(), AuditAction::Replaced),
    };
    MergeOutcome { record, action }
}

/// Outer-joins two records, letting curated values survive.
///
/// For every key in either record:
///
/// - only in `existing`: kept as is.
/// - only in `generated`: adopted, unless the generated value is empty. An
///   empty generated value never introduces a key.
/// - in both: an empty generated value keeps the existing one. Otherwise,
///   if either side is a list (including a YAML sequence with non-string
///   items) the two are unioned without duplicates (existing items first,
///   then new ones in generated order). Otherwise the generated value wins.
///
/// Existing keys keep their positions; new keys follow in generated order.
///
/// # Examples
///
/// ```
/// use notetag::{MetadataRecord, Value, merge_records};
///
/// let mut existing = MetadataRecord::new();
/// existing.insert("tags", vec!["AI", "Machine Learning"]);
/// existing.insert("topic", "Neural Networks");
///
/// let mut generated = MetadataRecord::new();
/// generated.insert("tags", vec!["Deep Learning", "AI"]);
/// generated.insert("phase", "");
///
/// let merged = merge_records(&existing, &generated);
/// assert_eq!(
///     merged.get("tags"),
///     Some(&Value::from(vec!["AI", "Machine Learning", "Deep Learning"]))
/// );
/// assert_eq!(merged.get("topic"), Some(&Value::from("Neural Networks")));
/// assert!(!merged.contains_key("phase"));
/// ```
pub fn merge_records(existing: &MetadataRecord, generated: &MetadataRecord) -> MetadataRecord {
    let mut merged = existing.clone();

    for (key, incoming) in generated.iter() {
        if incoming.is_empty() {
            continue;
        }

        let value = match existing.get(key) {
            Some(current) => merge_values(current, incoming),
            None => incoming.clone(),
        };
        merged.insert(key, value);
    }

    merged
}

/// Merges two values present under the same key. `incoming` is non-empty.
///
/// A sequence on either side (a string list or a YAML sequence with
/// non-string items) makes the result a union. Items keep their YAML types,
/// so `[AI, 2024]` stays a mixed sequence.
fn merge_values(current: &Value, incoming: &Value) -> Value {
    if !is_sequence(current) && !is_sequence(incoming) {
        return incoming.clone();
    }

    match (items(current), items(incoming)) {
        (Some(first), Some(second)) => sequence_value(union(first, second)),
        _ => incoming.clone(),
    }
}

fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::List(_) | Value::Opaque(Yaml::Sequence(_)))
}

/// The items a value contributes to a union, or `None` for a nested mapping
/// (or tagged value), which cannot join one.
fn items(value: &Value) -> Option<Vec<Yaml>> {
    match value {
        Value::Scalar(s) if s.is_empty() => Some(Vec::new()),
        Value::Scalar(s) => Some(vec![Yaml::String(s.clone())]),
        Value::List(items) => Some(items.iter().cloned().map(Yaml::String).collect()),
        Value::Opaque(Yaml::Sequence(items)) => Some(items.clone()),
        Value::Opaque(Yaml::Mapping(_) | Yaml::Tagged(_)) => None,
        Value::Opaque(other) => Some(vec![other.clone()]),
    }
}

fn union(first: Vec<Yaml>, second: Vec<Yaml>) -> Vec<Yaml> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(first.len() + second.len());
    for item in first.into_iter().chain(second) {
        if !seen.contains(&item) {
            seen.insert(item.clone());
            merged.push(item);
        }
    }
    merged
}

/// A string list when every item is a string, otherwise an opaque sequence.
fn sequence_value(items: Vec<Yaml>) -> Value {
    if items.iter().all(Yaml::is_string) {
        Value::List(
            items
                .into_iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect(),
        )
    } else {
        Value::Opaque(Yaml::Sequence(items))
    }
}
