// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property paths into a feature's JSON projection.
//!
//! A [`FeaturePath`] is an ordered list of object keys and array indices, the
//! same shape a change carries on the wire (`["nodes", 2]`). Numeric-looking
//! string keys also index arrays, so `["nodes", "2"]` addresses the same slot.
//!
//! The helpers mutate the value they are given. The reducer only ever hands
//! them a freshly projected copy of one feature, so the stored state is never
//! touched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One step of a [`FeaturePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    /// Array position.
    Index(usize),
    /// Object key (numeric strings double as array positions).
    Key(String),
}

impl PathKey {
    /// Array position this key addresses, if any.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(k) => k.parse().ok(),
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Ordered path from a feature's root to one of its properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeaturePath(Vec<PathKey>);

impl FeaturePath {
    /// Builds a path from its keys.
    pub fn new(keys: impl IntoIterator<Item = impl Into<PathKey>>) -> Self {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Single-key path addressing a top-level property.
    pub fn field(name: &str) -> Self {
        Self(vec![PathKey::from(name)])
    }

    /// The keys, root first.
    #[must_use]
    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    /// `true` for the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First key rendered as a property name.
    #[must_use]
    pub fn root_field(&self) -> Option<String> {
        self.0.first().map(ToString::to_string)
    }
}

impl fmt::Display for FeaturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Failure to resolve or edit a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Removal requested at the root.
    #[error("cannot remove the root of a value")]
    Empty,
    /// No property or slot exists at this key.
    #[error("nothing at key `{key}`")]
    Missing {
        /// Key that failed to resolve.
        key: String,
    },
    /// Array index is beyond the end (writes may append at `len`).
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current array length.
        len: usize,
    },
    /// A non-numeric key was used on an array.
    #[error("key `{key}` cannot index an array")]
    ExpectedIndex {
        /// Offending key.
        key: String,
    },
    /// Tried to descend into a scalar.
    #[error("cannot descend into {found} at key `{key}`")]
    NotAContainer {
        /// Key that required a container.
        key: String,
        /// JSON kind found instead.
        found: &'static str,
    },
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads the value at `path`, or `None` if any step is missing.
#[must_use]
pub fn get_at<'a>(target: &'a Value, path: &FeaturePath) -> Option<&'a Value> {
    path.keys().iter().try_fold(target, |node, key| match node {
        Value::Object(map) => map.get(&key.to_string()),
        Value::Array(items) => key.as_index().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Writes `value` at `path`, creating intermediate objects or arrays for
/// missing or null steps. An index equal to the array length appends.
pub fn set_at(target: &mut Value, path: &FeaturePath, value: Value) -> Result<(), PathError> {
    set_keys(target, path.keys(), value)
}

fn set_keys(target: &mut Value, keys: &[PathKey], value: Value) -> Result<(), PathError> {
    let Some((head, rest)) = keys.split_first() else {
        *target = value;
        return Ok(());
    };
    if target.is_null() {
        *target = if head.as_index().is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }
    let slot = match target {
        Value::Object(map) => map.entry(head.to_string()).or_insert(Value::Null),
        Value::Array(items) => {
            let index = head.as_index().ok_or_else(|| PathError::ExpectedIndex {
                key: head.to_string(),
            })?;
            let len = items.len();
            if index == len {
                items.push(Value::Null);
            }
            items
                .get_mut(index)
                .ok_or(PathError::IndexOutOfRange { index, len })?
        }
        other => {
            return Err(PathError::NotAContainer {
                key: head.to_string(),
                found: kind(other),
            })
        }
    };
    set_keys(slot, rest, value)
}

/// Like [`set_at`], except that an index into an existing array splices
/// `value` in before that slot instead of overwriting it. An index equal to
/// the array length appends.
pub fn insert_at(target: &mut Value, path: &FeaturePath, value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.keys().split_last() else {
        return set_at(target, path, value);
    };
    let parent_path = FeaturePath(parents.to_vec());
    if !matches!(get_at(target, &parent_path), Some(Value::Array(_))) {
        return set_at(target, path, value);
    }
    let parent = parents
        .iter()
        .try_fold(target, |node, key| child_mut(node, key))?;
    match parent {
        Value::Array(items) => {
            let len = items.len();
            let index = last.as_index().ok_or_else(|| PathError::ExpectedIndex {
                key: last.to_string(),
            })?;
            if index > len {
                return Err(PathError::IndexOutOfRange { index, len });
            }
            items.insert(index, value);
            Ok(())
        }
        other => set_keys(other, std::slice::from_ref(last), value),
    }
}

fn child_mut<'a>(node: &'a mut Value, key: &PathKey) -> Result<&'a mut Value, PathError> {
    let missing = || PathError::Missing {
        key: key.to_string(),
    };
    match node {
        Value::Object(map) => map.get_mut(&key.to_string()).ok_or_else(missing),
        Value::Array(items) => {
            let len = items.len();
            let index = key.as_index().ok_or_else(missing)?;
            items
                .get_mut(index)
                .ok_or(PathError::IndexOutOfRange { index, len })
        }
        other => Err(PathError::NotAContainer {
            key: key.to_string(),
            found: kind(other),
        }),
    }
}

/// Deletes the property or array slot at `path` and returns what was there.
///
/// Array slots are spliced out, so later elements shift down by one.
pub fn remove_at(target: &mut Value, path: &FeaturePath) -> Result<Value, PathError> {
    let Some((last, parents)) = path.keys().split_last() else {
        return Err(PathError::Empty);
    };
    let parent = parents.iter().try_fold(target, |node, key| child_mut(node, key))?;
    match parent {
        Value::Object(map) => map
            .remove(&last.to_string())
            .ok_or_else(|| PathError::Missing {
                key: last.to_string(),
            }),
        Value::Array(items) => {
            let len = items.len();
            let index = last.as_index().ok_or_else(|| PathError::ExpectedIndex {
                key: last.to_string(),
            })?;
            if index < len {
                Ok(items.remove(index))
            } else {
                Err(PathError::IndexOutOfRange { index, len })
            }
        }
        other => Err(PathError::NotAContainer {
            key: last.to_string(),
            found: kind(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: Value) -> FeaturePath {
        serde_json::from_value(raw).unwrap_or_default()
    }

    #[test]
    fn wire_paths_mix_keys_and_indices() {
        let p = path(json!(["nodes", 1]));
        assert_eq!(p.keys(), &[PathKey::from("nodes"), PathKey::Index(1)]);
        assert_eq!(p.to_string(), "nodes.1");
        assert_eq!(p.root_field().as_deref(), Some("nodes"));
    }

    #[test]
    fn numeric_strings_index_arrays() {
        let doc = json!({"nodes": ["a", "b"]});
        assert_eq!(
            get_at(&doc, &path(json!(["nodes", "1"]))),
            Some(&json!("b"))
        );
        assert_eq!(get_at(&doc, &path(json!(["nodes", 9]))), None);
    }

    #[test]
    fn set_creates_missing_branches() {
        let mut doc = json!({"id": "g1"});
        assert_eq!(
            set_at(&mut doc, &path(json!(["meta", "tags", 0])), json!("x")),
            Ok(())
        );
        assert_eq!(doc, json!({"id": "g1", "meta": {"tags": ["x"]}}));
    }

    #[test]
    fn set_appends_at_len_and_rejects_gaps() {
        let mut doc = json!({"nodes": ["a"]});
        assert_eq!(
            set_at(&mut doc, &path(json!(["nodes", 1])), json!("b")),
            Ok(())
        );
        assert_eq!(doc, json!({"nodes": ["a", "b"]}));
        assert_eq!(
            set_at(&mut doc, &path(json!(["nodes", 5])), json!("z")),
            Err(PathError::IndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn insert_splices_into_arrays_and_sets_elsewhere() {
        let mut doc = json!({"nodes": ["a", "c"], "name": "x"});
        assert_eq!(
            insert_at(&mut doc, &path(json!(["nodes", 1])), json!("b")),
            Ok(())
        );
        assert_eq!(
            insert_at(&mut doc, &path(json!(["nodes", 3])), json!("d")),
            Ok(())
        );
        assert_eq!(
            insert_at(&mut doc, &path(json!(["name"])), json!("y")),
            Ok(())
        );
        assert_eq!(doc, json!({"nodes": ["a", "b", "c", "d"], "name": "y"}));
        assert_eq!(
            insert_at(&mut doc, &path(json!(["nodes", 9])), json!("z")),
            Err(PathError::IndexOutOfRange { index: 9, len: 4 })
        );
        assert_eq!(
            insert_at(&mut doc, &path(json!(["meta", 0])), json!("m")),
            Ok(())
        );
        assert_eq!(doc["meta"], json!(["m"]));
    }

    #[test]
    fn remove_splices_array_slots() {
        let mut doc = json!({"nodes": ["a", "b", "c"]});
        assert_eq!(
            remove_at(&mut doc, &path(json!(["nodes", 1]))),
            Ok(json!("b"))
        );
        assert_eq!(doc, json!({"nodes": ["a", "c"]}));
    }

    #[test]
    fn remove_reports_missing_leaf_and_root() {
        let mut doc = json!({"position": {"x": 1.0}});
        assert_eq!(
            remove_at(&mut doc, &path(json!(["position", "y"]))),
            Err(PathError::Missing { key: "y".into() })
        );
        assert_eq!(
            remove_at(&mut doc, &FeaturePath::default()),
            Err(PathError::Empty)
        );
        assert_eq!(
            remove_at(&mut doc, &path(json!(["position", "x", "deep"]))),
            Err(PathError::NotAContainer {
                key: "deep".into(),
                found: "a number"
            })
        );
    }
}
