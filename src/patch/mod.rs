//! Two-way strategic merge patch generation
//!
//! Builds a strategic merge patch from two serialized snapshots of the same
//! object. Objects are compared key by key and keys that disappeared are
//! encoded as `null`. Lists follow the object's [`PatchSchema`]: merge-keyed
//! lists carry only the changed elements, `$patch: delete` markers for removed
//! ones, and a `$setElementOrder/<field>` directive; atomic lists are replaced
//! whole. Elements the patch does not mention survive on the server.
//!
//! The patch is checked against client-side [`Precondition`]s before it is
//! handed back, so a rejected patch never reaches the API server.

mod precondition;
mod schema;

pub use precondition::{require_spec_key_unchanged, Precondition};
pub use schema::{ListStrategy, PatchSchema};

use serde_json::{Map, Value};

use crate::Error;

/// Prefix of the directive fixing the order of a merged list
pub const SET_ELEMENT_ORDER: &str = "$setElementOrder/";
/// Prefix of the directive removing scalars from a merged primitive list
pub const DELETE_FROM_PRIMITIVE_LIST: &str = "$deleteFromPrimitiveList/";
/// Key of the per-element patch directive
pub const PATCH_DIRECTIVE: &str = "$patch";

/// A computed strategic merge patch document
#[derive(Clone, Debug, PartialEq)]
pub struct StrategicPatch(Value);

impl StrategicPatch {
    /// Diff `before` against `after` under `schema`. Both must be JSON objects.
    pub fn between(before: &Value, after: &Value, schema: &PatchSchema) -> Result<Self, Error> {
        match (before, after) {
            (Value::Object(old), Value::Object(new)) => {
                Ok(Self(Value::Object(diff_maps(old, new, "", schema)?)))
            }
            _ => Err(Error::serialization(
                "patch can only be computed between two JSON objects",
            )),
        }
    }

    /// True when the two inputs were identical
    pub fn is_empty(&self) -> bool {
        self.0.as_object().map(Map::is_empty).unwrap_or(true)
    }

    /// The patch as a JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the patch, returning the JSON value
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Remove the entry at `path`, dropping any parent left empty.
    ///
    /// Returns true if something was removed.
    pub fn remove_path(&mut self, path: &[&str]) -> bool {
        remove_path(&mut self.0, path)
    }
}

impl std::fmt::Display for StrategicPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the strategic merge patch from `before` to `after` and run every
/// precondition over it.
///
/// Preconditions compose with logical AND: the first one that rejects the
/// patch fails the whole call with [`Error::PreconditionFailed`].
pub fn create_two_way_merge_patch(
    before: &Value,
    after: &Value,
    schema: &PatchSchema,
    preconditions: &[Precondition],
) -> Result<StrategicPatch, Error> {
    let patch = StrategicPatch::between(before, after, schema)?;
    if let Some(rejected) = preconditions.iter().find(|p| !p.allows(patch.as_value())) {
        return Err(Error::precondition_failed(rejected.name(), patch.to_string()));
    }
    Ok(patch)
}

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn diff_maps(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    path: &str,
    schema: &PatchSchema,
) -> Result<Map<String, Value>, Error> {
    let mut patch = Map::new();
    for (key, new_value) in new {
        let field = field_path(path, key);
        match (old.get(key), new_value) {
            (None, _) => {
                patch.insert(key.clone(), new_value.clone());
            }
            (Some(Value::Object(o)), Value::Object(n)) => {
                let changed = diff_maps(o, n, &field, schema)?;
                if !changed.is_empty() {
                    patch.insert(key.clone(), Value::Object(changed));
                }
            }
            (Some(Value::Array(o)), Value::Array(n)) => {
                diff_lists(key, o, n, &field, schema, &mut patch)?;
            }
            (Some(old_value), _) => {
                if old_value != new_value {
                    patch.insert(key.clone(), new_value.clone());
                }
            }
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            patch.insert(key.clone(), Value::Null);
        }
    }
    Ok(patch)
}

fn diff_lists(
    key: &str,
    old: &[Value],
    new: &[Value],
    path: &str,
    schema: &PatchSchema,
    patch: &mut Map<String, Value>,
) -> Result<(), Error> {
    match schema.list_strategy(path) {
        ListStrategy::Atomic => {
            if old != new {
                patch.insert(key.to_string(), Value::Array(new.to_vec()));
            }
        }
        ListStrategy::MergePrimitives => {
            let added: Vec<Value> = new.iter().filter(|v| !old.contains(v)).cloned().collect();
            let removed: Vec<Value> = old.iter().filter(|v| !new.contains(v)).cloned().collect();
            if old != new {
                patch.insert(
                    format!("{SET_ELEMENT_ORDER}{key}"),
                    Value::Array(new.to_vec()),
                );
            }
            if !added.is_empty() {
                patch.insert(key.to_string(), Value::Array(added));
            }
            if !removed.is_empty() {
                patch.insert(
                    format!("{DELETE_FROM_PRIMITIVE_LIST}{key}"),
                    Value::Array(removed),
                );
            }
        }
        ListStrategy::MergeByKey(merge_key) => {
            let old_keys = merge_key_values(old, merge_key, path)?;
            let new_keys = merge_key_values(new, merge_key, path)?;

            let mut elements = Vec::new();
            for (new_element, id) in new.iter().zip(&new_keys) {
                match old_keys.iter().position(|k| k == id) {
                    None => elements.push(new_element.clone()),
                    Some(i) => {
                        let (Value::Object(o), Value::Object(n)) = (&old[i], new_element) else {
                            continue;
                        };
                        let mut changed = diff_maps(o, n, path, schema)?;
                        if !changed.is_empty() {
                            changed.insert(merge_key.to_string(), (*id).clone());
                            elements.push(Value::Object(changed));
                        }
                    }
                }
            }
            for id in old_keys.iter().filter(|k| !new_keys.contains(*k)) {
                let mut marker = Map::new();
                marker.insert(PATCH_DIRECTIVE.to_string(), Value::from("delete"));
                marker.insert(merge_key.to_string(), (*id).clone());
                elements.push(Value::Object(marker));
            }

            if !elements.is_empty() || old_keys != new_keys {
                let order = new_keys
                    .iter()
                    .map(|id| {
                        let mut entry = Map::new();
                        entry.insert(merge_key.to_string(), (*id).clone());
                        Value::Object(entry)
                    })
                    .collect();
                patch.insert(format!("{SET_ELEMENT_ORDER}{key}"), Value::Array(order));
            }
            if !elements.is_empty() {
                patch.insert(key.to_string(), Value::Array(elements));
            }
        }
    }
    Ok(())
}

fn merge_key_values<'a>(
    list: &'a [Value],
    merge_key: &str,
    path: &str,
) -> Result<Vec<&'a Value>, Error> {
    list.iter()
        .map(|element| {
            element.get(merge_key).ok_or_else(|| {
                Error::serialization(format!(
                    "element of {path} has no merge key {merge_key:?}: {element}"
                ))
            })
        })
        .collect()
}

fn remove_path(value: &mut Value, path: &[&str]) -> bool {
    let Some((head, rest)) = path.split_first() else {
        return false;
    };
    let Some(map) = value.as_object_mut() else {
        return false;
    };
    if rest.is_empty() {
        return map.remove(*head).is_some();
    }
    let Some(child) = map.get_mut(*head) else {
        return false;
    };
    let removed = remove_path(child, rest);
    if removed && child.as_object().is_some_and(Map::is_empty) {
        map.remove(*head);
    }
    removed
}
