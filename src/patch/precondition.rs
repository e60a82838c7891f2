//! Client-side patch preconditions

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A named predicate over a computed patch document.
///
/// Returns `true` when the patch may be submitted.
#[derive(Clone)]
pub struct Precondition {
    name: String,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Precondition {
    /// Create a precondition from a name (used in error messages) and a predicate
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Name reported when this precondition rejects a patch
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate against `patch`
    pub fn allows(&self, patch: &Value) -> bool {
        (self.check)(patch)
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Precondition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Reject any patch that touches `spec.<key>`.
///
/// Permissive when the patch is not an object, has no `spec`, or its `spec`
/// is not an object.
pub fn require_spec_key_unchanged(key: impl Into<String>) -> Precondition {
    let key = key.into();
    let name = format!("spec.{key} unchanged");
    Precondition::new(name, move |patch| {
        patch
            .get("spec")
            .and_then(Value::as_object)
            .map_or(true, |spec| !spec.contains_key(&key))
    })
}
