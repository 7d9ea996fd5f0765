//! Deep diff and patch primitives over JSON component payloads
//!
//! Patches are minimal structural diffs: objects recurse per key, everything
//! else (arrays included) is treated as an opaque leaf and replaced
//! wholesale. Deletions are encoded as an explicit `null` value, never by
//! omission, which makes a genuine stored `null` indistinguishable from a
//! deletion. Known limitation of the patch format.

use serde_json::Value;
use tracing::warn;

/// Policy for applying a patch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchRules {
    /// Whether key additions and `null` deletions are honored.
    /// When false (the default), structural changes are dropped with a
    /// warning while value modifications still apply.
    pub allow_structural_changes: bool,
}

/// Compute the minimal patch turning `base` into `current`
///
/// Returns `None` when the two are deeply equal. Non-object values diff
/// wholesale. For objects: added keys carry the new value verbatim, removed
/// keys carry `null`, changed keys recurse.
pub fn compute_override_patch(base: &Value, current: &Value) -> Option<Value> {
    if base == current {
        return None;
    }

    let (base_map, current_map) = match (base, current) {
        (Value::Object(base_map), Value::Object(current_map)) => (base_map, current_map),
        _ => return Some(current.clone()),
    };

    let mut patch = serde_json::Map::new();

    for (key, current_value) in current_map {
        match base_map.get(key) {
            None => {
                patch.insert(key.clone(), current_value.clone());
            }
            Some(base_value) if base_value != current_value => {
                if let Some(nested) = compute_override_patch(base_value, current_value) {
                    patch.insert(key.clone(), nested);
                }
            }
            Some(_) => {}
        }
    }

    // Deletions are encoded as an explicit null, not by omission
    for key in base_map.keys() {
        if !current_map.contains_key(key) {
            patch.insert(key.clone(), Value::Null);
        }
    }

    if patch.is_empty() {
        None
    } else {
        Some(Value::Object(patch))
    }
}

/// Apply a patch onto a base value, returning the patched copy
///
/// Application is best-effort: disallowed structural changes are dropped
/// with a warning rather than failing the whole operation. A non-object
/// base is replaced by the patch outright; a non-object patch against an
/// object base is rejected and the base returned unchanged.
pub fn apply_override_patch(base: &Value, patch: &Value, rules: PatchRules) -> Value {
    let base_map = match base {
        Value::Object(base_map) => base_map,
        _ => return patch.clone(),
    };
    let patch_map = match patch {
        Value::Object(patch_map) => patch_map,
        _ => {
            warn!("Override patch is not an object, returning base unchanged");
            return base.clone();
        }
    };

    let mut result = base_map.clone();

    for (key, patch_value) in patch_map {
        if patch_value.is_null() {
            if rules.allow_structural_changes {
                result.remove(key);
            } else {
                warn!(key = %key, "Dropping disallowed deletion in override patch");
            }
            continue;
        }
        match result.get(key) {
            None => {
                if rules.allow_structural_changes {
                    result.insert(key.clone(), patch_value.clone());
                } else {
                    warn!(key = %key, "Dropping disallowed addition in override patch");
                }
            }
            Some(base_value) => {
                let replacement = if base_value.is_object() && patch_value.is_object() {
                    apply_override_patch(base_value, patch_value, rules)
                } else {
                    patch_value.clone()
                };
                result.insert(key.clone(), replacement);
            }
        }
    }

    Value::Object(result)
}

/// Fold a sequence of patches into one, later patches winning conflicts
///
/// The fold starts from an empty object with structural changes allowed, so
/// purely additive patch sets merge losslessly.
pub fn merge_patches(patches: &[Value]) -> Value {
    let rules = PatchRules {
        allow_structural_changes: true,
    };
    patches
        .iter()
        .fold(Value::Object(serde_json::Map::new()), |merged, patch| {
            apply_override_patch(&merged, patch, rules)
        })
}

/// List the structural changes a patch would make against a base
///
/// Returns dotted key paths for every addition and deletion, without
/// mutating anything. Empty means the patch is purely value-modifying.
pub fn validate_patch(base: &Value, patch: &Value) -> Vec<String> {
    let mut violations = Vec::new();
    collect_structural_changes(base, patch, String::new(), &mut violations);
    violations
}

fn collect_structural_changes(base: &Value, patch: &Value, prefix: String, out: &mut Vec<String>) {
    let (base_map, patch_map) = match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => (base_map, patch_map),
        _ => return,
    };

    for (key, patch_value) in patch_map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        if patch_value.is_null() {
            out.push(path);
            continue;
        }
        match base_map.get(key) {
            None => out.push(path),
            Some(base_value) => {
                if base_value.is_object() && patch_value.is_object() {
                    collect_structural_changes(base_value, patch_value, path, out);
                }
            }
        }
    }
}

/// Produce a fully independent deep copy of a payload tree
///
/// `Value` owns all of its data, so the copy shares nothing with the
/// source. Functions and cyclic structures cannot occur in JSON payloads.
pub fn clear_overrides(value: &Value) -> Value {
    value.clone()
}
