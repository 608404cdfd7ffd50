use serde_json::{Map, Value};

// @module: Configuration tree merge engine

/// Deep-merge two generic configuration trees, `overlay` winning.
///
/// The same algorithm runs on both sides of the renderer boundary: here to
/// compute a cue's effective configuration from the document defaults plus
/// its override tree, and inside the generated renderer script to layer the
/// same override onto the job's default tree.
///
/// Tie-breaks, per key present in either tree:
/// - both sides, same kind, scalar: overlay wins
/// - both sides objects: recurse
/// - both sides lists: element-wise against the overlay list's length; the
///   overlay element is taken verbatim (see below)
/// - both sides, different kinds: overlay wins, no recursion
/// - one side only: that side wins
///
/// The list branch checks the container's kind, not each element's, when
/// deciding whether to recurse. List elements are therefore never merged,
/// even when both sides hold objects at the same index. Preset files in the
/// wild depend on this exact behavior, so it is kept as-is.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_objects(base_map, overlay_map))
        }
        (Value::Array(_), Value::Array(overlay_items)) => {
            let mut merged = Vec::with_capacity(overlay_items.len());
            for item in overlay_items {
                merged.push(item.clone());
            }
            Value::Array(merged)
        }
        // Scalars of any kind, and kind mismatches: overlay wins
        _ => overlay.clone(),
    }
}

fn merge_objects(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::new();
    for (key, base_value) in base {
        match overlay.get(key) {
            Some(overlay_value) => {
                merged.insert(key.clone(), merge(base_value, overlay_value));
            }
            None => {
                merged.insert(key.clone(), base_value.clone());
            }
        }
    }
    for (key, overlay_value) in overlay {
        if !base.contains_key(key) {
            merged.insert(key.clone(), overlay_value.clone());
        }
    }
    merged
}
