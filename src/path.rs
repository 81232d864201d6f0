//! Dotted-path access into context trees (`data.cart.items.0.price`).

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::trace;

/// Strings an upstream Python serializer emits in place of real values.
/// Traversal never descends through them.
pub const SENTINELS: &[&str] = &["None", "null", "undefined", "False", "false", "True", "true"];

/// Widest gap of `null`s a write past the end of an array may fill.
pub const MAX_ARRAY_PADDING: usize = 1024;

pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Looks up `path` inside `context`.
///
/// Missing keys, `null`, sentinel strings and primitives along the way all
/// yield `None`. Arrays answer numeric segments and `length`.
pub fn get<'a>(context: &'a Value, path: &str) -> Option<Cow<'a, Value>> {
    if path.is_empty() {
        return None;
    }
    let segments: Vec<&str> = path.split('.').collect();
    let last = segments.len() - 1;
    let mut acc = context;
    for (i, segment) in segments.iter().copied().enumerate() {
        match acc {
            Value::Object(map) => match map.get(segment) {
                Some(next) => acc = next,
                None => {
                    trace!(path, segment, "path segment missing");
                    return None;
                }
            },
            Value::Array(items) if is_index(segment) => {
                match segment.parse::<usize>().ok().and_then(|idx| items.get(idx)) {
                    Some(next) => acc = next,
                    None => {
                        trace!(path, segment, "array index out of range");
                        return None;
                    }
                }
            }
            Value::Array(items) if segment == "length" && i == last => {
                return Some(Cow::Owned(Value::from(items.len())));
            }
            Value::String(s) if SENTINELS.contains(&s.as_str()) => {
                trace!(path, segment, sentinel = %s, "path stopped at sentinel");
                return None;
            }
            _ => {
                trace!(path, segment, "path stopped at non-container");
                return None;
            }
        }
    }
    Some(Cow::Borrowed(acc))
}

/// Writes `value` at `path`, creating intermediate objects and arrays.
///
/// `None` deletes the key (or removes the array element) instead of storing
/// anything. Works in place; callers hand it their own working copy.
pub fn set(target: &mut Value, path: &str, value: Option<Value>) {
    if path.is_empty() {
        return;
    }
    let segments: Vec<&str> = path.split('.').collect();
    set_segments(target, path, &segments, value);
}

fn set_segments(cursor: &mut Value, path: &str, segments: &[&str], value: Option<Value>) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        write_leaf(cursor, path, segment, value);
        return;
    }

    let deleting = value.is_none();
    let child = match cursor {
        Value::Object(map) => {
            if deleting && !map.contains_key(*segment) {
                return;
            }
            map.entry(segment.to_string()).or_insert(Value::Null)
        }
        Value::Array(items) if is_index(segment) => {
            let Ok(idx) = segment.parse::<usize>() else {
                return;
            };
            if idx >= items.len() && (deleting || !pad_to(items, idx, path)) {
                return;
            }
            &mut items[idx]
        }
        _ => {
            trace!(path, segment, "cannot descend into non-container");
            return;
        }
    };

    if !child.is_object() && !child.is_array() {
        if deleting {
            return;
        }
        *child = if is_index(rest[0]) {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }
    set_segments(child, path, rest, value);
}

/// Makes `idx` addressable by padding with `null`; refuses gaps wider than
/// [`MAX_ARRAY_PADDING`].
fn pad_to(items: &mut Vec<Value>, idx: usize, path: &str) -> bool {
    if idx < items.len() {
        return true;
    }
    let new_len = match idx.checked_add(1) {
        Some(len) if idx - items.len() <= MAX_ARRAY_PADDING => len,
        _ => {
            trace!(path, idx, len = items.len(), "array index too far past the end");
            return false;
        }
    };
    items.resize(new_len, Value::Null);
    true
}

fn write_leaf(cursor: &mut Value, path: &str, segment: &str, value: Option<Value>) {
    match cursor {
        Value::Array(items) if is_index(segment) => {
            let Ok(idx) = segment.parse::<usize>() else {
                return;
            };
            match value {
                None => {
                    if idx < items.len() {
                        items.remove(idx);
                        trace!(path, "removed array element");
                    }
                }
                Some(v) => {
                    if !pad_to(items, idx, path) {
                        return;
                    }
                    items[idx] = v;
                    trace!(path, "wrote array element");
                }
            }
        }
        Value::Object(map) => match value {
            None => {
                map.shift_remove(segment);
                trace!(path, "deleted key");
            }
            Some(v) => {
                map.insert(segment.to_string(), v);
                trace!(path, "wrote key");
            }
        },
        _ => trace!(path, segment, "cannot write into non-container"),
    }
}
