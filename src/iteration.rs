//! Per-iteration name bindings for list rendering.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path;

/// One loop level: `alias` names the current `item`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationFrame {
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub item: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl IterationFrame {
    pub fn new(alias: impl Into<String>, item: Value) -> Self {
        Self {
            alias: alias.into(),
            item,
            index: None,
            total: None,
        }
    }

    pub fn at(mut self, index: usize, total: usize) -> Self {
        self.index = Some(index);
        self.total = Some(total);
        self
    }

    /// Trimmed alias, or `default` when blank.
    pub fn alias_or<'a>(&'a self, default: &'a str) -> &'a str {
        let alias = self.alias.trim();
        if alias.is_empty() {
            default
        } else {
            alias
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IterationMatch<'a> {
    Miss,
    /// A frame claimed the name. `None` means the alias matched but the
    /// nested path is absent inside the item.
    Hit(Option<Cow<'a, Value>>),
}

/// Searches `stack` from the innermost frame outward.
pub fn lookup<'a>(path: &str, stack: &'a [IterationFrame], default_alias: &str) -> IterationMatch<'a> {
    if path.is_empty() {
        return IterationMatch::Miss;
    }
    for frame in stack.iter().rev() {
        let alias = frame.alias_or(default_alias);

        if path == alias {
            return IterationMatch::Hit(Some(Cow::Borrowed(&frame.item)));
        }
        if let Some(rest) = path.strip_prefix(alias).and_then(|r| r.strip_prefix('.')) {
            return IterationMatch::Hit(path::get(&frame.item, rest));
        }

        let suffix = path.strip_prefix(alias);
        if suffix == Some("Index") || path == "index" {
            match frame.index {
                Some(index) => return IterationMatch::Hit(Some(Cow::Owned(Value::from(index)))),
                None => continue,
            }
        }
        if matches!(suffix, Some("Total") | Some("Length")) || path == "total" || path == "length" {
            match frame.total {
                Some(total) => return IterationMatch::Hit(Some(Cow::Owned(Value::from(total)))),
                None => continue,
            }
        }
    }
    IterationMatch::Miss
}
