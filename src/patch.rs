//! Copy-on-write patch application.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::binding::{is_binding, BindingRef};
use crate::coerce::{group_thousands, number_value};
use crate::path;
use crate::Engine;

/// Derived-state recomputation run after every patch.
pub trait PatchHook: Send + Sync {
    fn name(&self) -> &'static str;
    /// Returns `false` when the context had nothing to recompute.
    fn apply(&self, context: &mut Value) -> bool;
}

/// Keeps `data.order.total` and `data.order.totalFormatted` equal to the sum
/// of `data.cart.items[*].price`, whenever the cart items are a list.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartTotals;

impl CartTotals {
    pub const ITEMS_PATH: &'static str = "data.cart.items";
    pub const TOTAL_PATH: &'static str = "data.order.total";
    pub const FORMATTED_PATH: &'static str = "data.order.totalFormatted";
    pub const CURRENCY_SUFFIX: &'static str = " ₽";
}

impl PatchHook for CartTotals {
    fn name(&self) -> &'static str {
        "cart_totals"
    }

    fn apply(&self, context: &mut Value) -> bool {
        let total: f64 = match path::get(context, Self::ITEMS_PATH).as_deref() {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object()?.get("price")?.as_f64())
                .sum(),
            _ => return false,
        };
        let formatted = format!("{}{}", group_thousands(total), Self::CURRENCY_SUFFIX);
        debug!(total, %formatted, "recomputed order total");
        path::set(context, Self::TOTAL_PATH, Some(number_value(total)));
        path::set(context, Self::FORMATTED_PATH, Some(Value::String(formatted)));
        true
    }
}

/// One step taken while applying a patch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TraceEvent {
    Resolve {
        reference: String,
        resolved: Option<Value>,
    },
    Set {
        path: String,
        value: Value,
    },
    Delete {
        path: String,
    },
    Recompute {
        hook: String,
    },
}

struct Patcher<'e> {
    engine: &'e Engine,
    source: &'e Value,
    trace: Option<Vec<TraceEvent>>,
}

impl Patcher<'_> {
    fn record(&mut self, event: impl FnOnce() -> TraceEvent) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(event());
        }
    }

    /// Nested non-binding objects flatten into `path.child` writes.
    fn apply_entry(&mut self, target: &mut Value, entry_path: &str, value: &Value) {
        if let Value::Object(children) = value {
            if !is_binding(value) {
                for (key, child) in children {
                    let next = if entry_path.is_empty() {
                        key.clone()
                    } else {
                        format!("{entry_path}.{key}")
                    };
                    self.apply_entry(target, &next, child);
                }
                return;
            }
        }

        let resolved = match BindingRef::from_value(value) {
            Some(binding) => {
                let resolved = self.engine.resolve_binding(binding, self.source, None, &[]);
                self.record(|| TraceEvent::Resolve {
                    reference: binding.reference.to_string(),
                    resolved: resolved.clone(),
                });
                resolved
            }
            None => Some(value.clone()),
        };

        match &resolved {
            Some(v) => self.record(|| TraceEvent::Set {
                path: entry_path.to_string(),
                value: v.clone(),
            }),
            None => {
                debug!(path = entry_path, "patch binding resolved to nothing, deleting");
                self.record(|| TraceEvent::Delete {
                    path: entry_path.to_string(),
                });
            }
        }
        path::set(target, entry_path, resolved);
    }
}

impl Engine {
    /// Applies `patch` to a copy of `context` and returns the copy.
    ///
    /// Bindings inside the patch resolve against `source` (default:
    /// `context`), i.e. against the pre-patch state. Registered hooks run
    /// after all writes. The inputs are never modified.
    pub fn apply_patch(&self, context: &Value, patch: &Value, source: Option<&Value>) -> Value {
        self.run_patch(context, patch, source, false).0
    }

    /// Like [`Engine::apply_patch`], also returning every resolve, write and
    /// recompute step in order.
    pub fn apply_patch_traced(
        &self,
        context: &Value,
        patch: &Value,
        source: Option<&Value>,
    ) -> (Value, Vec<TraceEvent>) {
        self.run_patch(context, patch, source, true)
    }

    fn run_patch(
        &self,
        context: &Value,
        patch: &Value,
        source: Option<&Value>,
        traced: bool,
    ) -> (Value, Vec<TraceEvent>) {
        let mut next = context.clone();
        let Some(entries) = patch.as_object() else {
            if !patch.is_null() {
                warn!("ignoring patch that is not an object");
            }
            return (next, Vec::new());
        };

        let mut patcher = Patcher {
            engine: self,
            source: source.unwrap_or(context),
            trace: traced.then(Vec::new),
        };
        debug!(entries = entries.len(), "applying context patch");
        for (entry_path, value) in entries {
            patcher.apply_entry(&mut next, entry_path, value);
        }
        for hook in &self.hooks {
            if hook.apply(&mut next) {
                patcher.record(|| TraceEvent::Recompute {
                    hook: hook.name().to_string(),
                });
            }
        }
        (next, patcher.trace.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn cart_totals_ignore_non_numeric_prices() {
        let mut ctx = json!({"data": {"cart": {"items": [{"price": 1000}, {"price": "9"}, {"title": "x"}, 5]}}});
        assert!(CartTotals.apply(&mut ctx));
        assert_eq!(ctx["data"]["order"], json!({"total": 1000, "totalFormatted": "1 000 ₽"}));
    }

    #[test]
    fn cart_totals_skip_when_items_are_not_a_list() {
        let mut ctx = json!({"data": {"cart": {"items": ""}, "order": {"total": 7}}});
        assert!(!CartTotals.apply(&mut ctx));
        assert_eq!(ctx["data"]["order"], json!({"total": 7}));
    }

    #[test]
    fn trace_records_each_step() {
        let engine = Engine::default();
        let ctx = json!({"user": {"email": "old@example.com"}, "draft": "new@example.com"});
        let patch = json!({
            "user.email": {"reference": "${draft}"},
            "draft": {"reference": "${missing}"}
        });
        let (next, trace) = engine.apply_patch_traced(&ctx, &patch, None);
        assert_eq!(next, json!({"user": {"email": "new@example.com"}}));
        assert_eq!(
            trace,
            vec![
                TraceEvent::Resolve { reference: "${draft}".into(), resolved: Some(json!("new@example.com")) },
                TraceEvent::Set { path: "user.email".into(), value: json!("new@example.com") },
                TraceEvent::Resolve { reference: "${missing}".into(), resolved: None },
                TraceEvent::Delete { path: "draft".into() },
            ]
        );
    }

    #[test]
    fn trace_records_recompute_only_when_a_hook_ran() {
        let engine = Engine::default();
        let ctx = json!({"data": {"cart": {"items": [{"price": 5}]}}});
        let (_, trace) = engine.apply_patch_traced(&ctx, &json!({}), None);
        assert_eq!(trace, vec![TraceEvent::Recompute { hook: "cart_totals".into() }]);

        let ctx = json!({"data": {"cart": {"items": "None"}}});
        let (_, trace) = engine.apply_patch_traced(&ctx, &json!({}), None);
        assert_eq!(trace, vec![]);
    }

    #[test]
    fn trace_serializes_with_action_tag() {
        let event = TraceEvent::Delete { path: "a.b".into() };
        assert_eq!(serde_json::to_value(&event).unwrap(), json!({"action": "delete", "path": "a.b"}));
    }
}
