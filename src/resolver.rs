//! Resolution of prop values against a context.

use serde_json::{Map, Value};
use tracing::debug;

use crate::binding::{normalize_reference, Bindable, BindingRef};
use crate::coerce::to_template_string;
use crate::iteration::{self, IterationFrame, IterationMatch};
use crate::path;
use crate::scope::Scope;
use crate::template::{self, Reference};
use crate::Engine;

const PYTHON_MARKERS: &[&str] = &["str(", "len(", " in ", " and ", " or "];
const OPERATOR_CHARS: &[char] = &[
    '+', '-', '*', '/', '%', '!', '=', '<', '>', '&', '|', '?', ':', '\'', '"', '`', '(', ')', '[', ']',
];

/// True when a normalized reference needs the expression evaluator rather
/// than a plain path lookup.
pub fn looks_like_expression(reference: &str) -> bool {
    if PYTHON_MARKERS.iter().any(|m| reference.contains(m)) {
        return true;
    }
    if reference.starts_with("not ") {
        return true;
    }
    if let Some(idx) = reference.find(" if ") {
        if reference[idx..].contains(" else ") {
            return true;
        }
    }
    reference.contains(OPERATOR_CHARS)
}

impl Engine {
    /// Resolves a prop value.
    ///
    /// Anything that is not a binding descriptor passes through (`null`
    /// falls back to `fallback`). Bindings resolve through templates,
    /// iteration frames, expressions and context paths, then fall back to
    /// the descriptor's own `value` and finally to `fallback`.
    pub fn resolve(
        &self,
        value: &Value,
        context: &Value,
        fallback: Option<&Value>,
        stack: &[IterationFrame],
    ) -> Option<Value> {
        match BindingRef::from_value(value) {
            Some(binding) => self.resolve_binding(binding, context, fallback, stack),
            None if value.is_null() => fallback.cloned(),
            None => Some(value.clone()),
        }
    }

    pub fn resolve_bindable(
        &self,
        value: &Bindable,
        context: &Value,
        fallback: Option<&Value>,
        stack: &[IterationFrame],
    ) -> Option<Value> {
        match value {
            Bindable::Literal(Value::Null) => fallback.cloned(),
            Bindable::Literal(v) => Some(v.clone()),
            Bindable::Binding(b) => self.resolve_binding(b.as_ref(), context, fallback, stack),
        }
    }

    /// Resolves `props[key]`; a missing prop or a non-object `props` yields `fallback`.
    pub fn resolve_prop(
        &self,
        props: &Value,
        key: &str,
        context: &Value,
        fallback: Option<&Value>,
        stack: &[IterationFrame],
    ) -> Option<Value> {
        match props.as_object().and_then(|map| map.get(key)) {
            Some(candidate) => self.resolve(candidate, context, fallback, stack),
            None => fallback.cloned(),
        }
    }

    /// Replaces every binding inside `tree` with its resolved value.
    ///
    /// Bindings that resolve to nothing drop their key (or become `null`
    /// inside arrays). An `items` binding that yields a list is projected
    /// through a sibling `displayPath`, when present.
    pub fn resolve_tree(&self, tree: &Value, context: &Value, stack: &[IterationFrame]) -> Value {
        if BindingRef::from_value(tree).is_some() {
            return self.resolve(tree, context, None, stack).unwrap_or(Value::Null);
        }
        match tree {
            Value::Object(map) => {
                let display_path = map.get("displayPath").and_then(Value::as_str);
                let mut out = Map::new();
                for (key, child) in map {
                    let resolved = match BindingRef::from_value(child) {
                        Some(binding) => {
                            let resolved = self.resolve_binding(binding, context, None, stack);
                            match (key.as_str(), resolved, display_path) {
                                ("items", Some(Value::Array(items)), Some(display)) => {
                                    Some(Value::Array(project(items, display)))
                                }
                                (_, other, _) => other,
                            }
                        }
                        None => Some(self.resolve_tree(child, context, stack)),
                    };
                    if let Some(v) = resolved {
                        out.insert(key.clone(), v);
                    }
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_tree(item, context, stack))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub(crate) fn resolve_binding(
        &self,
        binding: BindingRef<'_>,
        context: &Value,
        fallback: Option<&Value>,
        stack: &[IterationFrame],
    ) -> Option<Value> {
        let reference = match template::classify(binding.reference) {
            Reference::Template(parts) => {
                let scope = Scope::with_frames(context, stack, &self.config.default_alias);
                let rendered = template::render(&parts, |expr| {
                    to_template_string(self.evaluate(expr, &scope).as_ref())
                });
                debug!(reference = binding.reference, %rendered, "rendered template");
                return Some(Value::String(rendered));
            }
            Reference::Single(reference) => reference,
        };

        let normalized = normalize_reference(reference);
        if looks_like_expression(normalized) {
            let scope = Scope::with_frames(context, stack, &self.config.default_alias);
            if let Some(v) = self.evaluate(normalized, &scope) {
                debug!(reference, "resolved binding by expression");
                return Some(v);
            }
        } else {
            match iteration::lookup(normalized, stack, &self.config.default_alias) {
                IterationMatch::Hit(Some(v)) => {
                    debug!(reference, "resolved binding from iteration frame");
                    return Some(v.into_owned());
                }
                // the alias shadows the context even when the item lacks the field
                IterationMatch::Hit(None) => return binding.fallback_or(fallback),
                IterationMatch::Miss => {}
            }
            if normalized.is_empty() {
                if let Some(frame) = stack.last() {
                    return Some(frame.item.clone());
                }
            }
        }

        if let Some(resolved) = path::get(context, normalized) {
            if self.config.prefer_structural_fallback
                && resolved.as_str() == Some("")
                && binding.has_structural_fallback()
            {
                debug!(reference, "preferring structural fallback over empty string");
                return binding.value.cloned();
            }
            debug!(reference, "resolved binding from context path");
            return Some(resolved.into_owned());
        }

        debug!(reference, "binding unresolved, using fallback");
        binding.fallback_or(fallback)
    }
}

fn project(items: Vec<Value>, display_path: &str) -> Vec<Value> {
    items
        .into_iter()
        .map(|item| match &item {
            Value::Object(_) => path::get(&item, display_path)
                .map(|v| v.into_owned())
                .unwrap_or(Value::Null),
            _ => item,
        })
        .collect()
}
