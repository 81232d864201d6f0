use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::iteration::IterationFrame;

/// Flattened variable scope an expression is evaluated against.
///
/// Top-level keys of the context are visible as variables; locals bound on
/// top of them (iteration aliases) shadow context keys.
#[derive(Debug, Default)]
pub struct Scope<'a> {
    globals: Option<&'a Map<String, Value>>,
    locals: HashMap<String, Cow<'a, Value>>,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a Value) -> Self {
        Self {
            globals: context.as_object(),
            locals: HashMap::new(),
        }
    }

    /// Context keys plus `alias`, `aliasIndex` and `aliasTotal` for every
    /// frame; inner frames win over outer ones.
    pub fn with_frames(context: &'a Value, frames: &'a [IterationFrame], default_alias: &str) -> Self {
        let mut scope = Self::new(context);
        for frame in frames {
            let alias = frame.alias_or(default_alias);
            scope.bind(alias, Cow::Borrowed(&frame.item));
            if let Some(index) = frame.index {
                scope.bind(format!("{alias}Index"), Cow::Owned(Value::from(index)));
            }
            if let Some(total) = frame.total {
                scope.bind(format!("{alias}Total"), Cow::Owned(Value::from(total)));
            }
        }
        scope
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Cow<'a, Value>) {
        self.locals.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .get(name)
            .map(|v| v.as_ref())
            .or_else(|| self.globals.and_then(|g| g.get(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
