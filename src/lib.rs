//! Binding and expression resolution for backend-driven UI screens.
//!
//! A screen is a JSON tree whose props may hold binding descriptors
//! (`{"reference": "${cart.total}", "value": 0}`). [`Engine`] resolves them
//! against a context document, renders `${...}` templates, evaluates small
//! Python/JavaScript-flavoured expressions and applies patches that produce
//! the next context.

pub mod binding;
pub mod coerce;
pub mod comparison;
pub mod config;
pub mod errors;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod iteration;
pub mod patch;
pub mod path;
pub mod resolver;
pub mod scope;
pub mod template;
pub mod transpile;
mod parser;

use std::sync::Arc;

use serde_json::Value;

pub use binding::{is_binding, normalize_reference, Bindable, Binding};
pub use config::EngineConfig;
pub use errors::{EvalError, Result};
pub use expression::parse_expr;
pub use functions::{Function, Registry};
pub use iteration::IterationFrame;
pub use patch::{CartTotals, PatchHook, TraceEvent};
pub use scope::Scope;
pub use transpile::transpile;

/// Resolution and patching engine. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    registry: Registry,
    hooks: Vec<Arc<dyn PatchHook>>,
}

impl Engine {
    /// Engine with the given config and helper functions, plus the
    /// [`CartTotals`] post-patch hook.
    pub fn new(config: EngineConfig, registry: Registry) -> Self {
        Self {
            config,
            registry,
            hooks: vec![Arc::new(CartTotals)],
        }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::new(config, Registry::with_builtins())
    }

    /// Drops every registered post-patch hook.
    pub fn without_hooks(mut self) -> Self {
        self.hooks.clear();
        self
    }

    pub fn with_hook<H: PatchHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Evaluates one expression; failures are logged and yield `None`.
    pub fn evaluate(&self, expression: &str, scope: &Scope<'_>) -> Option<Value> {
        evaluator::evaluate(expression, scope, &self.registry)
    }

    pub fn try_evaluate(&self, expression: &str, scope: &Scope<'_>) -> Result<Option<Value>> {
        evaluator::try_evaluate(expression, scope, &self.registry)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

/// Convenience: resolve with a default engine.
pub fn resolve(
    value: &Value,
    context: &Value,
    fallback: Option<&Value>,
    stack: &[IterationFrame],
) -> Option<Value> {
    Engine::default().resolve(value, context, fallback, stack)
}

/// Convenience: patch with a default engine.
pub fn apply_patch(context: &Value, patch: &Value, source: Option<&Value>) -> Value {
    Engine::default().apply_patch(context, patch, source)
}
