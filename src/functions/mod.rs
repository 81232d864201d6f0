use serde_json::Value;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::errors::Result;

/// Helper callable from binding expressions.
///
/// Arguments and the result use `None` for `undefined`.
pub trait Function: Send + Sync {
    /// Name as written in expressions; namespaced helpers use `Ns.name`.
    fn name(&self) -> &'static str;
    fn arity(&self) -> RangeInclusive<usize>;
    fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>>;
}

/// Thread-safe function registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Function>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtins::ToStr("String"));
        registry.register(builtins::ToStr("str"));
        registry.register(builtins::ToNumber);
        registry.register(builtins::ToBoolean);
        registry.register(builtins::Len);
        registry.register(builtins::Int);
        registry.register(builtins::IsArray);
        registry.register(builtins::ObjectKeys);
        registry.register(builtins::ObjectValues);
        registry
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let map = Arc::make_mut(&mut self.inner);
        map.insert(f.name(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }
}

pub mod builtins {
    use super::*;
    use crate::coerce::{number_value, to_display_string, to_number, truthy};
    use crate::errors::EvalError;

    fn first(args: &[Option<Value>]) -> Option<&Value> {
        args.first().and_then(Option::as_ref)
    }

    /// `String(x)` and Python's `str(x)`.
    pub struct ToStr(pub &'static str);
    impl Function for ToStr {
        fn name(&self) -> &'static str { self.0 }
        fn arity(&self) -> RangeInclusive<usize> { 0..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            if args.is_empty() {
                return Ok(Some(Value::String(String::new())));
            }
            Ok(Some(Value::String(to_display_string(first(args)))))
        }
    }

    pub struct ToNumber;
    impl Function for ToNumber {
        fn name(&self) -> &'static str { "Number" }
        fn arity(&self) -> RangeInclusive<usize> { 0..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            if args.is_empty() {
                return Ok(Some(Value::from(0)));
            }
            Ok(Some(number_value(to_number(first(args)))))
        }
    }

    pub struct ToBoolean;
    impl Function for ToBoolean {
        fn name(&self) -> &'static str { "Boolean" }
        fn arity(&self) -> RangeInclusive<usize> { 0..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            Ok(Some(Value::Bool(truthy(first(args)))))
        }
    }

    /// Python `len(x)`: string length in UTF-16 units (as `.length`), or
    /// element count.
    pub struct Len;
    impl Function for Len {
        fn name(&self) -> &'static str { "len" }
        fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            match first(args) {
                Some(Value::String(s)) => Ok(Some(Value::from(s.encode_utf16().count()))),
                Some(Value::Array(items)) => Ok(Some(Value::from(items.len()))),
                Some(Value::Object(map)) => Ok(Some(Value::from(map.len()))),
                other => Err(EvalError::Runtime(format!(
                    "object of type {} has no len()",
                    type_name(other)
                ))),
            }
        }
    }

    /// Python `int(x)`: truncates numbers, parses numeric strings.
    pub struct Int;
    impl Function for Int {
        fn name(&self) -> &'static str { "int" }
        fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            let x = to_number(first(args));
            if !x.is_finite() {
                return Err(EvalError::Runtime(format!(
                    "invalid literal for int(): {}",
                    to_display_string(first(args))
                )));
            }
            Ok(Some(number_value(x.trunc())))
        }
    }

    pub struct IsArray;
    impl Function for IsArray {
        fn name(&self) -> &'static str { "Array.isArray" }
        fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            Ok(Some(Value::Bool(matches!(first(args), Some(Value::Array(_))))))
        }
    }

    pub struct ObjectKeys;
    impl Function for ObjectKeys {
        fn name(&self) -> &'static str { "Object.keys" }
        fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            let keys = match first(args) {
                Some(Value::Object(map)) => map.keys().cloned().map(Value::String).collect(),
                Some(Value::Array(items)) => (0..items.len()).map(|i| Value::String(i.to_string())).collect(),
                None | Some(Value::Null) => {
                    return Err(EvalError::Runtime("cannot convert undefined or null to object".into()))
                }
                Some(_) => Vec::new(),
            };
            Ok(Some(Value::Array(keys)))
        }
    }

    pub struct ObjectValues;
    impl Function for ObjectValues {
        fn name(&self) -> &'static str { "Object.values" }
        fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
            let values = match first(args) {
                Some(Value::Object(map)) => map.values().cloned().collect(),
                Some(Value::Array(items)) => items.clone(),
                None | Some(Value::Null) => {
                    return Err(EvalError::Runtime("cannot convert undefined or null to object".into()))
                }
                Some(_) => Vec::new(),
            };
            Ok(Some(Value::Array(values)))
        }
    }

    fn type_name(v: Option<&Value>) -> &'static str {
        match v {
            None => "undefined",
            Some(Value::Null) => "NoneType",
            Some(Value::Bool(_)) => "bool",
            Some(Value::Number(_)) => "number",
            Some(Value::String(_)) => "str",
            Some(Value::Array(_)) => "list",
            Some(Value::Object(_)) => "dict",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn builtins_are_registered_under_expression_names() {
        let registry = Registry::with_builtins();
        for name in ["String", "str", "Number", "Boolean", "len", "int", "Array.isArray", "Object.keys"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(registry.get("eval").is_none());
    }

    #[test]
    fn custom_functions_can_be_added() {
        struct Upper;
        impl Function for Upper {
            fn name(&self) -> &'static str { "upper" }
            fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
            fn call(&self, args: &[Option<Value>]) -> Result<Option<Value>> {
                Ok(args[0].as_ref().and_then(Value::as_str).map(|s| Value::String(s.to_uppercase())))
            }
        }
        let base = Registry::with_builtins();
        let mut extended = base.clone();
        extended.register(Upper);
        assert!(!base.contains("upper"));
        let f = extended.get("upper").unwrap();
        assert_eq!(f.call(&[Some(json!("ok"))]).unwrap(), Some(json!("OK")));
    }

    #[test]
    fn len_and_int() {
        let registry = Registry::with_builtins();
        let len = registry.get("len").unwrap();
        assert_eq!(len.call(&[Some(json!([1, 2, 3]))]).unwrap(), Some(json!(3)));
        assert!(len.call(&[Some(json!(5))]).is_err());
        let int = registry.get("int").unwrap();
        assert_eq!(int.call(&[Some(json!("12"))]).unwrap(), Some(json!(12)));
        assert_eq!(int.call(&[Some(json!(3.9))]).unwrap(), Some(json!(3)));
    }
}
