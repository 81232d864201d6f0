//! Tree-walking interpreter for binding expressions.
//!
//! Values follow JavaScript semantics (truthiness, `+` concatenation, loose
//! and strict equality) over `serde_json::Value`, with `None` as `undefined`.
//! Nothing here reaches outside the scope and the function registry.

use std::borrow::Cow;
use std::cmp::Ordering;

use itertools::Itertools;
use serde_json::Value;
use tracing::warn;

use crate::coerce::{number_value, to_display_string, to_number, truthy};
use crate::comparison::{compare_values, loose_equals, strict_equals};
use crate::errors::{EvalError, Result};
use crate::expression::{parse_expr, BinaryOp, Expr, UnaryOp};
use crate::functions::Registry;
use crate::scope::Scope;

type Slot<'a> = Option<Cow<'a, Value>>;

/// Parses and evaluates `expression`, reporting parse and runtime errors.
pub fn try_evaluate(expression: &str, scope: &Scope<'_>, registry: &Registry) -> Result<Option<Value>> {
    let ast = parse_expr(expression.trim())?;
    let interpreter = Interpreter { scope, registry };
    Ok(interpreter.eval(&ast)?.map(Cow::into_owned))
}

/// Like [`try_evaluate`], but logs failures and yields `undefined` instead.
pub fn evaluate(expression: &str, scope: &Scope<'_>, registry: &Registry) -> Option<Value> {
    match try_evaluate(expression, scope, registry) {
        Ok(value) => value,
        Err(err) => {
            warn!(expression, error = %err, "failed to evaluate expression");
            None
        }
    }
}

struct Interpreter<'s> {
    scope: &'s Scope<'s>,
    registry: &'s Registry,
}

impl<'s> Interpreter<'s> {
    fn eval<'a>(&self, expr: &'a Expr) -> Result<Slot<'a>>
    where
        's: 'a,
    {
        match expr {
            Expr::Literal(v) => Ok(Some(Cow::Borrowed(v))),
            Expr::Undefined => Ok(None),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| Ok(self.eval(item)?.map(Cow::into_owned).unwrap_or(Value::Null)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(Cow::Owned(Value::Array(values))))
            }
            Expr::Ident(name) => match self.scope.lookup(name) {
                Some(v) => Ok(Some(Cow::Borrowed(v))),
                None => Err(EvalError::Runtime(format!("{name} is not defined"))),
            },
            Expr::Member { object, property } => {
                let target = self.eval(object)?;
                read_property(target, property)
            }
            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let key = match self.eval(index)?.as_deref() {
                    Some(Value::Number(n)) => match n.as_f64() {
                        Some(x) if x >= 0.0 && x == x.trunc() => format!("{}", x as u64),
                        _ => n.to_string(),
                    },
                    other => to_display_string(other),
                };
                read_property(target, &key)
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Unary { op, expr } => {
                let v = self.eval(expr)?;
                let out = match op {
                    UnaryOp::Not => Value::Bool(!truthy(v.as_deref())),
                    UnaryOp::Neg => number_value(-to_number(v.as_deref())),
                    UnaryOp::Plus => number_value(to_number(v.as_deref())),
                };
                Ok(Some(Cow::Owned(out)))
            }
            Expr::Binary { op: BinaryOp::And, left, right } => {
                let l = self.eval(left)?;
                if truthy(l.as_deref()) {
                    self.eval(right)
                } else {
                    Ok(l)
                }
            }
            Expr::Binary { op: BinaryOp::Or, left, right } => {
                let l = self.eval(left)?;
                if truthy(l.as_deref()) {
                    Ok(l)
                } else {
                    self.eval(right)
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                Ok(Some(Cow::Owned(binary(*op, l.as_deref(), r.as_deref()))))
            }
            Expr::Membership { negated, needle, haystack } => {
                let n = self.eval(needle)?;
                let h = self.eval(haystack)?;
                let found = contains(h.as_deref(), n.as_deref())?;
                Ok(Some(Cow::Owned(Value::Bool(found != *negated))))
            }
            Expr::Conditional { test, consequent, alternate } => {
                if truthy(self.eval(test)?.as_deref()) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn call<'a>(&self, callee: &'a Expr, args: &'a [Expr]) -> Result<Slot<'a>>
    where
        's: 'a,
    {
        match callee {
            Expr::Ident(name) => self.call_function(name, args),
            Expr::Member { object, property } => {
                // `Array.isArray(x)` style helpers, unless the namespace is shadowed by a variable
                if let Expr::Ident(ns) = object.as_ref() {
                    let qualified = format!("{ns}.{property}");
                    if !self.scope.contains(ns) && self.registry.contains(&qualified) {
                        return self.call_function(&qualified, args);
                    }
                }
                let receiver = self.eval(object)?;
                let values = self.eval_args(args)?;
                call_method(receiver.as_deref(), property, &values).map(|v| v.map(Cow::Owned))
            }
            _ => Err(EvalError::Runtime(format!("{callee} is not a function"))),
        }
    }

    fn call_function<'a>(&self, name: &str, args: &'a [Expr]) -> Result<Slot<'a>>
    where
        's: 'a,
    {
        let function = self
            .registry
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        let arity = function.arity();
        if !arity.contains(&args.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else {
                format!("{}..={}", arity.start(), arity.end())
            };
            return Err(EvalError::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            });
        }
        let values = self.eval_args(args)?;
        Ok(function.call(&values)?.map(Cow::Owned))
    }

    fn eval_args(&self, args: &[Expr]) -> Result<Vec<Option<Value>>> {
        args.iter()
            .map(|arg| Ok(self.eval(arg)?.map(Cow::into_owned)))
            .collect()
    }
}

fn describe(v: Option<&Value>) -> &'static str {
    match v {
        None => "undefined",
        _ => "null",
    }
}

fn read_property<'a>(target: Slot<'a>, key: &str) -> Result<Slot<'a>> {
    match target {
        Some(Cow::Borrowed(v)) if !v.is_null() => Ok(property(v, key)),
        Some(Cow::Owned(v)) if !v.is_null() => {
            Ok(property(&v, key).map(|c| Cow::Owned(c.into_owned())))
        }
        Some(_) => Err(EvalError::Runtime(format!(
            "cannot read properties of null (reading '{key}')"
        ))),
        None => Err(EvalError::Runtime(format!(
            "cannot read properties of undefined (reading '{key}')"
        ))),
    }
}

fn property<'v>(v: &'v Value, key: &str) -> Slot<'v> {
    match v {
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Array(items) if key == "length" => Some(Cow::Owned(Value::from(items.len()))),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|idx| items.get(idx))
            .map(Cow::Borrowed),
        Value::String(s) if key == "length" => Some(Cow::Owned(Value::from(s.encode_utf16().count()))),
        _ => None,
    }
}

fn binary(op: BinaryOp, l: Option<&Value>, r: Option<&Value>) -> Value {
    let is_textual = |v: Option<&Value>| {
        matches!(v, Some(Value::String(_)) | Some(Value::Array(_)) | Some(Value::Object(_)))
    };
    match op {
        BinaryOp::Add if is_textual(l) || is_textual(r) => {
            Value::String(to_display_string(l) + &to_display_string(r))
        }
        BinaryOp::Add => number_value(to_number(l) + to_number(r)),
        BinaryOp::Sub => number_value(to_number(l) - to_number(r)),
        BinaryOp::Mul => number_value(to_number(l) * to_number(r)),
        BinaryOp::Div => number_value(to_number(l) / to_number(r)),
        BinaryOp::Rem => number_value(to_number(l) % to_number(r)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(l, r)),
        BinaryOp::StrictNe => Value::Bool(!strict_equals(l, r)),
        BinaryOp::Eq => Value::Bool(loose_equals(l, r)),
        BinaryOp::Ne => Value::Bool(!loose_equals(l, r)),
        BinaryOp::Lt => Value::Bool(compare_values(l, r) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(compare_values(l, r), Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Gt => Value::Bool(compare_values(l, r) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(compare_values(l, r), Some(Ordering::Greater | Ordering::Equal))),
        // short-circuit operators are handled by the interpreter
        BinaryOp::And | BinaryOp::Or => Value::Null,
    }
}

/// Membership for `in` / `includes`: array elements, substrings, object keys.
fn contains(haystack: Option<&Value>, needle: Option<&Value>) -> Result<bool> {
    match haystack {
        Some(Value::Array(items)) => Ok(items.iter().any(|item| strict_equals(Some(item), needle))),
        Some(Value::String(s)) => Ok(s.contains(to_display_string(needle).as_str())),
        Some(Value::Object(map)) => Ok(map.contains_key(&to_display_string(needle))),
        None | Some(Value::Null) => Err(EvalError::Runtime(format!(
            "cannot read properties of {} (reading 'includes')",
            describe(haystack)
        ))),
        Some(other) => Err(EvalError::Runtime(format!(
            "argument of type {} is not iterable",
            kind(other)
        ))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn call_method(receiver: Option<&Value>, name: &str, args: &[Option<Value>]) -> Result<Option<Value>> {
    let arg = |i: usize| args.get(i).and_then(Option::as_ref);
    let out = match (receiver, name) {
        (None | Some(Value::Null), _) => {
            return Err(EvalError::Runtime(format!(
                "cannot read properties of {} (reading '{name}')",
                describe(receiver)
            )))
        }
        (Some(haystack @ (Value::Array(_) | Value::String(_))), "includes") => {
            Value::Bool(contains(Some(haystack), arg(0))?)
        }
        (Some(Value::Array(items)), "join") => {
            let sep = match arg(0) {
                None => ",".to_string(),
                some => to_display_string(some),
            };
            let joined = items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => to_display_string(Some(other)),
                })
                .join(&sep);
            Value::String(joined)
        }
        (Some(Value::String(s)), "toUpperCase") => Value::String(s.to_uppercase()),
        (Some(Value::String(s)), "toLowerCase") => Value::String(s.to_lowercase()),
        (Some(Value::String(s)), "trim") => Value::String(s.trim().to_string()),
        (Some(v), "toString") => Value::String(to_display_string(Some(v))),
        (Some(Value::Number(n)), "toFixed") => {
            let digits = to_number(arg(0));
            let digits = if digits.is_finite() { digits.clamp(0.0, 100.0) as usize } else { 0 };
            Value::String(format!("{:.*}", digits, n.as_f64().unwrap_or(f64::NAN)))
        }
        (Some(other), _) => {
            return Err(EvalError::Runtime(format!(
                "{name} is not a function on {}",
                kind(other)
            )))
        }
    };
    Ok(Some(out))
}
