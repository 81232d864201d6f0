use std::cmp::Ordering;

use serde_json::Value;

use crate::coerce::{to_display_string, to_number};

/// `===`. Containers compare structurally since values carry no identity.
pub fn strict_equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, _) | (_, None) => false,
        (Some(Value::Number(na)), Some(Value::Number(nb))) => match (na.as_f64(), nb.as_f64()) {
            (Some(da), Some(db)) => da == db,
            _ => na == nb,
        },
        (Some(a), Some(b)) => a == b,
    }
}

/// `==`, covering the coercions that show up in binding expressions.
pub fn loose_equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    let nullish = |v: Option<&Value>| matches!(v, None | Some(Value::Null));
    if nullish(a) || nullish(b) {
        return nullish(a) && nullish(b);
    }
    match (a, b) {
        (Some(Value::Number(_)), Some(Value::String(_)))
        | (Some(Value::String(_)), Some(Value::Number(_)))
        | (Some(Value::Bool(_)), _)
        | (_, Some(Value::Bool(_))) => to_number(a) == to_number(b),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y))
            if !matches!(y, Value::Array(_) | Value::Object(_)) =>
        {
            let text = Value::String(to_display_string(Some(x)));
            loose_equals(Some(&text), Some(y))
        }
        (Some(x), Some(y @ (Value::Array(_) | Value::Object(_))))
            if !matches!(x, Value::Array(_) | Value::Object(_)) =>
        {
            let text = Value::String(to_display_string(Some(y)));
            loose_equals(Some(x), Some(&text))
        }
        _ => strict_equals(a, b),
    }
}

/// Relational ordering: strings compare lexicographically, everything else
/// numerically. `None` when either side is NaN.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    match (a, b) {
        (Some(Value::String(sa)), Some(Value::String(sb))) => Some(sa.cmp(sb)),
        _ => to_number(a).partial_cmp(&to_number(b)),
    }
}
