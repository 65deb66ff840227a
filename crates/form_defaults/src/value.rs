//! Equality and display rules for form data values.
//!
//! Form inputs hand back numbers as strings and vice versa, so scalars compare
//! by their string form while objects and arrays compare structurally.

use serde_json::{Number, Value};

/// Loose equality between a value found in the form data (`a`) and a value the
/// engine wrote (`b`).
///
/// Objects, arrays and null on the left compare structurally with [`deep_equal`];
/// every other left-hand value compares by [`display_string`].
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match a {
        Value::Object(_) | Value::Array(_) | Value::Null => deep_equal(a, b),
        _ => display_string(a) == display_string(b),
    }
}

/// Structural equality with numbers compared by value (`1 == 1.0`).
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| deep_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if x == y {
        return true;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// String form of a value as a form runtime would coerce it.
///
/// Integral numbers print without a fraction, arrays join their elements with
/// `,` (null elements empty), objects print as `[object Object]`.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i128),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// String form used in change maps, where "never written" prints as `null`.
pub(crate) fn display_optional(value: Option<&Value>) -> String {
    value.map_or_else(|| "null".to_string(), display_string)
}
