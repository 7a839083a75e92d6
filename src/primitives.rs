//! Shared value primitives.
//!
//! Used by the condition evaluator, the simulator and the payload builder.
//! Field values are untyped JSON, so the coercions here follow the loose
//! semantics form configurations are authored against: `Number(x)` style
//! numeric coercion, strict equality and "empty" meaning absent, null, `""`
//! or `[]`.

use crate::enums::PrimitiveType;
use serde_json::{Map, Value};

// ─── Dot paths ──────────────────────────────────────────────────────────────

/// Resolves a simple dot-path against a value tree.
///
/// Returns the value at the path, or `None` if any segment fails to resolve.
/// Empty path returns the root value.
pub fn resolve_simple_path<'a>(path: &str, value: &'a Value) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Why a value could not be placed at a dot path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathConflict {
    /// The prefix that already holds a non-object value.
    pub at: String,
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// Fails when an intermediate segment already holds a non-object value.
/// An existing leaf is overwritten.
pub fn insert_path(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), PathConflict> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(obj) => obj,
            _ => {
                return Err(PathConflict {
                    at: segments[..=depth].join("."),
                });
            }
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Removes and returns the value at `path`. Empty parent objects are kept.
pub fn remove_path(root: &mut Map<String, Value>, path: &str) -> Option<Value> {
    match path.rsplit_once('.') {
        None => root.remove(path),
        Some((parent, leaf)) => {
            let mut current = root;
            for segment in parent.split('.') {
                current = current.get_mut(segment)?.as_object_mut()?;
            }
            current.remove(leaf)
        }
    }
}

// ─── Equality ───────────────────────────────────────────────────────────────

/// Deep equality comparison.
///
/// Integer 42 equals float 42.0; object key order is irrelevant;
/// arrays compare element-wise by position and length.
pub fn values_deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => a == b,
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| values_deep_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            if a.len() != b.len() {
                return false;
            }
            a.iter()
                .all(|(k, v)| b.get(k).is_some_and(|bv| values_deep_equal(v, bv)))
        }
        _ => false,
    }
}

/// Strict equality where an absent value only equals another absent value.
/// No type coercion: `"1"` is not `1`, `null` is not absent.
pub fn strict_equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => values_deep_equal(a, b),
        _ => false,
    }
}

// ─── Coercions ──────────────────────────────────────────────────────────────

/// Numeric coercion with `Number(x)` semantics. Non-numeric input is NaN.
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_numeric_string(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(Some(single)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_numeric_string(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(n) = parse_radix_literal(trimmed) {
        return n;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that Number() rejects.
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        t => t.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Unsigned `0x` / `0o` / `0b` literals, case-insensitive. `None` when the
/// prefix is absent; NaN when the digits are not valid for the radix.
fn parse_radix_literal(s: &str) -> Option<f64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let parsed = digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    });
    Some(parsed.unwrap_or(f64::NAN))
}

/// String coercion with `String(x)` semantics for scalars.
pub fn to_js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => "0".to_string(),
            Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Absent, null, empty string and empty array are empty.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Truthiness as a form would judge an "active" field: `true`, non-zero
/// numbers, non-empty strings and arrays, and any object.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

/// The primitive type name of a JSON value.
pub fn json_type(value: &Value) -> PrimitiveType {
    match value {
        Value::Null => PrimitiveType::Null,
        Value::Bool(_) => PrimitiveType::Boolean,
        Value::Number(_) => PrimitiveType::Number,
        Value::String(_) => PrimitiveType::String,
        Value::Array(_) => PrimitiveType::Array,
        Value::Object(_) => PrimitiveType::Object,
    }
}

/// Whether `value` would convert cleanly into `expected`, e.g. `"42"` into a
/// number or `"true"` into a boolean.
pub fn loosely_coercible(value: &Value, expected: PrimitiveType) -> bool {
    match (value, expected) {
        (Value::String(s), PrimitiveType::Number) => {
            !s.trim().is_empty() && parse_numeric_string(s).is_finite()
        }
        (Value::String(s), PrimitiveType::Boolean) => matches!(s.as_str(), "true" | "false"),
        (Value::Number(_) | Value::Bool(_), PrimitiveType::String) => true,
        (Value::Number(n), PrimitiveType::Boolean) => {
            matches!(n.as_f64(), Some(f) if f == 0.0 || f == 1.0)
        }
        _ => false,
    }
}

/// Casts a value to a primitive type. Returns `None` when no sensible
/// conversion exists; the caller keeps the original value then.
pub fn cast_value(value: &Value, target: PrimitiveType) -> Option<Value> {
    match target {
        PrimitiveType::String => match value {
            Value::Object(_) => None,
            other => Some(Value::String(to_js_string(other))),
        },
        PrimitiveType::Number => {
            let n = to_number(Some(value));
            serde_json::Number::from_f64(n).map(|num| {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    Value::Number((n as i64).into())
                } else {
                    Value::Number(num)
                }
            })
        }
        PrimitiveType::Boolean => match value {
            Value::String(s) if s == "false" => Some(Value::Bool(false)),
            other => Some(Value::Bool(is_truthy(Some(other)))),
        },
        PrimitiveType::Array => match value {
            Value::Array(_) => Some(value.clone()),
            Value::Null => Some(Value::Array(Vec::new())),
            other => Some(Value::Array(vec![other.clone()])),
        },
        PrimitiveType::Object => value.is_object().then(|| value.clone()),
        PrimitiveType::Null => Some(Value::Null),
    }
}
