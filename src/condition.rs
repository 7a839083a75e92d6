//! Conditional-rule evaluation.
//!
//! [`evaluate`] is pure and total: every operator/value combination yields a
//! boolean. Non-numeric operands of ordering operators become NaN and compare
//! false; an unrecognized operator evaluates to `false` and is logged.

use crate::enums::Operator;
use crate::primitives::{is_empty_value, strict_equals, to_js_string, to_number};
use crate::types::{ConditionalRule, ValueMap};
use serde_json::Value;

/// Evaluates a conditional rule against a field-value map.
///
/// The base comparison is combined with the sub-rules as
/// `(base && all(and)) || any(or)`; either list may be absent.
pub fn evaluate(rule: &ConditionalRule, values: &ValueMap) -> bool {
    let mut result = evaluate_base(rule, values);

    if let Some(and) = &rule.and {
        result = result && and.iter().all(|sub| evaluate(sub, values));
    }

    if let Some(or) = &rule.or {
        result = result || or.iter().any(|sub| evaluate(sub, values));
    }

    result
}

/// Evaluates only the rule's own operator, ignoring `and` / `or`.
pub fn evaluate_base(rule: &ConditionalRule, values: &ValueMap) -> bool {
    let actual = values.get(&rule.field);
    let expected = rule.value.as_ref();
    apply_operator(&rule.operator, actual, expected)
}

/// Applies one operator to a field value and a comparison value.
pub fn apply_operator(operator: &Operator, actual: Option<&Value>, expected: Option<&Value>) -> bool {
    match operator {
        Operator::Equals => strict_equals(actual, expected),
        Operator::NotEquals => !strict_equals(actual, expected),
        Operator::Contains => contains(actual, expected).unwrap_or(false),
        Operator::NotContains => contains(actual, expected).is_none_or(|found| !found),
        Operator::GreaterThan => to_number(actual) > to_number(expected),
        Operator::LessThan => to_number(actual) < to_number(expected),
        Operator::GreaterThanOrEqual => to_number(actual) >= to_number(expected),
        Operator::LessThanOrEqual => to_number(actual) <= to_number(expected),
        Operator::IsEmpty => is_empty_value(actual),
        Operator::IsNotEmpty => !is_empty_value(actual),
        Operator::In => membership(actual, expected).unwrap_or(false),
        Operator::NotIn => membership(actual, expected).is_none_or(|found| !found),
        Operator::Unrecognized(name) => {
            tracing::warn!(operator = %name, "unrecognized condition operator; evaluating to false");
            false
        }
    }
}

/// `Some(found)` for string and array field values, `None` for any other
/// type, where neither containment nor its negation is meaningful.
fn contains(actual: Option<&Value>, expected: Option<&Value>) -> Option<bool> {
    match actual? {
        Value::String(haystack) => {
            let needle = match expected {
                Some(v) => to_js_string(v),
                None => "undefined".to_string(),
            };
            Some(haystack.contains(needle.as_str()))
        }
        Value::Array(items) => Some(items.iter().any(|item| strict_equals(Some(item), expected))),
        _ => None,
    }
}

/// `Some(found)` when the comparison value is an array, `None` otherwise.
fn membership(actual: Option<&Value>, expected: Option<&Value>) -> Option<bool> {
    let candidates = expected?.as_array()?;
    Some(candidates.iter().any(|c| strict_equals(actual, Some(c))))
}
