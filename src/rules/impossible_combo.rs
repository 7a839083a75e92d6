//! Resolved values that jointly violate a cross-field constraint.
//!
//! Comparison rules (`fields: [left, right]` + `operator`) are checked
//! directly. Expression rules are CEL programs over the resolved values and
//! need the `cel-eval` feature; without it they are skipped.

use super::{DetectionRule, RuleContext};
use crate::enums::Comparison;
use crate::error::RuleError;
use crate::finding::Finding;
use crate::primitives::{strict_equals, to_number};
use crate::types::{CrossFieldKind, CrossFieldRule, FieldRef};
use serde_json::{Value, json};

pub struct ImpossibleCombo;

impl DetectionRule for ImpossibleCombo {
    fn id(&self) -> &'static str {
        "impossible-combo"
    }

    fn title(&self) -> &'static str {
        "Impossible value combination"
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for (i, rule) in ctx.invariants.cross_field_rules.iter().enumerate() {
            match rule.effective_kind() {
                CrossFieldKind::Compare => {
                    if let Some(finding) = check_comparison(ctx, i, rule) {
                        findings.push(finding);
                    }
                }
                CrossFieldKind::Expression => {
                    if let Some(finding) = check_expression(self.id(), ctx, i, rule)? {
                        findings.push(finding);
                    }
                }
                CrossFieldKind::MutuallyExclusive => {}
            }
        }

        Ok(findings)
    }
}

fn rule_path(index: usize) -> String {
    format!("invariants.crossFieldRules[{}]", index)
}

// ─── Comparisons ────────────────────────────────────────────────────────────

fn check_comparison(ctx: &RuleContext<'_>, index: usize, rule: &CrossFieldRule) -> Option<Finding> {
    let operator = rule.operator?;
    let [left_name, right_name] = rule.fields.as_slice() else {
        return None;
    };
    let left = ctx.configuration.field(left_name)?;
    let right = ctx.configuration.field(right_name)?;

    // A hidden or unanswered field cannot take part in a contradiction.
    if !ctx.state.is_visible(left_name) || !ctx.state.is_visible(right_name) {
        return None;
    }
    let lv = ctx.state.values.get(left_name)?;
    let rv = ctx.state.values.get(right_name)?;

    let holds = match operator {
        Comparison::Equals => strict_equals(Some(lv), Some(rv)),
        Comparison::NotEquals => !strict_equals(Some(lv), Some(rv)),
        ordering => {
            let (l, r) = (to_number(Some(lv)), to_number(Some(rv)));
            if l.is_nan() || r.is_nan() {
                return None;
            }
            match ordering {
                Comparison::LessThan => l < r,
                Comparison::LessThanOrEqual => l <= r,
                Comparison::GreaterThan => l > r,
                _ => l >= r,
            }
        }
    };
    if holds {
        return None;
    }

    let valid = valid_combination(operator, left_name, right_name, rv);
    let mut finding = Finding::error(format!(
        "Impossible combination: {} {} {}",
        left_name,
        operator.symbol(),
        right_name
    ))
    .explain(format!(
        "Cross-field rule '{}' requires {} {} {}, but state '{}' resolves {} = {} and {} = {}.{}",
        rule.label(index),
        left_name,
        operator.symbol(),
        right_name,
        ctx.example.description,
        left_name,
        lv,
        right_name,
        rv,
        rule.message
            .as_ref()
            .map(|m| format!(" {}", m))
            .unwrap_or_default(),
    ))
    .at(left.path())
    .at(right.path())
    .at(rule_path(index))
    .reproducer(&ctx.example.values)
    .fix(format!(
        "Use a valid combination such as {}; update the example state or the defaults \
         ({}.defaultValue) accordingly.",
        valid,
        left.path()
    ));

    finding = finding.fix(bound_suggestion(operator, &left, &right, rv));
    Some(finding)
}

/// A concrete pair of values satisfying `left <op> right`, keeping `right`.
fn valid_combination(operator: Comparison, left: &str, right: &str, right_value: &Value) -> Value {
    let r = to_number(Some(right_value));
    let left_value = match operator {
        Comparison::Equals | Comparison::LessThanOrEqual | Comparison::GreaterThanOrEqual => {
            right_value.clone()
        }
        Comparison::LessThan if r.is_finite() => number(r - 1.0),
        Comparison::GreaterThan if r.is_finite() => number(r + 1.0),
        Comparison::NotEquals if r.is_finite() => number(r + 1.0),
        _ => json!(format!("not {}", right_value)),
    };
    let mut combo = serde_json::Map::new();
    combo.insert(left.to_string(), left_value);
    combo.insert(right.to_string(), right_value.clone());
    Value::Object(combo)
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

/// The bound `left` must respect: `right` itself for inclusive operators,
/// one step inside it for strict ones.
fn bound_value(operator: Comparison, rv: &Value) -> Value {
    let r = to_number(Some(rv));
    match operator {
        Comparison::LessThan if r.is_finite() => number(r - 1.0),
        Comparison::GreaterThan if r.is_finite() => number(r + 1.0),
        _ => rv.clone(),
    }
}

fn bound_suggestion(operator: Comparison, left: &FieldRef<'_>, right: &FieldRef<'_>, rv: &Value) -> String {
    match operator {
        Comparison::LessThan | Comparison::LessThanOrEqual => format!(
            "Constrain the input: set {}.validation.max to {} (or validate '{}' against '{}' on change) \
             so the form rejects the combination before submit.",
            left.path(),
            bound_value(operator, rv),
            left.name(),
            right.name()
        ),
        Comparison::GreaterThan | Comparison::GreaterThanOrEqual => format!(
            "Constrain the input: set {}.validation.min to {} (or validate '{}' against '{}' on change) \
             so the form rejects the combination before submit.",
            left.path(),
            bound_value(operator, rv),
            left.name(),
            right.name()
        ),
        Comparison::Equals => format!(
            "Derive '{}' from '{}': add {}.dependency = {} so it is reset whenever '{}' changes.",
            right.name(),
            left.name(),
            right.path(),
            json!({"parent": left.name(), "resetOnChange": true}),
            left.name()
        ),
        Comparison::NotEquals => format!(
            "Hide '{}' while it would repeat '{}': add {}.showIf = {}.",
            right.name(),
            left.name(),
            right.path(),
            json!({"field": left.name(), "operator": "isEmpty"})
        ),
    }
}

// ─── Expressions ────────────────────────────────────────────────────────────

#[cfg(feature = "cel-eval")]
fn check_expression(
    rule_id: &str,
    ctx: &RuleContext<'_>,
    index: usize,
    rule: &CrossFieldRule,
) -> Result<Option<Finding>, RuleError> {
    let Some(expression) = rule.expression.as_deref() else {
        return Ok(None);
    };

    let program = match cel::Program::compile(expression) {
        Ok(p) => p,
        Err(e) => {
            return Ok(Some(
                Finding::error(format!("Cross-field rule '{}' is not valid CEL", rule.label(index)))
                    .explain(format!("The expression '{}' does not compile: {}", expression, e))
                    .at(format!("{}.expression", rule_path(index)))
                    .reproducer(&ctx.example.values)
                    .fix(format!(
                        "Rewrite {}.expression using field names as identifiers, e.g. \"endDate > startDate\".",
                        rule_path(index)
                    ))
                    .fix(format!(
                        "Or express it as a comparison rule: {{\"fields\": [\"a\", \"b\"], \"operator\": \"lessThan\"}} at {}.",
                        rule_path(index)
                    )),
            ));
        }
    };

    let visible: serde_json::Map<String, Value> = ctx
        .state
        .values
        .iter()
        .filter(|(name, _)| ctx.state.is_visible(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    let mut cel_ctx = cel::Context::default();
    for (name, value) in &visible {
        cel_ctx.add_variable_from_value(name.as_str(), json_to_cel(value));
    }

    let holds = match program.execute(&cel_ctx) {
        Ok(cel::Value::Bool(b)) => b,
        Ok(other) => {
            return Err(RuleError::new(
                rule_id,
                format!(
                    "cross-field rule '{}' evaluated to {:?}, expected a boolean",
                    rule.label(index),
                    other
                ),
            ));
        }
        // Unanswered or hidden fields: nothing to contradict yet.
        Err(cel::ExecutionError::NoSuchKey(_)) | Err(cel::ExecutionError::UndeclaredReference(_)) => {
            return Ok(None);
        }
        Err(e) => {
            return Err(RuleError::new(
                rule_id,
                format!("cross-field rule '{}' failed: {}", rule.label(index), e),
            ));
        }
    };
    if holds {
        return Ok(None);
    }

    let mut finding = Finding::error(format!("Impossible combination: {}", expression))
        .explain(format!(
            "Cross-field rule '{}' ({}) is false for the values resolved in state '{}'.{}",
            rule.label(index),
            expression,
            ctx.example.description,
            rule.message
                .as_ref()
                .map(|m| format!(" {}", m))
                .unwrap_or_default(),
        ));
    for name in &rule.fields {
        if let Some(field) = ctx.configuration.field(name) {
            finding = finding.at(field.path());
        }
    }
    let involved: serde_json::Map<String, Value> = if rule.fields.is_empty() {
        visible.clone()
    } else {
        rule.fields
            .iter()
            .filter_map(|name| visible.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    };
    let change = match satisfying_combination(&program, &cel_ctx, &involved) {
        Some(combo) => format!(
            "Use a valid combination such as {} (currently {}); update the example state or \
             the defaults accordingly, and add a matching validation.min / validation.max on \
             the fields involved.",
            Value::Object(combo),
            Value::Object(involved)
        ),
        None => format!(
            "Change the offending values {} so that '{}' holds, and add a matching \
             validation.min / validation.max on the fields involved.",
            Value::Object(involved),
            expression
        ),
    };
    Ok(Some(
        finding
            .at(format!("{}.expression", rule_path(index)))
            .reproducer(&ctx.example.values)
            .fix(change)
            .fix(format!(
                "If the combination is legitimate, relax {}.expression (e.g. add \"|| !has(...)\" \
                 guards) rather than dropping the rule.",
                rule_path(index)
            )),
    ))
}

/// Tries small edits of the involved values until the program holds: move
/// one value next to a numeric other (+1, -1, equal), or swap two values.
#[cfg(feature = "cel-eval")]
fn satisfying_combination(
    program: &cel::Program,
    base: &cel::Context<'_>,
    involved: &serde_json::Map<String, Value>,
) -> Option<serde_json::Map<String, Value>> {
    let mut candidates: Vec<Vec<(&String, Value)>> = Vec::new();
    for (a, va) in involved {
        for (b, vb) in involved {
            if a == b {
                continue;
            }
            if let Some(nb) = vb.as_f64() {
                for n in [nb + 1.0, nb - 1.0, nb] {
                    candidates.push(vec![(a, number(n))]);
                }
            }
            candidates.push(vec![(a, vb.clone()), (b, va.clone())]);
        }
    }

    candidates.into_iter().find_map(|edits| {
        let mut scope = base.new_inner_scope();
        for (name, value) in &edits {
            scope.add_variable_from_value(name.as_str(), json_to_cel(value));
        }
        if !matches!(program.execute(&scope), Ok(cel::Value::Bool(true))) {
            return None;
        }
        let mut combo = involved.clone();
        for (name, value) in edits {
            combo.insert(name.clone(), value);
        }
        Some(combo)
    })
}

#[cfg(not(feature = "cel-eval"))]
fn check_expression(
    _rule_id: &str,
    _ctx: &RuleContext<'_>,
    index: usize,
    _rule: &CrossFieldRule,
) -> Result<Option<Finding>, RuleError> {
    tracing::debug!(rule = index, "cel-eval disabled; skipping expression cross-field rule");
    Ok(None)
}

/// Convert serde_json::Value → cel::Value.
#[cfg(feature = "cel-eval")]
fn json_to_cel(value: &Value) -> cel::Value {
    use std::collections::HashMap;
    use std::sync::Arc;

    match value {
        Value::Null => cel::Value::Null,
        Value::Bool(b) => cel::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                cel::Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                cel::Value::UInt(u)
            } else if let Some(f) = n.as_f64() {
                cel::Value::Float(f)
            } else {
                cel::Value::Null
            }
        }
        Value::String(s) => cel::Value::String(Arc::new(s.clone())),
        Value::Array(arr) => cel::Value::List(Arc::new(arr.iter().map(json_to_cel).collect())),
        Value::Object(map) => {
            let entries: HashMap<String, cel::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_cel(v)))
                .collect();
            entries.into()
        }
    }
}
