//! Declared mutually exclusive fields that are active in the same state.
//!
//! Pairs come only from explicit declarations: the configuration's
//! `mutuallyExclusive` groups, a field's `exclusiveWith` list, and
//! `mutuallyExclusive` cross-field rules in the invariants. Name-based
//! guessing is not attempted.

use super::{DetectionRule, RuleContext};
use crate::error::RuleError;
use crate::finding::Finding;
use crate::primitives::is_truthy;
use crate::types::{Configuration, CrossFieldKind, FieldRef, Invariants};
use serde_json::json;

pub struct MutuallyExclusive;

impl DetectionRule for MutuallyExclusive {
    fn id(&self) -> &'static str {
        "mutually-exclusive"
    }

    fn title(&self) -> &'static str {
        "Mutually exclusive fields both active"
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for (a, b) in declared_pairs(ctx.configuration, ctx.invariants) {
            let (Some(left), Some(right)) = (ctx.configuration.field(&a), ctx.configuration.field(&b))
            else {
                continue;
            };
            if !is_active(ctx, &left) || !is_active(ctx, &right) {
                continue;
            }
            findings.push(build_finding(ctx, &left, &right));
        }

        Ok(findings)
    }
}

/// Every declared pair once, in first-declaration order, as (earlier, later)
/// by field declaration order.
pub fn declared_pairs(configuration: &Configuration, invariants: &Invariants) -> Vec<(String, String)> {
    let order: Vec<&str> = configuration.fields().map(|f| f.name()).collect();
    let position = |name: &str| order.iter().position(|n| *n == name).unwrap_or(usize::MAX);

    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut push = |a: &str, b: &str| {
        if a == b {
            return;
        }
        let (first, second) = if position(a) <= position(b) { (a, b) } else { (b, a) };
        if !pairs.iter().any(|(x, y)| x == first && y == second) {
            pairs.push((first.to_string(), second.to_string()));
        }
    };

    for group in &configuration.mutually_exclusive {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                push(a, b);
            }
        }
    }

    for field_ref in configuration.fields() {
        for other in &field_ref.field.exclusive_with {
            push(field_ref.name(), other);
        }
    }

    for rule in &invariants.cross_field_rules {
        if rule.effective_kind() != CrossFieldKind::MutuallyExclusive {
            continue;
        }
        for (i, a) in rule.fields.iter().enumerate() {
            for b in &rule.fields[i + 1..] {
                push(a, b);
            }
        }
    }

    pairs
}

/// A field is active when it is visible and its resolved value is truthy.
fn is_active(ctx: &RuleContext<'_>, field: &FieldRef<'_>) -> bool {
    ctx.state.is_visible(field.name()) && is_truthy(ctx.state.values.get(field.name()))
}

fn build_finding(ctx: &RuleContext<'_>, left: &FieldRef<'_>, right: &FieldRef<'_>) -> Finding {
    let (a, b) = (left.name(), right.name());
    let radio = json!({
        "name": format!("{}Choice", a),
        "type": "radio",
        "options": [a, b],
    });
    let guard = json!({"field": a, "operator": "notEquals", "value": true});

    Finding::warning(format!("Mutually exclusive fields '{}' and '{}' are both active", a, b))
        .explain(format!(
            "'{}' and '{}' are declared mutually exclusive, yet in state '{}' both are \
             visible with truthy values ({} and {}). The submitted payload would carry \
             contradictory answers.",
            a,
            b,
            ctx.example.description,
            ctx.state.values.get(a).map(|v| v.to_string()).unwrap_or_default(),
            ctx.state.values.get(b).map(|v| v.to_string()).unwrap_or_default(),
        ))
        .at(left.path())
        .at(right.path())
        .reproducer(&ctx.example.values)
        .fix(format!(
            "Replace '{}' ({}) and '{}' ({}) with one enum field, e.g. {}.",
            a,
            left.path(),
            b,
            right.path(),
            radio
        ))
        .fix(format!(
            "If both fields must stay, add {}.showIf = {} so '{}' disappears once '{}' is checked.",
            right.path(),
            guard,
            b,
            a
        ))
}
