//! Required fields that the current state hides.
//!
//! A hidden field cannot be filled in, so a `required` validation on it either
//! blocks submission or is silently skipped, depending on the renderer.

use super::{DetectionRule, RuleContext};
use crate::enums::Operator;
use crate::error::RuleError;
use crate::finding::Finding;
use crate::types::ConditionalRule;

pub struct RequiredHidden;

impl DetectionRule for RequiredHidden {
    fn id(&self) -> &'static str {
        "required-hidden"
    }

    fn title(&self) -> &'static str {
        "Required field hidden"
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for field_ref in ctx.configuration.fields() {
            let field = field_ref.field;
            if !field.is_required() || ctx.state.is_visible(&field.name) {
                continue;
            }
            // Only a showIf can hide a field.
            let Some(rule) = &field.show_if else {
                continue;
            };

            let gate_value = ctx
                .state
                .values
                .get(&rule.field)
                .or_else(|| ctx.example.values.get(&rule.field))
                .map(|v| v.to_string())
                .unwrap_or_else(|| "undefined".to_string());

            let mut finding = Finding::error(format!(
                "Required field '{}' is hidden",
                field.name
            ))
            .explain(format!(
                "Field '{}' has validation.required = true, but its showIf condition ({}) \
                 is false in state '{}' ('{}' is {}). The user can never fill it in, so \
                 submission is blocked or the required check is skipped.",
                field.name,
                describe(rule),
                ctx.example.description,
                rule.field,
                gate_value,
            ))
            .at(field_ref.path())
            .at(field_ref.property_path("showIf"))
            .reproducer(&ctx.example.values)
            .fix(format!(
                "Remove the requirement: set {}.validation.required to false and enforce \
                 '{}' server-side only when showIf holds.",
                field_ref.path(),
                field.name
            ))
            .fix(relax_suggestion(&field_ref.property_path("showIf"), rule));

            if rule.operator == Operator::Equals
                && let Some(expected) = &rule.value
            {
                finding = finding.fix(format!(
                    "Give the controlling field a matching default: set \"defaultValue\": {} \
                     on '{}' so '{}' is visible unless the user changes it.",
                    expected, rule.field, field.name
                ));
            }

            findings.push(finding);
        }

        Ok(findings)
    }
}

fn describe(rule: &ConditionalRule) -> String {
    match &rule.value {
        Some(v) => format!("{} {} {}", rule.field, rule.operator, v),
        None => format!("{} {}", rule.field, rule.operator),
    }
}

fn relax_suggestion(show_if_path: &str, rule: &ConditionalRule) -> String {
    match rule.operator.negated() {
        Some(negated) => {
            let rewritten = ConditionalRule {
                operator: negated,
                and: None,
                or: None,
                ..rule.clone()
            };
            let json = serde_json::to_string(&rewritten).unwrap_or_default();
            format!(
                "Relax the condition at {}: rewrite it as {} if the field should be shown \
                 in this state, or delete showIf entirely.",
                show_if_path, json
            )
        }
        None => format!(
            "Replace the unrecognized operator '{}' at {}.operator with a supported one \
             such as \"equals\", or delete showIf entirely.",
            rule.operator, show_if_path
        ),
    }
}
