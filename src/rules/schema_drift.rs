//! Disagreement between the payload a state would submit and the declared
//! payload contract.
//!
//! Severity policy: a missing required path is an error. A type mismatch is a
//! warning when the value would coerce cleanly (e.g. `"42"` for a number) or
//! the path is optional, and an error otherwise. Payload paths written by
//! more than one field are warnings.

use super::{DetectionRule, RuleContext};
use crate::enums::{PrimitiveType, Severity};
use crate::error::RuleError;
use crate::finding::Finding;
use crate::payload::{Payload, build_payload};
use crate::primitives::{json_type, loosely_coercible};
use crate::types::{FieldRef, PayloadSchema};
use serde_json::{Value, json};

pub struct SchemaDrift;

impl DetectionRule for SchemaDrift {
    fn id(&self) -> &'static str {
        "schema-drift"
    }

    fn title(&self) -> &'static str {
        "Payload schema drift"
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        // Nothing to submit; the structure check already reports the gap.
        if ctx.configuration.field_count() == 0 {
            return Ok(Vec::new());
        }

        let payload = build_payload(ctx.configuration, ctx.state);
        let mut findings = Vec::new();

        if let Some(schema) = &ctx.invariants.payload_schema {
            check_required(ctx, schema, &payload, &mut findings);
            check_types(ctx, schema, &payload, &mut findings);
        }
        check_collisions(ctx, &payload, &mut findings);

        Ok(findings)
    }
}

/// Fields whose payload path is `path` or lies below it.
fn writers_of<'a>(ctx: &RuleContext<'a>, path: &str) -> Vec<FieldRef<'a>> {
    let prefix = format!("{}.", path);
    ctx.configuration
        .fields()
        .filter(|f| {
            let p = f.field.payload_path();
            p == path || p.starts_with(&prefix)
        })
        .collect()
}

fn check_required(ctx: &RuleContext<'_>, schema: &PayloadSchema, payload: &Payload, findings: &mut Vec<Finding>) {
    for path in &schema.required {
        if payload.get(path).is_some() {
            continue;
        }

        let writers = writers_of(ctx, path);
        let reason = if writers.is_empty() {
            "no field's submitField (or name) targets it".to_string()
        } else {
            let names: Vec<String> = writers
                .iter()
                .map(|w| {
                    let why = if !ctx.state.is_visible(w.name()) {
                        "hidden"
                    } else {
                        "has no value"
                    };
                    format!("'{}' ({})", w.name(), why)
                })
                .collect();
            format!("the fields mapped to it are not submitted: {}", names.join(", "))
        };

        let mut finding = Finding::error(format!("Required payload path '{}' is missing", path))
            .explain(format!(
                "payloadSchema.required lists '{}', but in state '{}' {}. Example payload: {}",
                path,
                ctx.example.description,
                reason,
                payload.to_value()
            ))
            .at(format!("invariants.payloadSchema.required[\"{}\"]", path));
        for w in &writers {
            finding = finding.at(w.path());
        }
        finding = finding.reproducer(&ctx.example.values);

        finding = match writers.first() {
            Some(w) if !ctx.state.is_visible(w.name()) => finding.fix(format!(
                "Submit a fallback for hidden '{}': give {} a defaultValue and send it even when \
                 showIf is false, or relax {}.",
                w.name(),
                w.path(),
                w.property_path("showIf")
            )),
            Some(w) => finding.fix(format!(
                "Require a value: set {}.validation.required to true (or add a defaultValue) so \
                 '{}' is always present.",
                w.path(),
                path
            )),
            None => finding.fix(format!(
                "Map a field onto it: set \"submitField\": \"{}\" on the field that carries this \
                 data (e.g. the field named '{}').",
                path,
                path.rsplit('.').next().unwrap_or(path)
            )),
        };
        findings.push(finding.fix(format!(
            "If the path is optional, remove \"{}\" from invariants.payloadSchema.required.",
            path
        )));
    }
}

fn check_types(ctx: &RuleContext<'_>, schema: &PayloadSchema, payload: &Payload, findings: &mut Vec<Finding>) {
    for (path, expected) in &schema.types {
        let Some(actual_value) = payload.get(path) else {
            continue;
        };
        let actual = json_type(actual_value);
        if actual == *expected {
            continue;
        }

        let coercible = loosely_coercible(actual_value, *expected);
        let required = schema.required.contains(path);
        let severity = if required && !coercible {
            Severity::Error
        } else {
            Severity::Warning
        };

        let writers = writers_of(ctx, path);
        let mut finding = Finding::new(
            severity,
            format!("Payload path '{}' is {}, expected {}", path, actual, expected),
        )
        .explain(format!(
            "payloadSchema.types declares '{}' as {}, but state '{}' submits {} ({}).{} \
             Example payload: {}",
            path,
            expected,
            ctx.example.description,
            actual_value,
            actual,
            if coercible {
                " The value converts cleanly, so the mismatch is only loosely inferable."
            } else {
                ""
            },
            payload.to_value()
        ))
        .at(format!("invariants.payloadSchema.types[\"{}\"]", path));
        for w in &writers {
            finding = finding.at(w.path());
        }
        finding = finding
            .reproducer(&ctx.example.values)
            .fix(format!(
                "Add a cast to submit.transforms: {}.",
                json!({"path": path, "cast": expected.as_str()})
            ));
        finding = match writers.first() {
            Some(w) => finding.fix(format!(
                "Or change the input type: set {}.type to \"{}\" so the value is {} at the source.",
                w.path(),
                field_type_for(*expected),
                expected
            )),
            None => finding.fix(format!(
                "Or update the contract: set invariants.payloadSchema.types[\"{}\"] to \"{}\".",
                path, actual
            )),
        };
        findings.push(finding);
    }
}

fn field_type_for(expected: PrimitiveType) -> &'static str {
    match expected {
        PrimitiveType::Number => "number",
        PrimitiveType::Boolean => "checkbox",
        PrimitiveType::Array => "multiselect",
        _ => "text",
    }
}

fn check_collisions(ctx: &RuleContext<'_>, payload: &Payload, findings: &mut Vec<Finding>) {
    for collision in &payload.collisions {
        let mut finding = Finding::warning(format!(
            "Payload path '{}' is written by several fields",
            collision.path
        ))
        .explain(format!(
            "Fields {} all write to '{}' in state '{}'; only the last write survives. \
             Example payload: {}",
            collision
                .fields
                .iter()
                .map(|f| format!("'{}'", f))
                .collect::<Vec<_>>()
                .join(", "),
            collision.path,
            ctx.example.description,
            payload.to_value()
        ));
        for loc in &collision.locations {
            finding = finding.at(loc.clone());
        }
        let second = collision.fields.last().cloned().unwrap_or_default();
        let example = Value::String(format!("{}.{}", collision.path, second));
        findings.push(
            finding
                .reproducer(&ctx.example.values)
                .fix(format!(
                    "Give each field its own target, e.g. set submitField of '{}' to {}.",
                    second, example
                ))
                .fix(format!(
                    "Or make the fields exclusive with showIf (e.g. {}) so only one is \
                     submitted at a time.",
                    json!({"field": collision.fields.first().cloned().unwrap_or_default(), "operator": "isEmpty"})
                )),
        );
    }
}
