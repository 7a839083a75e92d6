//! Static checks of the configuration's own shape, run once per analysis.
//!
//! Gaps (no steps, empty steps, unknown field types) are info findings so
//! that an empty or partial configuration always produces an explanation.
//! Self-contradictory field settings are warnings.

use crate::enums::FieldType;
use crate::finding::Finding;
use crate::primitives::{to_number, values_deep_equal};
use crate::types::{Configuration, FieldRef};
use regex::Regex;
use serde_json::{Value, json};
use serde_json_path::JsonPath;

pub fn structure_findings(configuration: &Configuration) -> Vec<Finding> {
    let mut findings = Vec::new();

    if configuration.steps.is_empty() {
        findings.push(
            Finding::info("Configuration has no steps")
                .explain(
                    "The configuration declares no steps, so there are no fields to simulate, \
                     validate or submit. Every rule is skipped for lack of structure.",
                )
                .at("steps")
                .fix(format!(
                    "Add at least one step with a field, e.g. \"steps\": [{}].",
                    json!({"id": "step-1", "fields": [{"name": "email", "type": "email"}]})
                ))
                .fix("If the document is a stub, give it metadata.title and metadata.version so it is recognisable in reports."),
        );
    }

    for (si, step) in configuration.steps.iter().enumerate() {
        if step.fields.is_empty() {
            let label = step.id.clone().unwrap_or_else(|| format!("#{}", si + 1));
            findings.push(
                Finding::info(format!("Step '{}' has no fields", label))
                    .explain(format!(
                        "steps[{}] renders as an empty page in a multi-step form.",
                        si
                    ))
                    .at(format!("steps[{}].fields", si))
                    .fix(format!(
                        "Move at least one field into steps[{}].fields, e.g. {}.",
                        si,
                        json!({"name": "notes", "type": "textarea"})
                    ))
                    .fix(format!(
                        "Or delete steps[{}] and renumber the navigation that points at it.",
                        si
                    )),
            );
        }
    }

    for field_ref in configuration.fields() {
        check_field(&field_ref, &mut findings);
    }

    findings
}

fn check_field(field_ref: &FieldRef<'_>, findings: &mut Vec<Finding>) {
    let field = field_ref.field;

    if let FieldType::Other(name) = &field.field_type {
        findings.push(
            Finding::info(format!("Field '{}' has unknown type '{}'", field.name, name))
                .explain(format!(
                    "'{}' is not one of the supported field types; renderers fall back to a \
                     plain text input.",
                    name
                ))
                .at(field_ref.property_path("type"))
                .fix(format!(
                    "Set {} to a supported type such as \"text\", \"select\" or \"checkbox\".",
                    field_ref.property_path("type")
                ))
                .fix("If this is a custom component, register it with the renderer and keep a supported fallback type here."),
        );
    }

    if let Some(validation) = &field.validation {
        if let (Some(min), Some(max)) = (validation.min, validation.max)
            && min > max
        {
            findings.push(bounds_finding(field_ref, "min", min, "max", max));
        }
        if let (Some(min), Some(max)) = (validation.min_length, validation.max_length)
            && min > max
        {
            findings.push(bounds_finding(
                field_ref,
                "minLength",
                min as f64,
                "maxLength",
                max as f64,
            ));
        }
        if let Some(pattern) = &validation.pattern
            && let Err(e) = Regex::new(pattern)
        {
            findings.push(
                Finding::warning(format!("Field '{}' has an invalid pattern", field.name))
                    .explain(format!("validation.pattern '{}' does not compile: {}", pattern, e))
                    .at(field_ref.property_path("validation.pattern"))
                    .fix(format!(
                        "Escape special characters in {}, e.g. \"^\\\\d{{5}}$\" for a 5-digit code.",
                        field_ref.property_path("validation.pattern")
                    ))
                    .fix("Or replace the pattern with minLength / maxLength if only the length matters."),
            );
        }
    }

    if let Some(default) = &field.default_value {
        check_default(field_ref, default, findings);
    }

    if let Some(source) = &field.data_source
        && let Some(path) = &source.response_path
        && let Err(e) = JsonPath::parse(path)
    {
        findings.push(
            Finding::warning(format!("Field '{}' has an invalid responsePath", field.name))
                .explain(format!(
                    "dataSource.responsePath '{}' is not valid JSONPath ({}); options loaded \
                     from {} can never be extracted.",
                    path, e, source.endpoint
                ))
                .at(field_ref.property_path("dataSource.responsePath"))
                .fix(format!(
                    "Rewrite {} as a JSONPath from the response root, e.g. \"$.data.items\".",
                    field_ref.property_path("dataSource.responsePath")
                ))
                .fix("Or remove responsePath when the endpoint returns the option array at the top level."),
        );
    }
}

fn bounds_finding(field_ref: &FieldRef<'_>, lo: &str, min: f64, hi: &str, max: f64) -> Finding {
    Finding::warning(format!(
        "Field '{}' has contradictory validation bounds",
        field_ref.name()
    ))
    .explain(format!(
        "validation.{} ({}) is greater than validation.{} ({}); no input can satisfy both.",
        lo, min, hi, max
    ))
    .at(field_ref.property_path(&format!("validation.{}", lo)))
    .at(field_ref.property_path(&format!("validation.{}", hi)))
    .fix(format!(
        "Swap the bounds: set validation.{} to {} and validation.{} to {}.",
        lo, max, hi, min
    ))
    .fix(format!(
        "Or drop validation.{} from {} if only the upper limit matters.",
        lo,
        field_ref.path()
    ))
}

/// Reports a default value the field's own validation would reject.
fn check_default(field_ref: &FieldRef<'_>, default: &Value, findings: &mut Vec<Finding>) {
    let field = field_ref.field;
    let mut problems = Vec::new();

    if let Some(v) = &field.validation {
        let n = to_number(Some(default));
        if let Some(min) = v.min
            && !n.is_nan()
            && n < min
        {
            problems.push(format!("below validation.min {}", min));
        }
        if let Some(max) = v.max
            && !n.is_nan()
            && n > max
        {
            problems.push(format!("above validation.max {}", max));
        }
        if let Some(pattern) = &v.pattern
            && let Some(s) = default.as_str()
            && let Ok(re) = Regex::new(pattern)
            && !re.is_match(s)
        {
            problems.push(format!("does not match validation.pattern '{}'", pattern));
        }
    }

    if let Some(options) = &field.options
        && !options.is_empty()
        && matches!(field.field_type, FieldType::Select | FieldType::Radio)
        && !options.iter().any(|o| option_matches(o, default))
    {
        problems.push("is not one of the declared options".to_string());
    }

    if problems.is_empty() {
        return;
    }

    findings.push(
        Finding::warning(format!("Default of '{}' fails its own validation", field.name))
            .explain(format!(
                "defaultValue {} {}. A user who keeps the default cannot submit the form.",
                default,
                problems.join("; ")
            ))
            .at(field_ref.property_path("defaultValue"))
            .fix(format!(
                "Change {} to a value that passes validation{}.",
                field_ref.property_path("defaultValue"),
                field
                    .options
                    .as_ref()
                    .and_then(|o| o.first())
                    .map(|o| format!(", e.g. {}", option_value(o)))
                    .unwrap_or_default()
            ))
            .fix(format!(
                "Or remove {} so the field starts empty.",
                field_ref.property_path("defaultValue")
            )),
    );
}

/// Options are either bare values or `{value, label}` objects.
fn option_value(option: &Value) -> &Value {
    option.get("value").unwrap_or(option)
}

fn option_matches(option: &Value, default: &Value) -> bool {
    values_deep_equal(option_value(option), default)
}
