//! Lenient document loading.
//!
//! Text that is not a JSON/YAML object is a fatal [`ParseError`]. Inside a
//! readable document every section is deserialized on its own: a malformed
//! step, field, rule or state is skipped and reported as an info finding, so
//! a partial configuration still gets analyzed.

use crate::enums::FieldType;
use crate::error::{DocumentKind, ParseError, ParseErrorKind};
use crate::finding::Finding;
use crate::types::*;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A document plus the info findings produced while reading it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parsed<T> {
    pub document: T,
    pub findings: Vec<Finding>,
}

/// Parses JSON, falling back to YAML, and requires an object root.
pub fn parse_value(input: &str, document: DocumentKind) -> Result<Value, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            document,
            message: "empty input".to_string(),
        });
    }

    let value: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(json_err) => serde_saphyr::from_str(input).map_err(|yaml_err| ParseError {
            kind: ParseErrorKind::Syntax,
            document,
            message: format!("not valid JSON ({}) or YAML ({})", json_err, yaml_err),
        })?,
    };

    if !value.is_object() {
        return Err(ParseError {
            kind: ParseErrorKind::TypeMismatch,
            document,
            message: "document root must be an object".to_string(),
        });
    }
    Ok(value)
}

pub fn parse_configuration(input: &str) -> Result<Parsed<Configuration>, ParseError> {
    let value = parse_value(input, DocumentKind::Configuration)?;
    Ok(configuration_from_value(&value))
}

pub fn parse_invariants(input: &str) -> Result<Parsed<Invariants>, ParseError> {
    let value = parse_value(input, DocumentKind::Invariants)?;
    Ok(invariants_from_value(&value))
}

pub fn parse_example_states(input: &str) -> Result<Parsed<ExampleStates>, ParseError> {
    let value = parse_value(input, DocumentKind::ExampleStates)?;
    Ok(example_states_from_value(&value))
}

// ─── Section readers ────────────────────────────────────────────────────────

struct Reader {
    findings: Vec<Finding>,
}

impl Reader {
    fn new() -> Self {
        Reader { findings: Vec::new() }
    }

    /// Deserializes an optional section, reporting and dropping it on failure.
    fn section<T: DeserializeOwned>(&mut self, obj: &Value, key: &str, path: &str, hint: &str) -> Option<T> {
        let raw = obj.get(key)?;
        if raw.is_null() {
            return None;
        }
        self.item(raw, path, hint)
    }

    fn item<T: DeserializeOwned>(&mut self, raw: &Value, path: &str, hint: &str) -> Option<T> {
        match serde_json::from_value::<T>(raw.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                self.skipped(path, &e.to_string(), hint);
                None
            }
        }
    }

    fn skipped(&mut self, path: &str, reason: &str, hint: &str) {
        tracing::debug!(path, reason, "skipping malformed section");
        self.findings.push(
            Finding::info(format!("Skipped malformed section at {}", path))
                .explain(format!(
                    "{} could not be read ({}) and was left out of the analysis.",
                    path, reason
                ))
                .at(path.to_string())
                .fix(format!("Fix the shape of {}: {}.", path, hint))
                .fix(format!(
                    "Or delete {} if it is not meant to be part of the document.",
                    path
                )),
        );
    }

    fn array<'v>(&mut self, obj: &'v Value, key: &str, path: &str, hint: &str) -> Option<&'v Vec<Value>> {
        match obj.get(key)? {
            Value::Array(items) => Some(items),
            Value::Null => None,
            other => {
                self.skipped(path, &format!("expected an array, got {}", other), hint);
                None
            }
        }
    }
}

pub fn configuration_from_value(value: &Value) -> Parsed<Configuration> {
    let mut r = Reader::new();
    let mut config = Configuration {
        id: r.section(value, "id", "id", "use a string such as \"signup-form\""),
        metadata: r.section(
            value,
            "metadata",
            "metadata",
            "use {\"title\": \"Signup\", \"version\": \"1.0.0\"}",
        ),
        steps: Vec::new(),
        submit: r.section(
            value,
            "submit",
            "submit",
            "use {\"endpoint\": \"/api/signup\", \"method\": \"POST\"}",
        ),
        mutually_exclusive: r
            .section(
                value,
                "mutuallyExclusive",
                "mutuallyExclusive",
                "use a list of name lists, e.g. [[\"subscribe\", \"unsubscribe\"]]",
            )
            .unwrap_or_default(),
    };

    let step_hint = "each step is {\"id\": \"step-1\", \"fields\": [...]}";

    if let Some(steps) = r.array(value, "steps", "steps", "use \"steps\": [{\"fields\": []}]") {
        for (si, raw_step) in steps.iter().enumerate() {
            let step_path = format!("steps[{}]", si);
            if !raw_step.is_object() {
                r.skipped(&step_path, "expected an object", step_hint);
                continue;
            }
            let mut step = Step {
                id: r.section(raw_step, "id", &format!("{}.id", step_path), "use a string id"),
                title: r.section(raw_step, "title", &format!("{}.title", step_path), "use a string title"),
                fields: Vec::new(),
            };
            let fields_path = format!("{}.fields", step_path);
            if let Some(fields) = r.array(raw_step, "fields", &fields_path, FIELD_HINT) {
                for (fi, raw_field) in fields.iter().enumerate() {
                    let field_path = format!("{}[{}]", fields_path, fi);
                    if let Some(field) = field_from_value(&mut r, raw_field, &field_path) {
                        step.fields.push(field);
                    }
                }
            }
            config.steps.push(step);
        }
    }

    Parsed {
        document: config,
        findings: r.findings,
    }
}

const FIELD_HINT: &str = "each field needs a string \"name\" and a \"type\" such as \"text\"";

/// Reads one field. Only `name` and `type` are fatal for the field; any
/// other malformed property is dropped on its own so the field keeps its
/// place in the graph.
fn field_from_value(r: &mut Reader, raw: &Value, path: &str) -> Option<FieldDefinition> {
    if !raw.is_object() {
        r.skipped(path, "expected an object", FIELD_HINT);
        return None;
    }
    let Some(name) = raw.get("name").and_then(Value::as_str) else {
        r.skipped(path, "missing string \"name\"", FIELD_HINT);
        return None;
    };
    let field_type = match raw.get("type") {
        None | Some(Value::Null) => FieldType::Text,
        Some(t) => r.item(t, path, FIELD_HINT)?,
    };

    let at = |key: &str| format!("{}.{}", path, key);
    let mut field = FieldDefinition::new(name, field_type);
    field.label = r.section(raw, "label", &at("label"), "use a string label");
    field.default_value = raw.get("defaultValue").cloned();
    field.validation = r.section(
        raw,
        "validation",
        &at("validation"),
        "use {\"required\": true, \"maxLength\": 50}",
    );
    field.show_if = r.section(
        raw,
        "showIf",
        &at("showIf"),
        "use {\"field\": \"country\", \"operator\": \"equals\", \"value\": \"US\"}",
    );
    field.dependency = r.section(raw, "dependency", &at("dependency"), "use {\"parent\": \"country\"}");
    field.data_source = r.section(
        raw,
        "dataSource",
        &at("dataSource"),
        "use {\"endpoint\": \"/api/regions\", \"valueKey\": \"id\"}",
    );
    field.submit_field = r.section(
        raw,
        "submitField",
        &at("submitField"),
        "use a dot path such as \"contact.email\"",
    );
    field.options = r.section(raw, "options", &at("options"), "use a list of option values");
    field.exclusive_with = r
        .section(raw, "exclusiveWith", &at("exclusiveWith"), "use a list of field names")
        .unwrap_or_default();
    Some(field)
}

pub fn invariants_from_value(value: &Value) -> Parsed<Invariants> {
    let mut r = Reader::new();
    let mut invariants = Invariants {
        versioning: r.section(
            value,
            "versioning",
            "invariants.versioning",
            "use {\"currentVersion\": \"2.0.0\"}",
        ),
        payload_schema: r.section(
            value,
            "payloadSchema",
            "invariants.payloadSchema",
            "use {\"required\": [\"email\"], \"types\": {\"email\": \"string\"}}",
        ),
        cross_field_rules: Vec::new(),
    };

    let rule_hint = "use {\"fields\": [\"start\", \"end\"], \"operator\": \"lessThan\"}";
    if let Some(rules) = r.array(value, "crossFieldRules", "invariants.crossFieldRules", rule_hint) {
        for (i, raw) in rules.iter().enumerate() {
            let path = format!("invariants.crossFieldRules[{}]", i);
            if let Some(rule) = r.item(raw, &path, rule_hint) {
                invariants.cross_field_rules.push(rule);
            }
        }
    }

    Parsed {
        document: invariants,
        findings: r.findings,
    }
}

pub fn example_states_from_value(value: &Value) -> Parsed<ExampleStates> {
    let mut r = Reader::new();
    let mut states = ExampleStates::default();
    let hint = "use {\"description\": \"new user\", \"values\": {\"email\": \"a@b.c\"}}";

    if let Some(items) = r.array(value, "states", "states", hint) {
        for (i, raw) in items.iter().enumerate() {
            if let Some(state) = r.item(raw, &format!("states[{}]", i), hint) {
                states.states.push(state);
            }
        }
    }

    Parsed {
        document: states,
        findings: r.findings,
    }
}
