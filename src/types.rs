use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::enums::*;

/// Field-name → value map. Insertion order is preserved (`preserve_order`).
pub type ValueMap = serde_json::Map<String, Value>;

/// Keeps an explicit JSON `null` distinct from an absent key.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Accepts `"1.2.0"` as well as bare numbers such as `2` or `1.5`.
fn version_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "version must be a string or number, got {}",
            other
        ))),
    }
}

// ─── Configuration ──────────────────────────────────────────────────────────

/// The form configuration under analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<SubmitConfig>,
    /// Explicit groups of fields that must never be active together.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mutually_exclusive: Vec<Vec<String>>,
}

impl Configuration {
    /// Iterates every field with its step and field index, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = FieldRef<'_>> {
        self.steps.iter().enumerate().flat_map(|(si, step)| {
            step.fields
                .iter()
                .enumerate()
                .map(move |(fi, field)| FieldRef {
                    step: si,
                    index: fi,
                    field,
                })
        })
    }

    /// First field declared with `name`.
    pub fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        self.fields().find(|f| f.field.name == name)
    }

    pub fn field_count(&self) -> usize {
        self.steps.iter().map(|s| s.fields.len()).sum()
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.version.as_deref())
    }
}

/// A field together with its location in the configuration.
#[derive(Clone, Copy, Debug)]
pub struct FieldRef<'a> {
    pub step: usize,
    pub index: usize,
    pub field: &'a FieldDefinition,
}

impl<'a> FieldRef<'a> {
    /// JSON path of the field definition, e.g. `steps[0].fields[2]`.
    pub fn path(&self) -> String {
        format!("steps[{}].fields[{}]", self.step, self.index)
    }

    /// JSON path of a property below the field definition.
    pub fn property_path(&self, property: &str) -> String {
        format!("{}.{}", self.path(), property)
    }

    /// Borrowed from the configuration, so it outlives this `FieldRef`.
    pub fn name(&self) -> &'a str {
        &self.field.name
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "version_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

// ─── Field definition ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ConditionalRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    /// Dot-notation target path in the submission payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusive_with: Vec<String>,
}

fn default_field_type() -> FieldType {
    FieldType::Text
}

impl FieldDefinition {
    /// A plain field of the given type with every optional part unset.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: None,
            default_value: None,
            validation: None,
            show_if: None,
            dependency: None,
            data_source: None,
            submit_field: None,
            options: None,
            exclusive_with: Vec::new(),
        }
    }

    pub fn is_required(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.required)
    }

    /// Payload path the field's value is written to on submit.
    pub fn payload_path(&self) -> &str {
        self.submit_field.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

// ─── Conditional rule ───────────────────────────────────────────────────────

/// A visibility condition: a base comparison plus optional AND / OR sub-rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    #[serde(alias = "targetField")]
    pub field: String,
    pub operator: Operator,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<ConditionalRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<ConditionalRule>>,
}

impl ConditionalRule {
    pub fn new(field: impl Into<String>, operator: Operator, value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            and: None,
            or: None,
        }
    }

    /// Every field name referenced by this rule and its sub-rules, depth first.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(self.field.as_str());
        for sub in self.and.iter().chain(self.or.iter()).flatten() {
            sub.collect_fields(out);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub parent: String,
    #[serde(default)]
    pub reset_on_change: bool,
    #[serde(default)]
    pub disable_when_empty: bool,
    #[serde(default)]
    pub reload_options: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// JSONPath selecting the option list in the endpoint's response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_key: Option<String>,
}

// ─── Submission ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<TransformRule>,
}

/// A payload rewrite applied after field values are placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRule {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<PrimitiveType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,
}

// ─── Invariants ─────────────────────────────────────────────────────────────

/// The external contract configurations are checked against.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invariants {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versioning: Option<Versioning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_schema: Option<PayloadSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cross_field_rules: Vec<CrossFieldRule>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(
        default,
        deserialize_with = "version_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_guide: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadSchema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub types: BTreeMap<String, PrimitiveType>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrossFieldKind {
    #[default]
    Compare,
    MutuallyExclusive,
    Expression,
}

/// A rule spanning two or more fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossFieldRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CrossFieldKind>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Comparison>,
    /// CEL expression over the resolved field values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CrossFieldRule {
    /// Explicit `kind`, otherwise inferred from which keys are present.
    pub fn effective_kind(&self) -> CrossFieldKind {
        match self.kind {
            Some(kind) => kind,
            None if self.expression.is_some() => CrossFieldKind::Expression,
            None => CrossFieldKind::Compare,
        }
    }

    pub fn label(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("crossFieldRules[{}]", index))
    }
}

// ─── Example states ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleStates {
    #[serde(default)]
    pub states: Vec<ExampleState>,
}

/// A named set of candidate field values used to probe the configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleState {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub values: ValueMap,
}

impl ExampleState {
    pub fn new(description: impl Into<String>, values: ValueMap) -> Self {
        Self {
            description: description.into(),
            values,
        }
    }
}
