//! Closed enumerations used throughout the configuration model.
//!
//! Operator and field-type names arrive as free strings in the configuration.
//! Unknown names are preserved in a catch-all variant so that a single typo
//! never aborts loading; the evaluator and structure check decide what to do
//! with them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Finding severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Operator ───────────────────────────────────────────────────────────────

/// Comparison operator of a conditional rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    IsEmpty,
    IsNotEmpty,
    In,
    NotIn,
    /// Any operator name outside the supported set. Evaluates to `false`.
    Unrecognized(String),
}

impl Operator {
    pub fn from_name(name: &str) -> Self {
        match name {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "notContains" => Operator::NotContains,
            "greaterThan" => Operator::GreaterThan,
            "lessThan" => Operator::LessThan,
            "greaterThanOrEqual" => Operator::GreaterThanOrEqual,
            "lessThanOrEqual" => Operator::LessThanOrEqual,
            "isEmpty" => Operator::IsEmpty,
            "isNotEmpty" => Operator::IsNotEmpty,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            other => Operator::Unrecognized(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::GreaterThanOrEqual => "greaterThanOrEqual",
            Operator::LessThanOrEqual => "lessThanOrEqual",
            Operator::IsEmpty => "isEmpty",
            Operator::IsNotEmpty => "isNotEmpty",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Unrecognized(name) => name,
        }
    }

    /// The operator whose result is the logical negation of this one, used
    /// when suggesting a rewritten condition.
    pub fn negated(&self) -> Option<Operator> {
        Some(match self {
            Operator::Equals => Operator::NotEquals,
            Operator::NotEquals => Operator::Equals,
            Operator::Contains => Operator::NotContains,
            Operator::NotContains => Operator::Contains,
            Operator::GreaterThan => Operator::LessThanOrEqual,
            Operator::LessThan => Operator::GreaterThanOrEqual,
            Operator::GreaterThanOrEqual => Operator::LessThan,
            Operator::LessThanOrEqual => Operator::GreaterThan,
            Operator::IsEmpty => Operator::IsNotEmpty,
            Operator::IsNotEmpty => Operator::IsEmpty,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
            Operator::Unrecognized(_) => return None,
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Operator::from_name(&name))
    }
}

// ─── FieldType ──────────────────────────────────────────────────────────────

/// Semantic type tag of a field definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    Textarea,
    Select,
    Multiselect,
    Checkbox,
    Radio,
    Date,
    File,
    Hidden,
    Other(String),
}

impl FieldType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "text" => FieldType::Text,
            "email" => FieldType::Email,
            "password" => FieldType::Password,
            "number" => FieldType::Number,
            "tel" => FieldType::Tel,
            "url" => FieldType::Url,
            "textarea" => FieldType::Textarea,
            "select" => FieldType::Select,
            "multiselect" => FieldType::Multiselect,
            "checkbox" => FieldType::Checkbox,
            "radio" => FieldType::Radio,
            "date" => FieldType::Date,
            "file" => FieldType::File,
            "hidden" => FieldType::Hidden,
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Number => "number",
            FieldType::Tel => "tel",
            FieldType::Url => "url",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Hidden => "hidden",
            FieldType::Other(name) => name,
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FieldType::from_name(&name))
    }
}

/// HTTP method of the submission endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// JSON primitive type names used by the payload schema contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Object => "object",
            PrimitiveType::Array => "array",
            PrimitiveType::Null => "null",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a cross-field rule between two resolved values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equals,
    NotEquals,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::LessThan => "<",
            Comparison::LessThanOrEqual => "<=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqual => ">=",
            Comparison::Equals => "==",
            Comparison::NotEquals => "!=",
        }
    }
}
