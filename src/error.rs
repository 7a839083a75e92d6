use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Which input document a load or parse failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Configuration,
    Invariants,
    ExampleStates,
    Findings,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DocumentKind::Configuration => "configuration",
            DocumentKind::Invariants => "invariants",
            DocumentKind::ExampleStates => "example states",
            DocumentKind::Findings => "findings",
        })
    }
}

/// Error kind for parse failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
}

/// Produced by the `parse_*` functions when a document cannot be read at all.
///
/// Structural gaps inside an otherwise readable configuration are not parse
/// errors; they surface as info findings instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{document} document: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub document: DocumentKind,
    pub message: String,
}

/// Serialization error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SerializeError {
    pub message: String,
}

/// Returned by a detection rule that cannot finish for one example state.
///
/// The engine turns it into an error finding and keeps going.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("rule '{rule}' failed: {message}")]
pub struct RuleError {
    pub rule: String,
    pub message: String,
}

impl RuleError {
    pub fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Fatal I/O-stage failure of an analysis run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {document} document '{}': {source}", path.display())]
    Io {
        document: DocumentKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("cannot write artifact '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}
