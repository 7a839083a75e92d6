//! The single output entity of an analysis run.

use crate::enums::Severity;
use crate::types::ValueMap;
use serde::{Deserialize, Serialize};

/// A reported defect: severity, root cause, location, reproducer and fixes.
///
/// Serialized key order is `severity, title, explanation, jsonPaths,
/// reproducerState, fixGuidance`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub severity: Severity,
    pub title: String,
    pub explanation: String,
    pub json_paths: Vec<String>,
    pub reproducer_state: ValueMap,
    pub fix_guidance: Vec<String>,
}

impl Finding {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            explanation: String::new(),
            json_paths: Vec::new(),
            reproducer_state: ValueMap::new(),
            fix_guidance: Vec::new(),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(Severity::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(Severity::Info, title)
    }

    pub fn explain(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.json_paths.push(path.into());
        self
    }

    pub fn reproducer(mut self, state: &ValueMap) -> Self {
        self.reproducer_state = state.clone();
        self
    }

    pub fn fix(mut self, guidance: impl Into<String>) -> Self {
        self.fix_guidance.push(guidance.into());
        self
    }
}

/// Finding counts by severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Summary {
    pub fn of(findings: &[Finding]) -> Self {
        findings
            .iter()
            .fold(Summary::default(), |mut acc, f| {
                match f.severity {
                    Severity::Error => acc.errors += 1,
                    Severity::Warning => acc.warnings += 1,
                    Severity::Info => acc.infos += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }

    /// The only externally visible failure signal.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
