use formdebug::parse::{configuration_from_value, example_states_from_value, invariants_from_value};
use formdebug::{AnalysisInput, Engine, Finding, Severity};
use serde_json::Value;

/// Builds engine input from already-decoded documents.
pub fn input(configuration: &Value, invariants: Option<&Value>, states: Option<&Value>) -> AnalysisInput {
    AnalysisInput::from_parsed(
        configuration_from_value(configuration),
        invariants.map(invariants_from_value).unwrap_or_default(),
        states.map(example_states_from_value).unwrap_or_default(),
    )
}

pub fn run(configuration: &Value, invariants: Option<&Value>, states: Option<&Value>) -> Vec<Finding> {
    Engine::default()
        .run(&input(configuration, invariants, states))
        .findings
}

pub fn count(findings: &[Finding], severity: Severity) -> usize {
    findings.iter().filter(|f| f.severity == severity).count()
}

pub fn titles(findings: &[Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.title.as_str()).collect()
}
