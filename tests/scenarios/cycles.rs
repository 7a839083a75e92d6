use super::common::run;
use formdebug::parse::configuration_from_value;
use formdebug::{Severity, detect_cycles};
use serde_json::json;

#[test]
fn three_field_cycle_found_once() {
    let config = configuration_from_value(&json!({
        "steps": [{"fields": [
            {"name": "A", "type": "text", "showIf": {"field": "B", "operator": "isNotEmpty"}},
            {"name": "B", "type": "text", "dependency": {"parent": "C"}},
            {"name": "C", "type": "text", "showIf": {"field": "A", "operator": "isNotEmpty"}}
        ]}]
    }))
    .document;

    let cycles = detect_cycles(&config);
    assert_eq!(cycles.len(), 1);
    let mut members = cycles[0].clone();
    members.sort();
    assert_eq!(members, vec!["A", "B", "C"]);
}

#[test]
fn cycle_finding_names_every_member() {
    let findings = run(
        &json!({
            "steps": [{"fields": [
                {"name": "A", "type": "text", "showIf": {"field": "B", "operator": "isNotEmpty"}},
                {"name": "B", "type": "text", "dependency": {"parent": "C"}},
                {"name": "C", "type": "text", "showIf": {"field": "A", "operator": "isNotEmpty"}}
            ]}]
        }),
        None,
        None,
    );
    let cycle: Vec<_> = findings
        .iter()
        .filter(|f| f.title.starts_with("Dependency cycle"))
        .collect();
    assert_eq!(cycle.len(), 1);
    assert_eq!(cycle[0].severity, Severity::Error);
    for path in ["steps[0].fields[0]", "steps[0].fields[1]", "steps[0].fields[2]"] {
        assert!(cycle[0].json_paths.iter().any(|p| p == path), "missing {}", path);
    }
}

#[test]
fn self_reference_terminates() {
    let config = configuration_from_value(&json!({
        "steps": [{"fields": [
            {"name": "loop", "type": "text", "showIf": {"field": "loop", "operator": "isEmpty"}}
        ]}]
    }))
    .document;
    assert_eq!(detect_cycles(&config), vec![vec!["loop".to_string()]]);
}

#[test]
fn no_relations_no_cycles() {
    let config = configuration_from_value(&json!({
        "steps": [
            {"fields": [{"name": "a", "type": "text"}, {"name": "b", "type": "number"}]},
            {"fields": [{"name": "c", "type": "checkbox"}]}
        ]
    }))
    .document;
    assert!(detect_cycles(&config).is_empty());
}

#[test]
fn cycle_through_nested_or() {
    let config = configuration_from_value(&json!({
        "steps": [{"fields": [
            {"name": "x", "type": "text", "showIf": {
                "field": "x", "operator": "isNotEmpty",
                "or": [{"field": "y", "operator": "equals", "value": 1}]
            }},
            {"name": "y", "type": "number", "dependency": {"parent": "x"}}
        ]}]
    }))
    .document;
    let cycles = detect_cycles(&config);
    assert!(cycles.iter().any(|c| c == &vec!["x".to_string(), "y".to_string()]));
}

fn chain(len: usize, close: bool) -> serde_json::Value {
    let fields: Vec<_> = (0..len)
        .map(|i| {
            let parent = if i + 1 < len {
                Some(format!("f{}", i + 1))
            } else if close {
                Some("f0".to_string())
            } else {
                None
            };
            match parent {
                Some(p) => json!({"name": format!("f{}", i), "type": "text", "dependency": {"parent": p}}),
                None => json!({"name": format!("f{}", i), "type": "text"}),
            }
        })
        .collect();
    json!({"steps": [{"fields": fields}]})
}

#[test]
fn long_dependency_chain_does_not_exhaust_the_stack() {
    let config = configuration_from_value(&chain(10_000, false)).document;
    assert_eq!(config.fields().count(), 10_000);
    assert!(detect_cycles(&config).is_empty());
}

#[test]
fn long_closed_chain_is_one_cycle() {
    let config = configuration_from_value(&chain(10_000, true)).document;
    let cycles = detect_cycles(&config);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 10_000);
    assert_eq!(cycles[0][0], "f0");
    assert_eq!(cycles[0][9_999], "f9999");
}
