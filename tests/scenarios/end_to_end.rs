use super::common::{count, run, titles};
use formdebug::Severity;
use serde_json::json;

#[test]
fn required_email_hidden_by_subscribe() {
    let config = json!({
        "steps": [{"fields": [
            {"name": "subscribe", "type": "checkbox"},
            {"name": "email", "type": "email", "validation": {"required": true},
             "showIf": {"field": "subscribe", "operator": "equals", "value": true}}
        ]}]
    });
    let states = json!({"states": [{"description": "opted out", "values": {"subscribe": false}}]});

    let findings = run(&config, None, Some(&states));
    assert_eq!(findings.len(), 1, "{:?}", titles(&findings));
    let finding = &findings[0];
    assert_eq!(finding.severity, Severity::Error);
    assert!(finding.title.contains("hidden"));
    assert!(finding.json_paths.contains(&"steps[0].fields[1]".to_string()));
    assert_eq!(finding.reproducer_state, states["states"][0]["values"].as_object().unwrap().clone());
    assert!(finding.fix_guidance.len() >= 2);
}

// showIf `subscribe == false` with `subscribe: false` keeps the field visible.
#[test]
fn required_email_shown_when_condition_holds() {
    let config = json!({
        "steps": [{"fields": [
            {"name": "subscribe", "type": "checkbox"},
            {"name": "email", "type": "email", "validation": {"required": true},
             "showIf": {"field": "subscribe", "operator": "equals", "value": false}}
        ]}]
    });
    let states = json!({"states": [{"description": "opted out", "values": {"subscribe": false}}]});

    let findings = run(&config, None, Some(&states));
    assert!(findings.is_empty(), "{:?}", titles(&findings));
}

#[test]
fn exclusive_checkboxes_both_checked() {
    let config = json!({
        "mutuallyExclusive": [["subscribe", "unsubscribe"]],
        "steps": [{"fields": [
            {"name": "subscribe", "type": "checkbox"},
            {"name": "unsubscribe", "type": "checkbox"}
        ]}]
    });
    let states = json!({"states": [{"description": "both", "values": {"subscribe": true, "unsubscribe": true}}]});

    let findings = run(&config, None, Some(&states));
    assert_eq!(findings.len(), 1, "{:?}", titles(&findings));
    let finding = &findings[0];
    assert_eq!(finding.severity, Severity::Warning);
    assert!(finding.title.contains("subscribe") && finding.title.contains("unsubscribe"));
    assert_eq!(finding.json_paths, vec!["steps[0].fields[0]", "steps[0].fields[1]"]);
}

#[test]
fn exclusive_pair_declared_twice_reported_once() {
    let config = json!({
        "mutuallyExclusive": [["subscribe", "unsubscribe"]],
        "steps": [{"fields": [
            {"name": "subscribe", "type": "checkbox", "exclusiveWith": ["unsubscribe"]},
            {"name": "unsubscribe", "type": "checkbox", "exclusiveWith": ["subscribe"]}
        ]}]
    });
    let invariants = json!({"crossFieldRules": [
        {"kind": "mutuallyExclusive", "fields": ["unsubscribe", "subscribe"]}
    ]});
    let states = json!({"states": [{"description": "both", "values": {"subscribe": true, "unsubscribe": true}}]});

    let findings = run(&config, Some(&invariants), Some(&states));
    assert_eq!(count(&findings, Severity::Warning), 1);
}

#[test]
fn major_version_bump() {
    let config = json!({
        "metadata": {"title": "Signup", "version": "1.5.0"},
        "steps": [{"fields": [{"name": "name", "type": "text"}]}]
    });
    let invariants = json!({"versioning": {"currentVersion": "2.0.0"}});

    let findings = run(&config, Some(&invariants), None);
    assert_eq!(findings.len(), 1, "{:?}", titles(&findings));
    let finding = &findings[0];
    assert_eq!(finding.severity, Severity::Warning);
    assert!(finding.explanation.contains("1.5.0"));
    assert!(finding.explanation.contains("2.0.0"));
    assert_eq!(finding.json_paths, vec!["metadata.version"]);
}

#[test]
fn empty_configuration_only_informs() {
    let findings = run(&json!({"steps": []}), None, None);
    assert!(!findings.is_empty());
    assert!(findings.iter().all(|f| f.severity == Severity::Info));
}

#[test]
fn configuration_without_steps_key_only_informs() {
    let findings = run(&json!({"metadata": {"title": "stub"}}), None, None);
    assert!(!findings.is_empty());
    assert!(findings.iter().all(|f| f.severity == Severity::Info));
}

#[test]
fn repeated_runs_are_identical() {
    let config = json!({
        "metadata": {"version": "1.0.0"},
        "steps": [{"fields": [
            {"name": "plan", "type": "select", "defaultValue": "free"},
            {"name": "card", "type": "text", "validation": {"required": true},
             "showIf": {"field": "plan", "operator": "equals", "value": "pro"}},
            {"name": "start", "type": "number"},
            {"name": "end", "type": "number"}
        ]}]
    });
    let invariants = json!({
        "versioning": {"currentVersion": "3.0.0"},
        "payloadSchema": {"required": ["card"], "types": {"start": "number"}},
        "crossFieldRules": [{"fields": ["start", "end"], "operator": "lessThan"}]
    });
    let states = json!({"states": [
        {"description": "free", "values": {"start": 5, "end": 1}},
        {"description": "pro", "values": {"plan": "pro", "start": "5", "end": 9}}
    ]});

    let first = run(&config, Some(&invariants), Some(&states));
    let second = run(&config, Some(&invariants), Some(&states));
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn every_finding_has_two_fixes() {
    let config = json!({
        "steps": [
            {"fields": [
                {"name": "plan", "type": "select", "options": ["free", "pro"], "defaultValue": "gold"},
                {"name": "card", "type": "text", "validation": {"required": true, "min": 5, "max": 1},
                 "showIf": {"field": "plan", "operator": "equals", "value": "pro"}},
                {"name": "ghost", "type": "widget", "showIf": {"field": "phantom", "operator": "isEmpty"}},
                {"name": "a", "type": "text", "showIf": {"field": "b", "operator": "isEmpty"}},
                {"name": "b", "type": "text", "dependency": {"parent": "a"}, "submitField": "plan"}
            ]},
            {"fields": []}
        ]
    });
    let invariants = json!({
        "versioning": {"currentVersion": "2.0.0"},
        "payloadSchema": {"required": ["missing.path"], "types": {"plan": "number"}}
    });

    let findings = run(&config, Some(&invariants), None);
    assert!(findings.len() >= 6, "{:?}", titles(&findings));
    for f in &findings {
        assert!(f.fix_guidance.len() >= 2, "too few fixes for {}", f.title);
        assert!(!f.explanation.is_empty(), "no explanation for {}", f.title);
    }
}
