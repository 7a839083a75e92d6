use super::common::run;
use formdebug::{LoadError, parse_findings, serialize_findings, write_artifact};
use serde_json::json;

fn sample() -> Vec<formdebug::Finding> {
    run(
        &json!({
            "metadata": {"version": "0.9"},
            "steps": [{"fields": [
                {"name": "zip", "type": "text", "validation": {"required": true},
                 "showIf": {"field": "country", "operator": "in", "value": ["US", "CA"]}},
                {"name": "country", "type": "select", "defaultValue": "FR"}
            ]}]
        }),
        Some(&json!({"versioning": {"currentVersion": "1.0.0"}})),
        Some(&json!({"states": [{"description": "nested", "values": {"z": {"b": 1, "a": [1, 2.5]}}}]})),
    )
}

#[test]
fn artifact_round_trips() {
    let findings = sample();
    assert!(!findings.is_empty());
    let json = serialize_findings(&findings).unwrap();
    assert_eq!(parse_findings(&json).unwrap(), findings);
}

#[test]
fn artifact_written_to_disk() {
    let findings = sample();
    let path = std::env::temp_dir().join(format!("formdebug-artifact-{}.json", std::process::id()));
    write_artifact(&path, &findings).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(parse_findings(&text).unwrap(), findings);
}

#[test]
fn unwritable_artifact_is_a_load_error() {
    let path = std::env::temp_dir()
        .join("formdebug-no-such-dir")
        .join("nested")
        .join("out.json");
    let err = write_artifact(&path, &[]).unwrap_err();
    assert!(matches!(err, LoadError::Write { .. }));
}
