use super::common::{count, run};
use formdebug::{Finding, Severity};
use serde_json::Value;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    std::env::var("FORMDEBUG_FIXTURES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

/// A single scenario from the suite.
#[derive(Debug, serde::Deserialize)]
struct TestCase {
    id: String,
    name: String,
    configuration: Value,
    #[serde(default)]
    invariants: Option<Value>,
    #[serde(default)]
    states: Option<Value>,
    /// Needs CEL expression support.
    #[serde(default)]
    cel: bool,
    expected: Expected,
}

#[derive(Debug, serde::Deserialize)]
struct Expected {
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    errors: Option<usize>,
    #[serde(default)]
    warnings: Option<usize>,
    #[serde(default)]
    infos: Option<usize>,
    #[serde(default)]
    findings: Vec<ExpectedFinding>,
}

#[derive(Debug, serde::Deserialize)]
struct ExpectedFinding {
    severity: Severity,
    title: String,
    #[serde(default)]
    path: Option<String>,
}

fn check_count(case: &TestCase, what: &str, expected: Option<usize>, actual: usize) -> bool {
    match expected {
        Some(n) if n != actual => {
            eprintln!(
                "  FAIL [{}] {}: expected {} {}, got {}",
                case.id, case.name, n, what, actual
            );
            false
        }
        _ => true,
    }
}

fn dump(findings: &[Finding]) {
    for f in findings {
        eprintln!("      - [{}] {} at {:?}", f.severity, f.title, f.json_paths);
    }
}

#[test]
fn scenario_suite() {
    let suite_path = fixtures_dir().join("suite.yaml");
    assert!(suite_path.exists(), "Fixture suite not found: {:?}", suite_path);

    let content = std::fs::read_to_string(&suite_path).unwrap();
    let cases: Vec<TestCase> = serde_saphyr::from_str(&content).unwrap();
    assert!(!cases.is_empty());

    let mut failed = 0;
    let mut skipped = 0;
    for case in &cases {
        #[cfg(not(feature = "cel-eval"))]
        if case.cel {
            eprintln!("  SKIP [{}] {}: cel-eval feature disabled", case.id, case.name);
            skipped += 1;
            continue;
        }

        let findings = run(
            &case.configuration,
            case.invariants.as_ref(),
            case.states.as_ref(),
        );

        let mut ok = check_count(case, "findings", case.expected.total, findings.len());
        ok &= check_count(case, "errors", case.expected.errors, count(&findings, Severity::Error));
        ok &= check_count(case, "warnings", case.expected.warnings, count(&findings, Severity::Warning));
        ok &= check_count(case, "infos", case.expected.infos, count(&findings, Severity::Info));

        for expected in &case.expected.findings {
            let found = findings.iter().any(|f| {
                f.severity == expected.severity
                    && f.title == expected.title
                    && expected
                        .path
                        .as_ref()
                        .is_none_or(|p| f.json_paths.contains(p))
            });
            if !found {
                eprintln!(
                    "  FAIL [{}] {}: expected [{}] {} at {:?}",
                    case.id, case.name, expected.severity, expected.title, expected.path
                );
                ok = false;
            }
        }

        if !ok {
            eprintln!("    Actual findings:");
            dump(&findings);
            failed += 1;
        }
    }

    eprintln!(
        "Scenario suite: {} cases, {} failed, {} skipped",
        cases.len(),
        failed,
        skipped
    );
    assert_eq!(failed, 0, "{} scenario(s) failed", failed);
}
