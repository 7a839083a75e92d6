use super::common::{input, titles};
use formdebug::rules::{RequiredHidden, VersionBreak};
use formdebug::{DetectionRule, Engine, EngineOptions, Finding, RuleContext, RuleError, Severity};
use serde_json::json;

struct Panics;

impl DetectionRule for Panics {
    fn id(&self) -> &'static str {
        "panics"
    }
    fn title(&self) -> &'static str {
        "Panics on every state"
    }
    fn detect(&self, _: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        panic!("index out of range")
    }
}

struct Refuses;

impl DetectionRule for Refuses {
    fn id(&self) -> &'static str {
        "refuses"
    }
    fn title(&self) -> &'static str {
        "Returns an error"
    }
    fn detect(&self, _: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        Err(RuleError::new("refuses", "cannot evaluate"))
    }
}

fn engine() -> Engine {
    Engine::with_rules(
        vec![
            Box::new(Panics),
            Box::new(RequiredHidden),
            Box::new(Refuses),
            Box::new(VersionBreak),
        ],
        EngineOptions::default(),
    )
}

#[test]
fn failing_rules_do_not_stop_the_run() {
    let config = json!({
        "metadata": {"version": "1.0.0"},
        "steps": [{"fields": [
            {"name": "subscribe", "type": "checkbox"},
            {"name": "email", "type": "email", "validation": {"required": true},
             "showIf": {"field": "subscribe", "operator": "equals", "value": true}}
        ]}]
    });
    let invariants = json!({"versioning": {"currentVersion": "2.0.0"}});
    let states = json!({"states": [
        {"description": "one", "values": {"subscribe": false}},
        {"description": "two", "values": {"subscribe": true}}
    ]});

    let report = engine().run(&input(&config, Some(&invariants), Some(&states)));
    let titles = titles(&report.findings);

    assert_eq!(
        titles,
        vec![
            "Rule 'panics' failed",
            "Required field 'email' is hidden",
            "Rule 'refuses' failed",
            "Breaking version change 1.0.0 -> 2.0.0",
            "Rule 'panics' failed",
            "Rule 'refuses' failed",
            "Breaking version change 1.0.0 -> 2.0.0",
        ]
    );
    let failures: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.title.starts_with("Rule '"))
        .collect();
    assert!(failures.iter().all(|f| f.severity == Severity::Error));
    assert!(failures[0].explanation.contains("index out of range"));
    assert!(failures[1].explanation.contains("cannot evaluate"));
    assert_eq!(report.timings.len(), 8);
}
