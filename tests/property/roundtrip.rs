use formdebug::enums::Severity;
use formdebug::types::ValueMap;
use formdebug::{Finding, parse_findings, serialize_findings};
use proptest::prelude::*;
use serde_json::{Value, json};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "\\PC{0,12}".prop_map(Value::String),
    ]
}

fn reproducer() -> impl Strategy<Value = ValueMap> {
    prop::collection::vec(("[a-zA-Z_]{1,6}", scalar()), 0..5).prop_map(|pairs| pairs.into_iter().collect())
}

fn finding() -> impl Strategy<Value = Finding> {
    (
        prop_oneof![Just(Severity::Error), Just(Severity::Warning), Just(Severity::Info)],
        "\\PC{1,30}",
        "\\PC{0,60}",
        prop::collection::vec("steps\\[[0-9]\\]\\.fields\\[[0-9]\\]", 0..3),
        reproducer(),
        prop::collection::vec("\\PC{1,40}", 0..3),
    )
        .prop_map(|(severity, title, explanation, paths, state, fixes)| {
            let mut f = Finding::new(severity, title).explain(explanation).reproducer(&state);
            for p in paths {
                f = f.at(p);
            }
            for fix in fixes {
                f = f.fix(fix);
            }
            f
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn artifact_round_trip(findings in prop::collection::vec(finding(), 0..6)) {
        let json = serialize_findings(&findings).unwrap();
        let parsed = parse_findings(&json).unwrap();
        prop_assert_eq!(parsed, findings);
    }
}
