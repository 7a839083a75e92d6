use formdebug::enums::{FieldType, Operator};
use formdebug::simulate::simulate;
use formdebug::types::{Configuration, ConditionalRule, FieldDefinition, Step, ValueMap};
use proptest::prelude::*;
use serde_json::json;

/// Fields f0..fn; every odd field is shown only when its predecessor is non-empty.
fn configuration(n: usize, defaults: &[Option<i64>]) -> Configuration {
    let fields = (0..n)
        .map(|i| {
            let mut field = FieldDefinition::new(format!("f{}", i), FieldType::Number);
            field.default_value = defaults.get(i).copied().flatten().map(|d| json!(d));
            if i % 2 == 1 {
                field.show_if = Some(ConditionalRule::new(
                    format!("f{}", i - 1),
                    Operator::IsNotEmpty,
                    None,
                ));
            }
            field
        })
        .collect();
    Configuration {
        steps: vec![Step {
            fields,
            ..Step::default()
        }],
        ..Configuration::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn candidates_win_over_defaults(
        n in 1usize..8,
        defaults in prop::collection::vec(prop::option::of(any::<i64>()), 8),
        candidates in prop::collection::btree_map(0usize..8, any::<i64>(), 0..8),
    ) {
        let config = configuration(n, &defaults);
        let values: ValueMap = candidates
            .iter()
            .map(|(i, v)| (format!("f{}", i), json!(v)))
            .collect();
        let state = simulate(&config, &values);

        for i in 0..n {
            let name = format!("f{}", i);
            let expected = values
                .get(&name)
                .cloned()
                .or_else(|| defaults[i].map(|d| json!(d)));
            prop_assert_eq!(state.values.get(&name).cloned(), expected);
            prop_assert!(state.visibility.contains_key(&name));
            if i % 2 == 0 {
                prop_assert!(state.is_visible(&name));
            } else {
                let gate = format!("f{}", i - 1);
                prop_assert_eq!(state.is_visible(&name), state.values.contains_key(&gate));
            }
        }
    }

    #[test]
    fn simulation_is_deterministic(
        n in 1usize..8,
        defaults in prop::collection::vec(prop::option::of(any::<i64>()), 8),
    ) {
        let config = configuration(n, &defaults);
        prop_assert_eq!(simulate(&config, &ValueMap::new()), simulate(&config, &ValueMap::new()));
    }
}
