use formdebug::detect_cycles;
use formdebug::enums::{FieldType, Operator};
use formdebug::types::{Configuration, ConditionalRule, Dependency, FieldDefinition, Step};
use proptest::prelude::*;

fn chain(n: usize, back_edge: Option<usize>) -> Configuration {
    let fields = (0..n)
        .map(|i| {
            let mut field = FieldDefinition::new(format!("n{}", i), FieldType::Text);
            // n{i} depends on n{i+1}; the last node optionally closes a loop.
            let target = if i + 1 < n { Some(i + 1) } else { back_edge };
            if let Some(t) = target {
                if i % 2 == 0 {
                    field.show_if = Some(ConditionalRule::new(format!("n{}", t), Operator::IsEmpty, None));
                } else {
                    field.dependency = Some(Dependency {
                        parent: format!("n{}", t),
                        ..Dependency::default()
                    });
                }
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
    fn acyclic_chain_has_no_cycles(n in 1usize..12) {
        prop_assert!(detect_cycles(&chain(n, None)).is_empty());
    }

    #[test]
    fn back_edge_yields_one_cycle(n in 1usize..12, back in 0usize..12) {
        let back = back % n;
        let cycles = detect_cycles(&chain(n, Some(back)));
        prop_assert_eq!(cycles.len(), 1);
        let expected: Vec<String> = (back..n).map(|i| format!("n{}", i)).collect();
        prop_assert_eq!(&cycles[0], &expected);
    }
}
