use formdebug::condition::{apply_operator, evaluate};
use formdebug::enums::Operator;
use formdebug::types::{ConditionalRule, ValueMap};
use proptest::prelude::*;
use serde_json::{Value, json};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,3}", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Equals),
        Just(Operator::NotEquals),
        Just(Operator::Contains),
        Just(Operator::NotContains),
        Just(Operator::GreaterThan),
        Just(Operator::LessThan),
        Just(Operator::GreaterThanOrEqual),
        Just(Operator::LessThanOrEqual),
        Just(Operator::IsEmpty),
        Just(Operator::IsNotEmpty),
        Just(Operator::In),
        Just(Operator::NotIn),
        "[a-z]{3,8}".prop_map(|s| Operator::from_name(&format!("x{}", s))),
    ]
}

fn rule() -> impl Strategy<Value = ConditionalRule> {
    let base = (
        "[a-c]",
        operator(),
        prop::option::of(json_value()),
    )
        .prop_map(|(field, op, value)| ConditionalRule::new(field, op, value));
    base.prop_recursive(2, 8, 3, |inner| {
        (
            inner.clone(),
            prop::option::of(prop::collection::vec(inner.clone(), 0..3)),
            prop::option::of(prop::collection::vec(inner, 0..3)),
        )
            .prop_map(|(mut rule, and, or)| {
                rule.and = and;
                rule.or = or;
                rule
            })
    })
}

fn values() -> impl Strategy<Value = ValueMap> {
    prop::collection::btree_map("[a-c]", json_value(), 0..3)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Any rule over any value map yields a boolean without panicking.
    #[test]
    fn evaluation_is_total(rule in rule(), values in values()) {
        let _ = evaluate(&rule, &values);
    }

    // Paired operators are exact complements, including for absent values.
    #[test]
    fn negated_pairs_are_complements(
        actual in prop::option::of(json_value()),
        expected in prop::option::of(json_value()),
        op in prop_oneof![
            Just(Operator::Equals),
            Just(Operator::Contains),
            Just(Operator::IsEmpty),
            Just(Operator::In),
        ],
    ) {
        let negated = op.negated().unwrap();
        prop_assert_eq!(
            apply_operator(&op, actual.as_ref(), expected.as_ref()),
            !apply_operator(&negated, actual.as_ref(), expected.as_ref())
        );
    }

    // Ordering on NaN operands is always false.
    #[test]
    fn ordering_against_text_is_false(s in "[a-z]{1,8}", n in any::<i32>()) {
        let text = json!(s);
        let num = json!(n);
        for op in [Operator::GreaterThan, Operator::LessThan, Operator::GreaterThanOrEqual, Operator::LessThanOrEqual] {
            prop_assert!(!apply_operator(&op, Some(&text), Some(&num)));
            prop_assert!(!apply_operator(&op, Some(&num), Some(&text)));
        }
    }

    // An empty `or` list never turns a false base true; an empty `and` never turns a true base false.
    #[test]
    fn empty_sub_lists_keep_the_base(rule in rule(), values in values()) {
        let base = ConditionalRule { and: None, or: None, ..rule };
        let expected = evaluate(&base, &values);
        let with_empty = ConditionalRule { and: Some(Vec::new()), or: Some(Vec::new()), ..base };
        prop_assert_eq!(evaluate(&with_empty, &values), expected);
    }
}
