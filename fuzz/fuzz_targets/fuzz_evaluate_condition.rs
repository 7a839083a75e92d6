#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use formdebug::condition::evaluate;
use formdebug::enums::Operator;
use formdebug::types::{ConditionalRule, ValueMap};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

const FIELDS: [&str; 3] = ["a", "b", "c"];

fn arbitrary_operator(u: &mut Unstructured<'_>) -> arbitrary::Result<Operator> {
    Ok(match u.int_in_range(0..=12)? {
        0 => Operator::Equals,
        1 => Operator::NotEquals,
        2 => Operator::Contains,
        3 => Operator::NotContains,
        4 => Operator::GreaterThan,
        5 => Operator::LessThan,
        6 => Operator::GreaterThanOrEqual,
        7 => Operator::LessThanOrEqual,
        8 => Operator::IsEmpty,
        9 => Operator::IsNotEmpty,
        10 => Operator::In,
        11 => Operator::NotIn,
        _ => Operator::from_name(&String::arbitrary(u)?),
    })
}

/// Generate a small arbitrary JSON value from fuzzer bytes.
fn arbitrary_value(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<Value> {
    match u.int_in_range(0..=5)? {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(bool::arbitrary(u)?)),
        2 => {
            let n = f64::arbitrary(u)?;
            Ok(serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        3 => Ok(Value::String(String::arbitrary(u)?)),
        4 if depth < 2 => {
            let len = u.int_in_range(0..=3)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(arbitrary_value(u, depth + 1)?);
            }
            Ok(Value::Array(items))
        }
        _ => Ok(Value::Null),
    }
}

fn arbitrary_rule(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<ConditionalRule> {
    let field = FIELDS[u.int_in_range(0..=2)?];
    let operator = arbitrary_operator(u)?;
    let value = if bool::arbitrary(u)? {
        Some(arbitrary_value(u, 0)?)
    } else {
        None
    };
    let mut rule = ConditionalRule::new(field, operator, value);
    if depth < 2 {
        for slot in [&mut rule.and, &mut rule.or] {
            if bool::arbitrary(u)? {
                let len = u.int_in_range(0..=2)?;
                let mut subs = Vec::with_capacity(len);
                for _ in 0..len {
                    subs.push(arbitrary_rule(u, depth + 1)?);
                }
                *slot = Some(subs);
            }
        }
    }
    Ok(rule)
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    let rule = match arbitrary_rule(&mut u, 0) {
        Ok(r) => r,
        Err(_) => return,
    };

    let mut values = ValueMap::new();
    for name in FIELDS {
        match bool::arbitrary(&mut u) {
            Ok(true) => {
                if let Ok(v) = arbitrary_value(&mut u, 0) {
                    values.insert(name.to_string(), v);
                }
            }
            Ok(false) => {}
            Err(_) => break,
        }
    }

    let _ = evaluate(&rule, &values);
});
