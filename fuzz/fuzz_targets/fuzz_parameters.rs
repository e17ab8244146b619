#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use ocrd_validators::enums::ParameterType;
use ocrd_validators::{ParameterDecl, ParameterSpec, ParameterValidator, apply_defaults};
use serde_json::{Map, Value};

const NAMES: &[&str] = &["level", "dpi", "model", "threshold", "debug"];

/// Generate a simple arbitrary JSON value from fuzzer bytes.
fn arbitrary_value(u: &mut Unstructured<'_>) -> arbitrary::Result<Value> {
    match u.int_in_range(0..=5)? {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(bool::arbitrary(u)?)),
        2 => Ok(Value::from(i64::arbitrary(u)?)),
        3 => {
            let n = f64::arbitrary(u)?;
            Ok(serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        4 => Ok(Value::String(String::arbitrary(u)?)),
        _ => Ok(Value::Array(vec![])),
    }
}

fn arbitrary_type(u: &mut Unstructured<'_>) -> arbitrary::Result<ParameterType> {
    Ok(match u.int_in_range(0..=5)? {
        0 => ParameterType::String,
        1 => ParameterType::Integer,
        2 => ParameterType::Number,
        3 => ParameterType::Boolean,
        4 => ParameterType::Object,
        _ => ParameterType::Array,
    })
}

fn arbitrary_spec(u: &mut Unstructured<'_>) -> arbitrary::Result<ParameterSpec> {
    let mut spec = ParameterSpec::new();
    for name in NAMES {
        if !bool::arbitrary(u)? {
            continue;
        }
        let mut decl = ParameterDecl::new(arbitrary_type(u)?);
        if bool::arbitrary(u)? {
            decl = decl.with_default(arbitrary_value(u)?);
        }
        if bool::arbitrary(u)? {
            decl = decl.with_allowed_values(vec![arbitrary_value(u)?, arbitrary_value(u)?]);
        }
        if bool::arbitrary(u)? {
            decl = decl.with_range(Option::<f64>::arbitrary(u)?, Option::<f64>::arbitrary(u)?);
        }
        if bool::arbitrary(u)? {
            decl = decl.required();
        }
        spec.insert(*name, decl);
    }
    Ok(spec)
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(spec) = arbitrary_spec(&mut u) else {
        return;
    };
    let mut values = Map::new();
    for name in NAMES {
        match bool::arbitrary(&mut u) {
            Ok(true) => {
                let Ok(v) = arbitrary_value(&mut u) else {
                    return;
                };
                values.insert(name.to_string(), v);
            }
            Ok(false) => {}
            Err(_) => return,
        }
    }

    let validator = ParameterValidator::new(spec.clone());
    let _ = validator.validate(&values);
    let _ = validator.check_defaults();

    let once = apply_defaults(values, &spec);
    let twice = apply_defaults(once.clone(), &spec);
    assert_eq!(once, twice, "apply_defaults must be idempotent");
});
