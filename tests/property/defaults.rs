use ocrd_validators::enums::ParameterType;
use ocrd_validators::{ParameterDecl, ParameterSpec, ParameterValidator, apply_defaults};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

/// Strategy for a spec of distinct names, each optionally carrying a
/// conforming integer default.
fn arb_spec() -> impl Strategy<Value = ParameterSpec> {
    prop::collection::btree_map("[a-z][a-z_]{0,6}", prop::option::of(-1000i64..1000), 0..6).prop_map(
        |decls| {
            let mut spec = ParameterSpec::new();
            for (name, default) in decls {
                let mut decl = ParameterDecl::new(ParameterType::Integer);
                if let Some(d) = default {
                    decl = decl.with_default(json!(d));
                }
                spec.insert(name, decl);
            }
            spec
        },
    )
}

fn arb_values() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z][a-z_]{0,6}", -1000i64..1000, 0..6)
        .prop_map(|m| m.into_iter().map(|(k, v)| (k, json!(v))).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn applying_defaults_is_idempotent(spec in arb_spec(), values in arb_values()) {
        let once = apply_defaults(values, &spec);
        let twice = apply_defaults(once.clone(), &spec);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn present_values_survive(spec in arb_spec(), values in arb_values()) {
        let filled = apply_defaults(values.clone(), &spec);
        for (k, v) in &values {
            prop_assert_eq!(filled.get(k), Some(v));
        }
        for (name, decl) in spec.iter() {
            if !values.contains_key(name) {
                prop_assert_eq!(filled.get(name), decl.default.as_ref());
            }
        }
    }

    #[test]
    fn conforming_defaults_validate_clean(spec in arb_spec()) {
        let filled = apply_defaults(Map::new(), &spec);
        let report = ParameterValidator::new(spec).validate(&filled);
        prop_assert!(report.is_empty(), "{}", report);
    }
}
