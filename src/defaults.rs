use crate::types::ParameterSpec;
use serde_json::{Map, Value};

/// Fill in every declared default whose key is absent from `values`.
///
/// Present keys are never touched, even when they do not conform to the
/// spec, and unknown keys are kept. This is idempotent:
/// `apply_defaults(apply_defaults(v, s), s) == apply_defaults(v, s)`.
pub fn apply_defaults(mut values: Map<String, Value>, spec: &ParameterSpec) -> Map<String, Value> {
    for (name, decl) in spec.iter() {
        if values.contains_key(name) {
            continue;
        }
        if let Some(default) = &decl.default {
            values.insert(name.to_string(), default.clone());
        }
    }
    values
}
