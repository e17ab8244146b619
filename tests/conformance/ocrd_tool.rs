use super::common::*;
use ocrd_validators::{IssueClass, OcrdToolValidator};
use serde_json::{Value, json};

fn validator() -> OcrdToolValidator {
    OcrdToolValidator::builtin().expect("built-in schemas load")
}

fn manifest() -> Value {
    json!({
        "version": "0.1.0",
        "git_url": "https://github.com/example/ocrd_example",
        "tools": {
            "ocrd-example-binarize": {
                "executable": "ocrd-example-binarize",
                "description": "Binarize page images",
                "categories": ["Image preprocessing"],
                "steps": ["preprocessing/optimization"],
                "input_file_grp": ["OCR-D-IMG"],
                "output_file_grp": ["OCR-D-BIN"],
                "parameters": {
                    "method": {
                        "type": "string",
                        "enum": ["sauvola", "otsu"],
                        "default": "sauvola",
                        "description": "Thresholding method"
                    },
                    "k": {
                        "type": "number",
                        "format": "float",
                        "default": 0.34,
                        "minimum": 0,
                        "maximum": 1,
                        "description": "Sauvola k"
                    }
                }
            },
            "ocrd-example-segment": {
                "executable": "ocrd-example-segment",
                "description": "Segment regions",
                "parameters": {}
            }
        }
    })
}

#[test]
fn valid_manifest_has_no_issues() {
    assert_clean(&validator().validate(&manifest()));
}

#[test]
fn schema_violation_carries_instance_pointer() {
    let mut m = manifest();
    m["tools"]["ocrd-example-segment"]
        .as_object_mut()
        .unwrap()
        .remove("description");
    let report = validator().validate(&m);
    let issues = assert_has(&report, "xsd:ocrd-tool");
    assert_eq!(pointer(&issues[0]), Some("/tools/ocrd-example-segment"));
}

#[test]
fn structural_category_names_the_schema() {
    let report = validator().validate(&json!({"version": "1.0.0", "tools": 5}));
    let issues = assert_has(&report, "xsd:ocrd-tool");
    assert_eq!(pointer(&issues[0]), Some("/tools"));
    assert!(report.errors().all(|i| i.class() == IssueClass::Structural));
}

#[test]
fn executable_pattern_is_enforced() {
    let mut m = manifest();
    m["tools"]["ocrd-example-segment"]["executable"] = json!("Segment Tool");
    let report = validator().validate(&m);
    let issues = assert_has(&report, "xsd:ocrd-tool");
    assert_eq!(
        pointer(&issues[0]),
        Some("/tools/ocrd-example-segment/executable")
    );
}

#[test]
fn self_inconsistent_default_is_reported_at_the_default() {
    let mut m = manifest();
    m["tools"]["ocrd-example-binarize"]["parameters"]["method"]["default"] = json!("niblack");
    let report = validator().validate(&m);
    assert_eq!(categories(&report), vec!["invalid-enum-value"]);
    assert_eq!(
        pointer(&report.issues()[0]),
        Some("/tools/ocrd-example-binarize/parameters/method/default")
    );
}

#[test]
fn default_out_of_declared_range() {
    let mut m = manifest();
    m["tools"]["ocrd-example-binarize"]["parameters"]["k"]["default"] = json!(2.5);
    let report = validator().validate(&m);
    assert_eq!(categories(&report), vec!["out-of-range"]);
}

#[test]
fn duplicate_executable_is_reported_once() {
    let mut m = manifest();
    m["tools"]["ocrd-example-segment"]["executable"] = json!("ocrd-example-binarize");
    let report = validator().validate(&m);
    let dups = assert_has(&report, "duplicate-executable");
    assert_eq!(dups.len(), 1);
    assert_eq!(
        pointer(&dups[0]),
        Some("/tools/ocrd-example-segment/executable")
    );
    // The key no longer matches its executable either.
    assert_has(&report, "executable-key-mismatch");
}

#[test]
fn key_mismatch_is_only_a_warning() {
    let mut m = manifest();
    let tools = m["tools"].as_object_mut().unwrap();
    let tool = tools.remove("ocrd-example-segment").unwrap();
    tools.insert("segment".to_string(), tool);
    let report = validator().validate(&m);
    assert!(report.is_valid(), "{}", report);
    assert_eq!(categories(&report), vec!["executable-key-mismatch"]);
}

#[test]
fn yaml_manifest_is_accepted() {
    let yaml = r#"
version: 1.2.3
tools:
  ocrd-example-segment:
    executable: ocrd-example-segment
    description: Segment regions
    parameters:
      level:
        type: string
        enum: [region, line]
        default: region
        description: Granularity
"#;
    assert_clean(&validator().validate_str(yaml));
}

#[test]
fn unparseable_manifest_is_a_parse_error() {
    let report = validator().validate_str("{\"version\": \"1.0.0\", \"tools\": ");
    assert_eq!(categories(&report), vec!["parse-error"]);
    assert!(report.issues()[0].location.as_ref().unwrap().line.is_some());
}

#[test]
fn non_mapping_root_is_a_parse_error() {
    let report = validator().validate_str("- ocrd-example-segment\n");
    assert_eq!(categories(&report), vec!["parse-error"]);
}
