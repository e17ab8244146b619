use super::common::*;
use ocrd_validators::enums::ParameterType;
use ocrd_validators::{OcrdNetworkMessageValidator, ParameterDecl, ParameterSpec};
use serde_json::{Value, json};

fn validator() -> OcrdNetworkMessageValidator {
    OcrdNetworkMessageValidator::builtin().expect("built-in schemas load")
}

fn submission() -> Value {
    json!({
        "kind": "job-submission",
        "job_id": "6f1c4f9e-0a42-4c5e-9b7e-3f5f0c1d2e3a",
        "processor_name": "ocrd-cis-ocropy-binarize",
        "created_time": 1709294400,
        "path_to_mets": "/data/ws/mets.xml",
        "input_file_grps": ["OCR-D-IMG"],
        "output_file_grps": ["OCR-D-BIN"],
        "page_id": "PHYS_0001,PHYS_0002",
        "parameters": {"level-of-operation": "page"},
        "result_queue_name": "ocrd-cis-ocropy-binarize-result",
        "callback_url": "https://client.example.org/jobs/done"
    })
}

fn result() -> Value {
    json!({
        "kind": "job-result",
        "job_id": "6f1c4f9e-0a42-4c5e-9b7e-3f5f0c1d2e3a",
        "state": "success",
        "path_to_mets": "/data/ws/mets.xml"
    })
}

fn with_page_id(page_id: &str) -> Value {
    let mut m = submission();
    m["page_id"] = json!(page_id);
    m
}

#[test]
fn valid_messages_are_clean() {
    assert_clean(&validator().validate(&submission()));
    assert_clean(&validator().validate(&result()));
}

#[test]
fn unknown_kind_of_a_clean_message_is_a_single_error() {
    let mut m = submission();
    m["kind"] = json!("job-cancel");
    let report = validator().validate(&m);
    assert_eq!(categories(&report), vec!["unknown-message-kind"]);
    assert_eq!(pointer(&report.issues()[0]), Some("/kind"));

    m.as_object_mut().unwrap().remove("kind");
    let report = validator().validate(&m);
    assert_eq!(categories(&report), vec!["unknown-message-kind"]);
    assert!(report.issues()[0].message.contains("nothing"));
}

#[test]
fn unknown_kind_still_runs_the_shared_checks() {
    let m = json!({"path_to_mets": "/ws/mets.xml", "callback_url": "ftp:/x"});
    let report = validator().validate(&m);
    assert_eq!(
        categories(&report),
        vec![
            "unknown-message-kind",
            "missing-correlation-id",
            "malformed-result-reference"
        ]
    );
    assert_eq!(pointer(&report.issues()[2]), Some("/callback_url"));
}

#[test]
fn kind_selects_the_schema() {
    // A result carries no processor_name; as a submission it is incomplete.
    let mut m = result();
    m["kind"] = json!("job-submission");
    let report = validator().validate(&m);
    assert!(!report.is_valid());
    assert_has(&report, "xsd:message-processing");

    let mut m = result();
    m["state"] = json!("exploded");
    let report = validator().validate(&m);
    let schema = assert_has(&report, "xsd:message-result");
    assert_eq!(pointer(&schema[0]), Some("/state"));
}

#[test]
fn job_id_is_required_and_non_blank() {
    for job_id in [json!(null), json!("   ")] {
        let mut m = result();
        if job_id.is_null() {
            m.as_object_mut().unwrap().remove("job_id");
        } else {
            m["job_id"] = job_id;
        }
        let report = validator().validate(&m);
        assert_eq!(categories(&report), vec!["missing-correlation-id"]);
        assert_eq!(pointer(&report.issues()[0]), Some("/job_id"));
    }
}

#[test]
fn result_references_must_be_well_formed() {
    let mut m = result();
    m["path_to_mets"] = json!("   ");
    let report = validator().validate(&m);
    assert_eq!(categories(&report), vec!["malformed-result-reference"]);
    assert_eq!(pointer(&report.issues()[0]), Some("/path_to_mets"));

    let mut m = submission();
    m["callback_url"] = json!("ftp://client.example.org/done");
    let report = validator().validate(&m);
    assert_eq!(categories(&report), vec!["malformed-result-reference"]);
    assert_eq!(pointer(&report.issues()[0]), Some("/callback_url"));

    let mut m = submission();
    m["callback_url"] = json!("client/done");
    assert_eq!(
        categories(&validator().validate(&m)),
        vec!["malformed-result-reference"]
    );
}

#[test]
fn remote_mets_reference_must_parse() {
    let mut m = submission();
    m["path_to_mets"] = json!("https://exa mple.org/mets.xml");
    let report = validator().validate(&m);
    assert_eq!(categories(&report), vec!["malformed-result-reference"]);

    m["path_to_mets"] = json!("https://example.org/ws/mets.xml");
    assert_clean(&validator().validate(&m));
}

#[test]
fn exactly_one_workspace_reference() {
    let mut both = submission();
    both["workspace_id"] = json!("ws-0001");
    let report = validator().validate(&both);
    assert_eq!(categories(&report), vec!["ambiguous-workspace-reference"]);
    assert!(pointer(&report.issues()[0]).is_none());

    let mut neither = submission();
    neither.as_object_mut().unwrap().remove("path_to_mets");
    assert_eq!(
        categories(&validator().validate(&neither)),
        vec!["ambiguous-workspace-reference"]
    );

    let mut by_id = neither.clone();
    by_id["workspace_id"] = json!("ws-0001");
    assert_clean(&validator().validate(&by_id));
}

#[test]
fn results_need_no_workspace_reference() {
    let mut m = result();
    m.as_object_mut().unwrap().remove("path_to_mets");
    assert_clean(&validator().validate(&m));
}

#[test]
fn page_id_ranges_and_patterns() {
    for ok in [
        "PHYS_0001",
        "PHYS_0001..PHYS_0005",
        "PHYS_0003..PHYS_0003",
        "//PHYS_00[0-9]+",
        "PHYS_0001,PHYS_0007..PHYS_0009,//^phys",
        "",
    ] {
        assert_clean(&validator().validate(&with_page_id(ok)));
    }
}

#[test]
fn bad_page_id_tokens() {
    for bad in [
        "PHYS_0005..PHYS_0001",
        "PHYS_0001..IMG_0002",
        "PHYS_A..PHYS_B",
        "//[unclosed",
        "1st page",
        "PHYS_0001,,PHYS_0002",
    ] {
        let report = validator().validate(&with_page_id(bad));
        assert_eq!(categories(&report), vec!["invalid-page-id"], "{}", bad);
        assert_eq!(pointer(&report.issues()[0]), Some("/page_id"));
    }
}

#[test]
fn every_bad_token_is_reported() {
    let report = validator().validate(&with_page_id("PHYS 1,PHYS_0001,//(,PHYS_0001"));
    assert_eq!(categories(&report), vec!["invalid-page-id", "invalid-page-id"]);
}

#[test]
fn parameters_are_checked_against_a_declared_spec() {
    let spec = ParameterSpec::new()
        .with(
            "level-of-operation",
            ParameterDecl::new(ParameterType::String)
                .with_allowed_values(vec![json!("page"), json!("region")])
                .with_default(json!("page")),
        )
        .with("threshold", ParameterDecl::new(ParameterType::Number).required());
    let v = validator().with_parameter_spec(spec);

    let mut m = submission();
    m["parameters"] = json!({"level-of-operation": "word", "threshold": 0.5});
    let report = v.validate(&m);
    assert_eq!(categories(&report), vec!["invalid-enum-value"]);
    assert_eq!(
        pointer(&report.issues()[0]),
        Some("/parameters/level-of-operation")
    );

    // Without parameters, required ones are missing.
    m.as_object_mut().unwrap().remove("parameters");
    let report = v.validate(&m);
    assert_eq!(categories(&report), vec!["missing-parameter"]);
    assert_eq!(pointer(&report.issues()[0]), Some("/parameters"));
}

#[test]
fn parameters_are_free_without_a_spec() {
    let mut m = submission();
    m["parameters"] = json!({"anything": [1, 2, 3]});
    assert_clean(&validator().validate(&m));
}

#[test]
fn yaml_message_is_accepted() {
    let yaml = r#"
kind: job-result
job_id: abc-123
state: failed
workspace_id: ws-0001
"#;
    assert_clean(&validator().validate_str(yaml));
}
