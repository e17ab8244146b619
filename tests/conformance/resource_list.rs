use super::common::*;
use ocrd_validators::digest;
use ocrd_validators::enums::DigestAlgorithm;
use ocrd_validators::{OcrdResourceListValidator, ResourceDescriptor};
use serde_json::json;
use std::collections::HashMap;

fn validator() -> OcrdResourceListValidator {
    OcrdResourceListValidator::builtin().expect("built-in schemas load")
}

fn resources() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor::new("default-2021-03-09", "https://example.org/models/default.zip"),
        ResourceDescriptor::new("fraktur.traineddata", "https://example.org/models/frak.traineddata"),
    ]
}

#[test]
fn unique_well_formed_list_is_valid() {
    assert_clean(&validator().validate(&resources()));
}

#[test]
fn duplicate_name_is_exactly_one_error() {
    let mut list = resources();
    list.push(ResourceDescriptor::new("fraktur.traineddata", "https://mirror.example.org/frak"));
    let report = validator().validate(&list);
    assert_eq!(categories(&report), vec!["duplicate-resource-name"]);
    assert_eq!(pointer(&report.issues()[0]), Some("/2/name"));
}

#[test]
fn every_repeat_after_the_first_is_reported() {
    let list = vec![
        ResourceDescriptor::new("a", "https://example.org/a"),
        ResourceDescriptor::new("a", "https://example.org/a2"),
        ResourceDescriptor::new("a", "https://example.org/a3"),
    ];
    let report = validator().validate(&list);
    let dups = assert_has(&report, "duplicate-resource-name");
    let pointers: Vec<_> = dups.iter().map(pointer).collect();
    assert_eq!(pointers, vec![Some("/1/name"), Some("/2/name")]);
}

#[test]
fn missing_and_malformed_urls() {
    let mut empty = ResourceDescriptor::new("empty", "");
    empty.url = Some("   ".to_string());
    let mut absent = ResourceDescriptor::new("absent", "");
    absent.url = None;
    let malformed = ResourceDescriptor::new("malformed", "not a url");
    let report = validator().validate(&[empty, absent, malformed]);
    assert_eq!(
        categories(&report),
        vec!["missing-url", "missing-url", "invalid-url"]
    );
}

#[test]
fn declared_checksum_without_content_is_unverified() {
    let mut res = ResourceDescriptor::new("model", "https://example.org/model");
    res.checksum = Some(format!("sha256:{}", "a".repeat(64)));
    let report = validator().validate(&[res]);
    assert!(report.is_valid());
    assert_eq!(categories(&report), vec!["checksum-unverified"]);
}

#[test]
fn checksum_is_verified_against_supplied_content() {
    let bytes = b"model weights".to_vec();
    let mut good = ResourceDescriptor::new("good", "https://example.org/good");
    good.checksum = Some(format!("sha256:{}", digest::compute(DigestAlgorithm::Sha256, &bytes)));
    good.size = Some(bytes.len() as u64);
    let mut bad = ResourceDescriptor::new("bad", "https://example.org/bad");
    bad.checksum = good.checksum.clone();

    let contents = HashMap::from([
        ("good".to_string(), bytes.clone()),
        ("bad".to_string(), b"tampered".to_vec()),
    ]);
    let report = validator().validate_with_content(&[good, bad], &contents);
    assert_eq!(categories(&report), vec!["checksum-mismatch"]);
    assert_eq!(pointer(&report.issues()[0]), Some("/1/checksum"));
}

#[test]
fn bare_sha512_hex_is_accepted() {
    let bytes = b"dictionary".to_vec();
    let mut res = ResourceDescriptor::new("dict", "https://example.org/dict");
    res.checksum = Some(digest::compute(DigestAlgorithm::Sha512, &bytes));
    let contents = HashMap::from([("dict".to_string(), bytes)]);
    assert_clean(&validator().validate_with_content(&[res], &contents));
}

#[test]
fn malformed_checksum_declaration() {
    let mut res = ResourceDescriptor::new("model", "https://example.org/model");
    res.checksum = Some("md5:abc".to_string());
    let report = validator().validate(&[res]);
    assert_eq!(categories(&report), vec!["invalid-checksum"]);
}

#[test]
fn size_mismatch_with_supplied_content() {
    let mut res = ResourceDescriptor::new("model", "https://example.org/model");
    res.size = Some(1024);
    let contents = HashMap::from([("model".to_string(), vec![0u8; 10])]);
    let report = validator().validate_with_content(&[res], &contents);
    assert_eq!(categories(&report), vec!["size-mismatch"]);
}

#[test]
fn value_entry_point_runs_schema_first() {
    let list = json!([
        {"name": "a", "url": "https://example.org/a", "type": "archive", "path_in_archive": "a/model"},
        {"name": "b", "url": "https://example.org/b", "colour": "blue"}
    ]);
    let report = validator().validate_value(&list);
    assert!(!report.is_valid());
    assert_eq!(report.issues()[0].category, "xsd:resource-list");
}

#[test]
fn value_entry_point_keeps_list_indexes() {
    let list = json!([
        {"name": "a", "url": "https://example.org/a"},
        {"name": "a", "url": "https://example.org/a2"}
    ]);
    let report = validator().validate_value(&list);
    assert_eq!(categories(&report), vec!["duplicate-resource-name"]);
    assert_eq!(pointer(&report.issues()[0]), Some("/1/name"));
}

#[test]
fn per_executable_lists_are_checked_separately() {
    let yaml = r#"
ocrd-tesserocr-recognize:
  - name: eng.traineddata
    url: https://example.org/eng.traineddata
  - name: eng.traineddata
    url: https://example.org/eng2.traineddata
ocrd-calamari-recognize:
  - name: eng.traineddata
    url: https://example.org/calamari-eng.zip
    type: archive
"#;
    let report = validator().validate_str(yaml);
    assert_eq!(categories(&report), vec!["duplicate-resource-name"]);
    assert_eq!(
        pointer(&report.issues()[0]),
        Some("/ocrd-tesserocr-recognize/1/name")
    );
}
