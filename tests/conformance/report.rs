use super::common::*;
use ocrd_validators::enums::ParameterType;
use ocrd_validators::serialize::{to_json, to_xml, to_yaml};
use ocrd_validators::xml;
use ocrd_validators::{
    Artifact, ArtifactKind, Bag, Issue, IssueClass, Location, OcrdNetworkMessageValidator,
    OcrdResourceListValidator, OcrdToolValidator, OcrdZipValidator, PageDocument,
    PageValidationOptions, ParameterDecl, ParameterSpec, ProcessingServerConfigValidator, Report,
    WorkspaceValidationOptions, WorkspaceValidator, XsdMetsValidator, XsdPageValidator,
    ZipValidationOptions, validate_artifact,
};
use serde_json::json;

fn sample() -> Report {
    Report::from_issues(vec![
        Issue::error("xsd:mets", "missing required attribute 'LOCTYPE' on element 'FLocat'").at(12, 9),
        Issue::warning("unknown-parameter", "unknown parameter 'dpi'").at_pointer("/dpi"),
    ])
}

#[test]
fn validity_follows_errors_only() {
    assert!(Report::new().is_valid());
    assert!(Report::single(Issue::warning("file-group-naming", "x")).is_valid());
    assert!(!sample().is_valid());
    assert_eq!(sample().errors().count(), 1);
    assert_eq!(sample().warnings().count(), 1);
}

#[test]
fn json_shape_is_valid_plus_issues() {
    let text = to_json(&sample()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value,
        json!({
            "valid": false,
            "issues": [
                {
                    "severity": "error",
                    "category": "xsd:mets",
                    "location": {"line": 12, "column": 9},
                    "message": "missing required attribute 'LOCTYPE' on element 'FLocat'"
                },
                {
                    "severity": "warning",
                    "category": "unknown-parameter",
                    "location": {"pointer": "/dpi"},
                    "message": "unknown parameter 'dpi'"
                }
            ]
        })
    );
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["valid", "issues"]);

    let back: Report = serde_json::from_str(&text).unwrap();
    assert_eq!(back, sample());
}

#[test]
fn yaml_carries_the_same_shape() {
    let text = to_yaml(&sample()).unwrap();
    let value: serde_json::Value = serde_saphyr::from_str(&text).unwrap();
    assert_eq!(value["valid"], json!(false));
    assert_eq!(value["issues"][1]["location"]["pointer"], json!("/dpi"));
    assert!(text.find("valid").unwrap() < text.find("issues").unwrap());
}

#[test]
fn xml_rendering_escapes_and_locates() {
    let report = Report::single(
        Issue::error("inconsistent-text", "line text 'a<b' differs from words 'a & b'")
            .with_location(Location {
                file: Some("OCR-D-OCR_0001".to_string()),
                line: Some(7),
                column: Some(3),
                pointer: None,
            }),
    );
    let text = to_xml(&report);
    assert!(text.starts_with(r#"<report valid="false">"#));
    assert!(text.contains(
        r#"<error category="inconsistent-text" file="OCR-D-OCR_0001" line="7" column="3">"#
    ));
    assert!(text.contains("a&lt;b"));
    assert!(text.contains("a &amp; b"));
    assert!(text.trim_end().ends_with("</report>"));

    // The rendering is itself well-formed.
    let doc = xml::parse_str(&text).unwrap();
    assert_eq!(doc.root.local_name, "report");
    assert_eq!(doc.root.children.len(), 1);
}

#[test]
fn merge_keeps_order() {
    let a = Report::single(Issue::error("a", "first"));
    let b = Report::from_issues(vec![Issue::warning("b", "second"), Issue::error("c", "third")]);
    let merged = a.merge(b);
    assert_eq!(categories(&merged), vec!["a", "b", "c"]);
}

#[test]
fn combinators_rewrite_every_issue() {
    let prefixed = sample().with_category_prefix("workspace");
    assert_eq!(categories(&prefixed), vec!["workspace:xsd:mets", "workspace:unknown-parameter"]);

    let rerooted = sample().with_pointer_prefix("/parameters");
    let pointers: Vec<_> = rerooted.issues().iter().map(pointer).collect();
    assert_eq!(pointers, vec![Some("/parameters"), Some("/parameters/dpi")]);

    let tagged = sample()
        .with_file("OCR-D-SEG_0001")
        .with_file("ignored");
    assert!(tagged
        .issues()
        .iter()
        .all(|i| i.location.as_ref().unwrap().file.as_deref() == Some("OCR-D-SEG_0001")));
    assert_eq!(tagged.issues()[0].location.as_ref().unwrap().line, Some(12));
}

#[test]
fn issue_classes() {
    let class = |category: &str| Issue::error(category, "m").class();
    assert_eq!(class("xsd:page"), IssueClass::Structural);
    assert_eq!(class("workspace:parse-error"), IssueClass::Structural);
    assert_eq!(class("xsd:ocrd-tool"), IssueClass::Structural);
    assert_eq!(class("dangling-reading-order-ref"), IssueClass::Semantic);
    assert_eq!(class("workspace:bag-checksum-mismatch"), IssueClass::Semantic);
    assert_eq!(class("schema-mismatch"), IssueClass::Semantic);
    assert_eq!(Issue::warning("xsd:ocrd-tool", "m").class(), IssueClass::Advisory);
}

#[test]
fn display_lists_every_issue() {
    let text = sample().to_string();
    assert!(text.starts_with("invalid (1 error(s), 1 warning(s))"));
    assert!(text.contains("[error] xsd:mets at 12:9: missing required attribute"));
    assert!(text.contains("[warning] unknown-parameter at /dpi:"));
}

// ─── Dispatch ───────────────────────────────────────────────────────────────

#[test]
fn artifact_kind_names_round_trip() {
    for kind in ArtifactKind::ALL {
        assert_eq!(kind.to_string().parse::<ArtifactKind>(), Ok(kind));
    }
    assert_eq!("zip-bag".parse::<ArtifactKind>(), Ok(ArtifactKind::ZipBag));
    assert!("pdf".parse::<ArtifactKind>().unwrap_err().contains("pdf"));
}

#[test]
fn dispatch_reaches_every_validator() {
    let mets = xml::parse_str(&mets_xml()).unwrap();
    let page_doc = xml::parse_str(&page_xml()).unwrap();
    let page = PageDocument::from_xml(&page_doc);
    let page_options = PageValidationOptions::default();
    let spec = ParameterSpec::new().with("dpi", ParameterDecl::new(ParameterType::Integer));
    let values = json!({"dpi": "high"}).as_object().unwrap().clone();
    let manifest = json!({
        "version": "1.0.0",
        "tools": {"ocrd-dummy": {"executable": "ocrd-dummy", "description": "Copy input to output"}}
    });
    let resources = json!([{"name": "a", "url": "https://example.org/a"}]);
    let ws = workspace(&mets_xml(), &page_xml());
    let ws_options = WorkspaceValidationOptions::default();
    let bag = Bag::from_entries(workspace_payload(&mets_xml(), &page_xml()));
    let zip_options = ZipValidationOptions::default();
    let config = json!({"process_queue": {}});
    let message = json!({"kind": "job-result", "job_id": "j", "state": "queued"});

    let cases = [
        (Artifact::MetsXsd(&mets), true),
        (Artifact::PageXsd(&page_doc), true),
        (Artifact::PageSemantic { page: &page, options: &page_options }, true),
        (Artifact::Parameter { values: &values, spec: &spec }, false),
        (Artifact::ToolManifest(&manifest), true),
        (Artifact::ResourceList(&resources), true),
        (Artifact::Workspace { workspace: &ws, options: &ws_options }, true),
        (Artifact::ZipBag { bag: &bag, options: &zip_options }, true),
        (Artifact::ServerConfig(&config), false),
        (Artifact::NetworkMessage(&message), true),
    ];
    let kinds: Vec<ArtifactKind> = cases.iter().map(|(a, _)| a.kind()).collect();
    assert_eq!(kinds, ArtifactKind::ALL.to_vec());

    for (artifact, valid) in cases {
        let report = validate_artifact(artifact).unwrap();
        assert_eq!(report.is_valid(), valid, "{}: {}", artifact.kind(), report);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let page = page_xml().replace(r#"regionRef="r1""#, r#"regionRef="r404""#);
    let mets = mets_xml().replace(r#"ROLE="OTHER""#, r#"ROLE="HACKER""#);
    let ws = workspace(&mets, &page);
    let first = validate_artifact(Artifact::Workspace {
        workspace: &ws,
        options: &WorkspaceValidationOptions::default(),
    })
    .unwrap();
    let second = validate_artifact(Artifact::Workspace {
        workspace: &ws,
        options: &WorkspaceValidationOptions::default(),
    })
    .unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(to_json(&first).unwrap(), to_json(&second).unwrap());
}

#[test]
fn every_validator_builds_from_the_builtin_schemas() {
    assert!(XsdMetsValidator::builtin().is_ok());
    assert!(XsdPageValidator::builtin().is_ok());
    assert!(OcrdToolValidator::builtin().is_ok());
    assert!(OcrdResourceListValidator::builtin().is_ok());
    assert!(WorkspaceValidator::builtin().is_ok());
    assert!(OcrdZipValidator::builtin().is_ok());
    assert!(ProcessingServerConfigValidator::builtin().is_ok());
    assert!(OcrdNetworkMessageValidator::builtin().is_ok());
}
