use super::common::*;
use ocrd_validators::enums::TextStrictness;
use ocrd_validators::model::{PageDocument, Polygon, ReadingOrderRef, Region, TextLine, Word};
use ocrd_validators::xml;
use ocrd_validators::{PageValidationOptions, PageValidator, Severity};

fn parsed(page: &str) -> PageDocument {
    PageDocument::from_xml(&xml::parse_str(page).expect("fixture is well-formed"))
}

fn validate(page: &str) -> ocrd_validators::Report {
    PageValidator::default().validate(&parsed(page))
}

#[test]
fn consistent_page_is_valid() {
    assert_clean(&validate(&page_xml()));
}

#[test]
fn fixture_flattens_to_expected_shape() {
    let page = parsed(&page_xml());
    assert_eq!(page.image_filename.as_deref(), Some(IMAGE_PATH));
    assert_eq!((page.image_width, page.image_height), (Some(1000), Some(2000)));
    assert_eq!(page.regions.len(), 1);
    assert_eq!(page.lines.len(), 1);
    assert_eq!(page.words.len(), 2);
    assert_eq!(page.lines[0].text.as_deref(), Some("Hello world"));
    assert_eq!(page.reading_order[0].region_ref, "r1");
    assert_eq!(page.reading_order[0].group_id.as_deref(), Some("ro_1"));
    assert_eq!(page.reading_order[0].index, Some(0));
}

#[test]
fn validate_xml_matches_the_flattened_model() {
    let page = page_xml().replace(r#"regionRef="r1""#, r#"regionRef="r404""#);
    let doc = xml::parse_str(&page).unwrap();
    let validator = PageValidator::default();
    assert_eq!(validator.validate_xml(&doc), validate(&page));
    assert_clean(&validator.validate_xml(&xml::parse_str(&page_xml()).unwrap()));
}

#[test]
fn dangling_reading_order_ref_is_exactly_one_error() {
    let page = page_xml().replace(r#"regionRef="r1""#, r#"regionRef="r404""#);
    let report = validate(&page);
    assert_eq!(categories(&report), vec!["dangling-reading-order-ref"]);
    let issue = &report.issues()[0];
    assert!(issue.message.contains("r404"));
    assert!(issue.message.contains("ro_1"));
    assert!(issue.location.as_ref().unwrap().line.is_some());
}

#[test]
fn non_positive_image_dimensions() {
    let page = page_with("0", "-5", READING_ORDER, REGION);
    let report = validate(&page);
    assert_eq!(
        categories(&report),
        vec!["invalid-image-dimension", "invalid-image-dimension"]
    );
}

#[test]
fn degenerate_polygon() {
    let page = page_xml().replace(
        "420,120 800,120 800,190 420,190",
        "420,120 800,120 420,120",
    );
    let report = validate(&page);
    assert_eq!(categories(&report), vec!["degenerate-polygon"]);
    assert!(report.issues()[0].message.contains("r1_l1_w2"));
}

#[test]
fn self_intersecting_polygon() {
    // Bow tie inside the line.
    let page = page_xml().replace(
        "420,120 800,120 800,190 420,190",
        "420,120 800,190 800,120 420,190",
    );
    let report = validate(&page);
    assert_eq!(categories(&report), vec!["self-intersecting-polygon"]);
}

#[test]
fn word_outside_its_line() {
    let page = page_xml().replace(
        "420,120 800,120 800,190 420,190",
        "420,120 950,120 950,190 420,190",
    );
    let report = validate(&page);
    assert_eq!(categories(&report), vec!["coords-not-within-parent"]);
    let msg = &report.issues()[0].message;
    assert!(msg.contains("r1_l1_w2") && msg.contains("r1_l1"), "{}", msg);
}

#[test]
fn coordinate_check_can_be_disabled() {
    let page = page_xml().replace(
        "420,120 800,120 800,190 420,190",
        "420,120 950,120 950,190 420,190",
    );
    let options = PageValidationOptions {
        check_coordinate_consistency: false,
        ..Default::default()
    };
    assert_clean(&PageValidator::new(options).validate(&parsed(&page)));
}

#[test]
fn strict_text_mismatch_is_an_error() {
    let page = page_xml().replacen(
        "<pc:Unicode>Hello world</pc:Unicode></pc:TextEquiv>\n      </pc:TextLine>",
        "<pc:Unicode>Hello  world</pc:Unicode></pc:TextEquiv>\n      </pc:TextLine>",
        1,
    );
    let report = validate(&page);
    // The line disagrees with its words, and the region with its line.
    assert_eq!(categories(&report), vec!["inconsistent-text", "inconsistent-text"]);
    assert!(report.issues().iter().all(|i| i.severity == Severity::Error));
}

#[test]
fn lax_text_ignores_whitespace_differences() {
    let page = page_xml().replacen(
        "<pc:Unicode>Hello world</pc:Unicode></pc:TextEquiv>\n      </pc:TextLine>",
        "<pc:Unicode>Hello  world</pc:Unicode></pc:TextEquiv>\n      </pc:TextLine>",
        1,
    );
    let options = PageValidationOptions {
        strictness: TextStrictness::Lax,
        ..Default::default()
    };
    assert_clean(&PageValidator::new(options).validate(&parsed(&page)));
}

#[test]
fn lax_text_mismatch_is_a_warning() {
    let page = page_xml().replace("<pc:Unicode>world</pc:Unicode>", "<pc:Unicode>word</pc:Unicode>");
    let options = PageValidationOptions {
        strictness: TextStrictness::Lax,
        ..Default::default()
    };
    let report = PageValidator::new(options).validate(&parsed(&page));
    assert!(report.is_valid());
    assert_eq!(categories(&report), vec!["inconsistent-text"]);
    assert_eq!(report.issues()[0].severity, Severity::Warning);
}

#[test]
fn text_check_can_be_turned_off() {
    let page = page_xml().replace("<pc:Unicode>world</pc:Unicode>", "<pc:Unicode>word</pc:Unicode>");
    let options = PageValidationOptions {
        strictness: TextStrictness::Off,
        ..Default::default()
    };
    assert_clean(&PageValidator::new(options).validate(&parsed(&page)));
}

// ─── Hand-built documents ───────────────────────────────────────────────────

fn hand_built() -> PageDocument {
    PageDocument {
        image_filename: Some("img.png".to_string()),
        image_width: Some(100),
        image_height: Some(100),
        regions: vec![Region::new("r1", "TextRegion", Polygon::rect(0, 0, 50, 50))],
        lines: vec![TextLine::new("l1", "r1", Polygon::rect(5, 5, 45, 20))],
        words: vec![Word::new("w1", "l1", Polygon::rect(6, 6, 20, 19))],
        reading_order: vec![ReadingOrderRef {
            region_ref: "r1".to_string(),
            group_id: None,
            index: None,
            position: None,
        }],
        position: None,
    }
}

#[test]
fn hand_built_document_is_valid() {
    assert_clean(&PageValidator::default().validate(&hand_built()));
}

#[test]
fn dangling_parent_refs_at_every_level() {
    let mut page = hand_built();
    let mut nested = Region::new("r2", "ImageRegion", Polygon::rect(1, 1, 10, 10));
    nested.parent = Some("r9".to_string());
    page.regions.push(nested);
    page.lines.push(TextLine::new("l2", "r8", Polygon::rect(0, 0, 5, 5)));
    page.words.push(Word::new("w2", "l7", Polygon::rect(0, 0, 5, 5)));

    let report = PageValidator::default().validate(&page);
    let dangling = assert_has(&report, "dangling-parent-ref");
    assert_eq!(dangling.len(), 3);
    assert!(dangling[0].message.contains("r9"));
    assert!(dangling[1].message.contains("r8"));
    assert!(dangling[2].message.contains("l7"));
    // Nothing else: geometry against a missing parent is not checked.
    assert_eq!(report.len(), 3, "{}", report);
}

#[test]
fn checks_run_independently() {
    let mut page = hand_built();
    page.image_width = Some(0);
    page.reading_order[0].region_ref = "gone".to_string();
    page.words[0].polygon = Some(Polygon::rect(6, 6, 6, 6));

    let report = PageValidator::default().validate(&page);
    assert_eq!(
        categories(&report),
        vec![
            "invalid-image-dimension",
            "degenerate-polygon",
            "dangling-reading-order-ref",
        ]
    );
}
