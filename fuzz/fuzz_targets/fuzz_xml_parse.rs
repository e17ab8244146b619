#![no_main]

use libfuzzer_sys::fuzz_target;
use ocrd_validators::serialize::to_xml;
use ocrd_validators::{PageDocument, PageValidator, XsdPageValidator, xml};

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = xml::parse_bytes(data) else {
        return;
    };
    let page = PageDocument::from_xml(&doc);
    let mut report = PageValidator::default().validate(&page);
    if let Ok(xsd) = XsdPageValidator::builtin() {
        report = report.merge(xsd.validate(&doc));
    }

    // Whatever the messages contain, the rendered report must stay well-formed.
    let rendered = to_xml(&report);
    if let Err(e) = xml::parse_str(&rendered) {
        panic!("report rendering is not well-formed XML: {}\n{}", e, rendered);
    }
});
