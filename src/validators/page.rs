use crate::enums::TextStrictness;
use crate::error::{Issue, Report};
use crate::model::page::{PageDocument, Polygon};
use crate::types::PageValidationOptions;
use crate::validators::positioned;
use crate::xml::XmlDocument;
use std::collections::HashSet;

/// Semantic checks on a parsed PAGE document. Every check runs independently
/// of the others.
#[derive(Clone, Debug, Default)]
pub struct PageValidator {
    options: PageValidationOptions,
}

impl PageValidator {
    pub fn new(options: PageValidationOptions) -> Self {
        PageValidator { options }
    }

    pub fn validate(&self, page: &PageDocument) -> Report {
        let mut report = Report::new();

        check_image_dimensions(page, &mut report);
        check_nesting(page, &mut report);
        check_polygons(page, &mut report);
        if self.options.check_coordinate_consistency {
            check_coords_within_parent(page, &mut report);
        }
        if self.options.strictness != TextStrictness::Off {
            check_text_consistency(page, self.options.strictness, &mut report);
        }
        check_reading_order(page, &mut report);

        tracing::debug!(
            validator = "page",
            regions = page.regions.len(),
            lines = page.lines.len(),
            issues = report.len(),
            "validated page"
        );
        report
    }

    /// Flatten an XML document with [`PageDocument::from_xml`] and validate it.
    pub fn validate_xml(&self, document: &XmlDocument) -> Report {
        self.validate(&PageDocument::from_xml(document))
    }
}

// ─── Image ──────────────────────────────────────────────────────────────────

fn check_image_dimensions(page: &PageDocument, report: &mut Report) {
    for (attr, value) in [("imageWidth", page.image_width), ("imageHeight", page.image_height)] {
        if let Some(v) = value
            && v <= 0
        {
            report.push(positioned(
                Issue::error(
                    "invalid-image-dimension",
                    format!("{} must be a positive integer, found {}", attr, v),
                ),
                page.position,
            ));
        }
    }
}

// ─── Nesting ────────────────────────────────────────────────────────────────

fn check_nesting(page: &PageDocument, report: &mut Report) {
    let regions: HashSet<&str> = page.regions.iter().map(|r| r.id.as_str()).collect();
    let lines: HashSet<&str> = page.lines.iter().map(|l| l.id.as_str()).collect();

    for region in &page.regions {
        if let Some(parent) = &region.parent
            && !regions.contains(parent.as_str())
        {
            report.push(positioned(
                Issue::error(
                    "dangling-parent-ref",
                    format!("region '{}' references unknown parent region '{}'", region.id, parent),
                ),
                region.position,
            ));
        }
    }
    for line in &page.lines {
        if !regions.contains(line.region.as_str()) {
            report.push(positioned(
                Issue::error(
                    "dangling-parent-ref",
                    format!("text line '{}' references unknown region '{}'", line.id, line.region),
                ),
                line.position,
            ));
        }
    }
    for word in &page.words {
        if !lines.contains(word.line.as_str()) {
            report.push(positioned(
                Issue::error(
                    "dangling-parent-ref",
                    format!("word '{}' references unknown text line '{}'", word.id, word.line),
                ),
                word.position,
            ));
        }
    }
}

// ─── Geometry ───────────────────────────────────────────────────────────────

/// Every (kind, id, polygon, position) in document order: regions, lines, words.
fn shapes(
    page: &PageDocument,
) -> impl Iterator<Item = (&'static str, &str, &Polygon, Option<(usize, usize)>)> {
    let regions = page
        .regions
        .iter()
        .filter_map(|r| r.polygon.as_ref().map(|p| ("region", r.id.as_str(), p, r.position)));
    let lines = page
        .lines
        .iter()
        .filter_map(|l| l.polygon.as_ref().map(|p| ("text line", l.id.as_str(), p, l.position)));
    let words = page
        .words
        .iter()
        .filter_map(|w| w.polygon.as_ref().map(|p| ("word", w.id.as_str(), p, w.position)));
    regions.chain(lines).chain(words)
}

fn check_polygons(page: &PageDocument, report: &mut Report) {
    for (kind, id, polygon, position) in shapes(page) {
        let distinct = polygon.distinct_points();
        if distinct < 3 {
            report.push(positioned(
                Issue::error(
                    "degenerate-polygon",
                    format!(
                        "{} '{}' has {} distinct point(s), at least 3 are required",
                        kind, id, distinct
                    ),
                ),
                position,
            ));
        } else if polygon.is_self_intersecting() {
            report.push(positioned(
                Issue::error(
                    "self-intersecting-polygon",
                    format!("{} '{}' has a self-intersecting outline", kind, id),
                ),
                position,
            ));
        }
    }
}

fn usable(polygon: Option<&Polygon>) -> Option<&Polygon> {
    polygon.filter(|p| p.distinct_points() >= 3)
}

fn check_coords_within_parent(page: &PageDocument, report: &mut Report) {
    let mut check = |kind: &str,
                     id: &str,
                     child: Option<&Polygon>,
                     parent_kind: &str,
                     parent_id: &str,
                     parent: Option<&Polygon>,
                     position: Option<(usize, usize)>| {
        let (Some(child), Some(parent)) = (usable(child), usable(parent)) else {
            return;
        };
        if let Some(outside) = child.points.iter().find(|p| !parent.contains(**p)) {
            report.push(positioned(
                Issue::error(
                    "coords-not-within-parent",
                    format!(
                        "{} '{}' has point {},{} outside its parent {} '{}'",
                        kind, id, outside.x, outside.y, parent_kind, parent_id
                    ),
                ),
                position,
            ));
        }
    };

    for region in &page.regions {
        if let Some(parent) = region.parent.as_deref().and_then(|p| page.region(p)) {
            check(
                "region",
                &region.id,
                region.polygon.as_ref(),
                "region",
                &parent.id,
                parent.polygon.as_ref(),
                region.position,
            );
        }
    }
    for line in &page.lines {
        if let Some(region) = page.region(&line.region) {
            check(
                "text line",
                &line.id,
                line.polygon.as_ref(),
                "region",
                &region.id,
                region.polygon.as_ref(),
                line.position,
            );
        }
    }
    for word in &page.words {
        if let Some(line) = page.line(&word.line) {
            check(
                "word",
                &word.id,
                word.polygon.as_ref(),
                "text line",
                &line.id,
                line.polygon.as_ref(),
                word.position,
            );
        }
    }
}

// ─── Text ───────────────────────────────────────────────────────────────────

fn check_text_consistency(page: &PageDocument, strictness: TextStrictness, report: &mut Report) {
    for line in &page.lines {
        let Some(text) = &line.text else { continue };
        let words: Vec<&str> = page
            .words
            .iter()
            .filter(|w| w.line == line.id)
            .map(|w| w.text.as_deref())
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        if words.is_empty() {
            continue;
        }
        compare_text(
            "text line",
            &line.id,
            text,
            &words.join(" "),
            "words",
            strictness,
            line.position,
            report,
        );
    }

    for region in &page.regions {
        let Some(text) = &region.text else { continue };
        let lines: Vec<&str> = page
            .lines
            .iter()
            .filter(|l| l.region == region.id)
            .map(|l| l.text.as_deref())
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        if lines.is_empty() {
            continue;
        }
        compare_text(
            "region",
            &region.id,
            text,
            &lines.join("\n"),
            "text lines",
            strictness,
            region.position,
            report,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn compare_text(
    kind: &str,
    id: &str,
    own: &str,
    concatenated: &str,
    children: &str,
    strictness: TextStrictness,
    position: Option<(usize, usize)>,
    report: &mut Report,
) {
    let message = || {
        format!(
            "text of {} '{}' ({:?}) differs from its {} ({:?})",
            kind, id, own, children, concatenated
        )
    };
    match strictness {
        TextStrictness::Strict if own != concatenated => {
            report.push(positioned(Issue::error("inconsistent-text", message()), position));
        }
        TextStrictness::Lax if normalize_whitespace(own) != normalize_whitespace(concatenated) => {
            report.push(positioned(
                Issue::warning("inconsistent-text", message()),
                position,
            ));
        }
        _ => {}
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ─── Reading order ──────────────────────────────────────────────────────────

fn check_reading_order(page: &PageDocument, report: &mut Report) {
    let regions: HashSet<&str> = page.regions.iter().map(|r| r.id.as_str()).collect();
    for r in &page.reading_order {
        if !regions.contains(r.region_ref.as_str()) {
            let group = r
                .group_id
                .as_deref()
                .map(|g| format!(" in group '{}'", g))
                .unwrap_or_default();
            report.push(positioned(
                Issue::error(
                    "dangling-reading-order-ref",
                    format!(
                        "reading order{} references unknown region '{}'",
                        group, r.region_ref
                    ),
                ),
                r.position,
            ));
        }
    }
}
