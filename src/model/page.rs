//! PAGE document → flat [`PageDocument`], plus the polygon geometry the
//! semantic checks need.

use crate::xml::{XmlDocument, XmlElement};
use std::cmp::{Ordering, Reverse};

/// Element names of all PAGE region types.
pub const REGION_TYPES: &[&str] = &[
    "TextRegion",
    "ImageRegion",
    "LineDrawingRegion",
    "GraphicRegion",
    "TableRegion",
    "ChartRegion",
    "MapRegion",
    "SeparatorRegion",
    "MathsRegion",
    "ChemRegion",
    "MusicRegion",
    "AdvertRegion",
    "NoiseRegion",
    "UnknownRegion",
    "CustomRegion",
];

// ─── Geometry ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Point { x, y }
    }
}

/// A closed polygon; the last vertex connects back to the first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Polygon { points }
    }

    /// Parse a PAGE `points` attribute: `"x1,y1 x2,y2 ..."`.
    pub fn parse(points: &str) -> Option<Self> {
        let mut out = Vec::new();
        for pair in points.split_whitespace() {
            let (x, y) = pair.split_once(',')?;
            out.push(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?));
        }
        if out.is_empty() { None } else { Some(Polygon { points: out }) }
    }

    /// Axis-aligned rectangle, handy for building documents by hand.
    pub fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    pub fn distinct_points(&self) -> usize {
        let mut seen: Vec<Point> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if !seen.contains(p) {
                seen.push(*p);
            }
        }
        seen.len()
    }

    /// Vertices with consecutive duplicates (including last == first) removed.
    fn ring(&self) -> Vec<Point> {
        let mut ring: Vec<Point> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if ring.last() != Some(p) {
                ring.push(*p);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        ring
    }

    /// True if two non-adjacent edges touch or cross.
    pub fn is_self_intersecting(&self) -> bool {
        let ring = self.ring();
        let n = ring.len();
        if n < 4 {
            return false;
        }
        for i in 0..n {
            let (a1, a2) = (ring[i], ring[(i + 1) % n]);
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (b1, b2) = (ring[j], ring[(j + 1) % n]);
                if segments_intersect(a1, a2, b1, b2) {
                    return true;
                }
            }
        }
        false
    }

    /// True if `p` lies inside the polygon or on its boundary.
    pub fn contains(&self, p: Point) -> bool {
        let ring = self.ring();
        let n = ring.len();
        if n == 0 {
            return false;
        }
        for i in 0..n {
            if on_segment(ring[i], ring[(i + 1) % n], p) {
                return true;
            }
        }
        // Even-odd ray cast towards +x.
        let mut inside = false;
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            if (a.y > p.y) != (b.y > p.y) {
                // x-coordinate of the crossing, compared without division.
                let order = compare_products(
                    (diff(p.x, a.x), diff(b.y, a.y)),
                    (diff(b.x, a.x), diff(p.y, a.y)),
                );
                let crosses = if b.y > a.y { order.is_lt() } else { order.is_gt() };
                if crosses {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn diff(a: i64, b: i64) -> i128 {
    a as i128 - b as i128
}

/// Exact product of two coordinate differences. Each factor magnitude fits in
/// a `u64`, so the product magnitude fits in a `u128`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Product {
    Negative(Reverse<u128>),
    Zero,
    Positive(u128),
}

fn product(a: i128, b: i128) -> Product {
    let magnitude = a.unsigned_abs() * b.unsigned_abs();
    match a.signum() * b.signum() {
        0 => Product::Zero,
        1 => Product::Positive(magnitude),
        _ => Product::Negative(Reverse(magnitude)),
    }
}

fn compare_products(lhs: (i128, i128), rhs: (i128, i128)) -> Ordering {
    product(lhs.0, lhs.1).cmp(&product(rhs.0, rhs.1))
}

/// Sign of the cross product `(a - o) x (b - o)`.
fn cross(o: Point, a: Point, b: Point) -> i8 {
    compare_products(
        (diff(a.x, o.x), diff(b.y, o.y)),
        (diff(a.y, o.y), diff(b.x, o.x)),
    ) as i8
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    cross(a, b, p) == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);
    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }
    on_segment(b1, b2, a1) || on_segment(b1, b2, a2) || on_segment(a1, a2, b1) || on_segment(a1, a2, b2)
}

// ─── Document ───────────────────────────────────────────────────────────────

/// Flat representation of a PAGE document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageDocument {
    pub image_filename: Option<String>,
    pub image_width: Option<i64>,
    pub image_height: Option<i64>,
    pub regions: Vec<Region>,
    pub lines: Vec<TextLine>,
    pub words: Vec<Word>,
    pub reading_order: Vec<ReadingOrderRef>,
    /// Position of the `Page` element.
    pub position: Option<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: String,
    /// Element name, e.g. `TextRegion`.
    pub kind: String,
    pub polygon: Option<Polygon>,
    pub parent: Option<String>,
    pub text: Option<String>,
    pub position: Option<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub id: String,
    pub region: String,
    pub polygon: Option<Polygon>,
    pub text: Option<String>,
    pub position: Option<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Word {
    pub id: String,
    pub line: String,
    pub polygon: Option<Polygon>,
    pub text: Option<String>,
    pub position: Option<(usize, usize)>,
}

/// A `regionRef` inside the reading order.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadingOrderRef {
    pub region_ref: String,
    pub group_id: Option<String>,
    pub index: Option<i64>,
    pub position: Option<(usize, usize)>,
}

impl Region {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, polygon: Polygon) -> Self {
        Region {
            id: id.into(),
            kind: kind.into(),
            polygon: Some(polygon),
            parent: None,
            text: None,
            position: None,
        }
    }
}

impl TextLine {
    pub fn new(id: impl Into<String>, region: impl Into<String>, polygon: Polygon) -> Self {
        TextLine {
            id: id.into(),
            region: region.into(),
            polygon: Some(polygon),
            text: None,
            position: None,
        }
    }
}

impl Word {
    pub fn new(id: impl Into<String>, line: impl Into<String>, polygon: Polygon) -> Self {
        Word {
            id: id.into(),
            line: line.into(),
            polygon: Some(polygon),
            text: None,
            position: None,
        }
    }
}

impl PageDocument {
    /// Flatten a parsed PAGE document. Elements outside the `Page` element
    /// and unparseable attribute values are skipped.
    pub fn from_xml(doc: &XmlDocument) -> Self {
        let mut page = PageDocument::default();
        let Some(page_el) = doc.root.child("Page") else {
            return page;
        };
        page.position = Some((page_el.line, page_el.column));
        page.image_filename = page_el.attr("imageFilename").map(str::to_string);
        page.image_width = page_el.attr("imageWidth").and_then(|v| v.trim().parse().ok());
        page.image_height = page_el.attr("imageHeight").and_then(|v| v.trim().parse().ok());

        for child in &page_el.children {
            if REGION_TYPES.contains(&child.local_name.as_str()) {
                page.collect_region(child, None);
            } else if child.local_name == "ReadingOrder" {
                page.collect_reading_order(child, None);
            }
        }
        page
    }

    fn collect_region(&mut self, el: &XmlElement, parent: Option<&str>) {
        let id = el.attr("id").unwrap_or_default().to_string();
        self.regions.push(Region {
            id: id.clone(),
            kind: el.local_name.clone(),
            polygon: coords(el),
            parent: parent.map(str::to_string),
            text: text_equiv(el),
            position: Some((el.line, el.column)),
        });
        for child in &el.children {
            if REGION_TYPES.contains(&child.local_name.as_str()) {
                self.collect_region(child, Some(&id));
            } else if child.local_name == "TextLine" {
                self.collect_line(child, &id);
            }
        }
    }

    fn collect_line(&mut self, el: &XmlElement, region: &str) {
        let id = el.attr("id").unwrap_or_default().to_string();
        self.lines.push(TextLine {
            id: id.clone(),
            region: region.to_string(),
            polygon: coords(el),
            text: text_equiv(el),
            position: Some((el.line, el.column)),
        });
        for word in el.children_named("Word") {
            self.words.push(Word {
                id: word.attr("id").unwrap_or_default().to_string(),
                line: id.clone(),
                polygon: coords(word),
                text: text_equiv(word),
                position: Some((word.line, word.column)),
            });
        }
    }

    fn collect_reading_order(&mut self, el: &XmlElement, group: Option<&str>) {
        for child in &el.children {
            match child.local_name.as_str() {
                "OrderedGroup" | "UnorderedGroup" | "OrderedGroupIndexed"
                | "UnorderedGroupIndexed" => {
                    if let Some(region_ref) = child.attr("regionRef") {
                        self.reading_order.push(ReadingOrderRef {
                            region_ref: region_ref.to_string(),
                            group_id: child.attr("id").map(str::to_string),
                            index: child.attr("index").and_then(|v| v.trim().parse().ok()),
                            position: Some((child.line, child.column)),
                        });
                    }
                    self.collect_reading_order(child, child.attr("id"));
                }
                "RegionRefIndexed" | "RegionRef" => {
                    if let Some(region_ref) = child.attr("regionRef") {
                        self.reading_order.push(ReadingOrderRef {
                            region_ref: region_ref.to_string(),
                            group_id: group.map(str::to_string),
                            index: child.attr("index").and_then(|v| v.trim().parse().ok()),
                            position: Some((child.line, child.column)),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn line(&self, id: &str) -> Option<&TextLine> {
        self.lines.iter().find(|l| l.id == id)
    }
}

fn coords(el: &XmlElement) -> Option<Polygon> {
    el.child("Coords")
        .and_then(|c| c.attr("points"))
        .and_then(Polygon::parse)
}

/// Unicode text of the first-ranked `TextEquiv` (lowest `index`, else first).
fn text_equiv(el: &XmlElement) -> Option<String> {
    el.children_named("TextEquiv")
        .enumerate()
        .min_by_key(|(pos, te)| {
            let index = te
                .attr("index")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(i64::MAX);
            (index, *pos)
        })
        .and_then(|(_, te)| te.child("Unicode"))
        .map(|u| u.text.clone())
}
