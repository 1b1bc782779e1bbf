//! The parsed document and its mapping onto a render target.

use std::io::Read;
use std::str::FromStr;

use log::{debug, warn};
use svg::node::Attributes;
use svg::node::element::tag;
use svg::parser::Event;

use crate::backend::{Backend, StrokeOptions, replay};
use crate::error::{Error, Result};
use crate::path::{PathOp, Point, decode_path};
use crate::shapes;
use crate::style::{DisplayMode, FillRule, Properties, Style, Visibility};
use crate::transform::Transform;
use crate::units::{Length, parse_number_list};

/// The intrinsic coordinate box every shape is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Reference length for percentages that are neither horizontal nor
    /// vertical: `sqrt((w² + h²) / 2)`.
    pub fn diagonal(&self) -> f64 {
	((self.width * self.width + self.height * self.height) / 2.0).sqrt()
    }
}

impl FromStr for ViewBox {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	match parse_number_list(s)?.as_slice() {
	    &[x, y, width, height] if width > 0.0 && height > 0.0 => Ok(ViewBox { x, y, width, height }),
	    &[_, _, _, _] => Err(Error::InvalidDocument(format!("viewBox {:?} has an empty area", s))),
	    _ => Err(Error::InvalidDocument(format!("viewBox {:?} needs 4 numbers", s))),
	}
    }
}

/// Geometry plus resolved style. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub path: Vec<PathOp>,
    pub style: Style,
}

/// Maps view box coordinates onto a `(x, y, width, height)` rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    view_box: ViewBox,
    offset_x: f64,
    offset_y: f64,
    width: f64,
    height: f64,
}

impl RenderTarget {
    pub fn new(view_box: ViewBox, offset_x: f64, offset_y: f64, width: f64, height: f64) -> Self {
	RenderTarget { view_box, offset_x, offset_y, width, height }
    }

    pub fn scale_x(&self) -> f64 {
	self.width / self.view_box.width
    }

    pub fn scale_y(&self) -> f64 {
	self.height / self.view_box.height
    }

    /// Stroke widths use the mean of both scales, so strokes keep a uniform
    /// width under a non-uniform resize. This approximates true anisotropic
    /// stroke scaling.
    pub fn stroke_scale(&self) -> f64 {
	(self.scale_x() + self.scale_y()) / 2.0
    }

    pub fn map(&self, p: Point) -> Point {
	Point::new(
	    self.offset_x + (p.x - self.view_box.x) * self.width / self.view_box.width,
	    self.offset_y + (p.y - self.view_box.y) * self.height / self.view_box.height,
	)
    }
}

/// A parsed SVG document: shapes in paint order and the view box.
///
/// Read-only after parsing and free of per-size state, so one document can be
/// drawn at many sizes, from many threads, each with its own backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    view_box: ViewBox,
    shapes: Vec<Shape>,
}

/// A document bound to a render target, see [`Document::set_target`].
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    document: &'a Document,
    transform: RenderTarget,
}

impl<'a> Target<'a> {
    pub fn render_target(&self) -> &RenderTarget {
	&self.transform
    }

    pub fn draw(&self, backend: &mut dyn Backend, opacity: f64) {
	self.document.draw(&self.transform, backend, opacity);
    }
}

impl Document {
    pub fn parse(source: &[u8]) -> Result<Document> {
	let text = std::str::from_utf8(source)
	    .map_err(|err| Error::InvalidDocument(format!("not UTF-8: {}", err)))?;

	Self::parse_str(text)
    }

    pub fn parse_str(source: &str) -> Result<Document> {
	let parser = svg::read(source).map_err(|err| Error::InvalidDocument(err.to_string()))?;
	let mut builder = Builder::default();

	for event in parser {
	    match event {
		Event::Tag(name, kind, attributes) => {
		    let name = local_name(name);
		    match kind {
			tag::Type::Start => builder.open(name, &attributes, true)?,
			tag::Type::Empty => builder.open(name, &attributes, false)?,
			tag::Type::End => builder.close(name)?,
		    }
		},
		Event::Error(err) => return Err(Error::InvalidDocument(err.to_string())),
		_ => (),
	    }
	}

	let document = builder.finish()?;
	debug!("parsed {} shapes, viewBox {:?}", document.shapes.len(), document.view_box);

	Ok(document)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Document> {
	let mut content = String::new();
	reader
	    .read_to_string(&mut content)
	    .map_err(|err| Error::InvalidDocument(err.to_string()))?;

	Self::parse_str(&content)
    }

    pub fn view_box(&self) -> ViewBox {
	self.view_box
    }

    pub fn shapes(&self) -> &[Shape] {
	&self.shapes
    }

    pub fn len(&self) -> usize {
	self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
	self.shapes.is_empty()
    }

    /// Maps the view box onto the given rectangle. Nothing is stored in the
    /// document.
    pub fn set_target(&self, offset_x: f64, offset_y: f64, width: f64, height: f64) -> Target<'_> {
	Target {
	    document: self,
	    transform: RenderTarget::new(self.view_box, offset_x, offset_y, width, height),
	}
    }

    /// Replays every shape, in document order, into `backend`. `opacity` is
    /// clamped to `[0, 1]` and multiplies each shape's own opacities.
    pub fn draw(&self, target: &RenderTarget, backend: &mut dyn Backend, opacity: f64) {
	let opacity = if opacity.is_nan() { 0.0 } else { opacity.max(0.0).min(1.0) };
	let map = |p: Point| target.map(p);

	for shape in &self.shapes {
	    let style = &shape.style;
	    let will_fill = style.will_fill();
	    let will_stroke = style.will_stroke();
	    if !will_fill && !will_stroke {
		continue;
	    }

	    let (filler, stroker) = backend.setup_drawers(will_fill, will_stroke);

	    if let (Some(filler), Some(pattern)) = (filler, style.fill_pattern.as_ref()) {
		filler.set_winding_rule(style.fill_rule == FillRule::NonZero);
		replay(&shape.path, map, &mut *filler);
		filler.draw(pattern, style.fill_opacity * opacity);
	    }

	    if let (Some(stroker), Some(pattern)) = (stroker, style.stroke_pattern.as_ref()) {
		stroker.set_stroke_options(StrokeOptions {
		    width: style.stroke_width * target.stroke_scale(),
		    cap: style.line_cap,
		    join: style.line_join,
		    miter_limit: style.miter_limit,
		});
		replay(&shape.path, map, &mut *stroker);
		stroker.draw(pattern, style.stroke_opacity * opacity);
	    }
	}
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	Document::parse_str(s)
    }
}

/// Elements whose content is never rendered directly.
const NON_RENDERING: &[&str] = &[
    "clipPath", "defs", "desc", "filter", "linearGradient", "marker", "mask",
    "metadata", "pattern", "radialGradient", "script", "style", "symbol", "title",
];

/// Elements with geometry this crate does not handle.
const UNSUPPORTED: &[&str] = &["image", "text", "use", "foreignObject", "switch"];

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn pairs(attributes: &Attributes) -> impl Iterator<Item = (&str, &str)> {
    attributes.iter().map(|(k, v)| (k.as_str(), &**v))
}

/// `<path id="a">`, or `<path> #3` (position in document order) without an id.
fn describe(name: &str, attributes: &Attributes, index: usize) -> String {
    match attributes.get("id") {
	Some(id) => format!("<{} id={:?}>", name, &**id),
	None => format!("<{}> #{}", name, index),
    }
}

struct Frame {
    name: String,
    properties: Properties,
    opacity: f64,
    /// Element to view box space.
    transform: Transform,
    skip: bool,
}

#[derive(Default)]
struct Builder {
    view_box: Option<ViewBox>,
    shapes: Vec<Shape>,
    stack: Vec<Frame>,
    elements: usize,
}

impl Builder {
    fn open(&mut self, name: &str, attributes: &Attributes, has_children: bool) -> Result<()> {
	self.elements += 1;
	let element = describe(name, attributes, self.elements);

	let view_box = match (self.view_box, self.stack.is_empty()) {
	    (Some(_), true) => return Err(Error::InvalidDocument(format!("{} after the root element", element))),
	    (Some(vb), false) => vb,
	    (None, _) => {
		if name != "svg" {
		    return Err(Error::InvalidDocument(format!("root element is {}, expected <svg>", element)));
		}
		let vb: ViewBox = attributes
		    .get("viewBox")
		    .ok_or_else(|| Error::InvalidDocument("<svg> has no viewBox".to_string()))?
		    .parse()
		    .map_err(|err: Error| err.in_element(&element))?;
		self.view_box = Some(vb);
		vb
	    },
	};

	let parent = self.stack.last();
	let frame = if parent.map_or(false, |p| p.skip) || NON_RENDERING.contains(&name) {
	    Frame {
		name: name.to_string(),
		properties: Properties::new(),
		opacity: 0.0,
		transform: Transform::IDENTITY,
		skip: true,
	    }
	} else {
	    let root = Properties::new();
	    let inherited = parent.map_or(&root, |p| &p.properties);
	    let mut properties = Properties::cascade(pairs(attributes), inherited).map_err(|err| err.in_element(&element))?;

	    // Frames never hold these two, so what is left after the cascade is
	    // the element's own: group opacity multiplies, display hides the subtree.
	    let own_opacity = properties.opacity.take().map_or(1.0, |o| o.0);
	    let display = properties.display.take();

	    let own_transform = attributes
		.get("transform")
		.map(|v| v.parse::<Transform>())
		.transpose()
		.map_err(|err| err.in_element(&element))?
		.unwrap_or(Transform::IDENTITY);
	    let parent_transform = parent.map_or(Transform::IDENTITY, |p| p.transform);

	    Frame {
		name: name.to_string(),
		properties,
		opacity: parent.map_or(1.0, |p| p.opacity) * own_opacity,
		transform: parent_transform.multiply(&own_transform),
		skip: display == Some(DisplayMode::None),
	    }
	};

	if !frame.skip {
	    if let Some(shape) = build_shape(name, attributes, &frame, &view_box).map_err(|err| err.in_element(&element))? {
		self.shapes.push(shape);
	    }
	}

	if has_children {
	    self.stack.push(frame);
	}

	Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
	match self.stack.pop() {
	    Some(frame) if frame.name == name => Ok(()),
	    Some(frame) => Err(Error::InvalidDocument(format!("</{}> closes <{}>", name, frame.name))),
	    None => Err(Error::InvalidDocument(format!("unexpected </{}>", name))),
	}
    }

    fn finish(self) -> Result<Document> {
	if let Some(frame) = self.stack.last() {
	    return Err(Error::InvalidDocument(format!("<{}> is never closed", frame.name)));
	}

	let view_box = self.view_box.ok_or_else(|| Error::InvalidDocument("no <svg> root element".to_string()))?;

	Ok(Document { view_box, shapes: self.shapes })
    }
}

fn length(attributes: &Attributes, name: &str, reference: f64) -> Result<Option<f64>> {
    attributes
	.get(name)
	.map(|v| v.parse::<Length>().map(|l| l.resolve(reference)))
	.transpose()
}

fn geometry(name: &str, attributes: &Attributes, view_box: &ViewBox) -> Result<Vec<PathOp>> {
    let (w, h, d) = (view_box.width, view_box.height, view_box.diagonal());
    let get = |attr: &str, reference: f64| -> Result<f64> { Ok(length(attributes, attr, reference)?.unwrap_or(0.0)) };

    Ok(match name {
	"path" => match attributes.get("d") {
	    Some(data) => decode_path(data)?,
	    None => Vec::new(),
	},
	"rect" => {
	    let rx = length(attributes, "rx", w)?;
	    let ry = length(attributes, "ry", h)?;
	    let (rx, ry) = match (rx, ry) {
		(Some(rx), Some(ry)) => (rx, ry),
		(Some(r), None) | (None, Some(r)) => (r, r),
		(None, None) => (0.0, 0.0),
	    };
	    shapes::rectangle(get("x", w)?, get("y", h)?, get("width", w)?, get("height", h)?, rx, ry)
	},
	"circle" => shapes::circle(get("cx", w)?, get("cy", h)?, get("r", d)?),
	"ellipse" => shapes::ellipse(get("cx", w)?, get("cy", h)?, get("rx", w)?, get("ry", h)?),
	"line" => shapes::line(
	    Point::new(get("x1", w)?, get("y1", h)?),
	    Point::new(get("x2", w)?, get("y2", h)?),
	),
	"polyline" | "polygon" => {
	    let points = match attributes.get("points") {
		Some(points) => parse_number_list(points)?,
		None => Vec::new(),
	    };
	    shapes::poly(&points, name == "polygon")
	},
	_ => {
	    if UNSUPPORTED.contains(&name) {
		warn!("<{}> is not supported and is skipped", name);
	    }
	    Vec::new()
	},
    })
}

fn build_shape(name: &str, attributes: &Attributes, frame: &Frame, view_box: &ViewBox) -> Result<Option<Shape>> {
    let path = geometry(name, attributes, view_box)?;
    if path.is_empty() || frame.properties.visibility == Some(Visibility::Hidden) {
	return Ok(None);
    }

    let mut style = frame.properties.resolve(view_box.diagonal());
    style.fill_opacity *= frame.opacity;
    style.stroke_opacity *= frame.opacity;

    if frame.transform.is_identity() {
	return Ok(Some(Shape { path, style }));
    }

    style.stroke_width *= frame.transform.mean_scale();
    let path = path.iter().map(|op| frame.transform.apply_op(op)).collect();

    Ok(Some(Shape { path, style }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Pattern, Rgba};

    fn parse(source: &str) -> Result<Document> {
	Document::parse(source.as_bytes())
    }

    #[test]
    fn parses_shapes_in_document_order() {
	let doc = parse(r##"<?xml version="1.0"?>
	    <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
		<!-- icon -->
		<path d="M0 0 L24 0 L24 24 Z" fill="#FF0000"/>
		<circle cx="12" cy="12" r="4" fill="blue"/>
	    </svg>"##).unwrap();

	assert_eq!(doc.view_box(), ViewBox { x: 0.0, y: 0.0, width: 24.0, height: 24.0 });
	assert_eq!(doc.len(), 2);
	assert_eq!(doc.shapes()[0].style.fill_pattern, Some(Pattern::PlainColor(Rgba::rgb(255, 0, 0))));
	assert_eq!(doc.shapes()[1].style.fill_pattern, Some(Pattern::PlainColor(Rgba::rgb(0, 0, 255))));
    }

    #[test]
    fn groups_cascade_presentation_attributes() {
	let doc = parse(r##"<svg viewBox="0 0 10 10">
		<g fill="none" stroke="green" opacity="0.5">
		    <g style="stroke-width: 2">
			<rect width="5" height="5" opacity="0.5"/>
		    </g>
		</g>
		<rect width="5" height="5"/>
	    </svg>"##).unwrap();

	let style = &doc.shapes()[0].style;
	assert_eq!(style.fill_pattern, None);
	assert_eq!(style.stroke_pattern, Some(Pattern::PlainColor(Rgba::rgb(0, 128, 0))));
	assert_eq!(style.stroke_width, 2.0);
	assert_eq!(style.stroke_opacity, 0.25);

	assert_eq!(doc.shapes()[1].style, Style::default());
    }

    #[test]
    fn skips_hidden_and_non_rendering_content() {
	let doc = parse(r##"<svg viewBox="0 0 10 10">
		<defs><path id="ref" d="M0 0 L1 1"/></defs>
		<g display="none"><path d="M0 0 L1 1"/></g>
		<path d="M0 0 L1 1" visibility="hidden"/>
		<g visibility="hidden"><path d="M0 0 L1 1" visibility="visible"/></g>
	    </svg>"##).unwrap();

	assert_eq!(doc.len(), 1);
    }

    #[test]
    fn percentages_resolve_against_the_view_box() {
	let doc = parse(r##"<svg viewBox="0 0 200 100"><rect x="10%" y="50%" width="50%" height="10"/></svg>"##).unwrap();
	assert_eq!(doc.shapes()[0].path[0], PathOp::MoveTo(Point::new(20.0, 50.0)));
	assert_eq!(doc.shapes()[0].path[1], PathOp::LineTo(Point::new(120.0, 50.0)));
    }

    #[test]
    fn structural_errors() {
	for source in &[
	    "",
	    "not xml at all",
	    r#"<svg width="10" height="10"></svg>"#,
	    r#"<svg viewBox="0 0 0 10"></svg>"#,
	    r#"<svg viewBox="0 0 10"></svg>"#,
	    r#"<svg viewBox="0 0 10 10"><g></svg>"#,
	    r#"<svg viewBox="0 0 10 10"><g>"#,
	    r#"<g><svg viewBox="0 0 10 10"/></g>"#,
	] {
	    assert!(matches!(parse(source), Err(Error::InvalidDocument(_))), "{:?}", source);
	}
    }

    #[test]
    fn sub_parser_errors_name_the_element() {
	let err = parse(r#"<svg viewBox="0 0 10 10"><path id="bad" d="M0 0 K1 1"/></svg>"#).unwrap_err();

	match &err {
	    Error::Element { element, .. } => assert_eq!(element, "<path id=\"bad\">"),
	    other => panic!("unexpected {:?}", other),
	}
	assert!(matches!(err.root(), Error::MalformedPath { command: Some('K'), position: 5, .. }));

	let err = parse(r#"<svg viewBox="0 0 10 10"><rect width="3em" height="1"/></svg>"#).unwrap_err();
	assert_eq!(err.root(), &Error::UnknownUnit { unit: "em".into() });
	assert!(err.to_string().contains("<rect> #2"));
    }

    #[test]
    fn group_transforms_move_geometry_into_view_box_space() {
	let doc = parse(r#"<svg viewBox="0 0 50 50">
		<g transform="translate(10 0)">
		    <path d="M0 0 L1 1"/>
		    <g transform="scale(2)"><path d="M1 1 L2 1" stroke="black" stroke-width="3"/></g>
		</g>
		<rect width="1" height="1" transform="matrix(1 0 0 1 0 5)"/>
	    </svg>"#).unwrap();

	assert_eq!(doc.shapes()[0].path[0], PathOp::MoveTo(Point::new(10.0, 0.0)));
	assert_eq!(doc.shapes()[0].path[1], PathOp::LineTo(Point::new(11.0, 1.0)));
	assert_eq!(doc.shapes()[1].path[0], PathOp::MoveTo(Point::new(12.0, 2.0)));
	assert_eq!(doc.shapes()[1].path[1], PathOp::LineTo(Point::new(14.0, 2.0)));
	assert_eq!(doc.shapes()[1].style.stroke_width, 6.0);
	assert_eq!(doc.shapes()[2].path[0], PathOp::MoveTo(Point::new(0.0, 5.0)));
    }

    #[test]
    fn bad_transforms_name_the_element() {
	let err = parse(r#"<svg viewBox="0 0 10 10"><g id="g1" transform="translate(1 2 3)"/></svg>"#).unwrap_err();

	assert_eq!(err.root(), &Error::InvalidTransform { value: "translate(1 2 3)".into() });
	assert!(err.to_string().starts_with("in <g id=\"g1\">"));
    }

    #[test]
    fn inherit_takes_the_parent_value() {
	let doc = parse(r#"<svg viewBox="0 0 10 10">
		<g fill="red" stroke="blue"><rect width="5" height="5" fill="inherit" stroke="inherit"/></g>
	    </svg>"#).unwrap();

	assert_eq!(doc.shapes()[0].style.fill_pattern, Some(Pattern::PlainColor(Rgba::rgb(255, 0, 0))));
	assert_eq!(doc.shapes()[0].style.stroke_pattern, Some(Pattern::PlainColor(Rgba::rgb(0, 0, 255))));
    }

    #[test]
    fn target_maps_view_box_origin_to_offset() {
	let doc = parse(r#"<svg viewBox="-5 7 10 20"/>"#).unwrap();
	let target = doc.set_target(3.0, 4.0, 100.0, 50.0);
	let t = target.render_target();

	assert_eq!(t.map(Point::new(-5.0, 7.0)), Point::new(3.0, 4.0));
	assert_eq!(t.map(Point::new(5.0, 27.0)), Point::new(103.0, 54.0));
	assert_eq!(t.stroke_scale(), (10.0 + 2.5) / 2.0);
    }

    #[test]
    fn reads_from_a_reader() {
	let doc = Document::from_reader(&br#"<svg viewBox="0 0 1 1"><line x2="1" y2="1" stroke="red"/></svg>"#[..]).unwrap();
	assert_eq!(doc.len(), 1);
	assert!(doc.shapes()[0].style.will_stroke());
    }
}
