use svgr::{Document, DrawKind, Error, LineCap, Pattern, Point, Recorder, Rgba};
use svgr::record::Segment;
use test_case::test_case;

fn close(a: Point, b: Point) -> bool {
    a.approx_eq(b, 1e-9)
}

fn record(source: &str, x: f64, y: f64, w: f64, h: f64, opacity: f64) -> Recorder {
    let doc = Document::parse_str(source).unwrap();
    let mut recorder = Recorder::new();
    doc.set_target(x, y, w, h).draw(&mut recorder, opacity);
    recorder
}

const TRIANGLE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
    <path d="M0 0 L24 0 L24 24 Z" fill="#FF0000"/>
</svg>"##;

#[test]
fn end_to_end_fill() {
    let recorder = record(TRIANGLE, 0.0, 0.0, 100.0, 100.0, 1.0);
    let commands = recorder.commands();

    assert_eq!(commands.len(), 1);
    let fill = &commands[0];
    assert_eq!(fill.kind, DrawKind::Fill);
    assert_eq!(fill.contours.len(), 1);
    assert!(fill.contours[0].closed);

    let expected = [Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)];
    let vertices = fill.contours[0].vertices();
    assert_eq!(vertices.len(), 3);
    for (got, want) in vertices.iter().zip(expected.iter()) {
	assert!(close(*got, *want), "{:?} != {:?}", got, want);
    }

    assert_eq!(fill.color(Rgba::BLACK), Some(Rgba::new(255, 0, 0, 255)));
}

#[test]
fn drawing_twice_records_the_same_commands() {
    let doc = Document::parse_str(TRIANGLE).unwrap();
    let target = doc.set_target(3.0, 4.0, 30.0, 40.0);
    let mut first = Recorder::new();
    let mut second = Recorder::new();

    target.draw(&mut first, 0.8);
    target.draw(&mut second, 0.8);
    assert_eq!(first.commands(), second.commands());

    // The same recorder, reset between frames.
    first.reset();
    target.draw(&mut first, 0.8);
    assert_eq!(first.commands(), second.commands());
}

#[test]
fn one_document_many_targets() {
    let doc = Document::parse_str(TRIANGLE).unwrap();
    let small = doc.set_target(0.0, 0.0, 12.0, 12.0);
    let large = doc.set_target(10.0, 10.0, 240.0, 240.0);

    let mut recorder = Recorder::new();
    small.draw(&mut recorder, 1.0);
    large.draw(&mut recorder, 1.0);

    let commands = recorder.commands();
    assert!(close(commands[0].contours[0].segments[0].end(), Point::new(12.0, 0.0)));
    assert!(close(commands[1].contours[0].start, Point::new(10.0, 10.0)));
    assert!(close(commands[1].contours[0].segments[0].end(), Point::new(250.0, 10.0)));
}

#[test]
fn view_box_origin_maps_to_target_offset() {
    let source = r#"<svg viewBox="10 20 5 5"><path d="M10 20 L15 25"/></svg>"#;
    let recorder = record(source, 7.0, 9.0, 50.0, 50.0, 1.0);

    assert_eq!(recorder.commands()[0].contours[0].start, Point::new(7.0, 9.0));
}

#[test]
fn strokes_follow_fills_and_scale_with_target() {
    let source = r#"<svg viewBox="0 0 10 20">
	<line x1="0" y1="0" x2="10" y2="20" stroke="currentColor" stroke-width="2" stroke-linecap="round" fill="red"/>
    </svg>"#;
    // x scale 4, y scale 2: strokes use the mean.
    let recorder = record(source, 0.0, 0.0, 40.0, 40.0, 1.0);
    let commands = recorder.commands();

    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].kind, DrawKind::Fill);
    assert_eq!(commands[1].kind, DrawKind::Stroke);

    let options = commands[1].stroke.unwrap();
    assert_eq!(options.width, 6.0);
    assert_eq!(options.cap, LineCap::Round);
    assert_eq!(commands[1].pattern, Some(Pattern::CurrentColor));
    assert_eq!(commands[1].color(Rgba::rgb(9, 9, 9)), Some(Rgba::rgb(9, 9, 9)));
}

#[test_case(1.0, 255 ; "opaque")]
#[test_case(0.5, 128 ; "half")]
#[test_case(0.0, 0 ; "invisible")]
#[test_case(7.0, 255 ; "clamped above")]
#[test_case(-1.0, 0 ; "clamped below")]
fn global_opacity_scales_alpha(opacity: f64, alpha: u8) {
    let recorder = record(TRIANGLE, 0.0, 0.0, 10.0, 10.0, opacity);
    assert_eq!(recorder.commands()[0].color(Rgba::BLACK), Some(Rgba::new(255, 0, 0, alpha)));
}

#[test]
fn shape_and_global_opacity_multiply() {
    let source = r##"<svg viewBox="0 0 1 1"><g opacity="0.5"><rect width="1" height="1" fill="#0000ff80" fill-opacity="0.5"/></g></svg>"##;
    let recorder = record(source, 0.0, 0.0, 1.0, 1.0, 0.5);
    let command = &recorder.commands()[0];

    assert_eq!(command.opacity, 0.125);
    assert_eq!(command.color(Rgba::BLACK), Some(Rgba::new(0, 0, 255, 16)));
}

#[test]
fn arcs_and_curves_are_replayed_as_curves() {
    let source = r#"<svg viewBox="0 0 10 10"><path d="M0 5 A5 5 0 0 1 10 5 Q5 10 0 5"/></svg>"#;
    let recorder = record(source, 0.0, 0.0, 10.0, 10.0, 1.0);
    let segments = &recorder.commands()[0].contours[0].segments;

    assert!(segments[..segments.len() - 1].iter().all(|s| matches!(s, Segment::Cubic(..))));
    assert!(matches!(segments.last(), Some(Segment::Quad(_, _))));
    assert!(close(segments[segments.len() - 2].end(), Point::new(10.0, 5.0)));
}

#[test]
fn invisible_shapes_request_no_drawers() {
    let source = r#"<svg viewBox="0 0 10 10">
	<rect width="5" height="5" fill="none"/>
	<rect width="5" height="5" fill="none" stroke="red" stroke-width="0"/>
    </svg>"#;

    assert!(record(source, 0.0, 0.0, 10.0, 10.0, 1.0).commands().is_empty());
}

#[test]
fn errors_carry_the_element() {
    let err = Document::parse_str(r#"<svg viewBox="0 0 10 10"><g><circle id="dot" r="1x"/></g></svg>"#).unwrap_err();

    assert_eq!(err.root(), &Error::UnknownUnit { unit: "x".into() });
    assert_eq!(err.to_string(), "in <circle id=\"dot\">: unknown unit: \"x\"");
}

#[test]
fn invalid_utf8_is_rejected() {
    assert!(matches!(Document::parse(b"<svg viewBox=\"0 0 1 1\">\xff</svg>"), Err(Error::InvalidDocument(_))));
}
