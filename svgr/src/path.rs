//! Path data (`d` attribute) decoding.
//!
//! Relative commands are resolved against the current point, smooth curves get
//! their reflected control point, and elliptical arcs are approximated by
//! cubic Béziers. The output only ever holds the four geometric primitives,
//! plus a [`PathOp::Close`] marker that carries no geometry.

use std::f64::consts::{FRAC_PI_2, PI};
use std::ops::{Add, Mul, Sub};

use log::trace;
use nom::{
    IResult,
    branch::alt,
    character::complete::{char, multispace0, one_of},
    combinator::{map, opt},
    sequence::{preceded, tuple},
};

use crate::error::{Error, Result};
use crate::units::number;

/// Below this, a radius or a chord counts as zero.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
	Point { x, y }
    }

    ///Reflects `self` through `center`.
    pub fn reflect(self, center: Point) -> Point {
	Point::new(2.0 * center.x - self.x, 2.0 * center.y - self.y)
    }

    pub fn approx_eq(self, other: Point, tolerance: f64) -> bool {
	(self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
	Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
	Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, factor: f64) -> Point {
	Point::new(self.x * factor, self.y * factor)
    }
}

/// One geometric operation, in absolute document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    /// Ends the current subpath with a segment back to its start.
    Close,
}

impl PathOp {
    /// The point this operation ends at, if it has one.
    pub fn end(&self) -> Option<Point> {
	match *self {
	    PathOp::MoveTo(p) | PathOp::LineTo(p) | PathOp::QuadTo(_, p) | PathOp::CubicTo(_, _, p) => Some(p),
	    PathOp::Close => None,
	}
    }
}

/// Decodes SVG path data into absolute operations.
pub fn decode_path(d: &str) -> Result<Vec<PathOp>> {
    let mut decoder = Decoder::new(d);
    decoder.run()?;

    trace!("decoded {} ops from {} bytes of path data", decoder.ops.len(), d.len());
    Ok(decoder.ops)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Previous {
    Cubic(Point),
    Quad(Point),
    Other,
}

struct Decoder<'a> {
    source: &'a str,
    rest: &'a str,
    ops: Vec<PathOp>,
    current: Point,
    subpath_start: Point,
    previous: Previous,
    /// Set after `Z` until the next drawing command reopens the subpath.
    closed: bool,
}

fn comma_wsp(input: &str) -> IResult<&str, ()> {
    map(tuple((multispace0, opt(char(',')), multispace0)), |_| ())(input)
}

fn argument(input: &str) -> IResult<&str, f64> {
    preceded(comma_wsp, number)(input)
}

fn flag(input: &str) -> IResult<&str, bool> {
    preceded(comma_wsp, alt((map(one_of("1"), |_| true), map(one_of("0"), |_| false))))(input)
}

fn arity(command: char) -> usize {
    match command.to_ascii_uppercase() {
	'M' | 'L' | 'T' => 2,
	'H' | 'V' => 1,
	'Q' | 'S' => 4,
	'C' => 6,
	'A' => 7,
	_ => 0,
    }
}

impl<'a> Decoder<'a> {
    fn new(source: &'a str) -> Self {
	Decoder {
	    source,
	    rest: source,
	    ops: Vec::new(),
	    current: Point::default(),
	    subpath_start: Point::default(),
	    previous: Previous::Other,
	    closed: false,
	}
    }

    fn position(&self) -> usize {
	self.source.len() - self.rest.len()
    }

    fn error(&self, command: Option<char>, reason: &'static str) -> Error {
	Error::MalformedPath { command, position: self.position(), reason }
    }

    fn skip_whitespace(&mut self) {
	self.rest = self.rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    }

    fn number(&mut self, command: char) -> Result<f64> {
	let (rest, value) = argument(self.rest).map_err(|_| self.error(Some(command), "expected a number"))?;
	self.rest = rest;
	Ok(value)
    }

    fn flag(&mut self, command: char) -> Result<bool> {
	let (rest, value) = flag(self.rest).map_err(|_| self.error(Some(command), "expected a flag (0 or 1)"))?;
	self.rest = rest;
	Ok(value)
    }

    fn point(&mut self, command: char, relative: bool) -> Result<Point> {
	let x = self.number(command)?;
	let y = self.number(command)?;

	Ok(if relative { self.current + Point::new(x, y) } else { Point::new(x, y) })
    }

    ///Whether another coordinate group follows without a command letter.
    fn repeats(&self) -> bool {
	matches!(comma_wsp(self.rest), Ok((rest, _)) if argument(rest).is_ok())
    }

    fn run(&mut self) -> Result<()> {
	self.skip_whitespace();

	while let Some(c) = self.rest.chars().next() {
	    if !c.is_ascii_alphabetic() {
		let reason = if self.ops.is_empty() {
		    "path data must start with a command"
		} else {
		    "unexpected character"
		};
		return Err(self.error(None, reason));
	    }
	    if !"MmLlHhVvQqTtCcSsAaZz".contains(c) {
		return Err(self.error(Some(c), "unknown command"));
	    }
	    if self.ops.is_empty() && c != 'M' && c != 'm' {
		return Err(self.error(Some(c), "path data must start with a moveto"));
	    }

	    self.rest = &self.rest[1..];

	    if c == 'Z' || c == 'z' {
		self.close();
		self.skip_whitespace();
		continue;
	    }

	    let mut command = c;
	    loop {
		self.segment(command)?;

		if !self.repeats() {
		    break;
		}
		// Coordinates after a moveto are implicit linetos.
		command = match command {
		    'M' => 'L',
		    'm' => 'l',
		    other => other,
		};
	    }

	    self.skip_whitespace();
	}

	Ok(())
    }

    fn close(&mut self) {
	if !self.closed {
	    self.ops.push(PathOp::Close);
	}
	self.current = self.subpath_start;
	self.previous = Previous::Other;
	self.closed = true;
    }

    /// Reopens the subpath at its start after a close.
    fn reopen(&mut self) {
	if self.closed {
	    self.ops.push(PathOp::MoveTo(self.subpath_start));
	    self.closed = false;
	}
    }

    /// Decodes one coordinate group. Any shortfall is reported at the start of
    /// the group.
    fn segment(&mut self, command: char) -> Result<()> {
	let start = self.position();

	self.segment_inner(command, command.is_ascii_lowercase()).map_err(|err| match err {
	    Error::MalformedPath { .. } => Error::MalformedPath {
		command: Some(command),
		position: start,
		reason: match arity(command) {
		    1 => "expected 1 coordinate",
		    2 => "expected 2 coordinates",
		    4 => "expected 4 coordinates",
		    6 => "expected 6 coordinates",
		    _ => "expected 7 arc parameters",
		},
	    },
	    other => other,
	})
    }

    fn segment_inner(&mut self, command: char, relative: bool) -> Result<()> {
	match command.to_ascii_uppercase() {
	    'M' => {
		let p = self.point(command, relative)?;
		self.ops.push(PathOp::MoveTo(p));
		self.subpath_start = p;
		self.closed = false;
		self.finish(p, Previous::Other);
	    },
	    'L' => {
		let p = self.point(command, relative)?;
		self.line_to(p);
	    },
	    'H' => {
		let x = self.number(command)?;
		let x = if relative { self.current.x + x } else { x };
		self.line_to(Point::new(x, self.current.y));
	    },
	    'V' => {
		let y = self.number(command)?;
		let y = if relative { self.current.y + y } else { y };
		self.line_to(Point::new(self.current.x, y));
	    },
	    'Q' => {
		let ctrl = self.point(command, relative)?;
		let p = self.point(command, relative)?;
		self.reopen();
		self.ops.push(PathOp::QuadTo(ctrl, p));
		self.finish(p, Previous::Quad(ctrl));
	    },
	    'T' => {
		let p = self.point(command, relative)?;
		let ctrl = match self.previous {
		    Previous::Quad(c) => c.reflect(self.current),
		    _ => self.current,
		};
		self.reopen();
		self.ops.push(PathOp::QuadTo(ctrl, p));
		self.finish(p, Previous::Quad(ctrl));
	    },
	    'C' => {
		let c1 = self.point(command, relative)?;
		let c2 = self.point(command, relative)?;
		let p = self.point(command, relative)?;
		self.reopen();
		self.ops.push(PathOp::CubicTo(c1, c2, p));
		self.finish(p, Previous::Cubic(c2));
	    },
	    'S' => {
		let c2 = self.point(command, relative)?;
		let p = self.point(command, relative)?;
		let c1 = match self.previous {
		    Previous::Cubic(c) => c.reflect(self.current),
		    _ => self.current,
		};
		self.reopen();
		self.ops.push(PathOp::CubicTo(c1, c2, p));
		self.finish(p, Previous::Cubic(c2));
	    },
	    'A' => {
		let rx = self.number(command)?;
		let ry = self.number(command)?;
		let rotation = self.number(command)?;
		let large_arc = self.flag(command)?;
		let sweep = self.flag(command)?;
		let p = self.point(command, relative)?;
		self.reopen();
		arc_to_cubics(self.current, rx, ry, rotation, large_arc, sweep, p, &mut self.ops);
		self.finish(p, Previous::Other);
	    },
	    _ => return Err(self.error(Some(command), "unknown command")),
	}

	Ok(())
    }

    fn line_to(&mut self, p: Point) {
	self.reopen();
	self.ops.push(PathOp::LineTo(p));
	self.finish(p, Previous::Other);
    }

    fn finish(&mut self, p: Point, previous: Previous) {
	self.current = p;
	self.previous = previous;
    }
}

/// Signed angle from `u` to `v`.
fn angle(u: Point, v: Point) -> f64 {
    (u.x * v.y - u.y * v.x).atan2(u.x * v.x + u.y * v.y)
}

/// Appends cubic Béziers approximating the elliptical arc from `from` to `to`,
/// one per quarter turn at most. Degenerate arcs become a single line.
#[allow(clippy::too_many_arguments)]
pub fn arc_to_cubics(
    from: Point,
    rx: f64,
    ry: f64,
    rotation: f64,
    large_arc: bool,
    sweep: bool,
    to: Point,
    ops: &mut Vec<PathOp>,
) {
    let mut rx = rx.abs();
    let mut ry = ry.abs();

    if rx < EPSILON || ry < EPSILON || from.approx_eq(to, EPSILON) {
	ops.push(PathOp::LineTo(to));
	return;
    }

    let (sin_phi, cos_phi) = rotation.to_radians().sin_cos();

    // Endpoint to center parameterization, in the ellipse's own axes.
    let half = (from - to) * 0.5;
    let x1 = cos_phi * half.x + sin_phi * half.y;
    let y1 = -sin_phi * half.x + cos_phi * half.y;

    let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
    if lambda > 1.0 {
	let s = lambda.sqrt();
	rx *= s;
	ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let numerator = rx2 * ry2 - rx2 * y1 * y1 - ry2 * x1 * x1;
    let denominator = rx2 * y1 * y1 + ry2 * x1 * x1;

    let mut coef = (numerator / denominator).max(0.0).sqrt();
    if large_arc == sweep {
	coef = -coef;
    }

    let cx1 = coef * rx * y1 / ry;
    let cy1 = -coef * ry * x1 / rx;

    let mid = (from + to) * 0.5;
    let center = Point::new(
	cos_phi * cx1 - sin_phi * cy1 + mid.x,
	sin_phi * cx1 + cos_phi * cy1 + mid.y,
    );

    let u = Point::new((x1 - cx1) / rx, (y1 - cy1) / ry);
    let v = Point::new((-x1 - cx1) / rx, (-y1 - cy1) / ry);

    let theta = angle(Point::new(1.0, 0.0), u);
    let mut delta = angle(u, v);
    if !sweep && delta > 0.0 {
	delta -= 2.0 * PI;
    } else if sweep && delta < 0.0 {
	delta += 2.0 * PI;
    }

    let segments = (delta.abs() / FRAC_PI_2 - EPSILON).ceil().max(1.0) as usize;
    let step = delta / segments as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    // Unit circle to document space.
    let to_document = |x: f64, y: f64| Point::new(
	center.x + rx * cos_phi * x - ry * sin_phi * y,
	center.y + rx * sin_phi * x + ry * cos_phi * y,
    );

    for i in 0..segments {
	let a1 = theta + step * i as f64;
	let a2 = a1 + step;
	let (sin1, cos1) = a1.sin_cos();
	let (sin2, cos2) = a2.sin_cos();

	let c1 = to_document(cos1 - k * sin1, sin1 + k * cos1);
	let c2 = to_document(cos2 + k * sin2, sin2 - k * cos2);
	let end = if i + 1 == segments { to } else { to_document(cos2, sin2) };

	ops.push(PathOp::CubicTo(c1, c2, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn assert_ops_eq(a: &[PathOp], b: &[PathOp]) {
	assert_eq!(a.len(), b.len(), "{:?} vs {:?}", a, b);

	for (x, y) in a.iter().zip(b) {
	    let same = match (x, y) {
		(PathOp::MoveTo(p), PathOp::MoveTo(q)) | (PathOp::LineTo(p), PathOp::LineTo(q)) => p.approx_eq(*q, TOLERANCE),
		(PathOp::QuadTo(p1, p2), PathOp::QuadTo(q1, q2)) => p1.approx_eq(*q1, TOLERANCE) && p2.approx_eq(*q2, TOLERANCE),
		(PathOp::CubicTo(p1, p2, p3), PathOp::CubicTo(q1, q2, q3)) => {
		    p1.approx_eq(*q1, TOLERANCE) && p2.approx_eq(*q2, TOLERANCE) && p3.approx_eq(*q3, TOLERANCE)
		},
		(PathOp::Close, PathOp::Close) => true,
		_ => false,
	    };
	    assert!(same, "{:?} != {:?}", x, y);
	}
    }

    fn pt(x: f64, y: f64) -> Point {
	Point::new(x, y)
    }

    #[test]
    fn decodes_absolute_commands() {
	let ops = decode_path("M0 0 L24 0 L24 24 Z").unwrap();

	assert_eq!(ops, vec![
	    PathOp::MoveTo(pt(0.0, 0.0)),
	    PathOp::LineTo(pt(24.0, 0.0)),
	    PathOp::LineTo(pt(24.0, 24.0)),
	    PathOp::Close,
	]);
    }

    #[test]
    fn relative_matches_absolute() {
	let absolute = decode_path("M10 10 L20 10 H30 V40 Q35 45 40 40 T50 40 C55 30 60 30 65 40 S75 50 80 40 A5 5 0 0 1 90 40 Z").unwrap();
	let relative = decode_path("m10 10 l10 0 h10 v30 q5 5 10 0 t10 0 c5-10 10-10 15 0 s10 10 15 0 a5 5 0 0 1 10 0 z").unwrap();

	assert_ops_eq(&absolute, &relative);
    }

    #[test]
    fn repeated_coordinates_continue_the_command() {
	let ops = decode_path("M1,2 3,4 5,6").unwrap();

	assert_eq!(ops, vec![
	    PathOp::MoveTo(pt(1.0, 2.0)),
	    PathOp::LineTo(pt(3.0, 4.0)),
	    PathOp::LineTo(pt(5.0, 6.0)),
	]);

	let ops = decode_path("m1 1 2 2l1-1-1-1").unwrap();
	assert_eq!(ops.last(), Some(&PathOp::LineTo(pt(3.0, 1.0))));
	assert_eq!(ops.len(), 4);
    }

    #[test]
    fn close_resets_the_current_point() {
	let ops = decode_path("M10 10 l5 0 l0 5 z l1 1").unwrap();

	assert_eq!(&ops[3..], &[
	    PathOp::Close,
	    PathOp::MoveTo(pt(10.0, 10.0)),
	    PathOp::LineTo(pt(11.0, 11.0)),
	]);
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
	let ops = decode_path("M0 0 C0 10 10 10 10 0 S20 -10 20 0").unwrap();
	assert_eq!(ops[2], PathOp::CubicTo(pt(10.0, -10.0), pt(20.0, -10.0), pt(20.0, 0.0)));
    }

    #[test]
    fn smooth_without_matching_curve_uses_current_point() {
	let ops = decode_path("M0 0 L10 0 S20 10 30 0").unwrap();
	assert_eq!(ops[2], PathOp::CubicTo(pt(10.0, 0.0), pt(20.0, 10.0), pt(30.0, 0.0)));

	let ops = decode_path("M0 0 C1 1 2 2 3 3 T10 0").unwrap();
	assert_eq!(ops[2], PathOp::QuadTo(pt(3.0, 3.0), pt(10.0, 0.0)));
    }

    #[test]
    fn smooth_quad_reflects_previous_control() {
	let ops = decode_path("M0 0 Q5 5 10 0 T20 0").unwrap();
	assert_eq!(ops[2], PathOp::QuadTo(pt(15.0, -5.0), pt(20.0, 0.0)));
    }

    #[test]
    fn arcs_become_cubics() {
	let ops = decode_path("M0 0 A10 10 0 0 1 20 0").unwrap();

	assert!(ops[1..].iter().all(|op| matches!(op, PathOp::CubicTo(..))));
	assert_eq!(ops.len(), 3);
	assert_eq!(ops.last().and_then(PathOp::end), Some(pt(20.0, 0.0)));

	// The half circle passes through (10, -10) with sweep=1 (y down).
	if let PathOp::CubicTo(_, _, mid) = ops[1] {
	    assert!(mid.approx_eq(pt(10.0, -10.0), 1e-9), "{:?}", mid);
	}
    }

    #[test]
    fn arc_flags_without_separators() {
	let ops = decode_path("M0 0 a10 10 0 1020 0").unwrap();
	assert_eq!(ops.last().and_then(PathOp::end), Some(pt(20.0, 0.0)));
    }

    #[test]
    fn small_radii_are_scaled_up() {
	let ops = decode_path("M0 0 A1 1 0 0 0 20 0").unwrap();
	if let PathOp::CubicTo(_, _, mid) = ops[1] {
	    assert!(mid.approx_eq(pt(10.0, 10.0), 1e-9), "{:?}", mid);
	}
    }

    #[test]
    fn degenerate_arcs_become_one_line() {
	for d in &["M0 0 A0 5 0 0 1 10 10", "M0 0 A5 0 0 0 1 10 10", "M3 3 A5 5 0 0 1 3 3"] {
	    let ops = decode_path(d).unwrap();
	    assert_eq!(ops.len(), 2, "{}", d);
	    assert!(matches!(ops[1], PathOp::LineTo(_)), "{}", d);
	}
    }

    #[test]
    fn rejects_unknown_commands() {
	assert_eq!(decode_path("M0 0 X1 1"), Err(Error::MalformedPath {
	    command: Some('X'),
	    position: 5,
	    reason: "unknown command",
	}));
    }

    #[test]
    fn rejects_coordinate_count_mismatch() {
	let err = decode_path("M0 0 Q1 1 2").unwrap_err();
	assert!(matches!(err, Error::MalformedPath { command: Some('Q'), position: 6, .. }), "{:?}", err);

	assert!(decode_path("M0 0 L").is_err());
	assert!(decode_path("M0 0 A1 1 0 2 1 5 5").is_err());
    }

    #[test]
    fn must_start_with_moveto() {
	assert!(matches!(decode_path("L1 1"), Err(Error::MalformedPath { command: Some('L'), position: 0, .. })));
	assert!(matches!(decode_path("1 1"), Err(Error::MalformedPath { command: None, .. })));
	assert_eq!(decode_path("  ").unwrap(), vec![]);
    }

    #[test]
    fn first_relative_moveto_is_absolute() {
	assert_eq!(decode_path("m5 5").unwrap(), vec![PathOp::MoveTo(pt(5.0, 5.0))]);
    }
}
