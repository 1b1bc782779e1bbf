//! Basic shapes normalized to path operations.

use crate::path::{PathOp, Point};

/// Distance of the control points from the corner for a quarter circle of
/// radius 1.
const KAPPA: f64 = 0.552_284_749_831;

/// Quarter ellipse from `from` to `to` around `corner`, the corner of the
/// bounding box the arc is inscribed in.
fn quarter(from: Point, corner: Point, to: Point) -> PathOp {
    PathOp::CubicTo(
	from + (corner - from) * KAPPA,
	to + (corner - to) * KAPPA,
	to,
    )
}

/// A rectangle, optionally with rounded corners. `rx`/`ry` are clamped to
/// half the width/height. Empty rectangles produce no geometry.
pub fn rectangle(x: f64, y: f64, width: f64, height: f64, rx: f64, ry: f64) -> Vec<PathOp> {
    if width <= 0.0 || height <= 0.0 {
	return Vec::new();
    }

    let rx = rx.max(0.0).min(width / 2.0);
    let ry = ry.max(0.0).min(height / 2.0);
    let right = x + width;
    let bottom = y + height;

    if rx == 0.0 || ry == 0.0 {
	return vec![
	    PathOp::MoveTo(Point::new(x, y)),
	    PathOp::LineTo(Point::new(right, y)),
	    PathOp::LineTo(Point::new(right, bottom)),
	    PathOp::LineTo(Point::new(x, bottom)),
	    PathOp::Close,
	];
    }

    vec![
	PathOp::MoveTo(Point::new(x + rx, y)),
	PathOp::LineTo(Point::new(right - rx, y)),
	quarter(Point::new(right - rx, y), Point::new(right, y), Point::new(right, y + ry)),
	PathOp::LineTo(Point::new(right, bottom - ry)),
	quarter(Point::new(right, bottom - ry), Point::new(right, bottom), Point::new(right - rx, bottom)),
	PathOp::LineTo(Point::new(x + rx, bottom)),
	quarter(Point::new(x + rx, bottom), Point::new(x, bottom), Point::new(x, bottom - ry)),
	PathOp::LineTo(Point::new(x, y + ry)),
	quarter(Point::new(x, y + ry), Point::new(x, y), Point::new(x + rx, y)),
	PathOp::Close,
    ]
}

pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<PathOp> {
    if rx <= 0.0 || ry <= 0.0 {
	return Vec::new();
    }

    let right = Point::new(cx + rx, cy);
    let bottom = Point::new(cx, cy + ry);
    let left = Point::new(cx - rx, cy);
    let top = Point::new(cx, cy - ry);

    vec![
	PathOp::MoveTo(right),
	quarter(right, Point::new(cx + rx, cy + ry), bottom),
	quarter(bottom, Point::new(cx - rx, cy + ry), left),
	quarter(left, Point::new(cx - rx, cy - ry), top),
	quarter(top, Point::new(cx + rx, cy - ry), right),
	PathOp::Close,
    ]
}

pub fn circle(cx: f64, cy: f64, r: f64) -> Vec<PathOp> {
    ellipse(cx, cy, r, r)
}

pub fn line(from: Point, to: Point) -> Vec<PathOp> {
    vec![PathOp::MoveTo(from), PathOp::LineTo(to)]
}

/// Connects `points` in order. Polygons are closed. A dangling odd coordinate
/// is dropped.
pub fn poly(points: &[f64], closed: bool) -> Vec<PathOp> {
    let mut ops: Vec<PathOp> = points
	.chunks_exact(2)
	.enumerate()
	.map(|(i, xy)| {
	    let p = Point::new(xy[0], xy[1]);
	    if i == 0 { PathOp::MoveTo(p) } else { PathOp::LineTo(p) }
	})
	.collect();

    if closed && !ops.is_empty() {
	ops.push(PathOp::Close);
    }

    ops
}
