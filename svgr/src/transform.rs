//! The `transform` attribute: affine matrices applied at parse time, so path
//! operations come out in view box space.

use std::str::FromStr;

use nom::{
    IResult,
    branch::alt,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt},
    multi::{many0, many1},
    sequence::{delimited, preceded, terminated, tuple},
};

use crate::color::css_function;
use crate::error::{Error, Result};
use crate::path::{PathOp, Point};
use crate::units::number;

/// `| a c e |`
/// `| b d f |`, as in SVG's `matrix(a b c d e f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
	Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
	Transform { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
	Transform::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
	Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Clockwise in a y-down space, `degrees` about the origin.
    pub fn rotate(degrees: f64) -> Self {
	let (sin, cos) = degrees.to_radians().sin_cos();
	Transform::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn skew_x(degrees: f64) -> Self {
	Transform::new(1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(degrees: f64) -> Self {
	Transform::new(1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// `self × other`: `other` applies first, then `self`.
    pub fn multiply(&self, other: &Transform) -> Transform {
	Transform {
	    a: self.a * other.a + self.c * other.b,
	    b: self.b * other.a + self.d * other.b,
	    c: self.a * other.c + self.c * other.d,
	    d: self.b * other.c + self.d * other.d,
	    e: self.a * other.e + self.c * other.f + self.e,
	    f: self.b * other.e + self.d * other.f + self.f,
	}
    }

    pub fn is_identity(&self) -> bool {
	*self == Transform::IDENTITY
    }

    pub fn apply(&self, p: Point) -> Point {
	Point::new(
	    self.a * p.x + self.c * p.y + self.e,
	    self.b * p.x + self.d * p.y + self.f,
	)
    }

    pub fn apply_op(&self, op: &PathOp) -> PathOp {
	match *op {
	    PathOp::MoveTo(p) => PathOp::MoveTo(self.apply(p)),
	    PathOp::LineTo(p) => PathOp::LineTo(self.apply(p)),
	    PathOp::QuadTo(c, p) => PathOp::QuadTo(self.apply(c), self.apply(p)),
	    PathOp::CubicTo(c1, c2, p) => PathOp::CubicTo(self.apply(c1), self.apply(c2), self.apply(p)),
	    PathOp::Close => PathOp::Close,
	}
    }

    /// Mean length of the transformed unit axes, used to scale stroke widths.
    pub fn mean_scale(&self) -> f64 {
	(self.a.hypot(self.b) + self.c.hypot(self.d)) / 2.0
    }
}

fn args(input: &str) -> IResult<&str, Vec<f64>> {
    many1(terminated(delimited(multispace0, number, multispace0), opt(char(','))))(input)
}

/// One transform function. `None` when the argument count is wrong.
fn function(input: &str) -> IResult<&str, Option<Transform>> {
    alt((
	map(css_function("matrix", args), |v| match *v.as_slice() {
	    [a, b, c, d, e, f] => Some(Transform::new(a, b, c, d, e, f)),
	    _ => None,
	}),
	map(css_function("translate", args), |v| match *v.as_slice() {
	    [tx] => Some(Transform::translate(tx, 0.0)),
	    [tx, ty] => Some(Transform::translate(tx, ty)),
	    _ => None,
	}),
	map(css_function("scale", args), |v| match *v.as_slice() {
	    [s] => Some(Transform::scale(s, s)),
	    [sx, sy] => Some(Transform::scale(sx, sy)),
	    _ => None,
	}),
	map(css_function("rotate", args), |v| match *v.as_slice() {
	    [angle] => Some(Transform::rotate(angle)),
	    [angle, cx, cy] => Some(
		Transform::translate(cx, cy)
		    .multiply(&Transform::rotate(angle))
		    .multiply(&Transform::translate(-cx, -cy)),
	    ),
	    _ => None,
	}),
	map(css_function("skewX", args), |v| match *v.as_slice() {
	    [angle] => Some(Transform::skew_x(angle)),
	    _ => None,
	}),
	map(css_function("skewY", args), |v| match *v.as_slice() {
	    [angle] => Some(Transform::skew_y(angle)),
	    _ => None,
	}),
    ))(input)
}

fn transform_list(input: &str) -> IResult<&str, Vec<Option<Transform>>> {
    let separator = tuple((multispace0, opt(char(',')), multispace0));

    preceded(multispace0, many0(terminated(function, separator)))(input)
}

impl FromStr for Transform {
    type Err = Error;

    /// A transform list; functions compose left to right, so the rightmost
    /// applies first.
    fn from_str(s: &str) -> Result<Self> {
	let invalid = || Error::InvalidTransform { value: s.to_string() };
	let (_, functions) = all_consuming(transform_list)(s).map_err(|_| invalid())?;

	functions.into_iter().try_fold(Transform::IDENTITY, |acc, t| {
	    t.map(|t| acc.multiply(&t)).ok_or_else(invalid)
	})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn p(x: f64, y: f64) -> Point {
	Point::new(x, y)
    }

    #[test_case("translate(10)", p(11.0, 1.0))]
    #[test_case("translate(10, -2)", p(11.0, -1.0))]
    #[test_case("scale(2)", p(2.0, 2.0))]
    #[test_case("scale(2 3)", p(2.0, 3.0))]
    #[test_case("matrix(1 0 0 1 5 6)", p(6.0, 7.0))]
    #[test_case("rotate(90)", p(-1.0, 1.0))]
    #[test_case("rotate(180, 1, 0)", p(1.0, -1.0))]
    #[test_case("skewX(45)", p(2.0, 1.0))]
    #[test_case("", p(1.0, 1.0))]
    fn applies_functions(input: &str, expected: Point) {
	let t: Transform = input.parse().unwrap();
	assert!(t.apply(p(1.0, 1.0)).approx_eq(expected, 1e-9), "{:?}", t.apply(p(1.0, 1.0)));
    }

    #[test]
    fn lists_apply_right_to_left() {
	let t: Transform = "translate(10 0) scale(2)".parse().unwrap();
	assert_eq!(t.apply(p(1.0, 1.0)), p(12.0, 2.0));

	let t: Transform = "scale(2),translate(10 0)".parse().unwrap();
	assert_eq!(t.apply(p(1.0, 1.0)), p(22.0, 2.0));
    }

    #[test]
    fn maps_every_point_of_an_op() {
	let t = Transform::translate(1.0, 2.0);
	assert_eq!(
	    t.apply_op(&PathOp::CubicTo(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0))),
	    PathOp::CubicTo(p(1.0, 2.0), p(2.0, 3.0), p(3.0, 4.0)),
	);
	assert_eq!(t.apply_op(&PathOp::Close), PathOp::Close);
    }

    #[test]
    fn stroke_scale_ignores_rotation() {
	let t: Transform = "rotate(30) scale(3)".parse().unwrap();
	assert!((t.mean_scale() - 3.0).abs() < 1e-12);
	assert!(Transform::IDENTITY.is_identity());
    }

    #[test_case("translate(1 2 3)" ; "too many arguments")]
    #[test_case("rotate(1 2)" ; "rotate needs one or three")]
    #[test_case("spin(4)" ; "unknown function")]
    #[test_case("translate(1" ; "unclosed")]
    fn rejects_bad_transforms(input: &str) {
	assert_eq!(input.parse::<Transform>(), Err(Error::InvalidTransform { value: input.to_string() }));
    }
}
