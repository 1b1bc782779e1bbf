//! The capability contract a rendering backend implements.
//!
//! For every shape, [`Document`](crate::Document) asks the backend for the
//! drawers the shape needs, replays the geometry into each of them as contours
//! (`start`, segments, `stop`) and then commits it with `draw`. Filling is
//! replayed and drawn before stroking.

use crate::color::Pattern;
use crate::path::{PathOp, Point};
use crate::style::{LineCap, LineJoin};

/// Contour building shared by fillers and strokers.
pub trait Drawer {
    /// Begins a new contour at `point`.
    fn start(&mut self, point: Point);
    fn line_to(&mut self, point: Point);
    fn quad_to(&mut self, ctrl: Point, point: Point);
    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, point: Point);
    /// Ends the current contour, closing it back to its start if `close_loop`.
    fn stop(&mut self, close_loop: bool);
    /// Commits every contour accumulated since the drawer was handed out.
    /// `opacity` is already multiplied through the style and the caller's
    /// global opacity.
    fn draw(&mut self, pattern: &Pattern, opacity: f64);
}

pub trait Filler: Drawer {
    /// `true` for non-zero (the default), `false` for even-odd.
    fn set_winding_rule(&mut self, non_zero: bool);
}

/// Stroke parameters in target space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeOptions {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
}

pub trait Stroker: Drawer {
    fn set_stroke_options(&mut self, options: StrokeOptions);
}

/// A rendering backend. One instance must not be shared between concurrent
/// draws: the drawers it hands out accumulate geometry between
/// `setup_drawers` and `draw`.
pub trait Backend {
    /// Called once per shape. Returns drawers only for the roles requested.
    fn setup_drawers(&mut self, will_fill: bool, will_stroke: bool) -> (Option<&mut dyn Filler>, Option<&mut dyn Stroker>);
}

/// Feeds `ops` into `drawer` as contours, mapping every point through `map`.
pub fn replay<D, F>(ops: &[PathOp], map: F, drawer: &mut D)
where
    D: Drawer + ?Sized,
    F: Fn(Point) -> Point,
{
    let mut open = false;

    for op in ops {
	match *op {
	    PathOp::MoveTo(p) => {
		if open {
		    drawer.stop(false);
		}
		drawer.start(map(p));
		open = true;
	    },
	    PathOp::LineTo(p) => drawer.line_to(map(p)),
	    PathOp::QuadTo(c, p) => drawer.quad_to(map(c), map(p)),
	    PathOp::CubicTo(c1, c2, p) => drawer.cubic_to(map(c1), map(c2), map(p)),
	    PathOp::Close => {
		if open {
		    drawer.stop(true);
		    open = false;
		}
	    },
	}
    }

    if open {
	drawer.stop(false);
    }
}
