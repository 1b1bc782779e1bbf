//! Immediate raster backend drawing into a `cairo::Context`.

use cairo::Context;

use crate::backend::{Backend, Drawer, Filler, StrokeOptions, Stroker};
use crate::color::{Pattern, Rgba};
use crate::path::Point;
use crate::style::{LineCap, LineJoin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Fill,
    Stroke,
}

/// Issues path commands straight onto the context.
///
/// Filler and stroker share the context's current path, so one of them has to
/// be drawn before the other is fed, which is how
/// [`Document::draw`](crate::Document::draw) uses them.
pub struct CairoDrawer {
    context: Context,
    role: Role,
    current: Point,
    current_color: Rgba,
}

impl CairoDrawer {
    fn new(context: Context, role: Role) -> Self {
	CairoDrawer { context, role, current: Point::default(), current_color: Rgba::BLACK }
    }
}

impl Drawer for CairoDrawer {
    fn start(&mut self, point: Point) {
	self.context.move_to(point.x, point.y);
	self.current = point;
    }

    fn line_to(&mut self, point: Point) {
	self.context.line_to(point.x, point.y);
	self.current = point;
    }

    fn quad_to(&mut self, ctrl: Point, point: Point) {
	// Degree elevation: cairo only knows cubics.
	let c1 = self.current + (ctrl - self.current) * (2.0 / 3.0);
	let c2 = point + (ctrl - point) * (2.0 / 3.0);
	self.cubic_to(c1, c2, point);
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, point: Point) {
	self.context.curve_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, point.x, point.y);
	self.current = point;
    }

    fn stop(&mut self, close_loop: bool) {
	if close_loop {
	    self.context.close_path();
	}
    }

    fn draw(&mut self, pattern: &Pattern, opacity: f64) {
	let color = match *pattern {
	    Pattern::PlainColor(c) => c,
	    Pattern::CurrentColor => self.current_color,
	};
	let (r, g, b, a) = color.with_opacity(opacity).to_unit();

	self.context.set_source_rgba(r, g, b, a);
	match self.role {
	    Role::Fill => self.context.fill(),
	    Role::Stroke => self.context.stroke(),
	}
    }
}

impl Filler for CairoDrawer {
    fn set_winding_rule(&mut self, non_zero: bool) {
	self.context.set_fill_rule(if non_zero { cairo::FillRule::Winding } else { cairo::FillRule::EvenOdd });
    }
}

impl Stroker for CairoDrawer {
    fn set_stroke_options(&mut self, options: StrokeOptions) {
	self.context.set_line_width(options.width);
	self.context.set_line_cap(match options.cap {
	    LineCap::Butt => cairo::LineCap::Butt,
	    LineCap::Round => cairo::LineCap::Round,
	    LineCap::Square => cairo::LineCap::Square,
	});
	self.context.set_line_join(match options.join {
	    LineJoin::Miter => cairo::LineJoin::Miter,
	    LineJoin::Round => cairo::LineJoin::Round,
	    LineJoin::Bevel => cairo::LineJoin::Bevel,
	});
	self.context.set_miter_limit(options.miter_limit);
    }
}

/// Renders onto a cairo context, e.g. a gdk window frame or an image surface.
///
/// Cairo errors are sticky on the context and are not reported here.
pub struct CairoBackend {
    filler: CairoDrawer,
    stroker: CairoDrawer,
}

impl CairoBackend {
    pub fn new(context: &Context) -> Self {
	CairoBackend {
	    filler: CairoDrawer::new(context.clone(), Role::Fill),
	    stroker: CairoDrawer::new(context.clone(), Role::Stroke),
	}
    }

    /// Color used for `currentColor` paints, black by default.
    pub fn with_current_color(mut self, color: Rgba) -> Self {
	self.filler.current_color = color;
	self.stroker.current_color = color;
	self
    }
}

impl Backend for CairoBackend {
    fn setup_drawers(&mut self, will_fill: bool, will_stroke: bool) -> (Option<&mut dyn Filler>, Option<&mut dyn Stroker>) {
	self.filler.context.new_path();

	let filler = if will_fill { Some(&mut self.filler as &mut dyn Filler) } else { None };
	let stroker = if will_stroke { Some(&mut self.stroker as &mut dyn Stroker) } else { None };

	(filler, stroker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use cairo::{Format, ImageSurface};

    /// Renders `source` at `size`×`size` and returns the surface's BGRA
    /// (little-endian ARGB32) pixel at `(x, y)`.
    fn pixel(source: &str, size: i32, color: Rgba, x: usize, y: usize) -> [u8; 4] {
	let doc = Document::parse_str(source).unwrap();
	let mut surface = ImageSurface::create(Format::ARgb32, size, size).unwrap();

	{
	    let context = Context::new(&surface);
	    let mut backend = CairoBackend::new(&context).with_current_color(color);
	    doc.set_target(0.0, 0.0, f64::from(size), f64::from(size)).draw(&mut backend, 1.0);
	}

	surface.flush();
	let stride = surface.get_stride() as usize;
	let data = surface.get_data().unwrap();
	let i = y * stride + x * 4;
	[data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn fills_scaled_shape() {
	let source = r##"<svg viewBox="0 0 24 24"><path d="M0 0 L24 0 L24 24 Z" fill="#FF0000"/></svg>"##;

	assert_eq!(pixel(source, 100, Rgba::BLACK, 90, 10), [0, 0, 255, 255]);
	assert_eq!(pixel(source, 100, Rgba::BLACK, 10, 90), [0, 0, 0, 0]);
    }

    #[test]
    fn current_color_comes_from_the_backend() {
	let source = r#"<svg viewBox="0 0 2 2"><rect width="2" height="2" fill="currentColor"/></svg>"#;
	assert_eq!(pixel(source, 10, Rgba::rgb(0, 255, 0), 5, 5), [0, 255, 0, 255]);
    }

    #[test]
    fn strokes_are_drawn_over_fills() {
	let source = r#"<svg viewBox="0 0 10 10">
	    <rect x="2" y="2" width="6" height="6" fill="blue" stroke="white" stroke-width="2"/>
	</svg>"#;

	assert_eq!(pixel(source, 10, Rgba::BLACK, 5, 5), [255, 0, 0, 255]);
	assert_eq!(pixel(source, 10, Rgba::BLACK, 2, 5), [255, 255, 255, 255]);
    }
}
