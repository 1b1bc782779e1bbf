//! A backend that records draw commands instead of rasterizing them.
//!
//! Useful for tests, for caching a document at one size and for replaying a
//! frame into another backend later.

use crate::backend::{Backend, Drawer, Filler, StrokeOptions, Stroker};
use crate::color::{Pattern, Rgba};
use crate::path::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Fill,
    Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Point),
    Quad(Point, Point),
    Cubic(Point, Point, Point),
}

impl Segment {
    pub fn end(&self) -> Point {
	match *self {
	    Segment::Line(p) | Segment::Quad(_, p) | Segment::Cubic(_, _, p) => p,
	}
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub start: Point,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl Contour {
    /// Start point followed by every segment end point.
    pub fn vertices(&self) -> Vec<Point> {
	std::iter::once(self.start).chain(self.segments.iter().map(Segment::end)).collect()
    }
}

/// One committed fill or stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub kind: DrawKind,
    pub contours: Vec<Contour>,
    /// Winding rule of a fill, ignored for strokes.
    pub non_zero: bool,
    pub stroke: Option<StrokeOptions>,
    /// `None` until `draw` is called.
    pub pattern: Option<Pattern>,
    pub opacity: f64,
}

impl DrawCommand {
    fn new(kind: DrawKind) -> Self {
	DrawCommand {
	    kind,
	    contours: Vec::new(),
	    non_zero: true,
	    stroke: None,
	    pattern: None,
	    opacity: 1.0,
	}
    }

    fn reset(&mut self, kind: DrawKind) {
	self.kind = kind;
	self.contours.clear();
	self.non_zero = true;
	self.stroke = None;
	self.pattern = None;
	self.opacity = 1.0;
    }

    /// The final color for a plain color pattern, `current` otherwise.
    pub fn color(&self, current: Rgba) -> Option<Rgba> {
	let base = match self.pattern? {
	    Pattern::PlainColor(c) => c,
	    Pattern::CurrentColor => current,
	};

	Some(base.with_opacity(self.opacity))
    }

    fn segment(&mut self, segment: Segment) {
	match self.contours.last_mut() {
	    Some(contour) => contour.segments.push(segment),
	    // Segments before any `start` begin at the origin.
	    None => self.contours.push(Contour {
		start: Point::default(),
		segments: vec![segment],
		closed: false,
	    }),
	}
    }

    /// Feeds this command into a drawer of another backend.
    fn replay<D: Drawer + ?Sized>(&self, drawer: &mut D) {
	for contour in &self.contours {
	    drawer.start(contour.start);
	    for segment in &contour.segments {
		match *segment {
		    Segment::Line(p) => drawer.line_to(p),
		    Segment::Quad(c, p) => drawer.quad_to(c, p),
		    Segment::Cubic(c1, c2, p) => drawer.cubic_to(c1, c2, p),
		}
	    }
	    drawer.stop(contour.closed);
	}
    }
}

impl Drawer for DrawCommand {
    fn start(&mut self, point: Point) {
	self.contours.push(Contour { start: point, segments: Vec::new(), closed: false });
    }

    fn line_to(&mut self, point: Point) {
	self.segment(Segment::Line(point));
    }

    fn quad_to(&mut self, ctrl: Point, point: Point) {
	self.segment(Segment::Quad(ctrl, point));
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, point: Point) {
	self.segment(Segment::Cubic(ctrl1, ctrl2, point));
    }

    fn stop(&mut self, close_loop: bool) {
	if let Some(contour) = self.contours.last_mut() {
	    contour.closed = close_loop;
	}
    }

    fn draw(&mut self, pattern: &Pattern, opacity: f64) {
	self.pattern = Some(*pattern);
	self.opacity = opacity;
    }
}

impl Filler for DrawCommand {
    fn set_winding_rule(&mut self, non_zero: bool) {
	self.non_zero = non_zero;
    }
}

impl Stroker for DrawCommand {
    fn set_stroke_options(&mut self, options: StrokeOptions) {
	self.stroke = Some(options);
    }
}

/// Records every fill and stroke in paint order.
///
/// Command slots are reused across [`reset`](Recorder::reset), so drawing the
/// same document every frame stops allocating after the first one.
#[derive(Debug, Default)]
pub struct Recorder {
    slots: Vec<DrawCommand>,
    len: usize,
}

impl Recorder {
    pub fn new() -> Self {
	Self::default()
    }

    /// Forgets the recorded commands but keeps their buffers.
    pub fn reset(&mut self) {
	self.len = 0;
    }

    pub fn commands(&self) -> &[DrawCommand] {
	&self.slots[..self.len]
    }

    /// Commands that were set up but never drawn are skipped.
    pub fn replay_into(&self, backend: &mut dyn Backend) {
	for command in self.commands() {
	    let pattern = match command.pattern {
		Some(pattern) => pattern,
		None => continue,
	    };

	    match command.kind {
		DrawKind::Fill => {
		    if let (Some(filler), _) = backend.setup_drawers(true, false) {
			filler.set_winding_rule(command.non_zero);
			command.replay(&mut *filler);
			filler.draw(&pattern, command.opacity);
		    }
		},
		DrawKind::Stroke => {
		    if let (_, Some(stroker)) = backend.setup_drawers(false, true) {
			if let Some(options) = command.stroke {
			    stroker.set_stroke_options(options);
			}
			command.replay(&mut *stroker);
			stroker.draw(&pattern, command.opacity);
		    }
		},
	    }
	}
    }

    fn allocate(&mut self, kind: DrawKind) -> usize {
	if self.len == self.slots.len() {
	    self.slots.push(DrawCommand::new(kind));
	} else {
	    self.slots[self.len].reset(kind);
	}

	self.len += 1;
	self.len - 1
    }
}

impl Backend for Recorder {
    fn setup_drawers(&mut self, will_fill: bool, will_stroke: bool) -> (Option<&mut dyn Filler>, Option<&mut dyn Stroker>) {
	let fill = if will_fill { Some(self.allocate(DrawKind::Fill)) } else { None };
	let stroke = if will_stroke { Some(self.allocate(DrawKind::Stroke)) } else { None };

	match (fill, stroke) {
	    (Some(f), Some(s)) => {
		// `s` is always `f + 1`.
		let (head, tail) = self.slots.split_at_mut(s);
		(Some(&mut head[f] as &mut dyn Filler), Some(&mut tail[0] as &mut dyn Stroker))
	    },
	    (Some(f), None) => (Some(&mut self.slots[f] as &mut dyn Filler), None),
	    (None, Some(s)) => (None, Some(&mut self.slots[s] as &mut dyn Stroker)),
	    (None, None) => (None, None),
	}
    }
}
