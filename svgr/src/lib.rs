//! Parses a practical subset of SVG (icons, mostly) into paths with resolved
//! paint, and replays them into any [`Backend`] at any size.
//!
//! ```no_run
//! use svgr::{Document, Recorder};
//!
//! let doc = Document::parse(br##"<svg viewBox="0 0 24 24"><path d="M0 0H24V24z" fill="#f00"/></svg>"##)?;
//! let mut recorder = Recorder::new();
//! doc.set_target(0.0, 0.0, 48.0, 48.0).draw(&mut recorder, 1.0);
//! # Ok::<(), svgr::Error>(())
//! ```

pub mod backend;
#[cfg(feature = "cairo")]
pub mod cairo_backend;
pub mod color;
pub mod document;
pub mod error;
pub mod path;
pub mod record;
pub mod shapes;
pub mod style;
pub mod transform;
pub mod units;

pub use backend::{Backend, Drawer, Filler, StrokeOptions, Stroker, replay};
#[cfg(feature = "cairo")]
pub use cairo_backend::CairoBackend;
pub use color::{Paint, Pattern, Rgba};
pub use document::{Document, RenderTarget, Shape, Target, ViewBox};
pub use error::{Error, Result};
pub use path::{PathOp, Point, decode_path};
pub use record::{DrawCommand, DrawKind, Recorder};
pub use style::{FillRule, LineCap, LineJoin, Properties, Property, Style, resolve_style};
pub use transform::Transform;
pub use units::{Length, parse_unit};
