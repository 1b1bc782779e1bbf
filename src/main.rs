use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use cairo::{Context, Format, ImageSurface};
use clap::Parser;
use gdk::{self, EventMask, EventType, WindowExt};
use log::{debug, info, trace};

use svgr::{CairoBackend, Document, Rgba, ViewBox};

/// Shows an SVG icon, re-rendered at the window size on every frame.
#[derive(Parser, Debug)]
#[command(name = "svg-viewer", version, about)]
struct Args {
    /// SVG file to show
    input: PathBuf,

    /// Initial window (or PNG) width
    #[arg(long, default_value_t = 400)]
    width: i32,

    /// Initial window (or PNG) height
    #[arg(long, default_value_t = 400)]
    height: i32,

    /// Global opacity in [0, 1]
    #[arg(long, default_value_t = 1.0)]
    opacity: f64,

    /// Render once into this PNG file and exit
    #[arg(long, value_name = "OUT")]
    png: Option<PathBuf>,

    /// Color used for `currentColor` paints
    #[arg(long, value_name = "COLOR", default_value = "black")]
    current_color: Rgba,
}

fn make_event_mask() -> EventMask {
    EventMask::empty()
	| EventMask::STRUCTURE_MASK
	| EventMask::EXPOSURE_MASK
	| EventMask::KEY_PRESS_MASK
}

fn make_win_attrs(screen: &gdk::Screen, title: String, width: i32, height: i32) -> gdk::WindowAttr {
    let display = screen.get_display();

    // Centered on the monitor under the pointer, if there is one.
    let geo = display
	.get_default_seat()
	.and_then(|seat| seat.get_pointer())
	.map(|pointer| pointer.get_position())
	.and_then(|(_, x, y)| display.get_monitor_at_point(x, y))
	.map(|monitor| monitor.get_geometry());

    gdk::WindowAttr {
	title: Some(title),
	x: geo.map(|g| g.x + (g.width - width) / 2),
	y: geo.map(|g| g.y + (g.height - height) / 2),
	width,
	height,
	event_mask: make_event_mask(),
	window_type: gdk::WindowType::Toplevel,
	..gdk::WindowAttr::default()
    }
}

/// The largest rectangle with the view box's aspect ratio centered in
/// `width`×`height`.
fn fit(view_box: ViewBox, width: f64, height: f64) -> (f64, f64, f64, f64) {
    let scale = (width / view_box.width).min(height / view_box.height);
    let w = view_box.width * scale;
    let h = view_box.height * scale;

    ((width - w) / 2.0, (height - h) / 2.0, w, h)
}

fn render(cr: &Context, doc: &Document, args: &Args, width: f64, height: f64) {
    let (x, y, w, h) = fit(doc.view_box(), width, height);
    let mut backend = CairoBackend::new(cr).with_current_color(args.current_color);

    doc.set_target(x, y, w, h).draw(&mut backend, args.opacity);
}

fn draw(window: &gdk::Window, doc: &Document, args: &Args) -> Option<()> {
    let vis_reg = window.get_visible_region()?;
    let frame = window.begin_draw_frame(&vis_reg)?;

    let mut ext = cairo::RectangleInt {
	x: 0,
	y: 0,
	width: 0,
	height: 0,
    };
    vis_reg.get_extents(&mut ext);

    if let Some(cr) = frame.get_cairo_context() {
	cr.set_source_rgb(1.0, 1.0, 1.0);
	cr.paint();
	render(&cr, doc, args, f64::from(ext.width), f64::from(ext.height));
    }

    window.end_draw_frame(&frame);
    Some(())
}

fn export_png(doc: &Document, args: &Args, out: &PathBuf) -> Result<(), Box<dyn Error>> {
    let surface = ImageSurface::create(Format::ARgb32, args.width, args.height)
	.map_err(|status| format!("cannot create {}x{} surface: {:?}", args.width, args.height, status))?;

    {
	let cr = Context::new(&surface);
	render(&cr, doc, args, f64::from(args.width), f64::from(args.height));
    }

    let mut file = File::create(out)?;
    surface
	.write_to_png(&mut file)
	.map_err(|err| format!("cannot write {}: {:?}", out.display(), err))?;

    info!("wrote {}", out.display());
    Ok(())
}

fn run_window(doc: &Document, args: &Args) -> Result<(), Box<dyn Error>> {
    gdk::init();

    let display = gdk::Display::get_default().ok_or("no default display")?;
    let screen = display.get_default_screen();
    let root_win = screen.get_root_window().ok_or("no root window")?;

    debug!("display name: {}", display.get_name());

    let title = args
	.input
	.file_name()
	.map_or_else(|| String::from("SVG"), |name| name.to_string_lossy().into_owned());
    let attrs = make_win_attrs(&screen, title, args.width, args.height);
    let window = gdk::Window::new(Some(&root_win), &attrs);

    window.show();

    let refresh_rate = 60; // 60 Hz

    'main: loop {
	std::thread::sleep(std::time::Duration::new(0, 1000_000_000 / refresh_rate));

	draw(&window, doc, args);

	while display.has_pending() {
	    if let Some(ev) = display.get_event() {
		trace!("event type: {}", ev.get_event_type());

		match ev.get_event_type() {
		    EventType::KeyPress => {
			match ev.get_keyval().and_then(std::char::from_u32) {
			    Some('q') => break 'main,
			    _ => continue,
			}
		    },
		    EventType::Delete => break 'main,
		    EventType::Configure => {
			debug!("resized to {}x{}", window.get_width(), window.get_height());
		    },
		    _ => continue,
		}
	    }
	}
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let doc = Document::from_reader(File::open(&args.input)?)?;
    info!("{}: {} shapes, viewBox {:?}", args.input.display(), doc.len(), doc.view_box());

    match &args.png {
	Some(out) => export_png(&doc, &args, out),
	None => run_window(&doc, &args),
    }
}
