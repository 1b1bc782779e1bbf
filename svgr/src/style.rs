//! Presentation attributes, `style` declarations and their resolution into a
//! drawable [`Style`].

use std::str::FromStr;

use log::warn;
use svg_macro::style_properties;

use crate::color::{Paint, Pattern, Rgba};
use crate::error::{Error, Result};
use crate::units::{Length, Number, parse_unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Inline,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Opacity clamped to `[0, 1]`; accepts numbers and percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opacity(pub f64);

fn keyword_error(s: &str) -> Error {
    Error::InvalidKeyword { value: s.to_string() }
}

impl FromStr for LineCap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	Ok(match s.to_lowercase().as_str() {
	    "butt" => Self::Butt,
	    "round" => Self::Round,
	    "square" => Self::Square,
	    _ => return Err(keyword_error(s)),
	})
    }
}

impl FromStr for LineJoin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	Ok(match s.to_lowercase().as_str() {
	    "miter" => Self::Miter,
	    "round" => Self::Round,
	    "bevel" => Self::Bevel,
	    "arcs" | "miter-clip" | "miterclip" => {
		warn!("line-join not implemented: {}, using miter", s);
		Self::Miter
	    },
	    _ => return Err(keyword_error(s)),
	})
    }
}

impl FromStr for FillRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	match s.to_lowercase().as_str() {
	    "nonzero" => Ok(Self::NonZero),
	    "evenodd" => Ok(Self::EvenOdd),
	    _ => Err(keyword_error(s)),
	}
    }
}

impl FromStr for DisplayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	if s.eq_ignore_ascii_case("none") {
	    Ok(DisplayMode::None)
	} else {
	    Ok(DisplayMode::Inline)
	}
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	match s.to_lowercase().as_str() {
	    "visible" => Ok(Self::Visible),
	    "hidden" | "collapse" => Ok(Self::Hidden),
	    _ => Err(keyword_error(s)),
	}
    }
}

impl FromStr for Opacity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	let (value, percentage) = parse_unit(s)?;
	let value = if percentage { value / 100.0 } else { value };

	Ok(Opacity(value.max(0.0).min(1.0)))
    }
}

#[style_properties(set = "Properties", error = "crate::error::Error")]
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Fill(Paint),
    FillOpacity(Opacity),
    FillRule(FillRule),
    Stroke(Paint),
    StrokeOpacity(Opacity),
    StrokeWidth(Length),
    StrokeLinecap(LineCap),
    StrokeLinejoin(LineJoin),
    StrokeMiterlimit(Number),
    Opacity(Opacity),
    Display(DisplayMode),
    Visibility(Visibility),
}

/// Parses one declaration. Unknown properties and `inherit` are `None`, which
/// leaves the property to the cascade. Declarations with an unknown keyword
/// are dropped with a warning; every other error is returned.
fn declaration(name: &str, value: &str) -> Result<Option<Property>> {
    if value.trim().eq_ignore_ascii_case("inherit") {
	return Ok(None);
    }

    match Property::parse(name, value) {
	None => Ok(None),
	Some(Ok(property)) => Ok(Some(property)),
	Some(Err(Error::InvalidKeyword { value })) => {
	    warn!("ignoring {}: unrecognized value {:?}", name.trim(), value);
	    Ok(None)
	},
	Some(Err(err)) => Err(err),
    }
}

impl Properties {
    /// Collects the properties set on one element: presentation attributes
    /// first, then the `style` attribute, which overrides them.
    pub fn from_attributes<'a, I>(attributes: I) -> Result<Properties>
    where
	I: IntoIterator<Item = (&'a str, &'a str)>,
    {
	let mut result = Properties::new();
	let mut style = None;

	for (name, value) in attributes {
	    if name == "style" {
		style = Some(value);
	    } else if let Some(property) = declaration(name, value)? {
		result.apply(property);
	    }
	}

	if let Some(style) = style {
	    result.apply_style(style)?;
	}

	Ok(result)
    }

    /// An element's own properties merged over the ones it inherits.
    pub fn cascade<'a, I>(attributes: I, inherited: &Properties) -> Result<Properties>
    where
	I: IntoIterator<Item = (&'a str, &'a str)>,
    {
	let mut properties = Properties::from_attributes(attributes)?;
	properties.inherit(inherited);

	Ok(properties)
    }

    /// Applies `name: value; ...` declarations in order.
    pub fn apply_style(&mut self, style: &str) -> Result<()> {
	for decl in style.split(';') {
	    let mut decl_pair = decl.splitn(2, ':');
	    let name = decl_pair.next().unwrap_or("");
	    let value = match decl_pair.next() {
		Some(v) => v,
		None => continue,
	    };

	    if let Some(property) = declaration(name, value)? {
		self.apply(property);
	    }
	}

	Ok(())
    }

    /// Resolves unset properties to their initial values. Percentage stroke
    /// widths are taken of `reference` (the normalized viewBox diagonal).
    pub fn resolve(&self, reference: f64) -> Style {
	let opacity = self.opacity.map_or(1.0, |o| o.0);

	Style {
	    fill_pattern: self.fill.unwrap_or(Paint::Color(Rgba::BLACK)).pattern(),
	    fill_opacity: self.fill_opacity.map_or(1.0, |o| o.0) * opacity,
	    fill_rule: self.fill_rule.unwrap_or(FillRule::NonZero),
	    stroke_pattern: self.stroke.unwrap_or(Paint::None).pattern(),
	    stroke_opacity: self.stroke_opacity.map_or(1.0, |o| o.0) * opacity,
	    stroke_width: self.stroke_width.map_or(1.0, |w| w.resolve(reference)),
	    line_cap: self.stroke_linecap.unwrap_or(LineCap::Butt),
	    line_join: self.stroke_linejoin.unwrap_or(LineJoin::Miter),
	    miter_limit: self.stroke_miterlimit.map_or(4.0, |n| n.0),
	}
    }
}

/// Resolved paint and stroke geometry of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill_pattern: Option<Pattern>,
    pub fill_opacity: f64,
    pub fill_rule: FillRule,
    pub stroke_pattern: Option<Pattern>,
    pub stroke_opacity: f64,
    pub stroke_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
}

impl Default for Style {
    fn default() -> Self {
	Properties::new().resolve(0.0)
    }
}

impl Style {
    pub fn will_fill(&self) -> bool {
	self.fill_pattern.is_some()
    }

    pub fn will_stroke(&self) -> bool {
	self.stroke_pattern.is_some() && self.stroke_width > 0.0
    }
}

/// Merges an element's own attributes over `inherited` and resolves the
/// result. Later declarations win, `style` beats presentation attributes.
pub fn resolve_style<'a, I>(attributes: I, inherited: &Properties, reference: f64) -> Result<Style>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    Ok(Properties::cascade(attributes, inherited)?.resolve(reference))
}
