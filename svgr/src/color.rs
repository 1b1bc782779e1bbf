//! Color literals and paint values.

use std::str::FromStr;

use log::warn;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, multispace0, space0},
    combinator::{all_consuming, map, opt},
    multi::many1,
    sequence::{delimited, pair, terminated},
};

use crate::error::{Error, Result};
use crate::units::number;

/// Non-premultiplied 8-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
	Rgba { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
	Rgba { r, g, b, a: 255 }
    }

    /// Scales alpha by `opacity`: `round(a * opacity)`. Opacity at or above 1
    /// leaves the color unchanged; below 0 (or NaN) makes it transparent.
    pub fn with_opacity(self, opacity: f64) -> Rgba {
	if opacity >= 1.0 {
	    return self;
	}

	let opacity = opacity.max(0.0);
	Rgba { a: (f64::from(self.a) * opacity).round() as u8, ..self }
    }

    /// Components in `[0, 1]`.
    pub fn to_unit(self) -> (f64, f64, f64, f64) {
	(
	    f64::from(self.r) / 255.0,
	    f64::from(self.g) / 255.0,
	    f64::from(self.b) / 255.0,
	    f64::from(self.a) / 255.0,
	)
    }
}

fn snd<T, U>(input: (U, T)) -> T { input.1 }

/// `name(args)`, with the name matched case-insensitively.
pub(crate) fn css_function<'a, F, O>(
    name: &'static str,
    arg_parser: F,
) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: Parser<&'a str, O, nom::error::Error<&'a str>>,
{
    let mut parser = tag_no_case(name)
	.and(space0)
	.and(delimited(char('('), arg_parser, char(')')))
	.map(snd);

    move |s| parser.parse(s)
}

/// One `rgb()` argument and whether it was a percentage.
fn rgb_component(input: &str) -> IResult<&str, (f64, bool)> {
    delimited(
	multispace0,
	pair(number, map(opt(char('%')), |p| p.is_some())),
	multispace0,
    )(input)
}

fn rgb_args(input: &str) -> IResult<&str, Vec<(f64, bool)>> {
    many1(terminated(rgb_component, opt(alt((char(','), char('/'))))))(input)
}

fn channel((value, percentage): (f64, bool)) -> u8 {
    let value = if percentage { value * 255.0 / 100.0 } else { value };
    value.round().max(0.0).min(255.0) as u8
}

fn alpha_channel((value, percentage): (f64, bool)) -> u8 {
    let value = if percentage { value / 100.0 } else { value };
    (value.max(0.0).min(1.0) * 255.0).round() as u8
}

fn parse_functional(s: &str) -> Option<Rgba> {
    let mut parser = all_consuming(alt((css_function("rgba", rgb_args), css_function("rgb", rgb_args))));
    let (_, args) = parser(s).ok()?;

    match args.as_slice() {
	[r, g, b] => Some(Rgba::rgb(channel(*r), channel(*g), channel(*b))),
	[r, g, b, a] => Some(Rgba::new(channel(*r), channel(*g), channel(*b), alpha_channel(*a))),
	_ => None,
    }
}

fn parse_hex(s: &str) -> Option<Rgba> {
    let digits = s.strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
	return None;
    }

    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&digits[i..=i], 16).ok().map(|v| v * 17);

    match digits.len() {
	3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
	4 => Some(Rgba::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
	6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
	8 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
	_ => None,
    }
}

fn parse_named(s: &str) -> Option<Rgba> {
    let name = s.to_ascii_lowercase();
    if name == "transparent" {
	return Some(Rgba::TRANSPARENT);
    }

    NAMED_COLORS
	.binary_search_by(|(n, _)| n.cmp(&name.as_str()))
	.ok()
	.map(|i| {
	    let (r, g, b) = NAMED_COLORS[i].1;
	    Rgba::rgb(r, g, b)
	})
}

impl FromStr for Rgba {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	let s = s.trim();

	let parsed = if s.starts_with('#') {
	    parse_hex(s)
	} else if s.contains('(') {
	    parse_functional(s)
	} else {
	    parse_named(s)
	};

	parsed.ok_or_else(|| Error::InvalidColor { value: s.to_string() })
    }
}

/// Paint as resolved for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    PlainColor(Rgba),
    /// Resolved by the backend at draw time.
    CurrentColor,
}

/// A `fill`/`stroke` value as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    None,
    CurrentColor,
    Color(Rgba),
}

impl Paint {
    pub fn pattern(self) -> Option<Pattern> {
	match self {
	    Paint::None => None,
	    Paint::CurrentColor => Some(Pattern::CurrentColor),
	    Paint::Color(c) => Some(Pattern::PlainColor(c)),
	}
    }
}

impl FromStr for Paint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	let s = s.trim();

	if s.eq_ignore_ascii_case("none") {
	    return Ok(Paint::None);
	}
	if s.eq_ignore_ascii_case("currentcolor") {
	    return Ok(Paint::CurrentColor);
	}

	// url(#gradient) [fallback]
	if s.get(..4).map_or(false, |p| p.eq_ignore_ascii_case("url(")) {
	    let fallback = s.find(')').map(|i| s[i + 1..].trim()).unwrap_or("");
	    if fallback.is_empty() {
		warn!("paint server {} is not supported, element is not painted", s);
		return Ok(Paint::None);
	    }
	    return fallback.parse();
	}

	s.parse().map(Paint::Color)
    }
}

/// CSS color keywords, sorted for binary search.
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("aliceblue", (240, 248, 255)),
    ("antiquewhite", (250, 235, 215)),
    ("aqua", (0, 255, 255)),
    ("aquamarine", (127, 255, 212)),
    ("azure", (240, 255, 255)),
    ("beige", (245, 245, 220)),
    ("bisque", (255, 228, 196)),
    ("black", (0, 0, 0)),
    ("blanchedalmond", (255, 235, 205)),
    ("blue", (0, 0, 255)),
    ("blueviolet", (138, 43, 226)),
    ("brown", (165, 42, 42)),
    ("burlywood", (222, 184, 135)),
    ("cadetblue", (95, 158, 160)),
    ("chartreuse", (127, 255, 0)),
    ("chocolate", (210, 105, 30)),
    ("coral", (255, 127, 80)),
    ("cornflowerblue", (100, 149, 237)),
    ("cornsilk", (255, 248, 220)),
    ("crimson", (220, 20, 60)),
    ("cyan", (0, 255, 255)),
    ("darkblue", (0, 0, 139)),
    ("darkcyan", (0, 139, 139)),
    ("darkgoldenrod", (184, 134, 11)),
    ("darkgray", (169, 169, 169)),
    ("darkgreen", (0, 100, 0)),
    ("darkgrey", (169, 169, 169)),
    ("darkkhaki", (189, 183, 107)),
    ("darkmagenta", (139, 0, 139)),
    ("darkolivegreen", (85, 107, 47)),
    ("darkorange", (255, 140, 0)),
    ("darkorchid", (153, 50, 204)),
    ("darkred", (139, 0, 0)),
    ("darksalmon", (233, 150, 122)),
    ("darkseagreen", (143, 188, 143)),
    ("darkslateblue", (72, 61, 139)),
    ("darkslategray", (47, 79, 79)),
    ("darkslategrey", (47, 79, 79)),
    ("darkturquoise", (0, 206, 209)),
    ("darkviolet", (148, 0, 211)),
    ("deeppink", (255, 20, 147)),
    ("deepskyblue", (0, 191, 255)),
    ("dimgray", (105, 105, 105)),
    ("dimgrey", (105, 105, 105)),
    ("dodgerblue", (30, 144, 255)),
    ("firebrick", (178, 34, 34)),
    ("floralwhite", (255, 250, 240)),
    ("forestgreen", (34, 139, 34)),
    ("fuchsia", (255, 0, 255)),
    ("gainsboro", (220, 220, 220)),
    ("ghostwhite", (248, 248, 255)),
    ("gold", (255, 215, 0)),
    ("goldenrod", (218, 165, 32)),
    ("gray", (128, 128, 128)),
    ("green", (0, 128, 0)),
    ("greenyellow", (173, 255, 47)),
    ("grey", (128, 128, 128)),
    ("honeydew", (240, 255, 240)),
    ("hotpink", (255, 105, 180)),
    ("indianred", (205, 92, 92)),
    ("indigo", (75, 0, 130)),
    ("ivory", (255, 255, 240)),
    ("khaki", (240, 230, 140)),
    ("lavender", (230, 230, 250)),
    ("lavenderblush", (255, 240, 245)),
    ("lawngreen", (124, 252, 0)),
    ("lemonchiffon", (255, 250, 205)),
    ("lightblue", (173, 216, 230)),
    ("lightcoral", (240, 128, 128)),
    ("lightcyan", (224, 255, 255)),
    ("lightgoldenrodyellow", (250, 250, 210)),
    ("lightgray", (211, 211, 211)),
    ("lightgreen", (144, 238, 144)),
    ("lightgrey", (211, 211, 211)),
    ("lightpink", (255, 182, 193)),
    ("lightsalmon", (255, 160, 122)),
    ("lightseagreen", (32, 178, 170)),
    ("lightskyblue", (135, 206, 250)),
    ("lightslategray", (119, 136, 153)),
    ("lightslategrey", (119, 136, 153)),
    ("lightsteelblue", (176, 196, 222)),
    ("lightyellow", (255, 255, 224)),
    ("lime", (0, 255, 0)),
    ("limegreen", (50, 205, 50)),
    ("linen", (250, 240, 230)),
    ("magenta", (255, 0, 255)),
    ("maroon", (128, 0, 0)),
    ("mediumaquamarine", (102, 205, 170)),
    ("mediumblue", (0, 0, 205)),
    ("mediumorchid", (186, 85, 211)),
    ("mediumpurple", (147, 112, 219)),
    ("mediumseagreen", (60, 179, 113)),
    ("mediumslateblue", (123, 104, 238)),
    ("mediumspringgreen", (0, 250, 154)),
    ("mediumturquoise", (72, 209, 204)),
    ("mediumvioletred", (199, 21, 133)),
    ("midnightblue", (25, 25, 112)),
    ("mintcream", (245, 255, 250)),
    ("mistyrose", (255, 228, 225)),
    ("moccasin", (255, 228, 181)),
    ("navajowhite", (255, 222, 173)),
    ("navy", (0, 0, 128)),
    ("oldlace", (253, 245, 230)),
    ("olive", (128, 128, 0)),
    ("olivedrab", (107, 142, 35)),
    ("orange", (255, 165, 0)),
    ("orangered", (255, 69, 0)),
    ("orchid", (218, 112, 214)),
    ("palegoldenrod", (238, 232, 170)),
    ("palegreen", (152, 251, 152)),
    ("paleturquoise", (175, 238, 238)),
    ("palevioletred", (219, 112, 147)),
    ("papayawhip", (255, 239, 213)),
    ("peachpuff", (255, 218, 185)),
    ("peru", (205, 133, 63)),
    ("pink", (255, 192, 203)),
    ("plum", (221, 160, 221)),
    ("powderblue", (176, 224, 230)),
    ("purple", (128, 0, 128)),
    ("rebeccapurple", (102, 51, 153)),
    ("red", (255, 0, 0)),
    ("rosybrown", (188, 143, 143)),
    ("royalblue", (65, 105, 225)),
    ("saddlebrown", (139, 69, 19)),
    ("salmon", (250, 128, 114)),
    ("sandybrown", (244, 164, 96)),
    ("seagreen", (46, 139, 87)),
    ("seashell", (255, 245, 238)),
    ("sienna", (160, 82, 45)),
    ("silver", (192, 192, 192)),
    ("skyblue", (135, 206, 235)),
    ("slateblue", (106, 90, 205)),
    ("slategray", (112, 128, 144)),
    ("slategrey", (112, 128, 144)),
    ("snow", (255, 250, 250)),
    ("springgreen", (0, 255, 127)),
    ("steelblue", (70, 130, 180)),
    ("tan", (210, 180, 140)),
    ("teal", (0, 128, 128)),
    ("thistle", (216, 191, 216)),
    ("tomato", (255, 99, 71)),
    ("turquoise", (64, 224, 208)),
    ("violet", (238, 130, 238)),
    ("wheat", (245, 222, 179)),
    ("white", (255, 255, 255)),
    ("whitesmoke", (245, 245, 245)),
    ("yellow", (255, 255, 0)),
    ("yellowgreen", (154, 205, 50)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn named_colors_are_sorted() {
	assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test_case("#FF0000", Rgba::rgb(255, 0, 0); "long hex")]
    #[test_case("#f00", Rgba::rgb(255, 0, 0); "short hex")]
    #[test_case("#0000ff80", Rgba::new(0, 0, 255, 128); "hex with alpha")]
    #[test_case("#0f08", Rgba::new(0, 255, 0, 136); "short hex with alpha")]
    #[test_case("CornflowerBlue", Rgba::rgb(100, 149, 237); "named")]
    #[test_case("transparent", Rgba::TRANSPARENT; "transparent")]
    #[test_case("rgb(10, 20, 30)", Rgba::rgb(10, 20, 30); "rgb")]
    #[test_case("rgb(100%,0%,50%)", Rgba::rgb(255, 0, 128); "rgb percent")]
    #[test_case("rgba(255,255,255,0.5)", Rgba::new(255, 255, 255, 128); "rgba")]
    #[test_case("RGB (1 2 3)", Rgba::rgb(1, 2, 3); "space separated")]
    fn parses_colors(input: &str, expected: Rgba) {
	assert_eq!(input.parse::<Rgba>().unwrap(), expected);
    }

    #[test_case("#ff0000f"; "bad hex length")]
    #[test_case("#gggggg"; "non hex digits")]
    #[test_case("notacolor"; "unknown name")]
    #[test_case("rgb(1,2)"; "too few components")]
    fn rejects_bad_colors(input: &str) {
	assert!(matches!(input.parse::<Rgba>(), Err(Error::InvalidColor { .. })));
    }

    #[test]
    fn opacity_scales_alpha() {
	let red = Rgba::rgb(255, 0, 0);

	assert_eq!(red.with_opacity(0.5).a, 128);
	assert_eq!(red.with_opacity(0.0).a, 0);
	assert_eq!(red.with_opacity(1.0), red);
	assert_eq!(Rgba::new(255, 0, 0, 100).with_opacity(0.5).a, 50);

	let mut last = 0;
	for step in 0..=100 {
	    let a = red.with_opacity(f64::from(step) / 100.0).a;
	    assert!(a >= last);
	    last = a;
	}
	assert_eq!(last, 255);
    }

    #[test]
    fn paints() {
	assert_eq!("none".parse::<Paint>().unwrap(), Paint::None);
	assert_eq!("currentColor".parse::<Paint>().unwrap(), Paint::CurrentColor);
	assert_eq!("url(#grad) #00f".parse::<Paint>().unwrap(), Paint::Color(Rgba::rgb(0, 0, 255)));
	assert_eq!("url(#grad)".parse::<Paint>().unwrap(), Paint::None);
	assert_eq!(Paint::CurrentColor.pattern(), Some(Pattern::CurrentColor));
	assert_eq!(Paint::None.pattern(), None);
    }
}
