//! Numbers and lengths with units.
//!
//! Every coordinate, length and percentage attribute goes through here.
//! Lengths are normalized to device-independent pixels (96 per inch).

use std::str::FromStr;

use nom::{
    IResult,
    branch::alt,
    character::complete::{char, digit0, digit1, multispace0, multispace1, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use crate::error::{Error, Result};

pub const PX_PER_PT: f64 = 96.0 / 72.0;
pub const PX_PER_PC: f64 = 16.0;
pub const PX_PER_IN: f64 = 96.0;
pub const PX_PER_CM: f64 = 96.0 / 2.54;
pub const PX_PER_MM: f64 = 96.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Percent,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Unit> {
	Some(match suffix.to_ascii_lowercase().as_str() {
	    "" | "px" => Unit::Px,
	    "pt" => Unit::Pt,
	    "pc" => Unit::Pc,
	    "in" => Unit::In,
	    "cm" => Unit::Cm,
	    "mm" => Unit::Mm,
	    "%" => Unit::Percent,
	    _ => return None,
	})
    }

    /// Pixels per unit. Percentages are left unscaled.
    pub fn factor(self) -> f64 {
	match self {
	    Unit::Px | Unit::Percent => 1.0,
	    Unit::Pt => PX_PER_PT,
	    Unit::Pc => PX_PER_PC,
	    Unit::In => PX_PER_IN,
	    Unit::Cm => PX_PER_CM,
	    Unit::Mm => PX_PER_MM,
	}
    }
}

/// A decimal number: optional sign, integer and/or fractional part
/// (`1`, `1.`, `.5`), optional exponent.
pub(crate) fn number(input: &str) -> IResult<&str, f64> {
    let mantissa = alt((
	recognize(pair(digit1, opt(pair(char('.'), digit0)))),
	recognize(pair(char('.'), digit1)),
    ));
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));

    map_res(
	recognize(tuple((opt(one_of("+-")), mantissa, opt(exponent)))),
	|s: &str| s.parse::<f64>(),
    )(input)
}

fn comma_wsp(input: &str) -> IResult<&str, &str> {
    alt((
	recognize(tuple((multispace0, char(','), multispace0))),
	multispace1,
    ))(input)
}

/// Numbers separated by whitespace and/or commas, as in `viewBox` and
/// `points`.
pub fn parse_number_list(input: &str) -> Result<Vec<f64>> {
    let list = preceded(multispace0, many0(terminated(number, opt(comma_wsp))));

    all_consuming(list)(input)
	.map(|(_, numbers)| numbers)
	.map_err(|_| Error::MalformedNumber { token: input.to_string() })
}

/// Parses a single number, no unit allowed.
pub fn parse_number(token: &str) -> Result<f64> {
    all_consuming(delimited(multispace0, number, multispace0))(token)
	.map(|(_, n)| n)
	.map_err(|_| Error::MalformedNumber { token: token.to_string() })
}

/// Parses `token` into its value in pixels and whether it was a percentage.
/// Percentages are returned as written (`50%` is `50.0`).
pub fn parse_unit(token: &str) -> Result<(f64, bool)> {
    let malformed = || Error::MalformedNumber { token: token.to_string() };

    let (rest, value) = number(token.trim_start()).map_err(|_| malformed())?;
    let suffix = rest.trim();

    if suffix.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '+' || c == '-') {
	return Err(malformed());
    }

    let unit = Unit::from_suffix(suffix).ok_or_else(|| Error::UnknownUnit { unit: suffix.to_string() })?;

    Ok((value * unit.factor(), unit == Unit::Percent))
}

/// Result of [`parse_unit`], kept unresolved until the reference length is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub percentage: bool,
}

impl Length {
    pub const fn px(value: f64) -> Self {
	Length { value, percentage: false }
    }

    /// Pixels, with percentages taken of `reference`.
    pub fn resolve(self, reference: f64) -> f64 {
	if self.percentage {
	    self.value * reference / 100.0
	} else {
	    self.value
	}
    }
}

impl FromStr for Length {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	let (value, percentage) = parse_unit(s)?;
	Ok(Length { value, percentage })
    }
}

/// A plain number property value (`stroke-miterlimit`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number(pub f64);

impl FromStr for Number {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
	parse_number(s).map(Number)
    }
}
