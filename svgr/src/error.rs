use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort [`Document::parse`](crate::Document::parse).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("malformed number: {token:?}")]
    MalformedNumber { token: String },

    #[error("unknown unit: {unit:?}")]
    UnknownUnit { unit: String },

    /// `position` is the byte offset into the path data.
    #[error("malformed path data at byte {position}{}: {reason}", command_suffix(.command))]
    MalformedPath {
	command: Option<char>,
	position: usize,
	reason: &'static str,
    },

    #[error("invalid color: {value:?}")]
    InvalidColor { value: String },

    /// A keyword property (`stroke-linecap`, `fill-rule`, ...) with an
    /// unknown value. The style resolver ignores these declarations.
    #[error("invalid keyword: {value:?}")]
    InvalidKeyword { value: String },

    #[error("invalid transform: {value:?}")]
    InvalidTransform { value: String },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("in {element}: {source}")]
    Element {
	element: String,
	#[source]
	source: Box<Error>,
    },
}

fn command_suffix(command: &Option<char>) -> String {
    match command {
	Some(c) => format!(" (command '{}')", c),
	None => String::new(),
    }
}

impl Error {
    ///Strips the element context and returns the error that caused it.
    pub fn root(&self) -> &Error {
	match self {
	    Error::Element { source, .. } => source.root(),
	    other => other,
	}
    }

    pub(crate) fn in_element(self, element: &str) -> Error {
	Error::Element {
	    element: element.to_string(),
	    source: Box::new(self),
	}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_unwraps_element_context() {
	let err = Error::UnknownUnit { unit: "em".into() }.in_element("<path id=\"a\">");

	assert_eq!(err.root(), &Error::UnknownUnit { unit: "em".into() });
	assert_eq!(err.to_string(), "in <path id=\"a\">: unknown unit: \"em\"");
    }

    #[test]
    fn path_error_names_command() {
	let err = Error::MalformedPath { command: Some('Q'), position: 4, reason: "expected 4 coordinates" };
	assert_eq!(err.to_string(), "malformed path data at byte 4 (command 'Q'): expected 4 coordinates");
    }
}
