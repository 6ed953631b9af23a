//! Error types.
//!
//! There are two layers. [`Error`] is raised synchronously to the caller for
//! structural problems: construction, broadcasting, selection, assignment.
//! [`ElementError`] is what a single element operation reports; inside a
//! tabularized call it is normally captured into a [`Failure`] value instead
//! of being raised.
//!
//! [`Failure`]: super::Failure

use std::fmt::{self};

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors raised by tables, index maps, broadcasting and engines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument has the wrong kind.
    #[error("TypeError: {0}")]
    Type(String),

    /// An argument has the right kind but an invalid value.
    #[error("ValueError: {0}")]
    Value(String),

    /// A position is out of bounds.
    #[error("IndexError: {0}")]
    Index(String),

    /// A dimension or label does not exist.
    #[error("KeyError: {0}")]
    Key(String),

    /// Attribute resolution failed.
    #[error("AttributeError: {0}")]
    Attribute(String),

    /// Two tables do not have compatible shapes.
    #[error("ShapeError: {0}")]
    Shape(String),

    /// Broadcasting could not align its inputs.
    #[error("BroadcastError: {0}")]
    Broadcast(String),

    /// An execution engine broke its contract.
    #[error("EngineError: {0}")]
    Engine(String),

    /// An element operation failed outside of containment.
    #[error(transparent)]
    Element(#[from] ElementError),

    /// JSON (de)serialization error.
    #[error("SerdeJsonError: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression.
    #[error("RegexError: {0}")]
    Regex(#[from] regex::Error),

    /// IO error.
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn type_error<S: Into<String>>(msg: S) -> Self { Self::Type(msg.into()) }
    pub fn value<S: Into<String>>(msg: S) -> Self { Self::Value(msg.into()) }
    pub fn index<S: Into<String>>(msg: S) -> Self { Self::Index(msg.into()) }
    pub fn key<S: Into<String>>(msg: S) -> Self { Self::Key(msg.into()) }
    pub fn attribute<S: Into<String>>(msg: S) -> Self { Self::Attribute(msg.into()) }
    pub fn shape<S: Into<String>>(msg: S) -> Self { Self::Shape(msg.into()) }
    pub fn broadcast<S: Into<String>>(msg: S) -> Self { Self::Broadcast(msg.into()) }
    pub fn engine<S: Into<String>>(msg: S) -> Self { Self::Engine(msg.into()) }
}

// ----------------------------------------------------------------------------

/// The category of an [`ElementError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Value,
    Index,
    Key,
    Attribute,
    ZeroDivision,
    Custom,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "TypeError",
            Self::Value => "ValueError",
            Self::Index => "IndexError",
            Self::Key => "KeyError",
            Self::Attribute => "AttributeError",
            Self::ZeroDivision => "ZeroDivisionError",
            Self::Custom => "Error",
        })
    }
}

/// An error reported by one element operation.
///
/// Two `ElementError`s are equal when both the kind and the message match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ElementError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ElementError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {kind, message: message.into()}
    }

    pub fn type_error<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::Type, msg) }
    pub fn value<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::Value, msg) }
    pub fn index<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::Index, msg) }
    pub fn key<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::Key, msg) }
    pub fn attribute<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::Attribute, msg) }
    pub fn zero_division<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::ZeroDivision, msg) }
    pub fn custom<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::Custom, msg) }
}

/// Structural errors met while operating on a nested table become element
/// errors of the same category.
impl From<Error> for ElementError {
    fn from(e: Error) -> Self {
        match e {
            Error::Element(e) => e,
            Error::Type(m) => Self::type_error(m),
            Error::Value(m) | Error::Shape(m) | Error::Broadcast(m) => Self::value(m),
            Error::Index(m) => Self::index(m),
            Error::Key(m) => Self::key(m),
            Error::Attribute(m) => Self::attribute(m),
            other => Self::custom(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(Error::key("dim9").to_string(), "KeyError: dim9");
        let e = ElementError::index("string index out of range");
        assert_eq!(e.to_string(), "IndexError: string index out of range");
        assert_eq!(Error::from(e.clone()).to_string(), e.to_string());
    }

    #[test]
    fn structural_to_element() {
        let e: ElementError = Error::shape("mismatch").into();
        assert_eq!(e.kind, ErrorKind::Value);
        let e: ElementError = Error::engine("pool").into();
        assert_eq!(e.kind, ErrorKind::Custom);
    }
}
