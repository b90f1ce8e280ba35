//! Error types for xmlbind

use std::fmt;
use thiserror::Error;

use crate::path::Path;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural or lexical failure in the input text
    MalformedDocument,
    /// A type declaration is missing or internally inconsistent
    UnsupportedType { type_name: String },
    /// A required field has no value
    MissingField,
    /// A value is present but cannot be converted to the declared kind
    TypeMismatch { raw: String },
    /// Strict mode found a field the descriptor does not declare
    UnexpectedField,
    /// The object graph refers back to an object that is being unbound
    CyclicReference,
    /// Reading input from the filesystem failed
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDocument => write!(f, "malformed document"),
            Self::UnsupportedType { type_name } => write!(f, "unsupported type `{type_name}`"),
            Self::MissingField => write!(f, "missing required field"),
            Self::TypeMismatch { raw } => write!(f, "type mismatch for value {raw:?}"),
            Self::UnexpectedField => write!(f, "unexpected field"),
            Self::CyclicReference => write!(f, "cyclic reference"),
            Self::Io => write!(f, "i/o error"),
        }
    }
}

/// Where an error was detected
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Location {
    #[default]
    Unknown,
    /// Line/column in the markup text
    Source(Pos),
    /// Path through the element tree or object graph
    Path(Path),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "<unknown>"),
            Self::Source(pos) => write!(f, "{pos}"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

/// Main error type for xmlbind
#[derive(Error, Clone, Debug, PartialEq)]
#[error("error at {location}: {message}")]
pub struct Error {
    kind: ErrorKind,
    location: Location,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, location: Location) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            location,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }

    /// Malformed markup at a source position
    pub fn malformed(pos: Pos, message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::MalformedDocument, Location::Source(pos), message)
    }

    /// Inconsistent or unknown type declaration
    pub fn unsupported(type_name: &str, message: impl Into<String>) -> Self {
        Self::with_message(
            ErrorKind::UnsupportedType {
                type_name: type_name.to_string(),
            },
            Location::Unknown,
            message,
        )
    }

    /// Binding failure located by path
    pub fn binding(kind: ErrorKind, path: &Path) -> Self {
        Self::new(kind, Location::Path(path.clone()))
    }

    /// Set the path of an error that has no location yet
    pub(crate) fn located(mut self, path: &Path) -> Self {
        if self.location == Location::Unknown {
            self.location = Location::Path(path.clone());
        }
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source position for malformed documents
    pub fn pos(&self) -> Option<Pos> {
        match &self.location {
            Location::Source(pos) => Some(*pos),
            _ => None,
        }
    }

    /// Tree path for binding errors
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::Path(path) => Some(path),
            _ => None,
        }
    }

    /// True for the four binding sub-kinds
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MissingField
                | ErrorKind::TypeMismatch { .. }
                | ErrorKind::UnexpectedField
                | ErrorKind::CyclicReference
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::with_message(ErrorKind::Io, Location::Unknown, err.to_string())
    }
}

/// Result type alias for xmlbind
pub type Result<T> = std::result::Result<T, Error>;
