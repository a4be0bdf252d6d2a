/*!
Error types for validation and translation.

Only two failure kinds exist, and they are never conflated:
- [`SyntaxError`]: the source pattern or flag string is ill-formed under the
  source dialect's grammar. Always recoverable by the caller.
- [`UnsupportedError`]: the source pattern is well-formed but uses a construct
  with no faithful equivalent in the target dialect. Callers may fall back to
  a different execution strategy instead of reporting a user error.
*/
use std::fmt;

/// The source pattern or flag string violates the source dialect's grammar.
///
/// Carries a human-readable message and, when determinable, the offset of the
/// offending construct. The offset is counted in pattern elements: code points
/// for [`Mode::Str`](crate::Mode::Str) patterns, byte values for
/// [`Mode::Bytes`](crate::Mode::Bytes) patterns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    message: String,
    position: Option<usize>,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            position: None,
        }
    }

    pub(crate) fn at(message: impl Into<String>, position: usize) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Offset of the offending construct in the source pattern, if known.
    pub fn position(&self) -> Option<usize> {
        self.position
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} at position {}", self.message, pos),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// The source pattern is valid but has no faithful translation into the
/// target dialect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedError {
    construct: String,
}

impl UnsupportedError {
    pub(crate) fn new(construct: impl Into<String>) -> UnsupportedError {
        UnsupportedError {
            construct: construct.into(),
        }
    }

    /// The specific construct that cannot be translated.
    pub fn construct(&self) -> &str {
        &self.construct
    }
}

impl fmt::Display for UnsupportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not supported", self.construct)
    }
}

impl std::error::Error for UnsupportedError {}

/// Error returned by [`Flavor::translate`](crate::Flavor::translate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslateError {
    Syntax(SyntaxError),
    Unsupported(UnsupportedError),
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::Syntax(e) => e.fmt(f),
            TranslateError::Unsupported(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for TranslateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslateError::Syntax(e) => Some(e),
            TranslateError::Unsupported(e) => Some(e),
        }
    }
}

impl From<SyntaxError> for TranslateError {
    fn from(e: SyntaxError) -> TranslateError {
        TranslateError::Syntax(e)
    }
}

impl From<UnsupportedError> for TranslateError {
    fn from(e: UnsupportedError) -> TranslateError {
        TranslateError::Unsupported(e)
    }
}
