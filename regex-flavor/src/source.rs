/*!
The unit of translation: pattern text, flag string and matching mode.

The mode cannot be inferred from the pattern text. A dialect like Python's
`re` behaves differently for text-typed and byte-typed subjects while
accepting the same pattern source, so the caller must state the matching
domain explicitly at construction time.
*/
use bon::Builder;

use crate::{
    error::{SyntaxError, TranslateError},
    python,
    translation::Translation,
};

/// The matching domain a pattern operates over.
///
/// Fixed before any parsing begins and immutable for the lifetime of a
/// translation. It decides the alphabet for character class bounds, the
/// meaning of predefined classes and "any character", and how case folding
/// behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// The pattern matches over Unicode code points (a text subject).
    #[default]
    Str,
    /// The pattern matches over raw byte values 0x00-0xff (a bytes subject).
    /// Every character of the pattern source must itself be <= 0xff.
    Bytes,
}

impl Mode {
    /// The highest value a character class bound may take in this mode.
    pub fn max_codepoint(self) -> u32 {
        match self {
            Mode::Str => 0x10FFFF,
            Mode::Bytes => 0xFF,
        }
    }
}

/// A source regex dialect.
///
/// One variant per supported dialect, selected once by the caller. Each
/// variant dispatches to a dedicated parser/translator module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Flavor {
    /// Python's `re` module dialect.
    #[default]
    Python,
}

impl Flavor {
    /// Parse and validate `source` under this flavor's grammar without
    /// producing output. Cheap, fails fast.
    ///
    /// Constructs that are valid in the source dialect but untranslatable
    /// (see [`UnsupportedError`](crate::UnsupportedError)) pass validation;
    /// they are only reported by [`translate`](Flavor::translate).
    pub fn validate(self, source: &RegexSource) -> Result<(), SyntaxError> {
        match self {
            Flavor::Python => python::validate(source),
        }
    }

    /// Parse `source` and emit an equivalent pattern in the target dialect,
    /// together with capture group, flag and unicode-ness metadata.
    pub fn translate(self, source: &RegexSource) -> Result<Translation, TranslateError> {
        match self {
            Flavor::Python => python::translate(source),
        }
    }
}

/// A raw pattern together with its flag string and matching mode.
///
/// Never mutated; translation is a pure function of this triple.
///
/// ## Example
/// ```
/// use regex_flavor::{Flavor, Mode, RegexSource};
///
/// let source = RegexSource::builder(r"(?P<year>\d{4})-\d{2}")
///     .mode(Mode::Str)
///     .build();
/// let translation = Flavor::Python.translate(&source).unwrap();
/// assert!(translation.is_unicode());
/// assert_eq!(translation.groups().index_of("year"), Some(1));
/// ```
#[derive(Builder, Clone, Copy, Debug)]
pub struct RegexSource<'a> {
    /// The pattern text. For [`Mode::Bytes`], characters above 0xff are
    /// rejected at validation time.
    #[builder(start_fn)]
    pub pattern: &'a str,
    /// The dialect's flag string, e.g. `"i"` or `"imx"` for Python.
    #[builder(default)]
    pub flags: &'a str,
    /// The matching domain. Defaults to [`Mode::Str`].
    #[builder(default)]
    pub mode: Mode,
}
