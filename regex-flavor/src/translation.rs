/*!
The result of a successful translation.

Metadata (capture groups, flags, unicode-ness) only exists on a
[`Translation`], so querying it before the driving call is a compile-time
impossibility rather than a runtime contract check.
*/
use std::collections::HashMap;

use crate::python::PythonFlags;

/// A pattern emitted in the target dialect, plus extracted metadata.
///
/// The pattern text is self-contained: every source flag that has no direct
/// target equivalent is compiled into the text (verbose-mode whitespace is
/// stripped, multiline anchors become inline `(?m:..)` groups, and so on).
/// The downstream engine receives only the pattern string and the
/// unicode-ness bit, never the source flag set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    pattern: String,
    unicode: bool,
    groups: CaptureGroups,
    flags: FlagSet,
}

impl Translation {
    pub(crate) fn new(
        pattern: String,
        unicode: bool,
        groups: CaptureGroups,
        flags: FlagSet,
    ) -> Translation {
        Translation {
            pattern,
            unicode,
            groups,
            flags,
        }
    }

    /// The emitted pattern in the target dialect's syntax.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn into_pattern(self) -> String {
        self.pattern
    }

    /// Whether the emitted pattern must be interpreted as matching code
    /// points rather than byte values.
    ///
    /// True iff the source was translated under [`Mode::Str`](crate::Mode::Str),
    /// regardless of flags.
    pub fn is_unicode(&self) -> bool {
        self.unicode
    }

    pub fn groups(&self) -> &CaptureGroups {
        &self.groups
    }

    /// Read-only view of the parsed source flags, queryable by flag name.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }
}

/// The capture groups of a source pattern.
///
/// Indices are assigned in the order group-opening parentheses appear in the
/// source (left to right, outermost first), identical to the source dialect's
/// own numbering. Group 0 is the implicit whole-match group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureGroups {
    count: usize,
    named: Option<HashMap<String, usize>>,
}

impl CaptureGroups {
    pub(crate) fn new(count: usize, named: Option<HashMap<String, usize>>) -> CaptureGroups {
        CaptureGroups { count, named }
    }

    /// Total number of groups, including the implicit group 0.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The name to 1-based index mapping, or `None` if the source pattern
    /// contains no named groups at all.
    pub fn named(&self) -> Option<&HashMap<String, usize>> {
        self.named.as_ref()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.named.as_ref()?.get(name).copied()
    }
}

/// A parsed, immutable flag set, tagged by the flavor that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlagSet {
    Python(PythonFlags),
}

impl FlagSet {
    /// Query a flag by its dialect-specific name, e.g. `"IGNORECASE"` or
    /// `"VERBOSE"` for Python. Unknown names read as unset.
    pub fn is_set(&self, name: &str) -> bool {
        match self {
            FlagSet::Python(flags) => {
                PythonFlags::from_name(name).is_some_and(|flag| flags.contains(flag))
            }
        }
    }
}
