/*!
Predefined character class translation tables.

Python's `\d`, `\s` and `\w` do not coincide with the target dialect's
defaults in either domain, so every occurrence is rewritten:

- In Unicode (str) patterns, Python accepts `Numeric_Type=Decimal` digits
  (the `Decimal_Number` category), whitespace per `Space_Separator` plus the
  `WS`/`B`/`S` bidi classes (`White_Space` plus U+001C-U+001F), and word
  characters from the `Letter` and `Number` categories plus a handful of CJK
  compatibility ideographs with numeric values, plus `_`.
- In bytes patterns, or under the ASCII flag, the classes shrink to their
  ASCII subsets and must never fall back to the target's Unicode-aware
  defaults.

The negated forms rely on the target's nested character classes: `[\S,]`
becomes `[[^..spaces..],]`, which has no ECMAScript-style equivalent but is
exact in the Rust regex dialect.
*/
use std::borrow::Cow;

/// Word characters of the `Letter`/`Number` categories, the CJK
/// compatibility ideographs U+F96B, U+F973, U+F978, U+F9B2, U+F9D1, U+F9D3,
/// U+F9FD and U+2F890 (all carrying numeric values), and `_`.
const UNICODE_WORD: &str = "\\p{Letter}\\p{Number}\\x{f96b}\\x{f973}\\x{f978}\\x{f9b2}\\x{f9d1}\\x{f9d3}\\x{f9fd}\\x{2f890}_";

/// `White_Space` plus U+001C-U+001F (file/group/record/unit separators,
/// which Python counts as whitespace via their bidi classes).
const UNICODE_SPACE: &str = "\\x1c-\\x1f\\p{White_Space}";

const ASCII_WORD: &str = "0-9A-Za-z_";
const ASCII_SPACE: &str = "\\x09-\\x0d\\x20";
const ASCII_DIGIT: &str = "0-9";

fn word_chars(unicode: bool) -> &'static str {
    if unicode {
        UNICODE_WORD
    } else {
        ASCII_WORD
    }
}

/// Translation of a `\d`/`\D`/`\s`/`\S`/`\w`/`\W` escape.
///
/// `in_class` selects a form that can be pasted directly into a bracketed
/// character class; negated shorthands become nested negated classes there.
pub(crate) fn shorthand(class: char, unicode: bool, in_class: bool) -> Cow<'static, str> {
    let elements: Cow<'static, str> = match (class, unicode) {
        ('d', true) => return Cow::Borrowed("\\p{Decimal_Number}"),
        ('D', true) => return Cow::Borrowed("\\P{Decimal_Number}"),
        ('d', false) => Cow::Borrowed(ASCII_DIGIT),
        ('D', false) => return Cow::Owned(format!("[^{ASCII_DIGIT}]")),
        ('s', true) => Cow::Borrowed(UNICODE_SPACE),
        ('S', true) => return Cow::Owned(format!("[^{UNICODE_SPACE}]")),
        ('s', false) => Cow::Borrowed(ASCII_SPACE),
        ('S', false) => return Cow::Owned(format!("[^{ASCII_SPACE}]")),
        ('w', _) => Cow::Borrowed(word_chars(unicode)),
        ('W', _) => return Cow::Owned(format!("[^{}]", word_chars(unicode))),
        _ => unreachable!("not a shorthand class: {class}"),
    };
    if in_class {
        elements
    } else {
        Cow::Owned(format!("[{elements}]"))
    }
}

/// Lookaround template reproducing Python's `\b` with Python's notion of a
/// word character. The target's own `\b` is Unicode-aware with a different
/// word definition, so it is never emitted.
pub(crate) fn word_boundary(unicode: bool) -> String {
    let w = format!("[{}]", word_chars(unicode));
    let nw = format!("[^{}]", word_chars(unicode));
    format!("(?:(?:\\A|(?<={nw}))(?={w})|(?<={w})(?:(?={nw})|\\z))")
}

/// Lookaround template reproducing Python's `\B`. Note that `\b` and `\B`
/// are not direct inverses: neither matches inside an empty subject.
pub(crate) fn word_non_boundary(unicode: bool) -> String {
    let w = format!("[{}]", word_chars(unicode));
    let nw = format!("[^{}]", word_chars(unicode));
    format!("(?:\\A(?={nw})|(?<={nw})\\z|(?<={nw})(?={nw})|(?<={w})(?={w}))")
}
