/*!
Python (`re` module) flavor support.

A single-pass recursive-descent parser over the Python regex grammar that
doubles as the translator: validation runs the parser with emission switched
off, translation runs it with emission switched on, so the two can never
disagree on what is well-formed.

The emitted pattern is written in the Rust regex dialect extended with
backreferences and lookaround, and is self-contained: verbose-mode
whitespace and comments are stripped, multiline anchors become inline
`(?m:..)` groups, case folding is expanded into explicit classes, and the
predefined classes are rewritten per mode. Constructs that
are valid Python but have no faithful equivalent in the target dialect
(conditional backreference groups, variable-length lookbehind,
locale-dependent behavior, case-insensitive backreferences) fail translation
with an [`UnsupportedError`]; they still pass validation.
*/
use std::collections::HashMap;

use regex_syntax::hir::{ClassUnicode, ClassUnicodeRange};

use crate::{
    error::{SyntaxError, TranslateError, UnsupportedError},
    source::{Mode, RegexSource},
    translation::{CaptureGroups, FlagSet, Translation},
};

mod classes;
mod flags;

pub use flags::PythonFlags;

pub(crate) fn validate(source: &RegexSource<'_>) -> Result<(), SyntaxError> {
    let mut processor = Processor::new(source, true);
    match processor.parse() {
        Ok(()) => Ok(()),
        Err(TranslateError::Syntax(e)) => Err(e),
        Err(TranslateError::Unsupported(_)) => {
            unreachable!("bail-outs are suppressed while validating")
        }
    }
}

pub(crate) fn translate(source: &RegexSource<'_>) -> Result<Translation, TranslateError> {
    let mut processor = Processor::new(source, false);
    processor.parse()?;
    Ok(processor.into_translation())
}

/// Characters that must be escaped outside of character classes in the
/// target dialect.
const SYNTAX_CHARS: &[char] = &[
    '^', '$', '\\', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|',
];

/// Characters that must be escaped inside character classes in the target
/// dialect. Unlike ECMAScript, the target supports nested classes and the
/// set operators `&&`/`~~`/`--`, so `[`, `&` and `~` need escaping too.
const CLASS_SYNTAX_CHARS: &[char] = &['\\', ']', '-', '^', '[', '&', '~'];

const VERBOSE_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\x0b', '\x0c'];

/// The grammatical category of the most recently parsed term. Quantifiers
/// may only follow an atom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Term {
    None,
    Assertion,
    Atom,
    Quantifier,
}

/// Width of a subexpression in pattern elements, used to enforce the
/// fixed-width lookbehind restriction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Width {
    lo: u64,
    hi: Option<u64>,
}

impl Width {
    const ZERO: Width = Width {
        lo: 0,
        hi: Some(0),
    };
    const ONE: Width = Width {
        lo: 1,
        hi: Some(1),
    };

    fn add(self, other: Width) -> Width {
        Width {
            lo: self.lo.saturating_add(other.lo),
            hi: match (self.hi, other.hi) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                _ => None,
            },
        }
    }

    fn union(self, other: Width) -> Width {
        Width {
            lo: self.lo.min(other.lo),
            hi: match (self.hi, other.hi) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }

    fn repeat(self, min: u64, max: Option<u64>) -> Width {
        Width {
            lo: self.lo.saturating_mul(min),
            hi: match (self.hi, max) {
                // A zero-width body stays zero-width no matter the bounds.
                (Some(0), _) => Some(0),
                (Some(h), Some(m)) => Some(h.saturating_mul(m)),
                _ => None,
            },
        }
    }

    fn is_fixed(self) -> bool {
        self.hi == Some(self.lo)
    }
}

/// Width accumulator for one disjunction nesting level.
#[derive(Clone, Copy, Debug)]
struct WidthFrame {
    /// Width of the current alternative so far.
    seq: Width,
    /// `seq` before the last atom was added; quantifiers rewrite the last
    /// atom's contribution.
    before_last: Width,
    /// Width of the last atom.
    last: Width,
    /// Union over the alternatives finished so far.
    alts: Option<Width>,
}

impl WidthFrame {
    fn new() -> WidthFrame {
        WidthFrame {
            seq: Width::ZERO,
            before_last: Width::ZERO,
            last: Width::ZERO,
            alts: None,
        }
    }

    fn atom(&mut self, width: Width) {
        self.before_last = self.seq;
        self.seq = self.seq.add(width);
        self.last = width;
    }

    fn quantify(&mut self, min: u64, max: Option<u64>) {
        let repeated = self.last.repeat(min, max);
        self.seq = self.before_last.add(repeated);
        self.last = repeated;
    }

    fn alternate(&mut self) {
        let finished = std::mem::replace(&mut self.seq, Width::ZERO);
        self.alts = Some(match self.alts {
            Some(acc) => acc.union(finished),
            None => finished,
        });
        self.before_last = Width::ZERO;
        self.last = Width::ZERO;
    }

    fn total(&self) -> Width {
        match self.alts {
            Some(acc) => acc.union(self.seq),
            None => self.seq,
        }
    }
}

struct Processor<'a> {
    pattern: &'a str,
    flags_str: &'a str,
    mode: Mode,
    /// Parse without emitting or bailing out; used by `validate`.
    silent: bool,

    /// Byte offset into `pattern`.
    pos: usize,
    out: String,

    /// Flags as written by the caller or by inline global flag groups,
    /// before implied additions.
    explicit_flags: PythonFlags,
    global_flags: PythonFlags,
    flags_stack: Vec<PythonFlags>,

    last_term: Term,
    /// A `\1`-style backreference was emitted. The target rejects numbered
    /// backrefs in patterns that also contain named groups.
    numbered_backref: bool,
    groups: usize,
    /// Width of each closed capture group, indexed by group number - 1.
    group_widths: Vec<Option<Width>>,
    named_groups: Option<HashMap<String, usize>>,
    /// Numbers of the capture groups currently open.
    group_stack: Vec<usize>,
    /// For each enclosing lookbehind, the number of the first group defined
    /// inside it.
    lookbehind_stack: Vec<usize>,
    width_stack: Vec<WidthFrame>,
}

impl<'a> Processor<'a> {
    fn new(source: &RegexSource<'a>, silent: bool) -> Processor<'a> {
        Processor {
            pattern: source.pattern,
            flags_str: source.flags,
            mode: source.mode,
            silent,
            pos: 0,
            out: String::with_capacity(source.pattern.len()),
            explicit_flags: PythonFlags::empty(),
            global_flags: PythonFlags::empty(),
            flags_stack: Vec::new(),
            last_term: Term::None,
            numbered_backref: false,
            groups: 0,
            group_widths: Vec::new(),
            named_groups: None,
            group_stack: Vec::new(),
            lookbehind_stack: Vec::new(),
            width_stack: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<(), TranslateError> {
        self.explicit_flags = PythonFlags::parse(self.flags_str)?;
        if self.mode == Mode::Bytes {
            if let Some((index, ch)) = self
                .pattern
                .chars()
                .enumerate()
                .find(|&(_, c)| c as u32 > 0xFF)
            {
                return Err(SyntaxError::at(
                    format!("character '{ch}' outside of range 0x00-0xff in bytes pattern"),
                    index,
                )
                .into());
            }
        }
        self.global_flags = self.explicit_flags.fixed(self.mode, self.explicit_flags)?;

        self.width_stack.push(WidthFrame::new());
        self.disjunction()?;

        // Inline global flags like `(?a)` may have been added mid-parse.
        loop {
            let before = self.global_flags;
            self.global_flags = before.fixed(self.mode, self.explicit_flags)?;
            if self.global_flags == before {
                break;
            }
        }

        if !self.at_end() {
            // The only way to stop before the end is an unmatched `)`.
            return Err(self.syntax_error_here("unbalanced parenthesis").into());
        }
        if self.numbered_backref && self.named_groups.is_some() {
            self.bail_out("numbered backreferences mixed with named groups")?;
        }
        Ok(())
    }

    fn into_translation(self) -> Translation {
        Translation::new(
            self.out,
            self.mode == Mode::Str,
            CaptureGroups::new(self.groups + 1, self.named_groups),
            FlagSet::Python(self.global_flags),
        )
    }

    // ---- scanning ----

    fn at_end(&self) -> bool {
        self.pos >= self.pattern.len()
    }

    fn cur(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn cur_char(&self) -> char {
        debug_assert!(!self.at_end());
        self.cur().unwrap_or('\0')
    }

    fn consume_char(&mut self) -> char {
        let ch = self.cur_char();
        self.pos += ch.len_utf8();
        ch
    }

    fn advance(&mut self) {
        if let Some(ch) = self.cur() {
            self.pos += ch.len_utf8();
        }
    }

    fn retreat(&mut self) {
        if let Some(ch) = self.pattern[..self.pos].chars().next_back() {
            self.pos -= ch.len_utf8();
        }
    }

    fn consume_if(&mut self, ch: char) -> bool {
        if self.cur() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn consuming_lookahead(&mut self, expected: &str) -> bool {
        if self.pattern[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn get_many(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.cur() {
            if !pred(ch) {
                break;
            }
            out.push(self.consume_char());
        }
        out
    }

    fn get_up_to(&mut self, count: usize, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while out.chars().count() < count {
            match self.cur() {
                Some(ch) if pred(ch) => out.push(self.consume_char()),
                _ => break,
            }
        }
        out
    }

    fn must_have_more(&self) -> Result<(), TranslateError> {
        if self.at_end() {
            return Err(self.syntax_error_here("unexpected end of pattern").into());
        }
        Ok(())
    }

    // ---- errors ----

    /// Offsets are reported in pattern elements: code points in str mode,
    /// byte values in bytes mode (each pattern char is one byte value).
    fn element_index(&self, byte_pos: usize) -> usize {
        self.pattern[..byte_pos].chars().count()
    }

    fn syntax_error_here(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(message, self.element_index(self.pos))
    }

    fn syntax_error_at(&self, message: impl Into<String>, byte_pos: usize) -> SyntaxError {
        SyntaxError::at(message, self.element_index(byte_pos))
    }

    fn syntax_error_rel(&self, message: impl Into<String>, elements_back: usize) -> SyntaxError {
        SyntaxError::at(
            message,
            self.element_index(self.pos).saturating_sub(elements_back),
        )
    }

    fn bail_out(&self, construct: &str) -> Result<(), TranslateError> {
        if self.silent {
            Ok(())
        } else {
            Err(UnsupportedError::new(construct).into())
        }
    }

    // ---- flags ----

    fn local_flags(&self) -> PythonFlags {
        self.flags_stack.last().copied().unwrap_or(self.global_flags)
    }

    fn ignore_case(&self) -> bool {
        self.local_flags().contains(PythonFlags::IGNORECASE)
    }

    // ---- emission ----

    fn emit(&mut self, snippet: &str) {
        if !self.silent {
            self.out.push_str(snippet);
        }
    }

    fn emit_char_no_casing(&mut self, ch: char, in_class: bool) {
        if self.silent {
            return;
        }
        if self.mode == Mode::Bytes && ch as u32 >= 0x80 {
            // Keep byte-mode output pure ASCII; the downstream engine reads
            // `\xNN` as a byte value.
            self.out.push_str(&format!("\\x{:02x}", ch as u32));
            return;
        }
        let syntax_chars = if in_class {
            CLASS_SYNTAX_CHARS
        } else {
            SYNTAX_CHARS
        };
        if syntax_chars.contains(&ch) {
            self.out.push('\\');
        }
        self.out.push(ch);
    }

    /// Emit a literal character, expanding it into its case-fold closure
    /// when matching case-insensitively. Inside character classes the
    /// closure extras are appended by the class parser instead.
    fn emit_literal(&mut self, ch: char, in_class: bool) -> Result<(), TranslateError> {
        if self.silent {
            return Ok(());
        }
        if in_class || !self.ignore_case() {
            self.emit_char_no_casing(ch, in_class);
            return Ok(());
        }
        if self.local_flags().contains(PythonFlags::LOCALE) {
            return Err(UnsupportedError::new("locale-specific case folding").into());
        }
        self.out.push('[');
        if self.local_flags().contains(PythonFlags::UNICODE) {
            let mut closure = ClassUnicode::new([ClassUnicodeRange::new(ch, ch)]);
            closure.case_fold_simple();
            self.emit_unicode_ranges(&closure);
        } else {
            self.emit_char_no_casing(ch, true);
            if ch.is_ascii_alphabetic() {
                let other = if ch.is_ascii_lowercase() {
                    ch.to_ascii_uppercase()
                } else {
                    ch.to_ascii_lowercase()
                };
                self.emit_char_no_casing(other, true);
            }
        }
        self.out.push(']');
        Ok(())
    }

    fn emit_unicode_ranges(&mut self, class: &ClassUnicode) {
        let ranges: Vec<ClassUnicodeRange> = class.iter().copied().collect();
        for range in ranges {
            self.emit_char_no_casing(range.start(), true);
            if range.start() != range.end() {
                self.out.push('-');
                self.emit_char_no_casing(range.end(), true);
            }
        }
    }

    /// Emit the characters the range `lo..=hi` additionally matches under
    /// case-insensitive matching (the fold closure minus the range itself).
    fn emit_case_fold_closure(&mut self, lo: char, hi: char) -> Result<(), TranslateError> {
        if self.silent {
            return Ok(());
        }
        if self.local_flags().contains(PythonFlags::LOCALE) {
            return Err(UnsupportedError::new("locale-specific case folding").into());
        }
        if self.local_flags().contains(PythonFlags::UNICODE) {
            let original = ClassUnicode::new([ClassUnicodeRange::new(lo, hi)]);
            let mut folded = original.clone();
            folded.case_fold_simple();
            folded.difference(&original);
            self.emit_unicode_ranges(&folded);
        } else {
            // Byte patterns and the ASCII flag fold ASCII letters only.
            for b in b'a'..=b'z' {
                if (lo..=hi).contains(&(b as char)) {
                    self.emit_char_no_casing(b.to_ascii_uppercase() as char, true);
                }
            }
            for b in b'A'..=b'Z' {
                if (lo..=hi).contains(&(b as char)) {
                    self.emit_char_no_casing(b.to_ascii_lowercase() as char, true);
                }
            }
        }
        Ok(())
    }

    // ---- widths ----

    fn frame(&mut self) -> &mut WidthFrame {
        self.width_stack
            .last_mut()
            .expect("width frame stack is never empty during parsing")
    }

    fn pop_frame_total(&mut self) -> Width {
        self.width_stack
            .pop()
            .map(|frame| frame.total())
            .unwrap_or(Width::ZERO)
    }

    fn set_atom(&mut self, width: Width) {
        self.last_term = Term::Atom;
        self.frame().atom(width);
    }

    fn set_assertion(&mut self) {
        self.last_term = Term::Assertion;
        self.frame().atom(Width::ZERO);
    }

    fn group_width(&self, number: usize) -> Width {
        self.group_widths
            .get(number.wrapping_sub(1))
            .copied()
            .flatten()
            .unwrap_or(Width::ZERO)
    }

    fn group_name(&self, number: usize) -> Option<String> {
        self.named_groups
            .as_ref()?
            .iter()
            .find(|&(_, &n)| n == number)
            .map(|(name, _)| name.clone())
    }

    // ---- grammar ----

    fn disjunction(&mut self) -> Result<(), TranslateError> {
        loop {
            self.alternative()?;
            if self.consume_if('|') {
                self.emit("|");
                self.frame().alternate();
            } else {
                return Ok(());
            }
        }
    }

    fn alternative(&mut self) -> Result<(), TranslateError> {
        while !self.at_end() && self.cur_char() != '|' && self.cur_char() != ')' {
            let start = self.pos;
            let ch = self.consume_char();

            if self.local_flags().contains(PythonFlags::VERBOSE) {
                if VERBOSE_WHITESPACE.contains(&ch) {
                    continue;
                }
                if ch == '#' {
                    self.line_comment();
                    continue;
                }
            }

            match ch {
                '\\' => self.escape()?,
                '[' => {
                    self.char_class(start)?;
                    self.set_atom(Width::ONE);
                }
                '*' | '+' | '?' | '{' => self.quantifier(ch, start)?,
                '.' => {
                    if self.local_flags().contains(PythonFlags::DOTALL) {
                        self.emit("(?s:.)");
                    } else {
                        self.emit("[^\\n]");
                    }
                    self.set_atom(Width::ONE);
                }
                '(' => self.parens(start)?,
                '^' => {
                    if self.local_flags().contains(PythonFlags::MULTILINE) {
                        self.emit("(?m:^)");
                    } else {
                        self.emit("\\A");
                    }
                    self.set_assertion();
                }
                '$' => {
                    if self.local_flags().contains(PythonFlags::MULTILINE) {
                        self.emit("(?m:$)");
                    } else {
                        // Python's `$` also matches just before a trailing
                        // newline; the target's does not.
                        self.emit("(?:\\z|(?=\\n\\z))");
                    }
                    self.set_assertion();
                }
                _ => {
                    self.emit_literal(ch, false)?;
                    self.set_atom(Width::ONE);
                }
            }
        }
        Ok(())
    }

    fn line_comment(&mut self) {
        while !self.at_end() {
            let ch = self.consume_char();
            if ch == '\\' && !self.at_end() {
                self.advance();
            } else if ch == '\n' {
                break;
            }
        }
    }

    // ---- escapes ----

    fn escape(&mut self) -> Result<(), TranslateError> {
        if self.at_end() {
            return Err(self.syntax_error_here("bad escape (end of pattern)").into());
        }
        if self.assertion_escape()? {
            self.set_assertion();
            return Ok(());
        }
        if self.category_escape(false)? {
            self.set_atom(Width::ONE);
            return Ok(());
        }
        if let Some(width) = self.backreference()? {
            self.set_atom(width);
            return Ok(());
        }
        self.character_escape(false)?;
        self.set_atom(Width::ONE);
        Ok(())
    }

    fn assertion_escape(&mut self) -> Result<bool, TranslateError> {
        match self.cur_char() {
            'A' => {
                self.advance();
                self.emit("\\A");
                Ok(true)
            }
            'Z' => {
                self.advance();
                self.emit("\\z");
                Ok(true)
            }
            'b' => {
                self.advance();
                self.word_boundary(false)?;
                Ok(true)
            }
            'B' => {
                self.advance();
                self.word_boundary(true)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn word_boundary(&mut self, negated: bool) -> Result<(), TranslateError> {
        let flags = self.local_flags();
        if flags.contains(PythonFlags::LOCALE) {
            self.bail_out("locale-specific word boundary assertions")?;
            return Ok(());
        }
        let unicode = flags.contains(PythonFlags::UNICODE);
        let snippet = if negated {
            classes::word_non_boundary(unicode)
        } else {
            classes::word_boundary(unicode)
        };
        self.emit(&snippet);
        Ok(())
    }

    fn category_escape(&mut self, in_class: bool) -> Result<bool, TranslateError> {
        match self.cur_char() {
            class @ ('d' | 'D' | 's' | 'S' | 'w' | 'W') => {
                self.advance();
                let flags = self.local_flags();
                if flags.contains(PythonFlags::LOCALE) && matches!(class, 'w' | 'W') {
                    self.bail_out("locale-specific definitions of word characters")?;
                    return Ok(true);
                }
                let unicode = flags.contains(PythonFlags::UNICODE);
                let snippet = classes::shorthand(class, unicode, in_class);
                self.emit(&snippet);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn character_escape(&mut self, in_class: bool) -> Result<char, TranslateError> {
        match self.cur_char() {
            'a' => self.simple_escape('\u{7}', in_class),
            'b' => self.simple_escape('\u{8}', in_class),
            'f' => self.simple_escape('\u{c}', in_class),
            'n' => self.simple_escape('\n', in_class),
            'r' => self.simple_escape('\r', in_class),
            't' => self.simple_escape('\t', in_class),
            'v' => self.simple_escape('\u{b}', in_class),
            '\\' => self.simple_escape('\\', in_class),
            'x' => {
                self.advance();
                let code = self.get_up_to(2, |c| c.is_ascii_hexdigit());
                if code.len() < 2 {
                    return Err(self
                        .syntax_error_rel(format!("incomplete escape \\x{code}"), 2 + code.len())
                        .into());
                }
                let ch = parse_hex(&code) as u8 as char;
                self.emit_literal(ch, in_class)?;
                Ok(ch)
            }
            lead @ ('u' | 'U') => {
                // `\u` and `\U` escapes only exist in str patterns.
                if self.mode != Mode::Str {
                    return Err(self
                        .syntax_error_rel(format!("bad escape \\{lead}"), 1)
                        .into());
                }
                self.advance();
                let length = if lead == 'u' { 4 } else { 8 };
                let code = self.get_up_to(length, |c| c.is_ascii_hexdigit());
                if code.len() < length {
                    return Err(self
                        .syntax_error_rel(
                            format!("incomplete escape \\{lead}{code}"),
                            2 + code.len(),
                        )
                        .into());
                }
                let value = parse_hex(&code);
                if value > 0x10FFFF {
                    return Err(self
                        .syntax_error_rel(
                            format!(
                                "unicode escape value \\{lead}{code} outside of range 0-0x10FFFF"
                            ),
                            2 + code.len(),
                        )
                        .into());
                }
                match char::from_u32(value) {
                    Some(ch) => {
                        self.emit_literal(ch, in_class)?;
                        Ok(ch)
                    }
                    // Python str patterns may name lone surrogates; the
                    // target alphabet has no such code points.
                    None if self.silent => Ok('\u{FFFD}'),
                    None => Err(UnsupportedError::new("lone surrogate escapes").into()),
                }
            }
            ch if ch.is_digit(8) => {
                let code = self.get_up_to(3, |c| c.is_digit(8));
                let value = parse_octal(&code);
                if value > 0o377 {
                    return Err(self
                        .syntax_error_rel(
                            format!("octal escape value \\{code} outside of range 0-o377"),
                            1 + code.len(),
                        )
                        .into());
                }
                let ch = value as u8 as char;
                self.emit_literal(ch, in_class)?;
                Ok(ch)
            }
            ch if ch.is_ascii_alphabetic() => {
                Err(self.syntax_error_rel(format!("bad escape \\{ch}"), 1).into())
            }
            _ => {
                let ch = self.consume_char();
                self.emit_literal(ch, in_class)?;
                Ok(ch)
            }
        }
    }

    fn simple_escape(&mut self, value: char, in_class: bool) -> Result<char, TranslateError> {
        self.advance();
        self.emit_literal(value, in_class)?;
        Ok(value)
    }

    fn backreference(&mut self) -> Result<Option<Width>, TranslateError> {
        if !matches!(self.cur_char(), '1'..='9') {
            return Ok(None);
        }
        // Three octal digits form an octal escape, not a group reference.
        let three_octal = {
            let mut it = self.pattern[self.pos..].chars();
            matches!(
                (it.next(), it.next(), it.next()),
                (Some(a), Some(b), Some(c)) if a.is_digit(8) && b.is_digit(8) && c.is_digit(8)
            )
        };
        if three_octal {
            return Ok(None);
        }
        let number = self.get_up_to(2, |c| c.is_ascii_digit());
        let group = dec_value(&number) as usize;
        if group > self.groups {
            return Err(self
                .syntax_error_rel(format!("invalid group reference {number}"), number.len())
                .into());
        }
        if self.group_stack.contains(&group) {
            return Err(self
                .syntax_error_rel("cannot refer to an open group", number.len() + 1)
                .into());
        }
        for &contained in &self.lookbehind_stack {
            if group >= contained {
                return Err(self
                    .syntax_error_here(
                        "cannot refer to group defined in the same lookbehind subpattern",
                    )
                    .into());
            }
        }
        if self.ignore_case() {
            self.bail_out("case-insensitive backreferences")?;
        } else if let Some(name) = self.group_name(group) {
            // The target rejects `\1` once a named group exists; a reference
            // to a named group must use the named form.
            self.emit(&format!("\\k<{name}>"));
        } else {
            self.numbered_backref = true;
            self.emit(&format!("\\{group}"));
        }
        Ok(Some(self.group_width(group)))
    }

    // ---- character classes ----

    fn class_escape(&mut self) -> Result<Option<char>, TranslateError> {
        if self.at_end() {
            return Err(self.syntax_error_here("bad escape (end of pattern)").into());
        }
        if self.category_escape(true)? {
            return Ok(None);
        }
        Ok(Some(self.character_escape(true)?))
    }

    fn char_class(&mut self, start: usize) -> Result<(), TranslateError> {
        self.emit("[");
        if self.consume_if('^') {
            self.emit("^");
        }
        let first_pos_inside = self.pos;
        loop {
            if self.at_end() {
                return Err(self
                    .syntax_error_at("unterminated character set", start)
                    .into());
            }
            let range_start = self.pos;
            let ch = self.consume_char();
            let lower: Option<char> = match ch {
                // A `]` as the very first element is a literal.
                ']' if self.pos == first_pos_inside + 1 => {
                    self.emit_char_no_casing(']', true);
                    Some(']')
                }
                ']' => {
                    self.emit("]");
                    break;
                }
                '\\' => self.class_escape()?,
                _ => {
                    self.emit_char_no_casing(ch, true);
                    Some(ch)
                }
            };
            if self.consume_if('-') {
                self.emit("-");
                if self.at_end() {
                    return Err(self
                        .syntax_error_at("unterminated character set", start)
                        .into());
                }
                let ch = self.consume_char();
                let upper: Option<char> = match ch {
                    ']' => {
                        self.emit("]");
                        break;
                    }
                    '\\' => self.class_escape()?,
                    _ => {
                        self.emit_char_no_casing(ch, true);
                        Some(ch)
                    }
                };
                match (lower, upper) {
                    (Some(lo), Some(hi)) if lo <= hi => {
                        if self.ignore_case() {
                            self.emit_case_fold_closure(lo, hi)?;
                        }
                    }
                    _ => {
                        return Err(self
                            .syntax_error_at(
                                format!(
                                    "bad character range {}",
                                    &self.pattern[range_start..self.pos]
                                ),
                                range_start,
                            )
                            .into());
                    }
                }
            } else if self.ignore_case() {
                if let Some(ch) = lower {
                    self.emit_case_fold_closure(ch, ch)?;
                }
            }
        }
        Ok(())
    }

    // ---- quantifiers ----

    fn quantifier(&mut self, ch: char, start: usize) -> Result<(), TranslateError> {
        let (min, max): (u64, Option<u64>) = match ch {
            '{' => {
                if self.consume_if('}') {
                    // `{}` is a literal in Python.
                    self.emit_literal('{', false)?;
                    self.set_atom(Width::ONE);
                    self.emit_literal('}', false)?;
                    self.set_atom(Width::ONE);
                    return Ok(());
                }
                if self.consuming_lookahead(",}") {
                    // Python reads `A{,}` as `A*`; the target accepts no
                    // such range quantifier.
                    return self.quantifier('*', start);
                }
                let lower = self.get_many(|c| c.is_ascii_digit());
                let has_comma = self.consume_if(',');
                let upper = if has_comma {
                    self.get_many(|c| c.is_ascii_digit())
                } else {
                    lower.clone()
                };
                if !self.consume_if('}') {
                    // Not a quantifier after all; fall back to literals.
                    self.emit_literal('{', false)?;
                    self.set_atom(Width::ONE);
                    let rest = self.pattern[start + 1..self.pos].to_string();
                    for ch in rest.chars() {
                        self.emit_literal(ch, false)?;
                        self.set_atom(Width::ONE);
                    }
                    return Ok(());
                }
                if !lower.is_empty() && !upper.is_empty() && dec_gt(&lower, &upper) {
                    return Err(self
                        .syntax_error_at("min repeat greater than max repeat", start)
                        .into());
                }
                // The target rejects an empty lower bound, so `{,n}` is
                // normalized to `{0,n}`.
                if has_comma {
                    let lo = if lower.is_empty() { "0" } else { lower.as_str() };
                    self.emit(&format!("{{{lo},{upper}}}"));
                } else {
                    self.emit(&format!("{{{lower}}}"));
                }
                let min = dec_value(&lower);
                let max = if has_comma {
                    if upper.is_empty() {
                        None
                    } else {
                        Some(dec_value(&upper))
                    }
                } else {
                    Some(min)
                };
                (min, max)
            }
            '*' => {
                self.emit("*");
                (0, None)
            }
            '+' => {
                self.emit("+");
                (1, None)
            }
            '?' => {
                self.emit("?");
                (0, Some(1))
            }
            _ => unreachable!("not a quantifier: {ch}"),
        };

        match self.last_term {
            Term::None | Term::Assertion => {
                Err(self.syntax_error_at("nothing to repeat", start).into())
            }
            Term::Quantifier => Err(self.syntax_error_at("multiple repeat", start).into()),
            Term::Atom => {
                if self.consume_if('?') {
                    self.emit("?");
                }
                self.frame().quantify(min, max);
                self.last_term = Term::Quantifier;
                Ok(())
            }
        }
    }

    // ---- groups ----

    fn parens(&mut self, start: usize) -> Result<(), TranslateError> {
        if self.at_end() {
            return Err(self
                .syntax_error_at("missing ), unterminated subpattern", start)
                .into());
        }
        let ch0 = self.consume_char();
        if ch0 != '?' {
            self.retreat();
            return self.group(true, None, start);
        }
        self.must_have_more()?;
        let ch1 = self.consume_char();
        match ch1 {
            'P' => {
                self.must_have_more()?;
                let ch2 = self.consume_char();
                match ch2 {
                    '<' => {
                        let name = self.parse_group_name('>')?;
                        self.group(true, Some(name), start)
                    }
                    '=' => self.named_backreference(),
                    _ => Err(self
                        .syntax_error_rel(format!("unknown extension ?P{ch2}"), 3)
                        .into()),
                }
            }
            ':' => self.group(false, None, start),
            '#' => {
                self.get_many(|c| c != ')');
                if !self.consume_if(')') {
                    return Err(self
                        .syntax_error_at("missing ), unterminated comment", start)
                        .into());
                }
                Ok(())
            }
            '<' => {
                self.must_have_more()?;
                let ch2 = self.consume_char();
                match ch2 {
                    '=' => self.lookbehind(true, start),
                    '!' => self.lookbehind(false, start),
                    _ => Err(self
                        .syntax_error_rel(format!("unknown extension ?<{ch2}"), 3)
                        .into()),
                }
            }
            '=' => self.lookahead(true, start),
            '!' => self.lookahead(false, start),
            '(' => self.conditional(start),
            '-' | 'i' | 'L' | 'm' | 's' | 'x' | 'a' | 't' | 'u' => self.inline_flags(ch1, start),
            _ => Err(self
                .syntax_error_rel(format!("unknown extension ?{ch1}"), 2)
                .into()),
        }
    }

    fn named_backreference(&mut self) -> Result<(), TranslateError> {
        let name = self.parse_group_name(')')?;
        let elements = name.chars().count();
        let group = self
            .named_groups
            .as_ref()
            .and_then(|map| map.get(&name))
            .copied();
        match group {
            Some(group) => {
                if self.group_stack.contains(&group) {
                    return Err(self
                        .syntax_error_rel("cannot refer to an open group", elements + 1)
                        .into());
                }
                for &contained in &self.lookbehind_stack {
                    if group >= contained {
                        return Err(self
                            .syntax_error_here(
                                "cannot refer to group defined in the same lookbehind subpattern",
                            )
                            .into());
                    }
                }
                if self.ignore_case() {
                    self.bail_out("case-insensitive backreferences")?;
                } else {
                    self.emit(&format!("\\k<{name}>"));
                }
                let width = self.group_width(group);
                self.set_atom(width);
                Ok(())
            }
            None => Err(self
                .syntax_error_rel(format!("unknown group name {name}"), elements + 1)
                .into()),
        }
    }

    fn parse_group_name(&mut self, terminator: char) -> Result<String, TranslateError> {
        let name = self.get_many(|c| c != terminator);
        if name.is_empty() {
            return Err(self.syntax_error_here("missing group name").into());
        }
        if !self.consume_if(terminator) {
            return Err(self
                .syntax_error_rel(
                    format!("missing {terminator}, unterminated name"),
                    name.chars().count(),
                )
                .into());
        }
        if !check_group_name(&name) {
            return Err(self
                .syntax_error_rel(
                    format!("bad character in group name {name}"),
                    name.chars().count() + 1,
                )
                .into());
        }
        Ok(name)
    }

    fn group(
        &mut self,
        capturing: bool,
        name: Option<String>,
        start: usize,
    ) -> Result<(), TranslateError> {
        if capturing {
            self.groups += 1;
            self.group_widths.push(None);
            self.group_stack.push(self.groups);
            match &name {
                Some(name) => self.emit(&format!("(?P<{name}>")),
                None => self.emit("("),
            }
        } else {
            self.emit("(?:");
        }
        if let Some(name) = name {
            let number = self.groups;
            let previous = self
                .named_groups
                .as_ref()
                .and_then(|map| map.get(&name))
                .copied();
            if let Some(was) = previous {
                return Err(self
                    .syntax_error_rel(
                        format!(
                            "redefinition of group name '{name}' as group {number}; was group {was}"
                        ),
                        name.chars().count() + 1,
                    )
                    .into());
            }
            self.named_groups
                .get_or_insert_with(HashMap::new)
                .insert(name, number);
        }
        self.width_stack.push(WidthFrame::new());
        self.disjunction()?;
        let total = self.pop_frame_total();
        if !self.consume_if(')') {
            return Err(self
                .syntax_error_at("missing ), unterminated subpattern", start)
                .into());
        }
        self.emit(")");
        if capturing {
            if let Some(number) = self.group_stack.pop() {
                self.group_widths[number - 1] = Some(total);
            }
        }
        self.set_atom(total);
        Ok(())
    }

    fn lookahead(&mut self, positive: bool, start: usize) -> Result<(), TranslateError> {
        self.emit(if positive { "(?=" } else { "(?!" });
        self.width_stack.push(WidthFrame::new());
        self.disjunction()?;
        self.pop_frame_total();
        if !self.consume_if(')') {
            return Err(self
                .syntax_error_at("missing ), unterminated subpattern", start)
                .into());
        }
        self.emit(")");
        self.set_assertion();
        Ok(())
    }

    fn lookbehind(&mut self, positive: bool, start: usize) -> Result<(), TranslateError> {
        self.emit(if positive { "(?<=" } else { "(?<!" });
        self.lookbehind_stack.push(self.groups + 1);
        self.width_stack.push(WidthFrame::new());
        self.disjunction()?;
        let total = self.pop_frame_total();
        self.lookbehind_stack.pop();
        if !total.is_fixed() {
            // The target only supports lookbehind of a single known length.
            self.bail_out("variable-length lookbehind")?;
        }
        if !self.consume_if(')') {
            return Err(self
                .syntax_error_at("missing ), unterminated subpattern", start)
                .into());
        }
        self.emit(")");
        self.set_assertion();
        Ok(())
    }

    fn conditional(&mut self, start: usize) -> Result<(), TranslateError> {
        let group_id = self.get_many(|c| c != ')');
        if group_id.is_empty() {
            return Err(self.syntax_error_here("missing group name").into());
        }
        let elements = group_id.chars().count();
        if !self.consume_if(')') {
            return Err(self
                .syntax_error_rel("missing ), unterminated name", elements)
                .into());
        }
        let group_number = if check_group_name(&group_id) {
            match self
                .named_groups
                .as_ref()
                .and_then(|map| map.get(&group_id))
                .copied()
            {
                Some(number) => number,
                None => {
                    return Err(self
                        .syntax_error_rel(format!("unknown group name {group_id}"), elements + 1)
                        .into());
                }
            }
        } else {
            match group_id.parse::<usize>() {
                Ok(number) => number,
                Err(_) => {
                    return Err(self
                        .syntax_error_rel(
                            format!("bad character in group name {group_id}"),
                            elements + 1,
                        )
                        .into());
                }
            }
        };
        if !self.lookbehind_stack.is_empty() && self.group_stack.contains(&group_number) {
            return Err(self.syntax_error_here("cannot refer to an open group").into());
        }
        for &contained in &self.lookbehind_stack {
            if group_number >= contained {
                return Err(self
                    .syntax_error_here(
                        "cannot refer to group defined in the same lookbehind subpattern",
                    )
                    .into());
            }
        }
        self.width_stack.push(WidthFrame::new());
        self.disjunction()?;
        if self.consume_if('|') {
            self.disjunction()?;
            if self.cur() == Some('|') {
                return Err(self
                    .syntax_error_here("conditional backref with more than two branches")
                    .into());
            }
        }
        let total = self.pop_frame_total();
        if !self.consume_if(')') {
            return Err(self
                .syntax_error_at("missing ), unterminated subpattern", start)
                .into());
        }
        // Syntax checks come first so an ill-formed conditional is always a
        // syntax error; only a well-formed one is merely untranslatable.
        self.bail_out("conditional backreference groups")?;
        self.set_atom(total);
        Ok(())
    }

    // ---- inline flags ----

    fn inline_flags(&mut self, ch0: char, start: usize) -> Result<(), TranslateError> {
        let mut ch = ch0;
        let mut positive = PythonFlags::empty();
        while let Some(flag) = PythonFlags::from_char(ch) {
            positive |= flag;
            if self.mode == Mode::Str && ch == 'L' {
                return Err(self
                    .syntax_error_here("bad inline flags: cannot use 'L' flag with a str pattern")
                    .into());
            }
            if self.mode == Mode::Bytes && ch == 'u' {
                return Err(self
                    .syntax_error_here(
                        "bad inline flags: cannot use 'u' flag with a bytes pattern",
                    )
                    .into());
            }
            if positive.num_type_flags() > 1 {
                return Err(self
                    .syntax_error_here(
                        "bad inline flags: flags 'a', 'u' and 'L' are incompatible",
                    )
                    .into());
            }
            if self.at_end() {
                return Err(self.syntax_error_here("missing -, : or )").into());
            }
            ch = self.consume_char();
        }
        match ch {
            ')' => {
                // Global inline flags, e.g. `(?i)`. They count as written
                // by the caller when resolving flag/mode conflicts.
                self.explicit_flags |= positive;
                self.global_flags |= positive;
                self.set_atom(Width::ZERO);
                Ok(())
            }
            ':' => {
                if positive.intersects(PythonFlags::GLOBAL_FLAGS) {
                    return Err(self
                        .syntax_error_rel("bad inline flags: cannot turn on global flag", 1)
                        .into());
                }
                self.scoped_flags(positive, PythonFlags::empty(), start)
            }
            '-' => {
                if positive.intersects(PythonFlags::GLOBAL_FLAGS) {
                    return Err(self
                        .syntax_error_rel("bad inline flags: cannot turn on global flag", 1)
                        .into());
                }
                if self.at_end() {
                    return Err(self.syntax_error_here("missing flag").into());
                }
                ch = self.consume_char();
                let mut negative = PythonFlags::empty();
                while let Some(flag) = PythonFlags::from_char(ch) {
                    negative |= flag;
                    if PythonFlags::is_type_flag_char(ch) {
                        return Err(self
                            .syntax_error_here(
                                "bad inline flags: cannot turn off flags 'a', 'u' and 'L'",
                            )
                            .into());
                    }
                    if self.at_end() {
                        return Err(self.syntax_error_here("missing :").into());
                    }
                    ch = self.consume_char();
                }
                if ch != ':' {
                    if ch.is_alphabetic() {
                        return Err(self.syntax_error_rel("unknown flag", 1).into());
                    }
                    return Err(self.syntax_error_rel("missing :", 1).into());
                }
                if negative.intersects(PythonFlags::GLOBAL_FLAGS) {
                    return Err(self
                        .syntax_error_rel("bad inline flags: cannot turn off global flag", 1)
                        .into());
                }
                self.scoped_flags(positive, negative, start)
            }
            _ => {
                if ch.is_alphabetic() {
                    return Err(self.syntax_error_rel("unknown flag", 1).into());
                }
                Err(self.syntax_error_rel("missing -, : or )", 1).into())
            }
        }
    }

    fn scoped_flags(
        &mut self,
        positive: PythonFlags,
        negative: PythonFlags,
        start: usize,
    ) -> Result<(), TranslateError> {
        if positive.intersects(negative) {
            return Err(self
                .syntax_error_here("bad inline flags: flag turned on and off")
                .into());
        }
        let mut new_flags = (self.local_flags() | positive) - negative;
        if positive.num_type_flags() > 0 {
            // A type flag in a scoped group displaces the others.
            new_flags -= PythonFlags::TYPE_FLAGS - positive;
        }
        self.flags_stack.push(new_flags);
        let result = self.group(false, None, start);
        self.flags_stack.pop();
        result
    }
}

fn check_group_name(name: &str) -> bool {
    name.chars().enumerate().all(|(i, ch)| {
        if i == 0 {
            ch.is_alphabetic() || ch == '_'
        } else {
            ch.is_alphanumeric() || ch == '_'
        }
    }) && !name.is_empty()
}

fn parse_hex(digits: &str) -> u32 {
    digits
        .chars()
        .fold(0u32, |acc, ch| acc * 16 + ch.to_digit(16).unwrap_or(0))
}

fn parse_octal(digits: &str) -> u32 {
    digits
        .chars()
        .fold(0u32, |acc, ch| acc * 8 + ch.to_digit(8).unwrap_or(0))
}

fn dec_value(digits: &str) -> u64 {
    digits.chars().fold(0u64, |acc, ch| {
        acc.saturating_mul(10)
            .saturating_add(ch.to_digit(10).unwrap_or(0) as u64)
    })
}

/// Compare two (possibly huge) decimal strings without parsing them.
fn dec_gt(a: &str, b: &str) -> bool {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len() > b.len() || (a.len() == b.len() && a > b)
}

#[cfg(test)]
mod tests {
    use crate::{
        error::TranslateError,
        source::{Flavor, Mode, RegexSource},
        translation::Translation,
    };

    use super::*;

    fn translate_str(pattern: &str) -> String {
        Flavor::Python
            .translate(&RegexSource::builder(pattern).build())
            .unwrap()
            .into_pattern()
    }

    fn translate_with(
        pattern: &str,
        flags: &str,
        mode: Mode,
    ) -> Result<Translation, TranslateError> {
        Flavor::Python.translate(&RegexSource::builder(pattern).flags(flags).mode(mode).build())
    }

    fn syntax_message(result: Result<Translation, TranslateError>) -> String {
        match result {
            Err(TranslateError::Syntax(e)) => e.message().to_string(),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    fn unsupported_construct(result: Result<Translation, TranslateError>) -> String {
        match result {
            Err(TranslateError::Unsupported(e)) => e.construct().to_string(),
            other => panic!("expected unsupported error, got {other:?}"),
        }
    }

    #[test]
    fn literals_and_metacharacters() {
        assert_eq!(translate_str("abc"), "abc");
        assert_eq!(translate_str("a}b"), r"a\}b");
        assert_eq!(translate_str("a]b"), r"a\]b");
        assert_eq!(translate_str("a.b"), r"a[^\n]b");
        assert_eq!(translate_str("a+b*?c??"), "a+b*?c??");
    }

    #[test]
    fn anchors() {
        assert_eq!(translate_str("^a$"), r"\Aa(?:\z|(?=\n\z))");
        let t = translate_with("^a$", "m", Mode::Str).unwrap();
        assert_eq!(t.pattern(), "(?m:^)a(?m:$)");
        assert_eq!(translate_str(r"\Aa\Z"), r"\Aa\z");
    }

    #[test]
    fn dotall() {
        assert_eq!(
            translate_with("a.b", "s", Mode::Str).unwrap().pattern(),
            "a(?s:.)b"
        );
    }

    #[test]
    fn group_numbering_and_names() {
        let t = translate_str(r"(a)(?:b)(?P<x>c)");
        assert_eq!(t, "(a)(?:b)(?P<x>c)");

        let t = translate_with(r"(a)(?P<x>b)(c)", "", Mode::Str).unwrap();
        assert_eq!(t.groups().count(), 4);
        assert_eq!(t.groups().index_of("x"), Some(2));

        let t = translate_with("(a)(b)", "", Mode::Str).unwrap();
        assert_eq!(t.groups().count(), 3);
        assert!(t.groups().named().is_none());
    }

    #[test]
    fn named_group_errors() {
        let message = syntax_message(translate_with(r"(?P<x>a)(?P<x>b)", "", Mode::Str));
        assert_eq!(message, "redefinition of group name 'x' as group 2; was group 1");

        let message = syntax_message(translate_with(r"(?P=x)", "", Mode::Str));
        assert_eq!(message, "unknown group name x");

        let message = syntax_message(translate_with(r"(?P<1x>a)", "", Mode::Str));
        assert_eq!(message, "bad character in group name 1x");

        let message = syntax_message(translate_with(r"(?P<>a)", "", Mode::Str));
        assert_eq!(message, "missing group name");
    }

    #[test]
    fn named_backreferences_stay_named() {
        // The target refuses `\1` in any pattern containing a named group,
        // so references to named groups use the named form, even when the
        // source wrote them numerically.
        assert_eq!(translate_str(r"(?P<x>a)(?P=x)"), r"(?P<x>a)\k<x>");
        assert_eq!(translate_str(r"(?P<x>a)\1"), r"(?P<x>a)\k<x>");
        assert_eq!(translate_str(r"(a)(?P<x>b)\2"), r"(a)(?P<x>b)\k<x>");
    }

    #[test]
    fn numbered_backref_with_named_group_is_untranslatable() {
        let construct = unsupported_construct(translate_with(r"(a)\1(?P<x>b)", "", Mode::Str));
        assert_eq!(construct, "numbered backreferences mixed with named groups");
        assert!(Flavor::Python
            .validate(&RegexSource::builder(r"(a)\1(?P<x>b)").build())
            .is_ok());
    }

    #[test]
    fn backreferences() {
        assert_eq!(translate_str(r"(a)\1"), r"(a)\1");

        let message = syntax_message(translate_with(r"(a)\2", "", Mode::Str));
        assert_eq!(message, "invalid group reference 2");

        let message = syntax_message(translate_with(r"(\1)", "", Mode::Str));
        assert_eq!(message, "cannot refer to an open group");

        let construct = unsupported_construct(translate_with(r"(a)\1", "i", Mode::Str));
        assert_eq!(construct, "case-insensitive backreferences");
        let construct = unsupported_construct(translate_with(r"(?P<x>a)(?P=x)", "i", Mode::Str));
        assert_eq!(construct, "case-insensitive backreferences");
        assert!(Flavor::Python
            .validate(&RegexSource::builder(r"(a)\1").flags("i").build())
            .is_ok());
    }

    #[test]
    fn character_escapes() {
        assert_eq!(translate_str(r"\x41"), "A");
        assert_eq!(translate_str(r"\u0041"), "A");
        assert_eq!(translate_str(r"\U00000041"), "A");
        assert_eq!(translate_str(r"\u2603"), "\u{2603}");
        assert_eq!(translate_str(r"\101"), "A");
        assert_eq!(translate_str(r"\n\t"), "\n\t");
        assert_eq!(translate_str(r"\$"), r"\$");

        let message = syntax_message(translate_with(r"\x4", "", Mode::Str));
        assert_eq!(message, r"incomplete escape \x4");

        let message = syntax_message(translate_with(r"\u123", "", Mode::Str));
        assert_eq!(message, r"incomplete escape \u123");

        let message = syntax_message(translate_with(r"\U00110000", "", Mode::Str));
        assert_eq!(
            message,
            r"unicode escape value \U00110000 outside of range 0-0x10FFFF"
        );

        let message = syntax_message(translate_with(r"\777", "", Mode::Str));
        assert_eq!(message, r"octal escape value \777 outside of range 0-o377");

        let message = syntax_message(translate_with(r"\q", "", Mode::Str));
        assert_eq!(message, r"bad escape \q");

        let message = syntax_message(translate_with("\\", "", Mode::Str));
        assert_eq!(message, "bad escape (end of pattern)");
    }

    #[test]
    fn u_escapes_are_str_only() {
        let message = syntax_message(translate_with(r"\u0041", "", Mode::Bytes));
        assert_eq!(message, r"bad escape \u");
    }

    #[test]
    fn lone_surrogate_escape() {
        let construct = unsupported_construct(translate_with(r"\ud800", "", Mode::Str));
        assert_eq!(construct, "lone surrogate escapes");
        assert!(Flavor::Python
            .validate(&RegexSource::builder(r"\ud800").build())
            .is_ok());
    }

    #[test]
    fn character_classes() {
        assert_eq!(translate_str("[abc]"), "[abc]");
        assert_eq!(translate_str("[^a-z]"), "[^a-z]");
        assert_eq!(translate_str("[]a]"), r"[\]a]");
        assert_eq!(translate_str("[a-]"), "[a-]");
        assert_eq!(translate_str("[a&b]"), r"[a\&b]");
        assert_eq!(translate_str(r"[\d]"), r"[\p{Decimal_Number}]");
        assert_eq!(
            translate_with(r"[\d]", "", Mode::Bytes).unwrap().pattern(),
            "[0-9]"
        );
        assert_eq!(
            translate_str(r"[\S]"),
            r"[[^\x1c-\x1f\p{White_Space}]]"
        );

        let message = syntax_message(translate_with("[z-a]", "", Mode::Str));
        assert_eq!(message, "bad character range z-a");

        let message = syntax_message(translate_with(r"[a-\d]", "", Mode::Str));
        assert_eq!(message, r"bad character range a-\d");

        let message = syntax_message(translate_with("[ab", "", Mode::Str));
        assert_eq!(message, "unterminated character set");

        let message = syntax_message(translate_with("[]", "", Mode::Str));
        assert_eq!(message, "unterminated character set");
    }

    #[test]
    fn shorthand_classes_by_mode() {
        assert_eq!(translate_str(r"\d"), r"\p{Decimal_Number}");
        assert_eq!(
            translate_with(r"\d", "", Mode::Bytes).unwrap().pattern(),
            "[0-9]"
        );
        assert_eq!(
            translate_with(r"\d", "a", Mode::Str).unwrap().pattern(),
            "[0-9]"
        );
        assert_eq!(
            translate_with(r"\w", "", Mode::Bytes).unwrap().pattern(),
            "[0-9A-Za-z_]"
        );
        assert!(translate_str(r"\w").starts_with(r"[\p{Letter}"));
        assert_eq!(translate_str(r"\D"), r"\P{Decimal_Number}");

        // Byte-mode output never leans on the target's Unicode defaults.
        for pattern in [r"\d", r"\D", r"\s", r"\S", r"\w", r"\W", r"\b"] {
            let out = translate_with(pattern, "", Mode::Bytes).unwrap();
            assert!(!out.pattern().contains("\\p{"), "{pattern}: {}", out.pattern());
        }
    }

    #[test]
    fn locale_dependent_constructs_bail() {
        let construct = unsupported_construct(translate_with(r"\w", "L", Mode::Bytes));
        assert_eq!(construct, "locale-specific definitions of word characters");

        let construct = unsupported_construct(translate_with(r"\b", "L", Mode::Bytes));
        assert_eq!(construct, "locale-specific word boundary assertions");

        let construct = unsupported_construct(translate_with("a", "iL", Mode::Bytes));
        assert_eq!(construct, "locale-specific case folding");

        for (pattern, flags) in [(r"\w", "L"), (r"\b", "L"), ("a", "iL")] {
            assert!(Flavor::Python
                .validate(
                    &RegexSource::builder(pattern)
                        .flags(flags)
                        .mode(Mode::Bytes)
                        .build()
                )
                .is_ok());
        }
    }

    #[test]
    fn case_insensitive_literals() {
        assert_eq!(translate_with("a", "i", Mode::Str).unwrap().pattern(), "[Aa]");
        assert_eq!(
            translate_with("a", "i", Mode::Bytes).unwrap().pattern(),
            "[aA]"
        );
        assert_eq!(
            translate_with("a", "ia", Mode::Str).unwrap().pattern(),
            "[aA]"
        );
        // Unicode simple folding pulls in the Kelvin sign.
        assert_eq!(
            translate_with("k", "i", Mode::Str).unwrap().pattern(),
            "[Kk\u{212a}]"
        );
        // Non-letters fold to themselves.
        assert_eq!(translate_with("1", "i", Mode::Str).unwrap().pattern(), "[1]");
    }

    #[test]
    fn case_insensitive_classes() {
        assert_eq!(
            translate_with("[a-c]", "i", Mode::Str).unwrap().pattern(),
            "[a-cA-C]"
        );
        assert_eq!(
            translate_with("[a-c]", "i", Mode::Bytes).unwrap().pattern(),
            "[a-cABC]"
        );
        assert_eq!(
            translate_with("[x]", "i", Mode::Str).unwrap().pattern(),
            "[xX]"
        );
    }

    #[test]
    fn verbose_mode() {
        let t = translate_with("a b#c\nd", "x", Mode::Str).unwrap();
        assert_eq!(t.pattern(), "abd");

        let t = translate_with(r"a\ b", "x", Mode::Str).unwrap();
        assert_eq!(t.pattern(), "a b");

        assert_eq!(translate_str("a(?#note)b"), "ab");

        let message = syntax_message(translate_with("a(?#note", "", Mode::Str));
        assert_eq!(message, "missing ), unterminated comment");
    }

    #[test]
    fn inline_flags() {
        assert_eq!(translate_str("(?i)a"), "[Aa]");
        assert_eq!(translate_str("(?i:a)b"), "(?:[Aa])b");
        assert_eq!(translate_str("x(?i)y"), "x[Yy]");

        let t = translate_with(r"(?a:\w)x", "", Mode::Str).unwrap();
        assert!(t.pattern().starts_with("(?:[0-9A-Za-z_])"));

        let message = syntax_message(translate_with("(?i", "", Mode::Str));
        assert_eq!(message, "missing -, : or )");

        let message = syntax_message(translate_with("(?z)", "", Mode::Str));
        assert_eq!(message, "unknown extension ?z");

        let message = syntax_message(translate_with("(?L)a", "", Mode::Str));
        assert_eq!(
            message,
            "bad inline flags: cannot use 'L' flag with a str pattern"
        );

        let message = syntax_message(translate_with("(?u)a", "", Mode::Bytes));
        assert_eq!(
            message,
            "bad inline flags: cannot use 'u' flag with a bytes pattern"
        );

        let message = syntax_message(translate_with("(?au:x)", "", Mode::Str));
        assert_eq!(
            message,
            "bad inline flags: flags 'a', 'u' and 'L' are incompatible"
        );

        let message = syntax_message(translate_with("(?i-i:a)", "", Mode::Str));
        assert_eq!(message, "bad inline flags: flag turned on and off");

        let message = syntax_message(translate_with("(?-a:x)", "", Mode::Str));
        assert_eq!(
            message,
            "bad inline flags: cannot turn off flags 'a', 'u' and 'L'"
        );

        let message = syntax_message(translate_with("(?t:a)", "", Mode::Str));
        assert_eq!(message, "bad inline flags: cannot turn on global flag");
    }

    #[test]
    fn lookarounds() {
        assert_eq!(translate_str("(?=a)b"), "(?=a)b");
        assert_eq!(translate_str("(?!a)b"), "(?!a)b");
        assert_eq!(translate_str("(?<=a)b"), "(?<=a)b");
        assert_eq!(translate_str("(?<!a)b"), "(?<!a)b");
        assert_eq!(translate_str("(?<=ab|cd)e"), "(?<=ab|cd)e");
        assert_eq!(translate_str(r"(a)(?<=\1)"), r"(a)(?<=\1)");
    }

    #[test]
    fn variable_length_lookbehind() {
        for pattern in [r"(?<=a*)b", r"(?<=a|bc)d", r"(a+)(?<=\1)", r"(?<=a{1,2})b"] {
            let construct =
                unsupported_construct(translate_with(pattern, "", Mode::Str));
            assert_eq!(construct, "variable-length lookbehind", "{pattern}");
            assert!(
                Flavor::Python
                    .validate(&RegexSource::builder(pattern).build())
                    .is_ok(),
                "{pattern}"
            );
        }
        // Fixed-width bodies are fine, including nested groups.
        assert_eq!(translate_str(r"(?<=(?:ab|cd))e"), "(?<=(?:ab|cd))e");
        assert_eq!(translate_str(r"(?<=a{3})b"), "(?<=a{3})b");
    }

    #[test]
    fn lookbehind_group_references() {
        let message = syntax_message(translate_with(r"(?<=(a)\1)", "", Mode::Str));
        assert_eq!(
            message,
            "cannot refer to group defined in the same lookbehind subpattern"
        );
    }

    #[test]
    fn conditional_backreference_groups() {
        let construct = unsupported_construct(translate_with(r"(a)(?(1)b|c)", "", Mode::Str));
        assert_eq!(construct, "conditional backreference groups");
        assert!(Flavor::Python
            .validate(&RegexSource::builder(r"(a)(?(1)b|c)").build())
            .is_ok());

        let message = syntax_message(translate_with(r"(a)(?(x)b)", "", Mode::Str));
        assert_eq!(message, "unknown group name x");

        // Ill-formed conditionals are syntax errors in both driving calls,
        // not unsupported constructs.
        let message = syntax_message(translate_with(r"(a)(?(1)b|c|d)", "", Mode::Str));
        assert_eq!(message, "conditional backref with more than two branches");
        assert!(Flavor::Python
            .validate(&RegexSource::builder(r"(a)(?(1)b|c|d)").build())
            .is_err());
    }

    #[test]
    fn quantifier_validation() {
        let message = syntax_message(translate_with("*a", "", Mode::Str));
        assert_eq!(message, "nothing to repeat");

        let message = syntax_message(translate_with("a**", "", Mode::Str));
        assert_eq!(message, "multiple repeat");

        let message = syntax_message(translate_with("(?=a)*", "", Mode::Str));
        assert_eq!(message, "nothing to repeat");

        let message = syntax_message(translate_with("a{3,2}", "", Mode::Str));
        assert_eq!(message, "min repeat greater than max repeat");
    }

    #[test]
    fn quantifier_ranges() {
        assert_eq!(translate_str("a{2,3}"), "a{2,3}");
        assert_eq!(translate_str("a{2,}"), "a{2,}");
        assert_eq!(translate_str("a{,3}"), "a{0,3}");
        assert_eq!(translate_str("a{3}"), "a{3}");
        assert_eq!(translate_str("a{,}"), "a*");
        assert_eq!(translate_str("a{}"), r"a\{\}");
        assert_eq!(translate_str("a{x}"), r"a\{x\}");
        assert_eq!(translate_str("a{2x}"), r"a\{2x\}");
        assert_eq!(translate_str("a{2,3}?"), "a{2,3}?");
    }

    #[test]
    fn parenthesis_errors() {
        let err = translate_with("a)", "", Mode::Str);
        match err {
            Err(TranslateError::Syntax(e)) => {
                assert_eq!(e.message(), "unbalanced parenthesis");
                assert_eq!(e.position(), Some(1));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }

        let message = syntax_message(translate_with("(a", "", Mode::Str));
        assert_eq!(message, "missing ), unterminated subpattern");

        let message = syntax_message(translate_with("(?Pz)", "", Mode::Str));
        assert_eq!(message, "unknown extension ?Pz");

        let message = syntax_message(translate_with("(?<z)", "", Mode::Str));
        assert_eq!(message, "unknown extension ?<z");

        let message = syntax_message(translate_with("(?", "", Mode::Str));
        assert_eq!(message, "unexpected end of pattern");
    }

    #[test]
    fn bytes_mode_alphabet() {
        let err = translate_with("a€b", "", Mode::Bytes);
        match err {
            Err(TranslateError::Syntax(e)) => {
                assert_eq!(e.position(), Some(1));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
        // The same literal is fine in str mode.
        assert_eq!(translate_str("a€b"), "a€b");

        // High bytes are emitted as escapes so the output stays ASCII.
        assert_eq!(
            translate_with("é", "", Mode::Bytes).unwrap().pattern(),
            r"\xe9"
        );
        assert_eq!(
            translate_with(r"\xff", "", Mode::Bytes).unwrap().pattern(),
            r"\xff"
        );
    }

    #[test]
    fn flag_mode_conflicts() {
        let message = syntax_message(translate_with("a", "u", Mode::Bytes));
        assert_eq!(message, "cannot use UNICODE flag with a bytes pattern");

        let message = syntax_message(translate_with("a", "L", Mode::Str));
        assert_eq!(message, "cannot use LOCALE flag with a str pattern");

        let message = syntax_message(translate_with("a", "au", Mode::Str));
        assert_eq!(message, "ASCII and UNICODE flags are incompatible");

        let message = syntax_message(translate_with("a", "aL", Mode::Bytes));
        assert_eq!(message, "ASCII and LOCALE flags are incompatible");

        let message = syntax_message(translate_with("a", "z", Mode::Str));
        assert_eq!(message, "unknown flag 'z'");

        // Validation reports the same conflicts.
        assert!(Flavor::Python
            .validate(&RegexSource::builder("a").flags("u").mode(Mode::Bytes).build())
            .is_err());
    }

    #[test]
    fn unicode_bit_follows_mode() {
        for flags in ["", "i", "a", "imsx"] {
            let t = translate_with("a", flags, Mode::Str).unwrap();
            assert!(t.is_unicode(), "str flags={flags}");
            let t = translate_with("a", flags, Mode::Bytes).unwrap();
            assert!(!t.is_unicode(), "bytes flags={flags}");
        }
    }

    #[test]
    fn flag_metadata() {
        let t = translate_with("a", "im", Mode::Str).unwrap();
        assert!(t.flags().is_set("IGNORECASE"));
        assert!(t.flags().is_set("MULTILINE"));
        assert!(t.flags().is_set("UNICODE"));
        assert!(!t.flags().is_set("VERBOSE"));

        let t = translate_with("a", "", Mode::Bytes).unwrap();
        assert!(!t.flags().is_set("UNICODE"));
    }

    #[test]
    fn translation_is_deterministic() {
        let source = RegexSource::builder(r"(?P<x>a|bb)+[c-k]\d")
            .flags("i")
            .mode(Mode::Str)
            .build();
        let first = Flavor::Python.translate(&source).unwrap();
        let second = Flavor::Python.translate(&source).unwrap();
        assert_eq!(first.pattern(), second.pattern());
        assert_eq!(first.groups(), second.groups());
    }

    #[test]
    fn validate_agrees_with_translate_on_syntax() {
        let patterns = [
            "abc",
            "a)",
            "(a",
            "[z-a]",
            r"(a)\2",
            r"(?P<x>a)(?P<x>b)",
            r"(a)(?(1)b|c)",
            r"(?<=a*)b",
            "a**",
            r"\q",
            "(?i:a)",
        ];
        for pattern in patterns {
            let source = RegexSource::builder(pattern).build();
            let validated = Flavor::Python.validate(&source).is_ok();
            let translated = Flavor::Python.translate(&source);
            let syntax_failed = matches!(translated, Err(TranslateError::Syntax(_)));
            assert_eq!(validated, !syntax_failed, "{pattern}");
        }
    }

    #[test]
    fn error_positions() {
        let err = Flavor::Python
            .validate(&RegexSource::builder(r"ab[z-a]").build())
            .unwrap_err();
        assert_eq!(err.position(), Some(3));
        assert!(!err.message().is_empty());

        // Positions count code points, not bytes.
        let err = Flavor::Python
            .validate(&RegexSource::builder("ééé)").build())
            .unwrap_err();
        assert_eq!(err.position(), Some(3));
    }

    #[test]
    fn width_arithmetic() {
        let w = Width::ONE.repeat(2, Some(3));
        assert_eq!(w, Width { lo: 2, hi: Some(3) });
        assert!(!w.is_fixed());
        assert!(Width::ONE.repeat(2, Some(2)).is_fixed());
        assert!(Width::ZERO.repeat(0, None).is_fixed());
        assert_eq!(
            Width::ONE.union(Width { lo: 2, hi: Some(2) }),
            Width { lo: 1, hi: Some(2) }
        );
    }
}
