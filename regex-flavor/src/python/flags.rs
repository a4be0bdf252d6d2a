use bitflags::bitflags;

use crate::{error::SyntaxError, source::Mode};

bitflags! {
    /// The flags of Python's `re` module, as parsed from a flag string or
    /// from inline `(?..)` groups.
    ///
    /// `ASCII`, `LOCALE` and `UNICODE` are "type" flags: they select the
    /// semantics of `\w`, `\b`, `\d`, `\s` and of case folding, and are
    /// mutually exclusive.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PythonFlags: u16 {
        const IGNORECASE = 1 << 0;
        const LOCALE = 1 << 1;
        const MULTILINE = 1 << 2;
        const DOTALL = 1 << 3;
        const VERBOSE = 1 << 4;
        const ASCII = 1 << 5;
        const UNICODE = 1 << 6;
        const TEMPLATE = 1 << 7;
    }
}

impl PythonFlags {
    pub(crate) const TYPE_FLAGS: PythonFlags = PythonFlags::ASCII
        .union(PythonFlags::LOCALE)
        .union(PythonFlags::UNICODE);

    /// Flags that may only appear globally, never in a scoped `(?f:..)` group.
    pub(crate) const GLOBAL_FLAGS: PythonFlags = PythonFlags::TEMPLATE;

    pub(crate) fn from_char(ch: char) -> Option<PythonFlags> {
        Some(match ch {
            'i' => PythonFlags::IGNORECASE,
            'L' => PythonFlags::LOCALE,
            'm' => PythonFlags::MULTILINE,
            's' => PythonFlags::DOTALL,
            'x' => PythonFlags::VERBOSE,
            'a' => PythonFlags::ASCII,
            'u' => PythonFlags::UNICODE,
            't' => PythonFlags::TEMPLATE,
            _ => return None,
        })
    }

    pub(crate) fn is_type_flag_char(ch: char) -> bool {
        matches!(ch, 'a' | 'L' | 'u')
    }

    pub(crate) fn num_type_flags(self) -> u32 {
        self.intersection(PythonFlags::TYPE_FLAGS).bits().count_ones()
    }

    /// Parse a flag string such as `"imx"`.
    pub(crate) fn parse(flags: &str) -> Result<PythonFlags, SyntaxError> {
        let mut out = PythonFlags::empty();
        for ch in flags.chars() {
            match PythonFlags::from_char(ch) {
                Some(flag) => out |= flag,
                None => return Err(SyntaxError::new(format!("unknown flag '{ch}'"))),
            }
        }
        Ok(out)
    }

    /// Resolve the effective flag set for `mode`, rejecting flag/mode
    /// conflicts.
    ///
    /// `explicit` is the flag set as written by the caller, before any
    /// implied additions; it decides whether an ASCII/UNICODE clash is a
    /// caller error or just an implied `UNICODE` to drop.
    pub(crate) fn fixed(
        self,
        mode: Mode,
        explicit: PythonFlags,
    ) -> Result<PythonFlags, SyntaxError> {
        let mut flags = self;
        match mode {
            Mode::Str => {
                if flags.contains(PythonFlags::LOCALE) {
                    return Err(SyntaxError::new(
                        "cannot use LOCALE flag with a str pattern",
                    ));
                }
                if flags.contains(PythonFlags::ASCII) {
                    if explicit.contains(PythonFlags::UNICODE) {
                        return Err(SyntaxError::new(
                            "ASCII and UNICODE flags are incompatible",
                        ));
                    }
                    flags.remove(PythonFlags::UNICODE);
                } else {
                    flags.insert(PythonFlags::UNICODE);
                }
            }
            Mode::Bytes => {
                if flags.contains(PythonFlags::UNICODE) {
                    return Err(SyntaxError::new(
                        "cannot use UNICODE flag with a bytes pattern",
                    ));
                }
                if flags.contains(PythonFlags::ASCII) && flags.contains(PythonFlags::LOCALE) {
                    return Err(SyntaxError::new("ASCII and LOCALE flags are incompatible"));
                }
            }
        }
        Ok(flags)
    }
}
