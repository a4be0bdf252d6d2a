/*!
Translate regex patterns from foreign dialects into one common target
dialect.

A pattern written for another language's regex engine usually *almost* works
when handed to a Rust regex engine: most of the syntax is shared, but
predefined classes, anchors, case folding and flag handling differ in quiet,
subject-corrupting ways. This crate parses a source pattern under its own
dialect's grammar and emits an equivalent pattern in the Rust regex dialect
(extended with backreferences and lookaround, as accepted by engines like
`fancy-regex`), plus the metadata a host needs to wire up matching: capture
group count and names, the parsed flag set, and whether the pattern matches
code points or bytes.

```
use regex_flavor::{Flavor, Mode, RegexSource};

let source = RegexSource::builder(r"(?P<num>\d+)\.(\d+)")
    .flags("a")
    .mode(Mode::Str)
    .build();
let translation = Flavor::Python.translate(&source).unwrap();
assert_eq!(translation.pattern(), r"(?P<num>[0-9]+)\.([0-9]+)");
assert_eq!(translation.groups().index_of("num"), Some(1));
```

Validation is available separately and never allocates output:

```
use regex_flavor::{Flavor, RegexSource};

assert!(Flavor::Python.validate(&RegexSource::builder(r"a{1,3}").build()).is_ok());
assert!(Flavor::Python.validate(&RegexSource::builder(r"a{3,1}").build()).is_err());
```

Patterns that are well-formed but use constructs the target dialect cannot
express (conditional backreference groups, variable-length lookbehind,
locale-dependent matching) pass [`validate`](Flavor::validate) but fail
[`translate`](Flavor::translate) with [`TranslateError::Unsupported`], so
hosts can distinguish "reject this pattern" from "run it elsewhere".
*/

pub mod error;
pub mod python;
mod source;
mod translation;

pub use error::{SyntaxError, TranslateError, UnsupportedError};
pub use python::PythonFlags;
pub use source::{Flavor, Mode, RegexSource};
pub use translation::{CaptureGroups, FlagSet, Translation};
