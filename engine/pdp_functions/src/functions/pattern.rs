//! Regular-expression match functions.
//!
//! Patterns use XML Schema regular-expression syntax with `fn:matches`
//! semantics: a pattern matches when it matches any substring, unless it
//! anchors itself with `^` or `$`. Patterns are translated to the `regex`
//! crate's syntax by an [`XsdPatternCompiler`]; the compiler sits behind the
//! [`PatternCompiler`] trait so hosts can substitute their own.
//!
//! A pattern given as a literal is compiled once, when the call is bound. A
//! pattern computed from the request is compiled on every evaluation.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use pdp_values::{argument_indeterminate, invalid_pattern, AttributeValue, EvalResult, PrimitiveKind, Value};
use regex::Regex;

use super::args::Args;
use super::{Version, BOOLEAN, STRING};
use crate::call::{Body, FirstOrderFunction, PrimitiveBody};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

/// A compiled pattern.
pub trait CompiledPattern: Send + Sync + fmt::Debug {
    /// Whether the pattern matches anywhere in `text`.
    fn is_match(&self, text: &str) -> bool;
}

impl CompiledPattern for Regex {
    fn is_match(&self, text: &str) -> bool {
        Regex::is_match(self, text)
    }
}

/// Compiles pattern text for the regexp-match functions.
pub trait PatternCompiler: Send + Sync + fmt::Debug {
    /// Compile `pattern`, failing with an invalid-pattern error.
    fn compile(&self, pattern: &str) -> EvalResult<Arc<dyn CompiledPattern>>;
}

/// `\i`: XML name start characters.
macro_rules! name_start {
    () => {
        r":A-Z_a-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}\x{37F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}\x{10000}-\x{EFFFF}"
    };
}

/// `\c` adds these to the name start characters.
macro_rules! name_rest {
    () => {
        r"\-.0-9\x{B7}\x{300}-\x{36F}\x{203F}-\x{2040}"
    };
}

const NAME_START: &str = concat!("[", name_start!(), "]");
const NOT_NAME_START: &str = concat!("[^", name_start!(), "]");
const NAME_CHAR: &str = concat!("[", name_start!(), name_rest!(), "]");
const NOT_NAME_CHAR: &str = concat!("[^", name_start!(), name_rest!(), "]");

/// `\w`: everything except punctuation, separators and other characters.
const WORD: &str = r"[^\p{P}\p{Z}\p{C}]";
const NOT_WORD: &str = r"[\p{P}\p{Z}\p{C}]";
/// `\s`: the four XML whitespace characters only.
const SPACE: &str = r"[ \t\n\r]";
const NOT_SPACE: &str = r"[^ \t\n\r]";
/// `.` outside a class: anything but a line ending.
const ANY_CHAR: &str = r"[^\n\r]";

/// Translates XML Schema patterns to `regex` syntax.
///
/// In strict mode, constructs that either have no `regex` equivalent or
/// mean something different there are rejected: Unicode block escapes
/// (`\p{IsBasicLatin}`), `(?` groups and the `\b \B \A \z \Z` assertions.
/// Otherwise they are passed through unchanged.
#[derive(Clone, Debug, Default)]
pub struct XsdPatternCompiler {
    strict: bool,
}

impl XsdPatternCompiler {
    /// Lenient translation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translation rejecting untranslatable constructs.
    pub fn strict() -> Self {
        XsdPatternCompiler { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Rewrite `pattern` into `regex` syntax.
    pub fn translate(&self, pattern: &str) -> EvalResult<String> {
        let mut out = String::with_capacity(pattern.len() + 16);
        let mut chars = pattern.chars().peekable();
        let mut class_depth = 0usize;

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let Some(escaped) = chars.next() else {
                        return Err(invalid_pattern(pattern, "trailing backslash"));
                    };
                    match escaped {
                        'i' => out.push_str(NAME_START),
                        'I' => out.push_str(NOT_NAME_START),
                        'c' => out.push_str(NAME_CHAR),
                        'C' => out.push_str(NOT_NAME_CHAR),
                        'w' => out.push_str(WORD),
                        'W' => out.push_str(NOT_WORD),
                        's' => out.push_str(SPACE),
                        'S' => out.push_str(NOT_SPACE),
                        'p' | 'P' if chars.peek() == Some(&'{') => {
                            let mut property = String::new();
                            for p in chars.by_ref() {
                                property.push(p);
                                if p == '}' {
                                    break;
                                }
                            }
                            if self.strict && property.starts_with("{Is") {
                                return Err(invalid_pattern(
                                    pattern,
                                    format!("unsupported block escape \\{escaped}{property}"),
                                ));
                            }
                            out.push('\\');
                            out.push(escaped);
                            out.push_str(&property);
                        }
                        'b' | 'B' | 'A' | 'z' | 'Z' if self.strict => {
                            return Err(invalid_pattern(
                                pattern,
                                format!("\\{escaped} is not an XML Schema escape"),
                            ));
                        }
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                '(' if self.strict && chars.peek() == Some(&'?') => {
                    return Err(invalid_pattern(pattern, "(? groups are not XML Schema syntax"));
                }
                '.' if class_depth == 0 => out.push_str(ANY_CHAR),
                '[' => {
                    class_depth += 1;
                    out.push('[');
                }
                ']' if class_depth > 0 => {
                    class_depth -= 1;
                    out.push(']');
                }
                // Class subtraction: `[a-z-[aeiou]]`.
                '-' if class_depth > 0 && chars.peek() == Some(&'[') => out.push_str("--"),
                '&' | '~' if class_depth > 0 => {
                    out.push('\\');
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}

impl PatternCompiler for XsdPatternCompiler {
    fn compile(&self, pattern: &str) -> EvalResult<Arc<dyn CompiledPattern>> {
        let translated = self.translate(pattern)?;
        let regex = Regex::new(&translated).map_err(|e| invalid_pattern(pattern, e.to_string()))?;
        tracing::trace!(pattern, translated = %translated, "compiled pattern");
        Ok(Arc::new(regex))
    }
}

/// Text a pattern is matched against: the string itself, or the canonical
/// lexical form of other kinds.
fn subject_text(value: &AttributeValue) -> Cow<'_, str> {
    match value.as_str() {
        Some(text) => Cow::Borrowed(text),
        None => Cow::Owned(value.to_string()),
    }
}

/// Match body compiling its pattern on every evaluation.
struct RegexpMatch {
    name: Arc<str>,
    compiler: Arc<dyn PatternCompiler>,
}

impl PrimitiveBody for RegexpMatch {
    fn apply(&self, values: &[AttributeValue]) -> EvalResult<Value> {
        let args = Args::new(&self.name, values);
        let pattern = self
            .compiler
            .compile(args.text(0)?)
            .map_err(|e| argument_indeterminate(1, e))?;
        Ok(Value::from(pattern.is_match(&subject_text(args.value(1)?))))
    }

    fn precompile(
        &self,
        statics: &[Option<&AttributeValue>],
    ) -> EvalResult<Option<Arc<dyn PrimitiveBody>>> {
        let Some(Some(literal)) = statics.first() else {
            return Ok(None);
        };
        let Some(text) = literal.as_str() else {
            return Ok(None);
        };
        let pattern = self.compiler.compile(text)?;
        tracing::debug!(function = %self.name, pattern = text, "pattern compiled at bind time");
        Ok(Some(Arc::new(CompiledMatch {
            name: Arc::clone(&self.name),
            pattern,
        })))
    }
}

/// Match body holding a pattern compiled at bind time.
struct CompiledMatch {
    name: Arc<str>,
    pattern: Arc<dyn CompiledPattern>,
}

impl PrimitiveBody for CompiledMatch {
    fn apply(&self, values: &[AttributeValue]) -> EvalResult<Value> {
        let args = Args::new(&self.name, values);
        Ok(Value::from(self.pattern.is_match(&subject_text(args.value(1)?))))
    }
}

/// Subject datatypes of the regexp-match functions.
const SUBJECTS: &[(PrimitiveKind, Version)] = &[
    (PrimitiveKind::String, Version::V1),
    (PrimitiveKind::AnyUri, Version::V2),
    (PrimitiveKind::IpAddress, Version::V2),
    (PrimitiveKind::DnsName, Version::V2),
    (PrimitiveKind::Rfc822Name, Version::V2),
    (PrimitiveKind::X500Name, Version::V2),
];

pub(crate) fn register(
    registry: &mut FunctionRegistry,
    compiler: &Arc<dyn PatternCompiler>,
) -> EvalResult<()> {
    for &(kind, version) in SUBJECTS {
        let signature = FunctionSignature::fixed(
            &version.id(&format!("{}-regexp-match", kind.short_name())),
            BOOLEAN,
            &[STRING, kind.single()],
        );
        let body = RegexpMatch {
            name: signature.name_arc(),
            compiler: Arc::clone(compiler),
        };
        registry.register(FirstOrderFunction::shared(signature, Body::Primitive(Arc::new(body))))?;
    }
    Ok(())
}
