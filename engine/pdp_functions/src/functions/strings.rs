//! String and anyURI functions.
//!
//! Indices count characters, not bytes.

use pdp_values::{substring_out_of_range, AttributeValue, EvalResult, Integer, PrimitiveKind, Value};

use super::args::Args;
use super::{primitive_fn, Version, BOOLEAN, INTEGER, STRING};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

type TextPredicate = fn(&str, &str) -> bool;

/// (suffix, predicate over (needle, haystack)).
const SEARCHES: &[(&str, TextPredicate)] = &[
    ("starts-with", |needle, text| text.starts_with(needle)),
    ("ends-with", |needle, text| text.ends_with(needle)),
    ("contains", |needle, text| text.contains(needle)),
];

/// `#x20 #x9 #xD #xA`; other Unicode spaces are content.
const XML_WHITESPACE: &[char] = &[' ', '\t', '\r', '\n'];

/// Characters `[begin, end)` of `text`; an `end` of -1 means the end of the
/// text.

fn substring(text: &str, begin: Integer, end: Integer) -> EvalResult<Value> {
    let length = text.chars().count();
    let out_of_range = || substring_out_of_range(begin.raw(), end.raw(), length);
    let start = usize::try_from(begin.raw()).map_err(|_| out_of_range())?;
    let stop = if end.raw() == -1 {
        length
    } else {
        usize::try_from(end.raw()).map_err(|_| out_of_range())?
    };
    if start > stop || stop > length {
        return Err(out_of_range());
    }
    let slice: String = text.chars().skip(start).take(stop - start).collect();
    Ok(Value::Single(AttributeValue::string(&slice)))
}

fn text_fn(name: &str, f: fn(&str) -> String) -> crate::call::SharedFunction {
    primitive_fn(
        FunctionSignature::fixed(&Version::V1.id(name), STRING, &[STRING]),
        move |args| Ok(Value::Single(AttributeValue::string(&f(args.text(0)?)))),
    )
}

fn concatenate(args: Args<'_>) -> EvalResult<Value> {
    let mut joined = String::new();
    for i in 0..args.len() {
        joined.push_str(args.text(i)?);
    }
    Ok(Value::Single(AttributeValue::string(&joined)))
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    registry.register(primitive_fn(
        FunctionSignature::variadic(
            &Version::V2.id("string-concatenate"),
            STRING,
            &[STRING, STRING],
            STRING,
        ),
        concatenate,
    ))?;

    for (subject, name) in [(PrimitiveKind::String, "string"), (PrimitiveKind::AnyUri, "anyURI")] {
        for &(suffix, predicate) in SEARCHES {
            registry.register(primitive_fn(
                FunctionSignature::fixed(
                    &Version::V3.id(&format!("{name}-{suffix}")),
                    BOOLEAN,
                    &[STRING, subject.single()],
                ),
                move |args| Ok(Value::from(predicate(args.text(0)?, args.text(1)?))),
            ))?;
        }
        registry.register(primitive_fn(
            FunctionSignature::fixed(
                &Version::V3.id(&format!("{name}-substring")),
                STRING,
                &[subject.single(), INTEGER, INTEGER],
            ),
            |args| substring(args.text(0)?, args.get(1)?, args.get(2)?),
        ))?;
    }

    registry.register(text_fn("string-normalize-space", |s| {
        s.trim_matches(XML_WHITESPACE).to_string()
    }))?;
    registry.register(text_fn("string-normalize-to-lower-case", str::to_lowercase))
}
