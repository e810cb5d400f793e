//! `{type}-from-string` and `string-from-{type}`.
//!
//! A string that does not parse is request data, not policy text, so the
//! failure is Indeterminate rather than Syntax.

use pdp_values::{invalid_conversion, AttributeValue, EvalResult, PrimitiveKind, Value};

use super::{primitive_fn, Version, STRING};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

/// Datatypes with a string conversion pair.
const CONVERTIBLE_KINDS: &[PrimitiveKind] = &[
    PrimitiveKind::Boolean,
    PrimitiveKind::Integer,
    PrimitiveKind::Double,
    PrimitiveKind::Time,
    PrimitiveKind::Date,
    PrimitiveKind::DateTime,
    PrimitiveKind::AnyUri,
    PrimitiveKind::DayTimeDuration,
    PrimitiveKind::YearMonthDuration,
    PrimitiveKind::X500Name,
    PrimitiveKind::Rfc822Name,
    PrimitiveKind::IpAddress,
    PrimitiveKind::DnsName,
];

fn from_string(kind: PrimitiveKind, text: &str) -> EvalResult<Value> {
    AttributeValue::parse(kind, text)
        .map(Value::Single)
        .map_err(|e| invalid_conversion(kind.short_name(), text, e.message))
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for &kind in CONVERTIBLE_KINDS {
        let name = kind.short_name();
        registry.register(primitive_fn(
            FunctionSignature::fixed(
                &Version::V3.id(&format!("{name}-from-string")),
                kind.single(),
                &[STRING],
            ),
            move |args| from_string(kind, args.text(0)?),
        ))?;
        registry.register(primitive_fn(
            FunctionSignature::fixed(
                &Version::V3.id(&format!("string-from-{name}")),
                STRING,
                &[kind.single()],
            ),
            |args| Ok(Value::Single(AttributeValue::string(&args.value(0)?.to_string()))),
        ))?;
    }
    Ok(())
}
