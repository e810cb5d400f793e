//! `{type}-equal` and `string-equal-ignore-case`.

use pdp_values::{AttributeValue, EvalResult, PrimitiveKind, Value};

use super::{primitive_fn, Version, BOOLEAN, STRING};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

/// Datatypes with an equality function.
const EQUALITY_KINDS: &[PrimitiveKind] = &[
    PrimitiveKind::String,
    PrimitiveKind::Boolean,
    PrimitiveKind::Integer,
    PrimitiveKind::Double,
    PrimitiveKind::Date,
    PrimitiveKind::Time,
    PrimitiveKind::DateTime,
    PrimitiveKind::DayTimeDuration,
    PrimitiveKind::YearMonthDuration,
    PrimitiveKind::AnyUri,
    PrimitiveKind::X500Name,
    PrimitiveKind::Rfc822Name,
    PrimitiveKind::HexBinary,
    PrimitiveKind::Base64Binary,
];

/// Equality as defined for the `-equal` functions.
///
/// Doubles follow IEEE 754, so NaN equals nothing. Temporal values go
/// through the partial order and may be indeterminate across timezones.
pub(crate) fn values_equal(a: &AttributeValue, b: &AttributeValue) -> EvalResult<bool> {
    match (a, b) {
        (AttributeValue::Double(x), AttributeValue::Double(y)) => {
            #[allow(clippy::float_cmp, reason = "IEEE equality is the defined semantics")]
            let equal = x == y;
            Ok(equal)
        }
        (AttributeValue::Time(_) | AttributeValue::Date(_) | AttributeValue::DateTime(_), _) => {
            Ok(a.compare(b)?.is_eq())
        }
        _ => Ok(a == b),
    }
}

fn equal(kind: PrimitiveKind) -> crate::call::SharedFunction {
    let version = match kind {
        PrimitiveKind::DayTimeDuration | PrimitiveKind::YearMonthDuration => Version::V3,
        _ => Version::V1,
    };
    let id = version.id(&format!("{}-equal", kind.short_name()));
    let signature = FunctionSignature::fixed(&id, BOOLEAN, &[kind.single(), kind.single()]);
    primitive_fn(signature, |args| {
        values_equal(args.value(0)?, args.value(1)?).map(Value::from)
    })
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for &kind in EQUALITY_KINDS {
        registry.register(equal(kind))?;
    }

    let id = Version::V3.id("string-equal-ignore-case");
    registry.register(primitive_fn(
        FunctionSignature::fixed(&id, BOOLEAN, &[STRING, STRING]),
        |args| {
            let (a, b) = (args.text(0)?, args.text(1)?);
            Ok(Value::from(a.to_lowercase() == b.to_lowercase()))
        },
    ))
}
