//! Date and dateTime arithmetic with durations.

use pdp_values::{
    processing_error, AttributeValue, Date, DateTime, DayTimeDuration, EvalResult, PrimitiveKind,
    Value, YearMonthDuration,
};

use super::args::Args;
use super::{primitive_fn, Version};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

type Shift = fn(Args<'_>) -> EvalResult<Option<AttributeValue>>;

/// (name, temporal kind, duration kind, operation).
const SHIFTS: &[(&str, PrimitiveKind, PrimitiveKind, Shift)] = &[
    (
        "dateTime-add-dayTimeDuration",
        PrimitiveKind::DateTime,
        PrimitiveKind::DayTimeDuration,
        |args| {
            let (dt, d): (&DateTime, &DayTimeDuration) = (args.get(0)?, args.get(1)?);
            Ok(dt.checked_add_day_time(d).map(AttributeValue::DateTime))
        },
    ),
    (
        "dateTime-subtract-dayTimeDuration",
        PrimitiveKind::DateTime,
        PrimitiveKind::DayTimeDuration,
        |args| {
            let (dt, d): (&DateTime, &DayTimeDuration) = (args.get(0)?, args.get(1)?);
            Ok(dt.checked_sub_day_time(d).map(AttributeValue::DateTime))
        },
    ),
    (
        "dateTime-add-yearMonthDuration",
        PrimitiveKind::DateTime,
        PrimitiveKind::YearMonthDuration,
        |args| {
            let (dt, d): (&DateTime, &YearMonthDuration) = (args.get(0)?, args.get(1)?);
            Ok(dt.checked_add_year_month(d).map(AttributeValue::DateTime))
        },
    ),
    (
        "dateTime-subtract-yearMonthDuration",
        PrimitiveKind::DateTime,
        PrimitiveKind::YearMonthDuration,
        |args| {
            let (dt, d): (&DateTime, &YearMonthDuration) = (args.get(0)?, args.get(1)?);
            Ok(dt.checked_sub_year_month(d).map(AttributeValue::DateTime))
        },
    ),
    (
        "date-add-yearMonthDuration",
        PrimitiveKind::Date,
        PrimitiveKind::YearMonthDuration,
        |args| {
            let (date, d): (&Date, &YearMonthDuration) = (args.get(0)?, args.get(1)?);
            Ok(date.checked_add_year_month(d).map(AttributeValue::Date))
        },
    ),
    (
        "date-subtract-yearMonthDuration",
        PrimitiveKind::Date,
        PrimitiveKind::YearMonthDuration,
        |args| {
            let (date, d): (&Date, &YearMonthDuration) = (args.get(0)?, args.get(1)?);
            Ok(date.checked_sub_year_month(d).map(AttributeValue::Date))
        },
    ),
];

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for &(name, temporal, duration, shift) in SHIFTS {
        let signature = FunctionSignature::fixed(
            &Version::V3.id(name),
            temporal.single(),
            &[temporal.single(), duration.single()],
        );
        registry.register(primitive_fn(signature, move |args| {
            shift(args)?
                .map(Value::Single)
                .ok_or_else(|| processing_error(format!("{name}: result is out of range")))
        }))?;
    }
    Ok(())
}
