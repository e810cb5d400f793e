//! Ordering predicates and `time-in-range`.

use std::cmp::Ordering;

use chrono::{Offset, Utc};
use pdp_values::{EvalResult, PrimitiveKind, Time, Value};

use super::{primitive_fn, Version, BOOLEAN};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

/// Datatypes with ordering predicates.
const ORDERED_KINDS: &[PrimitiveKind] = &[
    PrimitiveKind::Integer,
    PrimitiveKind::Double,
    PrimitiveKind::String,
    PrimitiveKind::Time,
    PrimitiveKind::Date,
    PrimitiveKind::DateTime,
];

/// Predicate suffixes and the orderings each accepts.
const PREDICATES: &[(&str, &[Ordering])] = &[
    ("greater-than", &[Ordering::Greater]),
    ("greater-than-or-equal", &[Ordering::Greater, Ordering::Equal]),
    ("less-than", &[Ordering::Less]),
    ("less-than-or-equal", &[Ordering::Less, Ordering::Equal]),
];

/// Whether `time` falls in `[lower, upper]`, wrapping past midnight when
/// `lower` is later in the day than `upper`.
///
/// An unzoned `time` is taken as UTC; unzoned bounds take the zone of `time`.
fn in_range(time: &Time, lower: &Time, upper: &Time) -> bool {
    let zone = time.timezone().unwrap_or_else(|| Utc.fix());
    let t = time.utc_seconds_of_day(zone);
    let lo = lower.utc_seconds_of_day(zone);
    let hi = upper.utc_seconds_of_day(zone);
    if lo <= hi {
        (lo..=hi).contains(&t)
    } else {
        t >= lo || t <= hi
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for &kind in ORDERED_KINDS {
        for &(suffix, accepted) in PREDICATES {
            let id = Version::V1.id(&format!("{}-{suffix}", kind.short_name()));
            registry.register(primitive_fn(
                FunctionSignature::fixed(&id, BOOLEAN, &[kind.single(), kind.single()]),
                move |args| {
                    let ordering = args.value(0)?.compare(args.value(1)?)?;
                    Ok(Value::from(accepted.contains(&ordering)))
                },
            ))?;
        }
    }

    let time = PrimitiveKind::Time.single();
    registry.register(primitive_fn(
        FunctionSignature::fixed(&Version::V2.id("time-in-range"), BOOLEAN, &[time, time, time]),
        |args| {
            Ok(Value::from(in_range(
                args.get(0)?,
                args.get(1)?,
                args.get(2)?,
            )))
        },
    ))
}
