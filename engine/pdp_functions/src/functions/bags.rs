//! Per-datatype bag functions: `-one-and-only`, `-bag-size`, `-is-in`, `-bag`.
//!
//! Membership uses the datatype's `-equal` relation, so it can be
//! indeterminate for temporal values and never finds a NaN.

use std::sync::Arc;

use pdp_values::{
    arity_mismatch, integer_overflow, not_one_and_only, AttributeValue, Bag, EvalResult, Integer,
    PrimitiveKind, Value,
};

use super::equality::values_equal;
use super::{typed_id, BOOLEAN, INTEGER};
use crate::call::{Body, FirstOrderFunction};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

fn bag_size(bag: &Bag) -> EvalResult<Value> {
    let size = i64::try_from(bag.len()).map_err(|_| integer_overflow("bag-size"))?;
    Ok(Value::Single(Integer::new(size).into()))
}

/// Whether some candidate is `-equal` to `value`.
///
/// A match wins over an indeterminate comparison with another candidate;
/// without a match the first such failure is returned.
pub(crate) fn is_member<'a>(
    value: &AttributeValue,
    candidates: impl IntoIterator<Item = &'a AttributeValue>,
) -> EvalResult<bool> {
    let mut failure = None;
    for candidate in candidates {
        match values_equal(value, candidate) {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }
    failure.map_or(Ok(false), Err)
}

fn register_kind(registry: &mut FunctionRegistry, kind: PrimitiveKind) -> EvalResult<()> {
    let single = kind.single();
    let bag = kind.bag();

    let id: Arc<str> = typed_id(kind, "one-and-only").into();
    registry.register(FirstOrderFunction::shared(
        FunctionSignature::fixed(&id, single, &[bag]),
        Body::bag(move |bags| {
            let [bag] = bags else {
                return Err(arity_mismatch(&id, 1, false, bags.len()));
            };
            bag.single()
                .cloned()
                .map(Value::Single)
                .ok_or_else(|| not_one_and_only(kind.short_name(), bag.len()))
        }),
    ))?;

    let id: Arc<str> = typed_id(kind, "bag-size").into();
    registry.register(FirstOrderFunction::shared(
        FunctionSignature::fixed(&id, INTEGER, &[bag]),
        Body::bag(move |bags| match bags {
            [bag] => bag_size(bag),
            _ => Err(arity_mismatch(&id, 1, false, bags.len())),
        }),
    ))?;

    let id: Arc<str> = typed_id(kind, "is-in").into();
    registry.register(FirstOrderFunction::shared(
        FunctionSignature::fixed(&id, BOOLEAN, &[single, bag]),
        Body::mixed(move |primitives, bags| match (primitives, bags) {
            ([value], [bag]) => is_member(value, bag.iter()).map(Value::from),
            _ => Err(arity_mismatch(&id, 2, false, primitives.len() + bags.len())),
        }),
    ))?;

    registry.register(FirstOrderFunction::shared(
        FunctionSignature::variadic(&typed_id(kind, "bag"), bag, &[], single),
        Body::primitive(move |values: &[AttributeValue]| {
            Bag::from_values(kind, values.to_vec()).map(Value::Bag)
        }),
    ))
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for kind in PrimitiveKind::ALL {
        register_kind(registry, kind)?;
    }
    Ok(())
}
