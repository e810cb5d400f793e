//! Per-datatype set functions over bags.
//!
//! Bags are treated as sets under the datatype's `-equal` relation: results
//! never contain two equal values, and element order follows first
//! appearance. A comparison that is indeterminate makes the result
//! indeterminate unless the answer is already decided without it.

use std::sync::Arc;

use pdp_values::{arity_mismatch, AttributeValue, Bag, EvalResult, PrimitiveKind, Value};

use super::bags::is_member;
use super::{typed_id, BOOLEAN};
use crate::call::{Body, FirstOrderFunction};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

type SetPredicate = fn(&Bag, &Bag) -> EvalResult<bool>;

/// Collect values passing `keep`, skipping any equal to one already kept.
fn collect_distinct<'a>(
    kind: PrimitiveKind,
    values: impl Iterator<Item = &'a AttributeValue>,
    keep: impl Fn(&AttributeValue) -> EvalResult<bool>,
) -> EvalResult<Value> {
    let mut kept: Vec<AttributeValue> = Vec::new();
    for value in values {
        if keep(value)? && !is_member(value, &kept)? {
            kept.push(value.clone());
        }
    }
    Bag::from_values(kind, kept).map(Value::Bag)
}

/// Whether some element of `a` is in `b`.
fn any_member(a: &Bag, b: &Bag) -> EvalResult<bool> {
    let mut failure = None;
    for value in a.iter() {
        match is_member(value, b.iter()) {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }
    failure.map_or(Ok(false), Err)
}

/// Whether every element of `a` is in `b`.
fn subset(a: &Bag, b: &Bag) -> EvalResult<bool> {
    let mut failure = None;
    for value in a.iter() {
        match is_member(value, b.iter()) {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }
    failure.map_or(Ok(true), Err)
}

/// (suffix, predicate) pairs returning boolean.
const PREDICATES: &[(&str, SetPredicate)] = &[
    ("at-least-one-member-of", any_member),
    ("subset", subset),
    ("set-equals", |a, b| Ok(subset(a, b)? && subset(b, a)?)),
];

fn register_kind(registry: &mut FunctionRegistry, kind: PrimitiveKind) -> EvalResult<()> {
    let bag = kind.bag();

    for &(suffix, predicate) in PREDICATES {
        let id: Arc<str> = typed_id(kind, suffix).into();
        registry.register(FirstOrderFunction::shared(
            FunctionSignature::fixed(&id, BOOLEAN, &[bag, bag]),
            Body::bag(move |bags| match bags {
                [a, b] => predicate(a, b).map(Value::from),
                _ => Err(arity_mismatch(&id, 2, false, bags.len())),
            }),
        ))?;
    }

    let id: Arc<str> = typed_id(kind, "intersection").into();
    registry.register(FirstOrderFunction::shared(
        FunctionSignature::fixed(&id, bag, &[bag, bag]),
        Body::bag(move |bags| match bags {
            [a, b] => collect_distinct(kind, a.iter(), |v| is_member(v, b.iter())),
            _ => Err(arity_mismatch(&id, 2, false, bags.len())),
        }),
    ))?;

    registry.register(FirstOrderFunction::shared(
        FunctionSignature::variadic(&typed_id(kind, "union"), bag, &[bag, bag], bag),
        Body::bag(move |bags| collect_distinct(kind, bags.iter().flat_map(Bag::iter), |_| Ok(true))),
    ))
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for kind in PrimitiveKind::ALL {
        register_kind(registry, kind)?;
    }
    Ok(())
}
