//! `and`, `or`, `n-of` and `not`.
//!
//! The variadic connectives evaluate their arguments left to right and stop
//! as soon as the outcome is decided; arguments past that point are never
//! evaluated, so their failures never surface.

use pdp_values::{processing_error, EvalResult, Value};

use super::{primitive_fn, Version, BOOLEAN, INTEGER};
use crate::call::{Body, FirstOrderFunction, LazyArgs};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

/// Short-circuit fold: stop at the first argument equal to `decisive`.
fn connective(args: &mut LazyArgs<'_>, decisive: bool) -> EvalResult<Value> {
    for i in 0..args.len() {
        if args.boolean(i)? == decisive {
            return Ok(Value::from(decisive));
        }
    }
    Ok(Value::from(!decisive))
}

fn n_of(args: &mut LazyArgs<'_>) -> EvalResult<Value> {
    let required = args.integer(0)?.raw();
    let candidates = args.len() - 1;
    let Ok(required) = usize::try_from(required) else {
        return Err(processing_error(format!(
            "n-of: required count {required} is negative"
        )));
    };
    if required > candidates {
        return Err(processing_error(format!(
            "n-of: {required} true arguments required, only {candidates} given"
        )));
    }

    let mut found = 0;
    for i in 1..args.len() {
        if found == required {
            break;
        }
        // Not enough arguments left to reach the count.
        if required - found > args.len() - i {
            return Ok(Value::from(false));
        }
        if args.boolean(i)? {
            found += 1;
        }
    }
    Ok(Value::from(found == required))
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    registry.register(FirstOrderFunction::shared(
        FunctionSignature::variadic(&Version::V1.id("or"), BOOLEAN, &[], BOOLEAN),
        Body::lazy(|args| connective(args, true)),
    ))?;
    registry.register(FirstOrderFunction::shared(
        FunctionSignature::variadic(&Version::V1.id("and"), BOOLEAN, &[], BOOLEAN),
        Body::lazy(|args| connective(args, false)),
    ))?;
    registry.register(FirstOrderFunction::shared(
        FunctionSignature::variadic(&Version::V1.id("n-of"), BOOLEAN, &[INTEGER], BOOLEAN),
        Body::lazy(n_of),
    ))?;
    registry.register(primitive_fn(
        FunctionSignature::fixed(&Version::V1.id("not"), BOOLEAN, &[BOOLEAN]),
        |args| Ok(Value::from(!args.get::<bool>(0)?)),
    ))
}
