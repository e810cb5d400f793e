//! Integer and double arithmetic, rounding and numeric conversion.
//!
//! Every operation is checked. Integer overflow, division or modulo by zero
//! and non-finite double results are Indeterminate; nothing wraps or
//! saturates.

use pdp_values::{
    division_by_zero, integer_overflow, invalid_conversion, modulo_by_zero, non_finite_result,
    AttributeValue, Datatype, EvalResult, Integer, Value,
};

use super::args::Args;
use super::{primitive_fn, Version, DOUBLE, INTEGER};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

type IntegerOp = fn(Integer, Integer) -> EvalResult<Integer>;
type DoubleOp = fn(f64, f64) -> EvalResult<f64>;

/// Binary integer operators: (name, variadic, operator).
const INTEGER_OPS: &[(&str, bool, IntegerOp)] = &[
    ("integer-add", true, |a, b| {
        a.checked_add(b).ok_or_else(|| integer_overflow("integer-add"))
    }),
    ("integer-multiply", true, |a, b| {
        a.checked_mul(b).ok_or_else(|| integer_overflow("integer-multiply"))
    }),
    ("integer-subtract", false, |a, b| {
        a.checked_sub(b).ok_or_else(|| integer_overflow("integer-subtract"))
    }),
    ("integer-divide", false, |a, b| {
        if b.is_zero() {
            return Err(division_by_zero());
        }
        a.checked_div(b).ok_or_else(|| integer_overflow("integer-divide"))
    }),
    ("integer-mod", false, |a, b| {
        if b.is_zero() {
            return Err(modulo_by_zero());
        }
        a.checked_rem(b).ok_or_else(|| integer_overflow("integer-mod"))
    }),
];

/// Binary double operators: (name, variadic, operator).
const DOUBLE_OPS: &[(&str, bool, DoubleOp)] = &[
    ("double-add", true, |a, b| Ok(a + b)),
    ("double-multiply", true, |a, b| Ok(a * b)),
    ("double-subtract", false, |a, b| Ok(a - b)),
    ("double-divide", false, |a, b| {
        if b == 0.0 {
            return Err(division_by_zero());
        }
        Ok(a / b)
    }),
];

fn finite(operation: &str, value: f64) -> EvalResult<Value> {
    if value.is_finite() {
        Ok(Value::Single(AttributeValue::Double(value)))
    } else {
        Err(non_finite_result(operation))
    }
}

fn signature(name: &str, kind: Datatype, variadic: bool) -> FunctionSignature {
    let id = Version::V1.id(name);
    if variadic {
        FunctionSignature::variadic(&id, kind, &[kind, kind], kind)
    } else {
        FunctionSignature::fixed(&id, kind, &[kind, kind])
    }
}

fn fold_integers(args: Args<'_>, op: IntegerOp) -> EvalResult<Value> {
    let mut acc = args.get::<Integer>(0)?;
    for i in 1..args.len() {
        acc = op(acc, args.get(i)?)?;
    }
    Ok(Value::Single(acc.into()))
}

fn fold_doubles(name: &'static str, args: Args<'_>, op: DoubleOp) -> EvalResult<Value> {
    let mut acc = args.get::<f64>(0)?;
    for i in 1..args.len() {
        acc = op(acc, args.get(i)?)?;
    }
    finite(name, acc)
}

/// `fn:round`: halves round toward positive infinity.
#[allow(clippy::float_cmp, reason = "a fraction of exactly one half is representable")]
fn round_half_up(x: f64) -> f64 {
    if x.fract().abs() == 0.5 {
        x.ceil()
    } else {
        x.round()
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for &(name, variadic, op) in INTEGER_OPS {
        registry.register(primitive_fn(signature(name, INTEGER, variadic), move |args| {
            fold_integers(args, op)
        }))?;
    }
    for &(name, variadic, op) in DOUBLE_OPS {
        registry.register(primitive_fn(signature(name, DOUBLE, variadic), move |args| {
            fold_doubles(name, args, op)
        }))?;
    }

    registry.register(primitive_fn(
        FunctionSignature::fixed(&Version::V1.id("integer-abs"), INTEGER, &[INTEGER]),
        |args| {
            let n: Integer = args.get(0)?;
            let abs = n.checked_abs().ok_or_else(|| integer_overflow("integer-abs"))?;
            Ok(Value::Single(abs.into()))
        },
    ))?;
    let unary_doubles: [(&str, fn(f64) -> f64); 3] =
        [("double-abs", f64::abs), ("round", round_half_up), ("floor", f64::floor)];
    for (name, op) in unary_doubles {
        registry.register(primitive_fn(
            FunctionSignature::fixed(&Version::V1.id(name), DOUBLE, &[DOUBLE]),
            move |args| finite(name, op(args.get(0)?)),
        ))?;
    }

    registry.register(primitive_fn(
        FunctionSignature::fixed(&Version::V1.id("double-to-integer"), INTEGER, &[DOUBLE]),
        |args| {
            let d: f64 = args.get(0)?;
            Integer::from_f64_truncated(d)
                .map(|n| Value::Single(n.into()))
                .ok_or_else(|| {
                    invalid_conversion("integer", &d.to_string(), "out of the integer range")
                })
        },
    ))?;
    registry.register(primitive_fn(
        FunctionSignature::fixed(&Version::V1.id("integer-to-double"), DOUBLE, &[INTEGER]),
        |args| finite("integer-to-double", args.get::<Integer>(0)?.to_f64()),
    ))
}
