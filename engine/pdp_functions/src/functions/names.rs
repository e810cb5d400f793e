//! `x500Name-match` and `rfc822Name-match`.

use pdp_values::{EvalResult, PrimitiveKind, Rfc822Name, Value, X500Name};

use super::{primitive_fn, Version, BOOLEAN, STRING};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    let x500 = PrimitiveKind::X500Name.single();
    registry.register(primitive_fn(
        FunctionSignature::fixed(&Version::V1.id("x500Name-match"), BOOLEAN, &[x500, x500]),
        |args| {
            let (name, within): (&X500Name, &X500Name) = (args.get(0)?, args.get(1)?);
            Ok(Value::from(name.is_suffix_of(within)))
        },
    ))?;

    registry.register(primitive_fn(
        FunctionSignature::fixed(
            &Version::V1.id("rfc822Name-match"),
            BOOLEAN,
            &[STRING, PrimitiveKind::Rfc822Name.single()],
        ),
        |args| {
            let name: &Rfc822Name = args.get(1)?;
            Ok(Value::from(name.matches_pattern(args.text(0)?)))
        },
    ))
}
