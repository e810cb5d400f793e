//! The standard first-order function set.
//!
//! Functions are built from static tables: each family has one generic
//! builder parameterized by datatype (and predicate or operator), and a
//! table listing which datatypes get an instance. There is no type per
//! function.

pub(crate) mod args;
mod arithmetic;
mod bags;
mod comparison;
mod conversion;
mod equality;
mod logical;
mod names;
mod pattern;
mod sets;
mod strings;
mod temporal;

use std::sync::Arc;

use pdp_values::{Datatype, EvalResult, PrimitiveKind, Value};

use crate::call::{Body, FirstOrderFunction, SharedFunction};
use crate::registry::FunctionRegistry;
use crate::signature::FunctionSignature;

pub use pattern::{CompiledPattern, PatternCompiler, XsdPatternCompiler};

use args::Args;

pub(crate) const BOOLEAN: Datatype = PrimitiveKind::Boolean.single();
pub(crate) const INTEGER: Datatype = PrimitiveKind::Integer.single();
pub(crate) const DOUBLE: Datatype = PrimitiveKind::Double.single();
pub(crate) const STRING: Datatype = PrimitiveKind::String.single();

/// XACML release that introduced a function identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Version {
    V1,
    V2,
    V3,
}

impl Version {
    /// Full function identifier for `name`.
    pub(crate) fn id(self, name: &str) -> String {
        let number = match self {
            Version::V1 => "1.0",
            Version::V2 => "2.0",
            Version::V3 => "3.0",
        };
        format!("urn:oasis:names:tc:xacml:{number}:function:{name}")
    }

    /// Release of the per-datatype bag and set functions for `kind`.
    pub(crate) const fn of_kind(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::DayTimeDuration | PrimitiveKind::YearMonthDuration => Version::V3,
            PrimitiveKind::IpAddress | PrimitiveKind::DnsName => Version::V2,
            _ => Version::V1,
        }
    }
}

/// Per-datatype function identifier, e.g. `integer-bag-size`.
pub(crate) fn typed_id(kind: PrimitiveKind, suffix: &str) -> String {
    Version::of_kind(kind).id(&format!("{}-{suffix}", kind.short_name()))
}

/// First-order function over single values.
pub(crate) fn primitive_fn<F>(signature: FunctionSignature, f: F) -> SharedFunction
where
    F: Fn(Args<'_>) -> EvalResult<Value> + Send + Sync + 'static,
{
    let name = signature.name_arc();
    FirstOrderFunction::shared(
        signature,
        Body::primitive(move |values| f(Args::new(&name, values))),
    )
}

/// Register the whole standard set. Regular expressions are compiled
/// through `patterns`.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn register_standard(
    registry: &mut FunctionRegistry,
    patterns: &Arc<dyn PatternCompiler>,
) -> EvalResult<()> {
    equality::register(registry)?;
    arithmetic::register(registry)?;
    logical::register(registry)?;
    comparison::register(registry)?;
    temporal::register(registry)?;
    bags::register(registry)?;
    sets::register(registry)?;
    strings::register(registry)?;
    conversion::register(registry)?;
    pattern::register(registry, patterns)?;
    names::register(registry)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
