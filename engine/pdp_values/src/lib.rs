#![allow(
    clippy::result_large_err,
    reason = "EvalError is fundamental; boxing would add indirection across every crate"
)]
//! PDP Values - Datatype and value model for the PDP function engine.
//!
//! This crate provides:
//! - The closed set of XACML primitive datatypes (`PrimitiveKind`) and the
//!   single/bag `Datatype` built on top of them
//! - Immutable typed values (`AttributeValue`) and the `Value` union of a
//!   single value or a `Bag`
//! - The append-only `BagBuilder` and its one-way `freeze()` into a `Bag`
//! - Evaluation error types (`EvalError`, `EvalErrorKind`, `EvalResult`)
//!
//! # Value Types
//!
//! All heap payloads go through `Heap<T>`, whose constructor is private to
//! this crate:
//! - Values are built through `AttributeValue::` factory methods or parsed
//!   from their lexical form with `AttributeValue::parse`
//! - Cloning a value is a reference-count bump
//! - Nothing exposes mutation, so values are safe to share across threads
//!
//! # Errors
//!
//! Only two protocol statuses exist: **Syntax** (a lexical form or a
//! statically known argument list is wrong) and **Indeterminate** (something
//! that depends on runtime data failed). See `errors` for the full taxonomy.

mod bag;
mod datatype;
mod errors;
mod value;

pub use bag::{Bag, BagBuilder};
pub use datatype::{Datatype, PrimitiveKind};
pub use errors::{EvalError, EvalErrorKind, EvalResult, Status};
pub use value::{
    AttributeValue, Date, DateTime, DayTimeDuration, DnsName, Heap, Integer, IpAddress,
    PortRange, Rfc822Name, Time, Value, X500Name, YearMonthDuration,
};

// Re-export error constructors for use by other crates
pub use errors::{
    // Argument and signature errors
    argument_indeterminate,
    argument_type_mismatch,
    arity_mismatch,
    // Arithmetic errors
    division_by_zero,
    // Registry errors
    duplicate_function,
    indeterminate_comparison,
    integer_overflow,
    invalid_conversion,
    invalid_lexical,
    invalid_pattern,
    invalid_sub_function,
    missing_attribute,
    modulo_by_zero,
    non_finite_result,
    not_one_and_only,
    processing_error,
    // Construction defects
    strategy_mismatch,
    sub_function_indeterminate,
    substring_out_of_range,
    unknown_datatype,
    unknown_function,
};
