#![allow(
    clippy::result_large_err,
    reason = "EvalError is fundamental; boxing would add indirection across every crate"
)]
//! PDP Functions - Function evaluation core of the PDP engine.
//!
//! This crate provides:
//! - Expression nodes (`Constant`, `AttributeDesignator`,
//!   `VariableReference`, `Apply`) and the `EvaluationContext` they read
//!   request data through
//! - Function signatures with strict static validation
//! - Calls: functions bound to argument expressions once and evaluated many
//!   times, with the evaluation strategy fixed by the signature shape
//! - The standard first-order function set and the higher-order bag
//!   functions
//! - The layered `FunctionRegistry`
//!
//! # Binding and evaluation
//!
//! ```text
//! FunctionRegistry::bind_apply(id, args)
//!     └── Function::new_call(args, remaining)   validation, precompilation
//!             └── FunctionCall::evaluate(ctx)   per request
//! ```
//!
//! Everything produced by binding is immutable and `Send + Sync`; a bound
//! expression tree can be evaluated for many requests in parallel, each
//! with its own context.

mod call;
mod context;
mod expr;
mod functions;
mod higher_order;
mod registry;
mod shared;
mod signature;
mod stack;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
mod test_helpers;

pub use call::{
    ArgCheck, ArgExprs, BagBody, Body, FirstOrderFunction, Function, FunctionCall, LazyArgs,
    LazyBody, MixedBody, PrimitiveBody, SharedFunction,
};
pub use context::{AttributeKey, EvaluationContext};
pub use expr::{Apply, Argument, AttributeDesignator, Constant, Expression, VariableReference};
pub use functions::{CompiledPattern, PatternCompiler, XsdPatternCompiler};
pub use higher_order::{Combinator, HigherOrderFunction, MapFactory};
pub use registry::{FunctionRegistry, GenericFunctionFactory, SharedFactory};
pub use shared::SharedRegistry;
pub use signature::{CallShape, FunctionSignature, ParamList};
