#![allow(
    clippy::result_large_err,
    reason = "EvalError is fundamental; boxing would add indirection across every crate"
)]
//! PDP Engine - Configured entry point to the function evaluation engine.
//!
//! ```text
//! EngineConfig ──► EngineBuilder::build ──► Engine
//!                                            ├── bind(id, args) -> Apply      once, at load
//!                                            └── evaluate(expr, &Request)     per request
//! ```
//!
//! The engine owns a frozen function registry (the standard set, optionally
//! with a stricter pattern compiler and extra functions layered on top) and
//! the issuer matching mode used for every request context it creates.
//! An `Engine` is cheap to clone and safe to share across threads.

use std::sync::Once;

mod config;
mod engine;

pub use config::{ConfigError, EngineBuilder, EngineConfig};
pub use engine::Engine;

pub use pdp_context::{Attribute, IssuerMatching, Request, RequestBuilder, RequestContext};
pub use pdp_functions::{
    Apply, Argument, AttributeDesignator, AttributeKey, Constant, EvaluationContext, Expression,
    Function, FunctionRegistry, SharedFunction, VariableReference,
};
pub use pdp_values::{
    AttributeValue, Bag, Datatype, EvalError, EvalErrorKind, EvalResult, PrimitiveKind, Status,
    Value,
};

static TRACING_INIT: Once = Once::new();

/// Initialize the tracing subscriber for debug output.
///
/// Controlled by `RUST_LOG`; does nothing when it is unset. Safe to call
/// more than once.
///
/// ```bash
/// RUST_LOG=pdp_functions=debug my-pdp
/// RUST_LOG=pdp_context=trace my-pdp
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
