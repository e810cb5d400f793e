#![allow(
    clippy::result_large_err,
    reason = "EvalError is fundamental; boxing would add indirection across every crate"
)]
//! PDP Context - Reference request model for the PDP engine.
//!
//! A `Request` is an immutable collection of attributes, assembled through
//! `RequestBuilder` and shareable across threads. Each evaluation of a
//! request gets its own `RequestContext`, which owns the per-request caches:
//!
//! ```text
//! Request (shared, immutable)
//!     └── RequestContext (one per evaluation)
//!             ├── resolved attribute bags, frozen on first use
//!             └── variable values
//! ```
//!
//! Repeated attributes with the same category and id are merged into one
//! bag. Whether a designator without an issuer sees issued attributes is
//! decided by `IssuerMatching`.

mod context;
mod request;

pub use context::{IssuerMatching, RequestContext};
pub use request::{Attribute, Request, RequestBuilder};
