//! The evaluation context: the engine's only window onto request data.

use std::fmt;
use std::sync::Arc;

use pdp_values::{Bag, EvalResult, PrimitiveKind, Value};

/// Identity of a request attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeKey {
    pub category: Arc<str>,
    pub id: Arc<str>,
    pub issuer: Option<Arc<str>>,
}

impl AttributeKey {
    /// Key without an issuer.
    pub fn new(category: &str, id: &str) -> Self {
        AttributeKey {
            category: Arc::from(category),
            id: Arc::from(id),
            issuer: None,
        }
    }

    /// Same key restricted to `issuer`.
    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = Some(Arc::from(issuer));
        self
    }

    /// Same key with the issuer dropped.
    #[must_use]
    pub fn without_issuer(&self) -> Self {
        AttributeKey {
            category: Arc::clone(&self.category),
            id: Arc::clone(&self.id),
            issuer: None,
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.category, self.id)?;
        if let Some(issuer) = &self.issuer {
            write!(f, " (issuer {issuer})")?;
        }
        Ok(())
    }
}

/// Per-request state consulted during evaluation.
///
/// Implementations own every mutable cache of a request. Once an attribute
/// has been resolved within a request, later resolutions of the same key
/// must return the same bag.
pub trait EvaluationContext {
    /// Resolve the bag of values of `kind` for `key`.
    ///
    /// An absent attribute resolves to the empty bag; failures to reach the
    /// data are Indeterminate errors.
    fn resolve_attribute(&mut self, key: &AttributeKey, kind: PrimitiveKind) -> EvalResult<Bag>;

    /// Previously computed value of a variable definition, if cached.
    fn variable(&self, _id: &str) -> Option<Value> {
        None
    }

    /// Remember the value of a variable definition for the rest of the request.
    fn cache_variable(&mut self, _id: &str, _value: Value) {}
}
