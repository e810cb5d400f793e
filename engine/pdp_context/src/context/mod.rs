//! `RequestContext`: the reference `EvaluationContext` over a `Request`.

use std::fmt;
use std::sync::Arc;

use pdp_functions::{AttributeKey, EvaluationContext};
use pdp_values::{Bag, BagBuilder, EvalResult, PrimitiveKind, Value};
use rustc_hash::FxHashMap;

use crate::request::{Attribute, Request};

/// How a designator's issuer is matched against attribute issuers.
///
/// A designator naming an issuer only ever sees attributes from that
/// issuer. The modes differ for designators without one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum IssuerMatching {
    /// No issuer on the designator matches attributes from any issuer.
    #[default]
    Lax,
    /// No issuer on the designator matches only attributes without one.
    Strict,
}

impl IssuerMatching {
    pub const fn name(self) -> &'static str {
        match self {
            IssuerMatching::Lax => "lax",
            IssuerMatching::Strict => "strict",
        }
    }

    /// Parse `lax` or `strict`, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        [IssuerMatching::Lax, IssuerMatching::Strict]
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name.trim()))
    }

    fn accepts(self, wanted: Option<&str>, attribute: &Attribute) -> bool {
        match (wanted, attribute.issuer.as_deref()) {
            (Some(wanted), Some(issuer)) => wanted == issuer,
            (Some(_), None) => false,
            (None, None) => true,
            (None, Some(_)) => self == IssuerMatching::Lax,
        }
    }
}

impl fmt::Display for IssuerMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-evaluation view of a `Request`.
///
/// Bags are built on first resolution and then reused for the rest of the
/// evaluation, so every designator over the same key sees the same bag.
pub struct RequestContext<'r> {
    request: &'r Request,
    issuer_matching: IssuerMatching,
    bags: FxHashMap<(AttributeKey, PrimitiveKind), Bag>,
    variables: FxHashMap<Arc<str>, Value>,
}

impl<'r> RequestContext<'r> {
    pub fn new(request: &'r Request, issuer_matching: IssuerMatching) -> Self {
        RequestContext {
            request,
            issuer_matching,
            bags: FxHashMap::default(),
            variables: FxHashMap::default(),
        }
    }

    pub fn request(&self) -> &'r Request {
        self.request
    }

    pub fn issuer_matching(&self) -> IssuerMatching {
        self.issuer_matching
    }

    /// Number of distinct bags resolved so far.
    pub fn resolved(&self) -> usize {
        self.bags.len()
    }

    fn collect(&self, key: &AttributeKey, kind: PrimitiveKind) -> EvalResult<Bag> {
        let mut builder = BagBuilder::new(kind);
        for attribute in self.request.named(&key.category, &key.id) {
            if !self.issuer_matching.accepts(key.issuer.as_deref(), attribute) {
                continue;
            }
            builder.extend(
                attribute
                    .values
                    .iter()
                    .filter(|value| value.kind() == kind)
                    .cloned(),
            )?;
        }
        Ok(builder.freeze())
    }
}

impl EvaluationContext for RequestContext<'_> {
    fn resolve_attribute(&mut self, key: &AttributeKey, kind: PrimitiveKind) -> EvalResult<Bag> {
        let cache_key = (key.clone(), kind);
        if let Some(bag) = self.bags.get(&cache_key) {
            return Ok(bag.clone());
        }
        let bag = self.collect(key, kind)?;
        tracing::trace!(attribute = %key, %kind, size = bag.len(), "attribute resolved");
        self.bags.insert(cache_key, bag.clone());
        Ok(bag)
    }

    fn variable(&self, id: &str) -> Option<Value> {
        self.variables.get(id).cloned()
    }

    fn cache_variable(&mut self, id: &str, value: Value) {
        self.variables.insert(Arc::from(id), value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
