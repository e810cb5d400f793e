//! Request attributes and their builder.

use std::sync::Arc;

use pdp_values::{AttributeValue, EvalResult, PrimitiveKind};
use rustc_hash::FxHashMap;

/// One attribute of a request: an identity and the values supplied for it.
///
/// Values may be of mixed datatypes; a designator only sees the values of
/// the datatype it asks for.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub category: Arc<str>,
    pub id: Arc<str>,
    pub issuer: Option<Arc<str>>,
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    /// Attribute with no issuer and no values yet.
    pub fn new(category: &str, id: &str) -> Self {
        Attribute {
            category: Arc::from(category),
            id: Arc::from(id),
            issuer: None,
            values: Vec::new(),
        }
    }

    /// Set the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = Some(Arc::from(issuer));
        self
    }

    /// Append a value.
    #[must_use]
    pub fn with_value(mut self, value: AttributeValue) -> Self {
        self.values.push(value);
        self
    }

    /// Append several values.
    #[must_use]
    pub fn with_values(mut self, values: impl IntoIterator<Item = AttributeValue>) -> Self {
        self.values.extend(values);
        self
    }

    /// Append a value given in its lexical form.
    pub fn with_lexical(self, kind: PrimitiveKind, lexical: &str) -> EvalResult<Self> {
        Ok(self.with_value(AttributeValue::parse(kind, lexical)?))
    }
}

type NameKey = (Arc<str>, Arc<str>);

/// Immutable set of request attributes.
#[derive(Clone, Debug, Default)]
pub struct Request {
    attributes: Vec<Attribute>,
    /// (category, id) to positions in `attributes`, in insertion order.
    index: FxHashMap<NameKey, Vec<usize>>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Every attribute, in the order it was added.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attributes named `category`/`id`, whatever their issuer.
    pub fn named<'r>(&'r self, category: &str, id: &str) -> impl Iterator<Item = &'r Attribute> {
        let key: NameKey = (Arc::from(category), Arc::from(id));
        self.index
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.attributes[i])
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Builder for `Request`.
#[derive(Default)]
pub struct RequestBuilder {
    attributes: Vec<Attribute>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute. The same name may be added more than once.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a single-valued attribute without an issuer.
    #[must_use]
    pub fn value(self, category: &str, id: &str, value: AttributeValue) -> Self {
        self.attribute(Attribute::new(category, id).with_value(value))
    }

    pub fn build(self) -> Request {
        let mut index: FxHashMap<NameKey, Vec<usize>> = FxHashMap::default();
        for (i, attribute) in self.attributes.iter().enumerate() {
            index
                .entry((Arc::clone(&attribute.category), Arc::clone(&attribute.id)))
                .or_default()
                .push(i);
        }
        tracing::trace!(attributes = self.attributes.len(), "request built");
        Request {
            attributes: self.attributes,
            index,
        }
    }
}
