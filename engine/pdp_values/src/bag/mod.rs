//! Bags: immutable multisets of values of one primitive kind.
//!
//! A `Bag` is never mutated. Bags are built either directly from a value
//! list or through a `BagBuilder`, which accepts values one at a time and is
//! consumed by `freeze()`. The element kind is carried even when the bag is
//! empty, so an empty bag of strings and an empty bag of integers differ.

use std::fmt;

use crate::datatype::{Datatype, PrimitiveKind};
use crate::errors::{argument_type_mismatch, EvalResult};
use crate::value::{AttributeValue, Heap};

/// Immutable multiset of attribute values of one kind.
#[derive(Clone, Debug)]
pub struct Bag {
    kind: PrimitiveKind,
    values: Heap<[AttributeValue]>,
}

impl Bag {
    /// The empty bag of `kind`.
    pub fn empty(kind: PrimitiveKind) -> Self {
        Bag {
            kind,
            values: Heap::from_vec(Vec::new()),
        }
    }

    /// A bag holding exactly `value`.
    pub fn singleton(value: AttributeValue) -> Self {
        Bag {
            kind: value.kind(),
            values: Heap::from_vec(vec![value]),
        }
    }

    /// Build a bag of `kind`, rejecting values of any other kind.
    pub fn from_values(kind: PrimitiveKind, values: Vec<AttributeValue>) -> EvalResult<Self> {
        let mut builder = BagBuilder::with_capacity(kind, values.len());
        builder.extend(values)?;
        Ok(builder.freeze())
    }

    /// Element kind.
    #[inline]
    pub const fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Bag datatype of this bag.
    #[inline]
    pub const fn datatype(&self) -> Datatype {
        self.kind.bag()
    }

    /// Number of values, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bag holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate the values in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeValue> {
        self.values.iter()
    }

    /// Values as a slice.
    pub fn as_slice(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Whether some value in the bag equals `value`.
    pub fn contains(&self, value: &AttributeValue) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// The only value, or `None` unless the bag holds exactly one.
    pub fn single(&self) -> Option<&AttributeValue> {
        match &*self.values {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Multiset equality: same kind and same values with the same multiplicity.
impl PartialEq for Bag {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.len() != other.len() {
            return false;
        }
        let mut used = vec![false; other.len()];
        for v in self.values.iter() {
            let found = (0..other.len()).find(|&i| !used[i] && other.values[i] == *v);
            match found {
                Some(i) => used[i] = true,
                None => return false,
            }
        }
        true
    }
}

impl Eq for Bag {}

impl<'a> IntoIterator for &'a Bag {
    type Item = &'a AttributeValue;
    type IntoIter = std::slice::Iter<'a, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Bag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

/// Append-only builder for a [`Bag`].
///
/// Pushing a value of the wrong kind fails and leaves the builder unchanged.
/// `freeze` consumes the builder, so a frozen bag can never change.
#[derive(Debug)]
pub struct BagBuilder {
    kind: PrimitiveKind,
    values: Vec<AttributeValue>,
}

impl BagBuilder {
    /// Empty builder for values of `kind`.
    pub fn new(kind: PrimitiveKind) -> Self {
        BagBuilder {
            kind,
            values: Vec::new(),
        }
    }

    /// Empty builder with room for `capacity` values.
    pub fn with_capacity(kind: PrimitiveKind, capacity: usize) -> Self {
        BagBuilder {
            kind,
            values: Vec::with_capacity(capacity),
        }
    }

    /// Element kind this builder accepts.
    pub const fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Number of values pushed so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append one value.
    pub fn push(&mut self, value: AttributeValue) -> EvalResult<()> {
        if value.kind() != self.kind {
            return Err(argument_type_mismatch(
                "bag",
                self.values.len() + 1,
                &self.kind,
                &value.kind(),
            ));
        }
        self.values.push(value);
        Ok(())
    }

    /// Append every value, stopping at the first of the wrong kind.
    pub fn extend(&mut self, values: impl IntoIterator<Item = AttributeValue>) -> EvalResult<()> {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Finish building.
    pub fn freeze(self) -> Bag {
        tracing::trace!(kind = %self.kind, size = self.values.len(), "bag frozen");
        Bag {
            kind: self.kind,
            values: Heap::from_vec(self.values),
        }
    }
}
