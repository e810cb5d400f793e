//! Frozen function registries handed to every binder and request.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A function registry after bootstrap.
///
/// Registration needs `&mut`, so once a registry is wrapped here its set of
/// functions is fixed. Clones point at the same registry, which is how the
/// standard set and each layer over it are handed to many threads at once.
pub struct SharedRegistry<T>(Arc<T>);

impl<T> SharedRegistry<T> {
    /// Freeze `registry`.
    pub fn new(registry: T) -> Self {
        Self(Arc::new(registry))
    }

    /// Whether both handles are the same frozen registry, not merely equal
    /// ones.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for SharedRegistry<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for SharedRegistry<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedRegistry").field(&*self.0).finish()
    }
}
