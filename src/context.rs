//! Request-scoped context.
//!
//! A [`Context`] is an immutable bag of typed values that travels with a
//! [`Request`](crate::Request). It is never modified in place: attaching a
//! value produces a new context and leaves the old one untouched, so code
//! holding the original never observes values added further down the chain.
//!
//! Values are keyed by their Rust type. A module that keeps its value types
//! private therefore owns its slots outright; nothing outside it can read or
//! overwrite them.

use http::Extensions;

/// An immutable, typed key→value context scoped to one request.
#[derive(Clone, Debug, Default)]
pub struct Context(Extensions);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context holding everything `self` holds plus `value`.
    ///
    /// A value of the same type already present is shadowed in the new
    /// context only.
    ///
    /// ```rust
    /// use epilogue::Context;
    ///
    /// #[derive(Clone)]
    /// struct TenantId(u32);
    ///
    /// let root = Context::new();
    /// let child = root.with(TenantId(7));
    ///
    /// assert!(root.get::<TenantId>().is_none());
    /// assert_eq!(child.get::<TenantId>().map(|t| t.0), Some(7));
    /// ```
    #[must_use]
    pub fn with<T>(&self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut ext = self.0.clone();
        ext.insert(value);
        Self(ext)
    }

    /// Looks up the value stored under type `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.0.get::<T>()
    }
}

impl From<Extensions> for Context {
    fn from(ext: Extensions) -> Self {
        Self(ext)
    }
}
