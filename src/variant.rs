//! Resource variants: the immutable descriptors moved between storages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable association of an object instance (an item kind, a fluid kind, ...)
/// that storages hold amounts of.
///
/// Variants must be cheap to clone and are always compared with `==`, never by
/// identity. The blank variant represents "nothing stored" and carries no object.
pub trait TransferVariant: Clone + PartialEq + fmt::Debug + 'static {
    /// The wrapped immutable object type.
    type Object: PartialEq;

    /// The blank variant.
    fn blank() -> Self;

    /// Whether this variant is blank.
    fn is_blank(&self) -> bool;

    /// The object instance of this variant, or `None` when blank.
    fn object(&self) -> Option<&Self::Object>;

    /// Whether this variant wraps the given object.
    fn is_of(&self, object: &Self::Object) -> bool {
        self.object().is_some_and(|o| o == object)
    }
}

/// A resource together with an amount of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAmount<T> {
    /// The resource instance.
    pub resource: T,

    /// The amount of the resource.
    pub amount: u64,
}

impl<T> ResourceAmount<T> {
    /// Create a new resource/amount pair.
    pub fn new(resource: T, amount: u64) -> Self {
        Self { resource, amount }
    }
}
