//! Single-variant storage locked to one allowed variant.

use std::fmt;

use super::{SingleSlotStorage, SingleVariantStorage, SlottedStorage, Storage, StorageView, ViewIter};
use crate::transaction::Transaction;
use crate::variant::TransferVariant;

/// A [`SingleVariantStorage`] that only ever holds one specific variant.
///
/// The variant-free [`FixedVariantStorage::fill`] and
/// [`FixedVariantStorage::drain`] operations cover the common case; the
/// [`Storage`] implementation rejects every other variant.
pub struct FixedVariantStorage<T: TransferVariant> {
    inner: SingleVariantStorage<T>,
    allowed: T,
}

impl<T: TransferVariant> FixedVariantStorage<T> {
    /// Create an empty storage accepting only `allowed`, with the given capacity.
    pub fn new(allowed: T, capacity: u64) -> Self {
        let for_insert = allowed.clone();
        let for_extract = allowed.clone();
        let inner = SingleVariantStorage::with_fixed_capacity(capacity)
            .insert_filter(move |variant| *variant == for_insert)
            .extract_filter(move |variant| *variant == for_extract);

        Self { inner, allowed }
    }

    /// Register a hook invoked after every outermost commit that modified this
    /// storage.
    pub fn on_final_commit(mut self, hook: impl Fn() + 'static) -> Self {
        self.inner = self.inner.on_final_commit(hook);
        self
    }

    /// The variant this storage accepts.
    pub fn allowed(&self) -> &T {
        &self.allowed
    }

    /// The stored amount.
    pub fn amount(&self) -> u64 {
        self.inner.amount()
    }

    /// Insert up to `max_amount` of the allowed variant.
    pub fn fill(&self, max_amount: u64, tx: &Transaction) -> u64 {
        self.inner.insert(&self.allowed, max_amount, tx)
    }

    /// Extract up to `max_amount` of the allowed variant.
    pub fn drain(&self, max_amount: u64, tx: &Transaction) -> u64 {
        self.inner.extract(&self.allowed, max_amount, tx)
    }
}

impl<T: TransferVariant> Storage<T> for FixedVariantStorage<T> {
    fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        self.inner.insert(resource, max_amount, tx)
    }

    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        self.inner.extract(resource, max_amount, tx)
    }

    fn iter(&self) -> ViewIter<'_, T> {
        Storage::iter(&self.inner)
    }

    fn version(&self) -> u64 {
        Storage::version(&self.inner)
    }

    fn as_slotted(&self) -> Option<&dyn SlottedStorage<T>> {
        Some(self)
    }
}

impl<T: TransferVariant> StorageView<T> for FixedVariantStorage<T> {
    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        self.inner.extract(resource, max_amount, tx)
    }

    fn is_resource_blank(&self) -> bool {
        StorageView::is_resource_blank(&self.inner)
    }

    fn resource(&self) -> T {
        self.inner.resource()
    }

    fn amount(&self) -> u64 {
        self.inner.amount()
    }

    fn capacity(&self) -> u64 {
        StorageView::capacity(&self.inner)
    }
}

impl<T: TransferVariant> SlottedStorage<T> for FixedVariantStorage<T> {
    fn slot_count(&self) -> usize {
        1
    }

    fn slot(&self, index: usize) -> &dyn SingleSlotStorage<T> {
        if index != 0 {
            panic!("slot {index} is out of bounds, this storage has 1 slot");
        }
        self
    }
}

impl<T: TransferVariant> fmt::Debug for FixedVariantStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedVariantStorage")
            .field("allowed", &self.allowed)
            .field("amount", &self.inner.amount())
            .finish()
    }
}
