//! Storage abstractions: containers of resources that transactions can move.
//!
//! - [`Storage`] / [`StorageView`] / [`SlottedStorage`]: the core traits
//! - [`SingleVariantStorage`] / [`FixedVariantStorage`]: one-slot storages
//! - [`CombinedStorage`] / [`CombinedSlottedStorage`]: ordered aggregation
//! - [`FilteringStorage`]: insert/extract gating around a backing storage
//! - [`util`]: bulk moves, simulation, lookups

mod combined;
mod filtering;
mod fixed;
mod single;
pub mod util;

use std::sync::atomic::{AtomicU64, Ordering};

pub use combined::{CombinedSlottedStorage, CombinedStorage};
pub use filtering::FilteringStorage;
pub use fixed::FixedVariantStorage;
pub use single::{ContentsError, SingleVariantStorage};

use crate::transaction::Transaction;

/// A boxed view yielded by storage iteration, borrowing from the storage.
pub type StorageViewItem<'a, T> = Box<dyn StorageView<T> + 'a>;

/// A boxed iterator over the views of a storage.
pub type ViewIter<'a, T> = Box<dyn Iterator<Item = StorageViewItem<'a, T>> + 'a>;

static VERSION: AtomicU64 = AtomicU64::new(1);

/// Next value of the global version counter.
pub(crate) fn next_version() -> u64 {
    VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Identity of the slot a view ultimately reads from.
///
/// Delegating wrappers forward this, so two views with equal ids share the
/// same underlying slot even when one of them restricts what may be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewId(usize);

impl ViewId {
    /// Identity derived from the view's address.
    pub fn of<V: ?Sized>(view: &V) -> ViewId {
        ViewId((view as *const V).cast::<()>() as usize)
    }
}

/// A view of a single stored resource in a [`Storage`].
pub trait StorageView<T: 'static> {
    /// Extract up to `max_amount` of `resource` from this view, returning the
    /// amount actually extracted. The operation participates in `tx` and is
    /// reverted if the transaction aborts.
    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64;

    /// Whether this view currently holds no resource.
    fn is_resource_blank(&self) -> bool;

    /// The resource stored in this view.
    fn resource(&self) -> T;

    /// The amount of [`StorageView::resource`] currently stored.
    fn amount(&self) -> u64;

    /// The maximum amount of [`StorageView::resource`] this view could hold,
    /// or an estimate when the view is blank.
    fn capacity(&self) -> u64;

    /// Identity of the underlying slot; delegating wrappers forward this.
    fn underlying_id(&self) -> ViewId {
        ViewId::of(self)
    }
}

/// A container of resources supporting transactional insertion and extraction.
///
/// `insert` and `extract` never move more than `max_amount` and report the
/// amount actually moved; they return 0 rather than failing.
pub trait Storage<T: 'static> {
    /// Whether [`Storage::insert`] may ever succeed.
    fn supports_insertion(&self) -> bool {
        true
    }

    /// Insert up to `max_amount` of `resource`, returning the amount accepted.
    fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64;

    /// Whether [`Storage::extract`] may ever succeed.
    fn supports_extraction(&self) -> bool {
        true
    }

    /// Extract up to `max_amount` of `resource`, returning the amount removed.
    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64;

    /// Iterate over the views of this storage.
    fn iter(&self) -> ViewIter<'_, T>;

    /// Iterate over the views that currently hold something.
    ///
    /// Filtering is lazy: a view that empties out while the iterator is alive
    /// is skipped when it is reached.
    fn non_empty_iter(&self) -> ViewIter<'_, T> {
        Box::new(
            self.iter()
                .filter(|view| !view.is_resource_blank() && view.amount() > 0),
        )
    }

    /// Version stamp that changes whenever a commit modified this storage.
    ///
    /// The default returns a fresh stamp on every call, so storages without
    /// version tracking always appear modified to polling callers.
    fn version(&self) -> u64 {
        next_version()
    }

    /// Downcast to a slotted storage when this storage has indexed slots.
    fn as_slotted(&self) -> Option<&dyn SlottedStorage<T>> {
        None
    }
}

/// A storage with indexed slots.
pub trait SlottedStorage<T: 'static>: Storage<T> {
    /// Number of slots in this storage.
    fn slot_count(&self) -> usize;

    /// The slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of bounds, like slice indexing.
    fn slot(&self, index: usize) -> &dyn SingleSlotStorage<T>;

    /// The slot at `index`, or `None` when out of bounds.
    fn get_slot(&self, index: usize) -> Option<&dyn SingleSlotStorage<T>> {
        (index < self.slot_count()).then(|| self.slot(index))
    }
}

/// A storage that is also its only view.
pub trait SingleSlotStorage<T: 'static>: Storage<T> + StorageView<T> {}

impl<T: 'static, S> SingleSlotStorage<T> for S where S: Storage<T> + StorageView<T> + ?Sized {}

impl<T: 'static, S> Storage<T> for &S
where
    S: Storage<T> + ?Sized,
{
    fn supports_insertion(&self) -> bool {
        (**self).supports_insertion()
    }

    fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        (**self).insert(resource, max_amount, tx)
    }

    fn supports_extraction(&self) -> bool {
        (**self).supports_extraction()
    }

    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        (**self).extract(resource, max_amount, tx)
    }

    fn iter(&self) -> ViewIter<'_, T> {
        (**self).iter()
    }

    fn non_empty_iter(&self) -> ViewIter<'_, T> {
        (**self).non_empty_iter()
    }

    fn version(&self) -> u64 {
        (**self).version()
    }

    fn as_slotted(&self) -> Option<&dyn SlottedStorage<T>> {
        (**self).as_slotted()
    }
}

impl<T: 'static, S> SlottedStorage<T> for &S
where
    S: SlottedStorage<T> + ?Sized,
{
    fn slot_count(&self) -> usize {
        (**self).slot_count()
    }

    fn slot(&self, index: usize) -> &dyn SingleSlotStorage<T> {
        (**self).slot(index)
    }

    fn get_slot(&self, index: usize) -> Option<&dyn SingleSlotStorage<T>> {
        (**self).get_slot(index)
    }
}

impl<T: 'static, V> StorageView<T> for &V
where
    V: StorageView<T> + ?Sized,
{
    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        (**self).extract(resource, max_amount, tx)
    }

    fn is_resource_blank(&self) -> bool {
        (**self).is_resource_blank()
    }

    fn resource(&self) -> T {
        (**self).resource()
    }

    fn amount(&self) -> u64 {
        (**self).amount()
    }

    fn capacity(&self) -> u64 {
        (**self).capacity()
    }

    fn underlying_id(&self) -> ViewId {
        (**self).underlying_id()
    }
}

/// The storage that accepts and yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStorage;

impl<T: 'static> Storage<T> for EmptyStorage {
    fn supports_insertion(&self) -> bool {
        false
    }

    fn insert(&self, _resource: &T, _max_amount: u64, _tx: &Transaction) -> u64 {
        0
    }

    fn supports_extraction(&self) -> bool {
        false
    }

    fn extract(&self, _resource: &T, _max_amount: u64, _tx: &Transaction) -> u64 {
        0
    }

    fn iter(&self) -> ViewIter<'_, T> {
        Box::new(std::iter::empty())
    }

    fn version(&self) -> u64 {
        0
    }
}

/// Argument checks shared by the variant storages.
pub mod preconditions {
    use crate::variant::TransferVariant;

    /// Ensure the variant is not blank.
    ///
    /// # Panics
    ///
    /// Panics on a blank variant; blank resources cannot be inserted into or
    /// extracted from a storage.
    pub fn not_blank<T: TransferVariant>(variant: &T) {
        if variant.is_blank() {
            panic!("resource may not be blank");
        }
    }
}
