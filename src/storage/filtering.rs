//! Insert/extract gating around a backing storage.

use std::fmt;

use super::{Storage, StorageView, StorageViewItem, ViewId, ViewIter};
use crate::transaction::Transaction;

/// A [`Storage`] wrapping a backing storage behind insert/extract predicates.
///
/// Filtered resources stay visible through iteration but cannot be moved, not
/// even through the wrapped views.
pub struct FilteringStorage<T, S> {
    backing: S,
    insert_filter: Option<Box<dyn Fn(&T) -> bool>>,
    extract_filter: Option<Box<dyn Fn(&T) -> bool>>,
}

impl<T: 'static, S: Storage<T>> FilteringStorage<T, S> {
    /// Wrap `backing` without any restrictions; add them with
    /// [`FilteringStorage::insert_filter`] and
    /// [`FilteringStorage::extract_filter`].
    pub fn new(backing: S) -> Self {
        Self {
            backing,
            insert_filter: None,
            extract_filter: None,
        }
    }

    /// Only let resources accepted by `filter` be inserted.
    pub fn insert_filter(mut self, filter: impl Fn(&T) -> bool + 'static) -> Self {
        self.insert_filter = Some(Box::new(filter));
        self
    }

    /// Only let resources accepted by `filter` be extracted.
    pub fn extract_filter(mut self, filter: impl Fn(&T) -> bool + 'static) -> Self {
        self.extract_filter = Some(Box::new(filter));
        self
    }

    /// The wrapped storage.
    pub fn backing(&self) -> &S {
        &self.backing
    }

    fn can_insert(&self, resource: &T) -> bool {
        self.insert_filter.as_ref().map_or(true, |filter| filter(resource))
    }

    fn can_extract(&self, resource: &T) -> bool {
        self.extract_filter.as_ref().map_or(true, |filter| filter(resource))
    }
}

impl<T: 'static, S: Storage<T>> Storage<T> for FilteringStorage<T, S> {
    fn supports_insertion(&self) -> bool {
        self.backing.supports_insertion()
    }

    fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        if self.can_insert(resource) {
            self.backing.insert(resource, max_amount, tx)
        } else {
            0
        }
    }

    fn supports_extraction(&self) -> bool {
        self.backing.supports_extraction()
    }

    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        if self.can_extract(resource) {
            self.backing.extract(resource, max_amount, tx)
        } else {
            0
        }
    }

    fn iter(&self) -> ViewIter<'_, T> {
        let filter = self.extract_filter.as_deref();
        Box::new(self.backing.iter().map(move |view| {
            Box::new(FilteringView { view, filter }) as StorageViewItem<'_, T>
        }))
    }

    fn version(&self) -> u64 {
        self.backing.version()
    }
}

struct FilteringView<'a, T> {
    view: StorageViewItem<'a, T>,
    filter: Option<&'a (dyn Fn(&T) -> bool)>,
}

impl<T: 'static> StorageView<T> for FilteringView<'_, T> {
    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        if self.filter.map_or(true, |filter| filter(resource)) {
            self.view.extract(resource, max_amount, tx)
        } else {
            0
        }
    }

    fn is_resource_blank(&self) -> bool {
        self.view.is_resource_blank()
    }

    fn resource(&self) -> T {
        self.view.resource()
    }

    fn amount(&self) -> u64 {
        self.view.amount()
    }

    fn capacity(&self) -> u64 {
        self.view.capacity()
    }

    fn underlying_id(&self) -> ViewId {
        self.view.underlying_id()
    }
}

impl<T, S: fmt::Debug> fmt::Debug for FilteringStorage<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteringStorage")
            .field("backing", &self.backing)
            .finish()
    }
}
