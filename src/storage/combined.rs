//! Storages that aggregate an ordered list of parts.

use std::marker::PhantomData;

use super::{SingleSlotStorage, SlottedStorage, Storage, ViewIter};
use crate::transaction::Transaction;

/// A [`Storage`] wrapping multiple storages, iterated in order.
///
/// Insertion and extraction distribute over the parts in order until the
/// requested amount is satisfied.
#[derive(Debug)]
pub struct CombinedStorage<T, S> {
    /// The parts backing this storage, iterated in order.
    pub parts: Vec<S>,
    _resource: PhantomData<fn() -> T>,
}

impl<T: 'static, S: Storage<T>> CombinedStorage<T, S> {
    /// Create a combined storage delegating to the provided parts.
    pub fn new(parts: Vec<S>) -> Self {
        Self {
            parts,
            _resource: PhantomData,
        }
    }
}

impl<T: 'static, S: Storage<T>> Storage<T> for CombinedStorage<T, S> {
    fn supports_insertion(&self) -> bool {
        self.parts.iter().any(|part| part.supports_insertion())
    }

    fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        let mut amount = 0;

        for part in &self.parts {
            amount += part.insert(resource, max_amount - amount, tx);
            if amount == max_amount {
                break;
            }
        }

        amount
    }

    fn supports_extraction(&self) -> bool {
        self.parts.iter().any(|part| part.supports_extraction())
    }

    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        let mut amount = 0;

        for part in &self.parts {
            amount += part.extract(resource, max_amount - amount, tx);
            if amount == max_amount {
                break;
            }
        }

        amount
    }

    fn iter(&self) -> ViewIter<'_, T> {
        Box::new(self.parts.iter().flat_map(|part| part.iter()))
    }
}

/// A [`CombinedStorage`] over slotted parts that is itself slotted: slot
/// indices run across part boundaries in order.
#[derive(Debug)]
pub struct CombinedSlottedStorage<T, S> {
    /// The parts backing this storage, iterated in order.
    pub parts: Vec<S>,
    _resource: PhantomData<fn() -> T>,
}

impl<T: 'static, S: SlottedStorage<T>> CombinedSlottedStorage<T, S> {
    /// Create a combined slotted storage delegating to the provided parts.
    pub fn new(parts: Vec<S>) -> Self {
        Self {
            parts,
            _resource: PhantomData,
        }
    }
}

impl<T: 'static, S: SlottedStorage<T>> Storage<T> for CombinedSlottedStorage<T, S> {
    fn supports_insertion(&self) -> bool {
        self.parts.iter().any(|part| part.supports_insertion())
    }

    fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        let mut amount = 0;

        for part in &self.parts {
            amount += part.insert(resource, max_amount - amount, tx);
            if amount == max_amount {
                break;
            }
        }

        amount
    }

    fn supports_extraction(&self) -> bool {
        self.parts.iter().any(|part| part.supports_extraction())
    }

    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        let mut amount = 0;

        for part in &self.parts {
            amount += part.extract(resource, max_amount - amount, tx);
            if amount == max_amount {
                break;
            }
        }

        amount
    }

    fn iter(&self) -> ViewIter<'_, T> {
        Box::new(self.parts.iter().flat_map(|part| part.iter()))
    }

    fn as_slotted(&self) -> Option<&dyn SlottedStorage<T>> {
        Some(self)
    }
}

impl<T: 'static, S: SlottedStorage<T>> SlottedStorage<T> for CombinedSlottedStorage<T, S> {
    fn slot_count(&self) -> usize {
        self.parts.iter().map(|part| part.slot_count()).sum()
    }

    fn slot(&self, index: usize) -> &dyn SingleSlotStorage<T> {
        let mut remaining = index;

        for part in &self.parts {
            if remaining < part.slot_count() {
                return part.slot(remaining);
            }
            remaining -= part.slot_count();
        }

        panic!(
            "slot {index} is out of bounds, this storage has {} slots",
            self.slot_count()
        );
    }
}
