//! Single-variant storage: one resource kind at a time, snapshot-backed.

use std::fmt;

use thiserror::Error;

use super::{preconditions, SingleSlotStorage, SlottedStorage, Storage, StorageView, StorageViewItem, ViewIter};
use crate::transaction::{Transaction, TransactionalValue};
use crate::variant::{ResourceAmount, TransferVariant};

/// Contents rejected by [`SingleVariantStorage::load_contents`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentsError {
    /// The amount does not fit the storage's capacity for that variant.
    #[error("amount {amount} exceeds capacity {capacity}")]
    ExceedsCapacity {
        /// The rejected amount.
        amount: u64,
        /// The capacity for the offered variant.
        capacity: u64,
    },

    /// A blank variant cannot carry a non-zero amount.
    #[error("blank contents cannot carry a non-zero amount ({amount})")]
    BlankWithAmount {
        /// The rejected amount.
        amount: u64,
    },
}

/// A storage that holds a single variant at any given time.
///
/// Behavior is configured at construction: a capacity
/// function (or fixed capacity), optional insert/extract filters, and a
/// final-commit hook for change notifications.
///
/// ```
/// use transfer_api::{SingleVariantStorage, Transaction, TransferVariant};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Fluid(Option<&'static str>);
///
/// impl TransferVariant for Fluid {
///     type Object = &'static str;
///     fn blank() -> Self {
///         Fluid(None)
///     }
///     fn is_blank(&self) -> bool {
///         self.0.is_none()
///     }
///     fn object(&self) -> Option<&&'static str> {
///         self.0.as_ref()
///     }
/// }
///
/// let tank = SingleVariantStorage::with_fixed_capacity(1000);
/// let tx = Transaction::open_outer();
/// assert_eq!(tank.insert(&Fluid(Some("water")), 250, &tx), 250);
/// tx.commit();
/// assert_eq!(tank.amount(), 250);
/// ```
pub struct SingleVariantStorage<T: TransferVariant> {
    contents: TransactionalValue<ResourceAmount<T>>,
    capacity_for: Box<dyn Fn(&T) -> u64>,
    insert_filter: Option<Box<dyn Fn(&T) -> bool>>,
    extract_filter: Option<Box<dyn Fn(&T) -> bool>>,
}

impl<T: TransferVariant> SingleVariantStorage<T> {
    /// Create an empty storage whose capacity depends on the stored variant.
    /// For a blank variant the function should return an estimate.
    pub fn new(capacity_for: impl Fn(&T) -> u64 + 'static) -> Self {
        Self {
            contents: TransactionalValue::new(ResourceAmount::new(T::blank(), 0)),
            capacity_for: Box::new(capacity_for),
            insert_filter: None,
            extract_filter: None,
        }
    }

    /// Create an empty storage with the same capacity for every variant.
    pub fn with_fixed_capacity(capacity: u64) -> Self {
        Self::new(move |_| capacity)
    }

    /// Restrict which variants may be inserted.
    pub fn insert_filter(mut self, filter: impl Fn(&T) -> bool + 'static) -> Self {
        self.insert_filter = Some(Box::new(filter));
        self
    }

    /// Restrict which variants may be extracted.
    pub fn extract_filter(mut self, filter: impl Fn(&T) -> bool + 'static) -> Self {
        self.extract_filter = Some(Box::new(filter));
        self
    }

    /// Register a hook invoked after every outermost commit that modified this
    /// storage.
    pub fn on_final_commit(self, hook: impl Fn() + 'static) -> Self {
        self.contents.set_on_final_commit(hook);
        self
    }

    /// The stored variant; blank when the storage is empty.
    pub fn resource(&self) -> T {
        self.contents.peek(|c| c.resource.clone())
    }

    /// The stored amount.
    pub fn amount(&self) -> u64 {
        self.contents.peek(|c| c.amount)
    }

    /// Insert up to `max_amount` of `resource`, returning the amount accepted.
    ///
    /// Only the currently stored variant (or any allowed variant when blank) is
    /// accepted, clamped to the remaining capacity.
    ///
    /// # Panics
    ///
    /// Panics when `resource` is blank.
    pub fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        preconditions::not_blank(resource);

        if let Some(filter) = &self.insert_filter {
            if !filter(resource) {
                return 0;
            }
        }

        let (variant, amount) = self.contents.peek(|c| (c.resource.clone(), c.amount));
        if variant != *resource && !variant.is_blank() {
            return 0;
        }

        let inserted = max_amount.min((self.capacity_for)(resource).saturating_sub(amount));
        if inserted == 0 {
            return 0;
        }

        self.contents.update(tx, |c| {
            if c.resource.is_blank() {
                c.resource = resource.clone();
                c.amount = inserted;
            } else {
                c.amount += inserted;
            }
        });

        inserted
    }

    /// Extract up to `max_amount` of `resource`, returning the amount removed.
    /// The storage resets to blank when it empties out.
    ///
    /// # Panics
    ///
    /// Panics when `resource` is blank.
    pub fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        preconditions::not_blank(resource);

        if let Some(filter) = &self.extract_filter {
            if !filter(resource) {
                return 0;
            }
        }

        let (variant, amount) = self.contents.peek(|c| (c.resource.clone(), c.amount));
        if variant != *resource {
            return 0;
        }

        let extracted = max_amount.min(amount);
        if extracted == 0 {
            return 0;
        }

        self.contents.update(tx, |c| {
            c.amount -= extracted;
            if c.amount == 0 {
                c.resource = T::blank();
            }
        });

        extracted
    }

    /// Snapshot of the current contents, for persistence.
    pub fn save_contents(&self) -> ResourceAmount<T> {
        self.contents.get()
    }

    /// Replace the contents outside of any transaction, for setup and
    /// persistence loading.
    pub fn load_contents(&self, contents: ResourceAmount<T>) -> Result<(), ContentsError> {
        if contents.resource.is_blank() {
            if contents.amount > 0 {
                return Err(ContentsError::BlankWithAmount {
                    amount: contents.amount,
                });
            }
        } else {
            let capacity = (self.capacity_for)(&contents.resource);
            if contents.amount > capacity {
                return Err(ContentsError::ExceedsCapacity {
                    amount: contents.amount,
                    capacity,
                });
            }
        }

        self.contents.set_untracked(contents);
        Ok(())
    }
}

impl<T: TransferVariant> Storage<T> for SingleVariantStorage<T> {
    fn insert(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        SingleVariantStorage::insert(self, resource, max_amount, tx)
    }

    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        SingleVariantStorage::extract(self, resource, max_amount, tx)
    }

    fn iter(&self) -> ViewIter<'_, T> {
        Box::new(std::iter::once(
            Box::new(self) as StorageViewItem<'_, T>
        ))
    }

    fn version(&self) -> u64 {
        self.contents.version()
    }

    fn as_slotted(&self) -> Option<&dyn SlottedStorage<T>> {
        Some(self)
    }
}

impl<T: TransferVariant> StorageView<T> for SingleVariantStorage<T> {
    fn extract(&self, resource: &T, max_amount: u64, tx: &Transaction) -> u64 {
        SingleVariantStorage::extract(self, resource, max_amount, tx)
    }

    fn is_resource_blank(&self) -> bool {
        self.contents.peek(|c| c.resource.is_blank())
    }

    fn resource(&self) -> T {
        SingleVariantStorage::resource(self)
    }

    fn amount(&self) -> u64 {
        SingleVariantStorage::amount(self)
    }

    fn capacity(&self) -> u64 {
        self.contents.peek(|c| (self.capacity_for)(&c.resource))
    }
}

impl<T: TransferVariant> SlottedStorage<T> for SingleVariantStorage<T> {
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

impl<T: TransferVariant> fmt::Debug for SingleVariantStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.contents.peek(|c| {
            f.debug_struct("SingleVariantStorage")
                .field("resource", &c.resource)
                .field("amount", &c.amount)
                .finish()
        })
    }
}
