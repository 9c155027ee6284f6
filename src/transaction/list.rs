//! Transactional list built on [`TransactionalValue`].

use std::fmt;

use super::value::TransactionalValue;
use super::Transaction;

/// A `Vec` whose mutations take part in transactions.
///
/// Mutating operations take the transaction to participate in; reads are plain.
/// Index-based operations panic on out-of-range indices, like `Vec` does.
pub struct TransactionalList<T: Clone + 'static> {
    value: TransactionalValue<Vec<T>>,
}

impl<T: Clone + 'static> TransactionalList<T> {
    /// Create a new transactional list with the given starting elements.
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            value: TransactionalValue::new(elements),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.value.peek(Vec::len)
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of the element at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<T> {
        self.value.peek(|v| v.get(index).cloned())
    }

    /// Clone of the whole list.
    pub fn to_vec(&self) -> Vec<T> {
        self.value.get()
    }

    /// Read the backing vector without cloning it.
    pub fn peek<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.value.peek(|v| f(v))
    }

    /// Append an element.
    pub fn push(&self, element: T, tx: &Transaction) {
        self.value.update(tx, |v| v.push(element));
    }

    /// Insert an element at `index`.
    pub fn insert(&self, index: usize, element: T, tx: &Transaction) {
        self.value.update(tx, |v| v.insert(index, element));
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set(&self, index: usize, element: T, tx: &Transaction) -> T {
        self.value.update(tx, |v| std::mem::replace(&mut v[index], element))
    }

    /// Remove and return the element at `index`.
    pub fn remove(&self, index: usize, tx: &Transaction) -> T {
        self.value.update(tx, |v| v.remove(index))
    }

    /// Append every element of `iter`.
    pub fn extend(&self, iter: impl IntoIterator<Item = T>, tx: &Transaction) {
        self.value.update(tx, |v| v.extend(iter));
    }

    /// Keep only the elements for which `keep` returns true.
    pub fn retain(&self, keep: impl FnMut(&T) -> bool, tx: &Transaction) {
        self.value.update(tx, |v| v.retain(keep));
    }

    /// Remove all elements.
    pub fn clear(&self, tx: &Transaction) {
        self.value.update(tx, Vec::clear);
    }
}

impl<T: Clone + PartialEq + 'static> TransactionalList<T> {
    /// Whether the list contains `element`.
    pub fn contains(&self, element: &T) -> bool {
        self.value.peek(|v| v.contains(element))
    }

    /// Remove the first occurrence of `element`, returning whether one was found.
    pub fn remove_item(&self, element: &T, tx: &Transaction) -> bool {
        self.value.update(tx, |v| {
            if let Some(position) = v.iter().position(|e| e == element) {
                v.remove(position);
                true
            } else {
                false
            }
        })
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for TransactionalList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.peek(|v| f.debug_list().entries(v.iter()).finish())
    }
}
