//! Transactional value: snapshot participation for a single piece of state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::manager::{CloseContext, TransactionResult};
use super::Transaction;
use crate::storage::next_version;

/// A value whose mutations take part in transactions.
///
/// The first mutation at a given nesting depth records a by-value snapshot and
/// registers a close callback: an abort restores the snapshot, a nested commit
/// migrates it to the parent depth, and the outermost commit discards it, bumps
/// the value's version and runs the final-commit hook.
///
/// This is the building block the storage implementations use for rollback; it
/// is also useful directly for any state that must follow transaction scopes.
pub struct TransactionalValue<T: Clone + 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    value: RefCell<T>,
    // One slot per nesting depth; `Some` once the value was modified there.
    snapshots: RefCell<Vec<Option<T>>>,
    version: Cell<u64>,
    on_final_commit: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<T: Clone + 'static> TransactionalValue<T> {
    /// Create a new transactional value with the provided starting value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                snapshots: RefCell::new(Vec::new()),
                version: Cell::new(next_version()),
                on_final_commit: RefCell::new(None),
            }),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Read the current value without cloning it.
    pub fn peek<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value inside the given transaction.
    pub fn set(&self, value: T, tx: &Transaction) {
        self.prepare(tx);
        *self.inner.value.borrow_mut() = value;
    }

    /// Mutate the value in place inside the given transaction.
    pub fn update<R>(&self, tx: &Transaction, f: impl FnOnce(&mut T) -> R) -> R {
        self.prepare(tx);
        f(&mut self.inner.value.borrow_mut())
    }

    /// Replace the value outside of any transaction, bypassing snapshots.
    ///
    /// Intended for setup and persistence loading; calling this while the value
    /// has live snapshots leaves a later rollback free to clobber it.
    pub fn set_untracked(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
    }

    /// Register the hook invoked after an outermost commit that touched this
    /// value, replacing any previous hook.
    pub fn set_on_final_commit(&self, hook: impl Fn() + 'static) {
        *self.inner.on_final_commit.borrow_mut() = Some(Rc::new(hook));
    }

    /// Version stamp, updated on every outermost commit that touched this value.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Ensure a snapshot exists for the transaction's nesting depth and register
    /// this value to be notified when the transaction closes.
    fn prepare(&self, tx: &Transaction) {
        let depth = tx.nesting_depth();
        let mut snapshots = self.inner.snapshots.borrow_mut();

        while snapshots.len() <= depth {
            snapshots.push(None);
        }

        if snapshots[depth].is_none() {
            snapshots[depth] = Some(self.inner.value.borrow().clone());
            drop(snapshots);

            let inner = Rc::clone(&self.inner);
            tx.add_close_callback(move |ctx, result| handle_close(inner, ctx, result));
        }
    }
}

fn handle_close<T: Clone + 'static>(
    inner: Rc<Inner<T>>,
    ctx: &mut CloseContext<'_>,
    result: TransactionResult,
) {
    let depth = ctx.nesting_depth();
    let snapshot = inner.snapshots.borrow_mut().get_mut(depth).and_then(Option::take);
    let Some(snapshot) = snapshot else { return };

    if result.was_aborted() {
        *inner.value.borrow_mut() = snapshot;
    } else if depth > 0 {
        // The parent must be able to revert past this commit: hand the snapshot
        // up unless the value was already modified at the parent depth.
        let migrated = {
            let mut snapshots = inner.snapshots.borrow_mut();
            if snapshots[depth - 1].is_none() {
                snapshots[depth - 1] = Some(snapshot);
                true
            } else {
                false
            }
        };

        if migrated {
            let inner = Rc::clone(&inner);
            ctx.add_close_callback(depth - 1, move |ctx, result| handle_close(inner, ctx, result));
        }
    } else {
        let inner = Rc::clone(&inner);
        ctx.add_outer_close_callback(move |_| {
            inner.version.set(next_version());
            let hook = inner.on_final_commit.borrow().clone();
            if let Some(hook) = hook {
                hook();
            }
        });
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for TransactionalValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionalValue")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}
