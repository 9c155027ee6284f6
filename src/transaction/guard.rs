//! The transaction guard.

use std::marker::PhantomData;

use tracing::trace;

use super::manager::{CloseContext, Frame, Lifecycle, TransactionResult, MANAGER};

/// A scope in which participants guarantee atomicity: either every change made
/// inside it is kept (commit), or all of them are reverted (abort).
///
/// Transactions are thread-local and nest. A nested transaction can only be
/// opened on the innermost open transaction, and transactions must be closed
/// innermost-first; violating the protocol panics, it never corrupts state.
/// Dropping a guard without committing aborts it.
///
/// The guard is neither `Send` nor `Sync`, so a transaction can never be
/// touched from a thread other than the one that opened it.
#[derive(Debug)]
pub struct Transaction {
    depth: usize,
    closed: bool,
    _not_send: PhantomData<*mut ()>,
}

impl Transaction {
    /// Open an outermost transaction for the current thread.
    ///
    /// # Panics
    ///
    /// Panics if this thread already has an open transaction, or is in the
    /// middle of closing one.
    pub fn open_outer() -> Transaction {
        MANAGER.with(|m| {
            let mut manager = m.borrow_mut();
            match manager.lifecycle {
                Lifecycle::Idle => {}
                Lifecycle::Open => panic!("an outer transaction is already open on this thread"),
                Lifecycle::Closing | Lifecycle::OuterClosing => {
                    panic!("cannot open a transaction while the previous one is closing")
                }
            }

            manager.frames.push(Frame::default());
            manager.lifecycle = Lifecycle::Open;
            trace!("opened outer transaction");

            Transaction {
                depth: 0,
                closed: false,
                _not_send: PhantomData,
            }
        })
    }

    /// Open a transaction nested inside this one.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not the innermost open transaction.
    pub fn open_nested(&self) -> Transaction {
        MANAGER.with(|m| {
            let mut manager = m.borrow_mut();
            if manager.lifecycle != Lifecycle::Open {
                panic!("cannot open a nested transaction while closing");
            }
            if manager.frames.len() != self.depth + 1 {
                panic!("open_nested must be called on the innermost open transaction");
            }

            manager.frames.push(Frame::default());
            let depth = self.depth + 1;
            trace!(depth, "opened nested transaction");

            Transaction {
                depth,
                closed: false,
                _not_send: PhantomData,
            }
        })
    }

    /// Open a transaction nested inside `parent` when given, or an outer one.
    pub fn open_nested_in(parent: Option<&Transaction>) -> Transaction {
        match parent {
            Some(parent) => parent.open_nested(),
            None => Transaction::open_outer(),
        }
    }

    /// Whether a transaction is open (or closing) on the current thread.
    pub fn is_open() -> bool {
        Self::lifecycle() != Lifecycle::Idle
    }

    /// The lifecycle state of the current thread's transaction manager.
    pub fn lifecycle() -> Lifecycle {
        MANAGER.with(|m| m.borrow().lifecycle)
    }

    /// Nesting depth of this transaction: 0 for an outer transaction, 1 for a
    /// direct nested child, and so on.
    pub fn nesting_depth(&self) -> usize {
        self.depth
    }

    /// Register a callback invoked when this transaction closes.
    ///
    /// Callbacks run last-registered-first. Work that may mutate other
    /// participants should instead be deferred until after the outermost close
    /// with [`Transaction::add_outer_close_callback`].
    ///
    /// # Panics
    ///
    /// Panics if this transaction is no longer open.
    pub fn add_close_callback(
        &self,
        callback: impl FnOnce(&mut CloseContext<'_>, TransactionResult) + 'static,
    ) {
        MANAGER.with(|m| {
            let mut manager = m.borrow_mut();
            match manager.frames.get_mut(self.depth) {
                Some(frame) => frame.close_callbacks.push(Box::new(callback)),
                None => panic!("transaction is no longer open"),
            }
        });
    }

    /// Register a callback invoked after the outermost transaction closes and
    /// after all close callbacks have run. Callbacks run last-registered-first.
    pub fn add_outer_close_callback(&self, callback: impl FnOnce(TransactionResult) + 'static) {
        MANAGER.with(|m| m.borrow_mut().outer_close_callbacks.push(Box::new(callback)));
    }

    /// Commit: every change made since this transaction was opened is kept.
    pub fn commit(mut self) {
        self.close(TransactionResult::Committed);
    }

    /// Abort: every change made since this transaction was opened is reverted.
    pub fn abort(mut self) {
        self.close(TransactionResult::Aborted);
    }

    fn close(&mut self, result: TransactionResult) {
        if self.closed {
            return;
        }
        self.closed = true;

        let pending = MANAGER.with(|m| m.borrow_mut().close(self.depth, result));
        trace!(depth = self.depth, ?result, "closed transaction");

        if self.depth > 0 {
            debug_assert!(pending.is_empty());
            return;
        }

        // Outer-close callbacks run with the manager borrow released so they may
        // query lifecycle state; callbacks they register are drained in turn.
        let mut pending = pending;
        loop {
            while let Some(callback) = pending.pop() {
                callback(result);
            }
            pending = MANAGER.with(|m| std::mem::take(&mut m.borrow_mut().outer_close_callbacks));
            if pending.is_empty() {
                break;
            }
        }

        MANAGER.with(|m| m.borrow_mut().lifecycle = Lifecycle::Idle);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        if std::thread::panicking() {
            // Roll back best-effort; skip when the stack is already inconsistent
            // so an unwind never turns into a double panic.
            let innermost = MANAGER
                .try_with(|m| {
                    m.try_borrow()
                        .map(|manager| manager.frames.len() == self.depth + 1)
                        .unwrap_or(false)
                })
                .unwrap_or(false);
            if !innermost {
                return;
            }
        }

        self.close(TransactionResult::Aborted);
    }
}
