//! Thread-local transaction manager.
//!
//! Each thread owns a stack of open transaction frames. Close callbacks are
//! collected per frame and run last-registered-first when the frame closes;
//! outer-close callbacks run once the outermost frame is gone.

use std::cell::RefCell;

/// The lifecycle states a thread's transaction manager may be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No transaction is open.
    Idle,
    /// A transaction is currently open.
    Open,
    /// A transaction is in the process of closing.
    Closing,
    /// The outermost transaction closed and outer-close callbacks are running.
    OuterClosing,
}

/// The result of closing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionResult {
    /// Changes made in the transaction were discarded.
    Aborted,
    /// Changes made in the transaction became permanent.
    Committed,
}

impl TransactionResult {
    /// Whether the transaction was aborted.
    pub fn was_aborted(self) -> bool {
        self == TransactionResult::Aborted
    }

    /// Whether the transaction was committed.
    pub fn was_committed(self) -> bool {
        self == TransactionResult::Committed
    }
}

pub(crate) type CloseCallback = Box<dyn FnOnce(&mut CloseContext<'_>, TransactionResult)>;
pub(crate) type OuterCloseCallback = Box<dyn FnOnce(TransactionResult)>;

/// Access to the transaction stack while a frame is closing.
///
/// Close callbacks receive this instead of a live [`Transaction`](super::Transaction):
/// the closing frame is already gone, but callbacks may still register follow-up
/// work on the frames that remain open, or after the outermost close.
pub struct CloseContext<'m> {
    manager: &'m mut Manager,
    depth: usize,
}

impl CloseContext<'_> {
    /// Nesting depth of the frame being closed (0 for the outermost).
    pub fn nesting_depth(&self) -> usize {
        self.depth
    }

    /// Register a close callback on a still-open outer frame.
    ///
    /// # Panics
    ///
    /// Panics if `depth` does not name an open frame, i.e. when it is not
    /// strictly smaller than the closing depth.
    pub fn add_close_callback(
        &mut self,
        depth: usize,
        callback: impl FnOnce(&mut CloseContext<'_>, TransactionResult) + 'static,
    ) {
        let open = self.manager.frames.len();
        match self.manager.frames.get_mut(depth) {
            Some(frame) => frame.close_callbacks.push(Box::new(callback)),
            None => panic!("no open transaction at depth {depth} ({open} frames remain open)"),
        }
    }

    /// Register a callback to run after the outermost transaction has closed.
    pub fn add_outer_close_callback(&mut self, callback: impl FnOnce(TransactionResult) + 'static) {
        self.manager.outer_close_callbacks.push(Box::new(callback));
    }
}

#[derive(Default)]
pub(crate) struct Frame {
    pub(crate) close_callbacks: Vec<CloseCallback>,
}

pub(crate) struct Manager {
    pub(crate) frames: Vec<Frame>,
    pub(crate) outer_close_callbacks: Vec<OuterCloseCallback>,
    pub(crate) lifecycle: Lifecycle,
}

impl Manager {
    fn new() -> Self {
        Self {
            frames: Vec::new(),
            outer_close_callbacks: Vec::new(),
            lifecycle: Lifecycle::Idle,
        }
    }

    /// Close the innermost frame, running its close callbacks last-to-first.
    ///
    /// Returns the outer-close callbacks to run once the borrow on the manager
    /// has been released (depth 0 only); the caller flips the lifecycle back to
    /// [`Lifecycle::Idle`] afterwards.
    pub(crate) fn close(&mut self, depth: usize, result: TransactionResult) -> Vec<OuterCloseCallback> {
        if self.frames.len() != depth + 1 {
            panic!(
                "transaction at depth {depth} closed out of order ({} frames open)",
                self.frames.len()
            );
        }

        self.lifecycle = Lifecycle::Closing;

        let mut callbacks = match self.frames.pop() {
            Some(frame) => frame.close_callbacks,
            None => panic!("no open transaction to close"),
        };

        while let Some(callback) = callbacks.pop() {
            let mut ctx = CloseContext { manager: self, depth };
            callback(&mut ctx, result);
        }

        if depth == 0 {
            self.lifecycle = Lifecycle::OuterClosing;
            std::mem::take(&mut self.outer_close_callbacks)
        } else {
            self.lifecycle = Lifecycle::Open;
            Vec::new()
        }
    }
}

thread_local! {
    pub(crate) static MANAGER: RefCell<Manager> = RefCell::new(Manager::new());
}
