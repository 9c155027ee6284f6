//! transfer-api - Transactional resource transfer
//!
//! A library for moving quantities of resources between storages with
//! atomicity guarantees: either the whole operation commits, or every
//! participant rolls back to its previous state.
//!
//! # Architecture
//!
//! The system is built around thread-local transactions:
//! - A [`Transaction`] is a nestable scope; participants snapshot their state
//!   the first time they are modified at a given nesting depth
//! - Aborting restores snapshots, committing folds them into the parent scope
//! - After the outermost commit, final-commit hooks run for deferred work
//!
//! # Modules
//!
//! - `transaction`: Transaction guard, lifecycle, transactional values
//! - `storage`: Storage traits and implementations (single, combined, filtering)
//! - `variant`: Resource descriptors moved between storages
//!
//! # Usage
//!
//! ```
//! use transfer_api::{SingleVariantStorage, Transaction, TransferVariant};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Fluid(Option<&'static str>);
//!
//! impl TransferVariant for Fluid {
//!     type Object = &'static str;
//!     fn blank() -> Self {
//!         Fluid(None)
//!     }
//!     fn is_blank(&self) -> bool {
//!         self.0.is_none()
//!     }
//!     fn object(&self) -> Option<&&'static str> {
//!         self.0.as_ref()
//!     }
//! }
//!
//! let tank = SingleVariantStorage::with_fixed_capacity(1000);
//! let water = Fluid(Some("water"));
//!
//! // Changes inside an aborted transaction leave no trace.
//! let tx = Transaction::open_outer();
//! assert_eq!(tank.insert(&water, 250, &tx), 250);
//! tx.abort();
//! assert_eq!(tank.amount(), 0);
//!
//! let tx = Transaction::open_outer();
//! assert_eq!(tank.insert(&water, 250, &tx), 250);
//! tx.commit();
//! assert_eq!(tank.amount(), 250);
//! ```

pub mod storage;
pub mod transaction;
pub mod variant;

// Re-export main types at crate root for convenience
pub use storage::{
    CombinedSlottedStorage, CombinedStorage, ContentsError, EmptyStorage, FilteringStorage,
    FixedVariantStorage, SingleSlotStorage, SingleVariantStorage, SlottedStorage, Storage,
    StorageView, StorageViewItem, ViewId, ViewIter,
};
pub use transaction::{
    CloseContext, Lifecycle, Transaction, TransactionResult, TransactionalList, TransactionalValue,
};
pub use variant::{ResourceAmount, TransferVariant};
