//! Transactions: thread-local atomic scopes with snapshot-based rollback.
//!
//! - [`Transaction`]: the guard that opens, nests, commits and aborts scopes
//! - [`TransactionalValue`] / [`TransactionalList`]: state that follows them
//! - [`CloseContext`]: what close callbacks get to work with

mod guard;
mod list;
mod manager;
mod value;

pub use guard::Transaction;
pub use list::TransactionalList;
pub use manager::{CloseContext, Lifecycle, TransactionResult};
pub use value::TransactionalValue;
