//! Trace-scoped file transactions.
//!
//! Every mutation goes through [`FileTransactionManager`], which backs up the
//! original content once per path and trace, journals the change before
//! touching the target, and can reverse a change list in LIFO order.

mod error;
mod manager;
mod manifest;
mod paths;

pub use error::{Result, TxnError};
pub use manager::{FileTransactionManager, RollbackFailure, RollbackOutcome};
