//! High-level operations that correspond to CLI invocations
//!
//! These modules hold the logic for renaming and rolling back, separated
//! from CLI concerns like argument parsing and output formatting.

pub mod rename;
pub mod rollback;

pub use rename::{rename_operation, RenameRequest};
pub use rollback::rollback_operation;
