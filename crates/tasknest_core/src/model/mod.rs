//! Persisted domain records.
//!
//! # Responsibility
//! - Define the JSON shapes stored under the session and task-list keys.
//! - Keep field names byte-compatible with existing browser storage.
//!
//! # Invariants
//! - Optional task fields are omitted, not written as `null`.

pub mod session;
pub mod task;
