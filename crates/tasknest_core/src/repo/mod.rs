//! Repository layer over the key-value boundary.
//!
//! # Responsibility
//! - Translate between persisted JSON blobs and domain models.
//! - Keep storage key names out of service logic.
//!
//! # Invariants
//! - Writes replace the whole collection; there are no partial updates.
//! - Unparseable persisted data surfaces as `RepoError::InvalidData`, never a
//!   panic.

pub mod task_repo;
