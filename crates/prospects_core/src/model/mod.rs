//! Domain model for prospect contacts and listing view state.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep filter/sort descriptors storage-agnostic.
//!
//! # Invariants
//! - Every contact is identified by a stable `ContactId`.
//! - Deletion is permanent; there is no tombstone state.

pub mod contact;
pub mod query;
