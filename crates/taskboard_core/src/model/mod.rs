//! Domain model for assignees, todos and their shared validation rules.
//!
//! # Responsibility
//! - Define canonical records used by repositories and services.
//! - Own field-level validation that does not need storage access.
//!
//! # Invariants
//! - Every record is identified by a stable v4 UUID assigned on creation.
//! - A todo stores assignee *ids*, never assignee records.

pub mod assignee;
pub mod todo;
pub mod validation;
