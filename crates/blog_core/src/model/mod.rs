//! Blog domain model.
//!
//! # Responsibility
//! - Define entity records, id aliases and read models shared by repo/service.
//! - Validate user-supplied fields before they reach storage.
//!
//! # Invariants
//! - Every entity is identified by a storage-assigned integer id that is
//!   never reused.

pub mod post;
pub mod taxonomy;
pub mod user;
pub mod validation;
