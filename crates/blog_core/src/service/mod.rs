//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into blog CRUD operations.
//! - Own transaction boundaries: one unit of work per operation.

pub mod blog_service;
