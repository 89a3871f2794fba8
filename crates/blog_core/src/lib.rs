//! Core data layer for the blog demo.
//! Schema, repositories and CRUD services over a single SQLite store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BlogConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, open_store, reset_schema, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingConfig};
pub use model::post::{
    CommentId, CommentRecord, PageRequest, PostId, PostPatch, PostRecord, PostThread, UserPosts,
};
pub use model::taxonomy::{Category, CategoryId, Tag, TagId};
pub use model::user::{User, UserId};
pub use model::validation::ValidationError;
pub use repo::{Entity, RepoError, RepoResult};
pub use service::blog_service::{
    BlogError, BlogResult, BlogService, PostDeleteRule, PostDeletion, ServiceOptions,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
