//! Category and tag entities.
//!
//! Both are name-keyed lookup tables: a post belongs to exactly one
//! category and links to any number of tags through `post_tags`.

use serde::{Deserialize, Serialize};

pub type CategoryId = i64;
pub type TagId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Unique, compared exactly.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    /// Unique, compared exactly.
    pub name: String,
}
