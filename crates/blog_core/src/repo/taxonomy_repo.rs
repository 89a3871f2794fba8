//! Category/tag repository contract and SQLite implementation.
//!
//! # Invariants
//! - Names are matched exactly; callers trim before lookup.
//! - `find_or_create_tag` never inserts a second row for an existing name.

use crate::model::taxonomy::{Category, CategoryId, Tag, TagId};
use crate::repo::RepoResult;
use rusqlite::{Connection, OptionalExtension};

pub trait TaxonomyRepository {
    fn create_category(&self, name: &str) -> RepoResult<CategoryId>;
    fn find_category(&self, name: &str) -> RepoResult<Option<Category>>;
    fn create_tag(&self, name: &str) -> RepoResult<TagId>;
    fn find_tag(&self, name: &str) -> RepoResult<Option<Tag>>;
    /// Returns the tag and whether it was created by this call.
    fn find_or_create_tag(&self, name: &str) -> RepoResult<(Tag, bool)>;
    fn count_tags(&self) -> RepoResult<u64>;
}

/// SQLite-backed category/tag repository.
pub struct SqliteTaxonomyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaxonomyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaxonomyRepository for SqliteTaxonomyRepository<'_> {
    fn create_category(&self, name: &str) -> RepoResult<CategoryId> {
        self.conn
            .execute("INSERT INTO categories (name) VALUES (?1);", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_category(&self, name: &str) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name FROM categories WHERE name = ?1;",
                [name],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    fn create_tag(&self, name: &str) -> RepoResult<TagId> {
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1);", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_tag(&self, name: &str) -> RepoResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row("SELECT id, name FROM tags WHERE name = ?1;", [name], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(tag)
    }

    fn find_or_create_tag(&self, name: &str) -> RepoResult<(Tag, bool)> {
        if let Some(tag) = self.find_tag(name)? {
            return Ok((tag, false));
        }
        let id = self.create_tag(name)?;
        Ok((
            Tag {
                id,
                name: name.to_string(),
            },
            true,
        ))
    }

    fn count_tags(&self) -> RepoResult<u64> {
        crate::repo::count_rows(self.conn, "tags")
    }
}
