//! Post repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist posts and their `post_tags` links.
//! - Build `PostRecord` read models (author, category, sorted tags).
//!
//! # Invariants
//! - Every listing is ordered by post id, i.e. insertion order.
//! - A post/tag pair is linked at most once.

use crate::model::post::{PostId, PostRecord};
use crate::model::taxonomy::{CategoryId, TagId};
use crate::model::user::UserId;
use crate::repo::{count_rows, Entity, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const POST_SELECT_SQL: &str = "SELECT
    p.id,
    p.title,
    p.content,
    p.user_id,
    u.username AS author,
    p.category_id,
    c.name AS category
FROM posts p
INNER JOIN users u ON u.id = p.user_id
INNER JOIN categories c ON c.id = p.category_id";

/// Column changes for `update_post`; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostChanges<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub category_id: Option<CategoryId>,
}

pub trait PostRepository {
    fn create_post(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        title: &str,
        content: &str,
    ) -> RepoResult<PostId>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<PostRecord>>;
    fn post_exists(&self, id: PostId) -> RepoResult<bool>;
    fn list_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<PostRecord>>;
    /// Posts linked to any of `tag_names`, each post once.
    fn list_by_tag_names(&self, tag_names: &[String]) -> RepoResult<Vec<PostRecord>>;
    /// `limit = None` returns every remaining row after `offset`.
    fn list_by_user(
        &self,
        user_id: UserId,
        limit: Option<u32>,
        offset: u64,
    ) -> RepoResult<Vec<PostRecord>>;
    fn update_post(&self, id: PostId, changes: &PostChanges<'_>) -> RepoResult<()>;
    /// Returns `false` when the link already existed.
    fn link_tag(&self, post_id: PostId, tag_id: TagId) -> RepoResult<bool>;
    /// Removes every tag link of the post and returns how many were removed.
    fn clear_tags(&self, post_id: PostId) -> RepoResult<usize>;
    /// Removes the post row only. Returns `false` when it did not exist.
    fn delete_post(&self, id: PostId) -> RepoResult<bool>;
    fn count_posts(&self) -> RepoResult<u64>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_posts(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(self.conn, row)?);
        }
        Ok(posts)
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        title: &str,
        content: &str,
    ) -> RepoResult<PostId> {
        self.conn.execute(
            "INSERT INTO posts (title, content, user_id, category_id) VALUES (?1, ?2, ?3, ?4);",
            params![title, content, user_id, category_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<PostRecord>> {
        let mut posts = self.query_posts(
            &format!("{POST_SELECT_SQL} WHERE p.id = ?;"),
            vec![Value::Integer(id)],
        )?;
        Ok(posts.pop())
    }

    fn post_exists(&self, id: PostId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<PostRecord>> {
        self.query_posts(
            &format!("{POST_SELECT_SQL} WHERE p.category_id = ? ORDER BY p.id ASC;"),
            vec![Value::Integer(category_id)],
        )
    }

    fn list_by_tag_names(&self, tag_names: &[String]) -> RepoResult<Vec<PostRecord>> {
        if tag_names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; tag_names.len()].join(", ");
        let sql = format!(
            "{POST_SELECT_SQL}
             WHERE p.id IN (
                SELECT pt.post_id
                FROM post_tags pt
                INNER JOIN tags t ON t.id = pt.tag_id
                WHERE t.name IN ({placeholders})
             )
             ORDER BY p.id ASC;"
        );
        let bind_values = tag_names
            .iter()
            .map(|name| Value::Text(name.clone()))
            .collect();
        self.query_posts(&sql, bind_values)
    }

    fn list_by_user(
        &self,
        user_id: UserId,
        limit: Option<u32>,
        offset: u64,
    ) -> RepoResult<Vec<PostRecord>> {
        let offset = i64::try_from(offset)
            .map_err(|_| RepoError::InvalidData(format!("row offset {offset} out of range")))?;
        let limit = limit.map_or(-1, i64::from);
        self.query_posts(
            &format!("{POST_SELECT_SQL} WHERE p.user_id = ? ORDER BY p.id ASC LIMIT ? OFFSET ?;"),
            vec![
                Value::Integer(user_id),
                Value::Integer(limit),
                Value::Integer(offset),
            ],
        )
    }

    fn update_post(&self, id: PostId, changes: &PostChanges<'_>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE posts
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                category_id = COALESCE(?4, category_id)
             WHERE id = ?1;",
            params![id, changes.title, changes.content, changes.category_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Post,
                id,
            });
        }
        Ok(())
    }

    fn link_tag(&self, post_id: PostId, tag_id: TagId) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2);",
            params![post_id, tag_id],
        )?;
        Ok(inserted == 1)
    }

    fn clear_tags(&self, post_id: PostId) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM post_tags WHERE post_id = ?1;", [post_id])?;
        Ok(removed)
    }

    fn delete_post(&self, id: PostId) -> RepoResult<bool> {
        let removed = self.conn.execute("DELETE FROM posts WHERE id = ?1;", [id])?;
        Ok(removed == 1)
    }

    fn count_posts(&self) -> RepoResult<u64> {
        count_rows(self.conn, "posts")
    }
}

fn parse_post_row(conn: &Connection, row: &Row<'_>) -> RepoResult<PostRecord> {
    let id: PostId = row.get("id")?;
    Ok(PostRecord {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        user_id: row.get("user_id")?,
        author: row.get("author")?,
        category_id: row.get("category_id")?,
        category: row.get("category")?,
        tags: load_tags_for_post(conn, id)?,
    })
}

fn load_tags_for_post(conn: &Connection, post_id: PostId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.name
         FROM post_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([post_id])?;
    let mut tags: Vec<String> = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}
