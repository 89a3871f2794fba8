//! Comment repository contract and SQLite implementation.

use crate::model::post::{CommentId, CommentRecord, PostId};
use crate::model::user::UserId;
use crate::repo::{count_rows, Entity, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COMMENT_SELECT_SQL: &str = "SELECT
    cm.id,
    cm.post_id,
    cm.user_id,
    u.username AS author,
    cm.content
FROM comments cm
INNER JOIN users u ON u.id = cm.user_id";

pub trait CommentRepository {
    fn create_comment(&self, user_id: UserId, post_id: PostId, content: &str)
        -> RepoResult<CommentId>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>>;
    /// Comments of one post in insertion order.
    fn list_for_post(&self, post_id: PostId) -> RepoResult<Vec<CommentRecord>>;
    fn update_content(&self, id: CommentId, content: &str) -> RepoResult<()>;
    /// Returns `false` when the comment did not exist.
    fn delete_comment(&self, id: CommentId) -> RepoResult<bool>;
    /// Removes every comment of the post and returns how many were removed.
    fn delete_for_post(&self, post_id: PostId) -> RepoResult<usize>;
    fn count_comments(&self) -> RepoResult<u64>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(
        &self,
        user_id: UserId,
        post_id: PostId,
        content: &str,
    ) -> RepoResult<CommentId> {
        self.conn.execute(
            "INSERT INTO comments (content, user_id, post_id) VALUES (?1, ?2, ?3);",
            params![content, user_id, post_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>> {
        let comment = self
            .conn
            .query_row(
                &format!("{COMMENT_SELECT_SQL} WHERE cm.id = ?1;"),
                [id],
                parse_comment_row,
            )
            .optional()?;
        Ok(comment)
    }

    fn list_for_post(&self, post_id: PostId) -> RepoResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL} WHERE cm.post_id = ?1 ORDER BY cm.id ASC;"
        ))?;
        let comments = stmt
            .query_map([post_id], parse_comment_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn update_content(&self, id: CommentId, content: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE comments SET content = ?2 WHERE id = ?1;",
            params![id, content],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Comment,
                id,
            });
        }
        Ok(())
    }

    fn delete_comment(&self, id: CommentId) -> RepoResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1;", [id])?;
        Ok(removed == 1)
    }

    fn delete_for_post(&self, post_id: PostId) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM comments WHERE post_id = ?1;", [post_id])?;
        Ok(removed)
    }

    fn count_comments(&self) -> RepoResult<u64> {
        count_rows(self.conn, "comments")
    }
}

fn parse_comment_row(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get("id")?,
        post_id: row.get("post_id")?,
        user_id: row.get("user_id")?,
        author: row.get("author")?,
        content: row.get("content")?,
    })
}
