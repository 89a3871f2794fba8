//! Repository layer: per-entity persistence contracts and SQLite impls.
//!
//! # Responsibility
//! - Keep SQL inside the persistence boundary.
//! - Translate storage constraint failures into semantic errors.
//!
//! # Invariants
//! - Repositories never commit; the caller owns the transaction.
//! - Unique/primary-key violations surface as `RepoError::Conflict`.

use crate::db::DbError;
use rusqlite::ffi;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod comment_repo;
pub mod post_repo;
pub mod taxonomy_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Blog entity kinds, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    User,
    Category,
    Tag,
    Post,
    Comment,
    PostTag,
}

impl Entity {
    /// Maps a storage table name back to its entity.
    pub fn from_table(table: &str) -> Option<Self> {
        match table {
            "users" => Some(Self::User),
            "categories" => Some(Self::Category),
            "tags" => Some(Self::Tag),
            "posts" => Some(Self::Post),
            "comments" => Some(Self::Comment),
            "post_tags" => Some(Self::PostTag),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::PostTag => "post tag link",
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Repository error for blog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Row addressed by id does not exist.
    NotFound { entity: Entity, id: i64 },
    /// Unique or primary-key violation; carries the `table.column` target.
    Conflict(String),
    InvalidData(String),
}

impl RepoError {
    /// Entity owning the violated constraint, when it can be recovered.
    pub fn conflict_entity(&self) -> Option<Entity> {
        match self {
            Self::Conflict(target) => target
                .split('.')
                .next()
                .and_then(|table| Entity::from_table(table.trim())),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(target) => write!(f, "unique constraint violated: {target}"),
            Self::InvalidData(message) => write!(f, "invalid persisted blog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match constraint_target(&value) {
            Some(target) => Self::Conflict(target),
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

fn constraint_target(err: &rusqlite::Error) -> Option<String> {
    let rusqlite::Error::SqliteFailure(inner, message) = err else {
        return None;
    };
    if inner.extended_code != ffi::SQLITE_CONSTRAINT_UNIQUE
        && inner.extended_code != ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    {
        return None;
    }

    // SQLite reports "UNIQUE constraint failed: <table>.<column>[, ...]".
    let message = message.as_deref().unwrap_or_default();
    let target = message
        .split_once("failed:")
        .map_or(message, |(_, rest)| rest)
        .trim();
    Some(target.to_string())
}

pub(crate) fn count_rows(conn: &rusqlite::Connection, table: &'static str) -> RepoResult<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count in {table}")))
}
