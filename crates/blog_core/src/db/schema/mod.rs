//! Blog schema bootstrap and destructive reset.
//!
//! # Responsibility
//! - Create missing blog tables without touching existing rows.
//! - Drop and recreate every blog table on explicit request.
//!
//! # Invariants
//! - Schema version is mirrored to `PRAGMA user_version`.
//! - Tables are dropped children-first so foreign keys never block a reset.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("blog.sql");

/// Blog tables in dependency order (parents first).
pub const BLOG_TABLES: &[&str] = &[
    "users",
    "categories",
    "tags",
    "posts",
    "comments",
    "post_tags",
];

/// Creates any missing blog tables and stamps the schema version.
///
/// Idempotent: re-running on a bootstrapped store is a no-op.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;
    Ok(())
}

/// Drops every blog table and recreates an empty schema.
///
/// # Side effects
/// - Destroys all stored users, categories, tags, posts and comments.
pub fn reset_schema(conn: &mut Connection) -> DbResult<()> {
    warn!("event=schema_reset module=db status=start tables={}", BLOG_TABLES.len());

    let tx = conn.transaction()?;
    for table in BLOG_TABLES.iter().rev() {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    tx.execute_batch("PRAGMA user_version = 0;")?;
    tx.commit()?;

    ensure_schema(conn)?;
    info!("event=schema_reset module=db status=ok");
    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
