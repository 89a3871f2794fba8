//! Connection bootstrap for the blog store.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have the blog schema in place.

use super::schema::{ensure_schema, reset_schema};
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a blog store file and ensures its schema.
///
/// Existing rows are kept.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    bootstrap("file", || {
        info!("event=db_open module=db status=start mode=file path={}", path.display());
        Connection::open(path)
    })
}

/// Opens an in-memory blog store with the schema in place.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", || {
        info!("event=db_open module=db status=start mode=memory");
        Connection::open_in_memory()
    })
}

/// Opens a blog store file and wipes it to an empty schema.
///
/// # Side effects
/// - Destructive: every row in the file is dropped. Use `open_db` to keep data.
pub fn open_store(path: impl AsRef<Path>) -> DbResult<Connection> {
    let mut conn = open_db(path)?;
    reset_schema(&mut conn)?;
    Ok(conn)
}

fn bootstrap(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();

    let mut conn = connect().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        err
    })?;

    match configure(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn configure(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    ensure_schema(conn)?;
    Ok(())
}
