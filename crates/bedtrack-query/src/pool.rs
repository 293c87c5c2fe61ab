// SPDX-License-Identifier: Apache-2.0

use bedtrack_core::StoreConfig;
use rusqlite::{Connection, OpenFlags};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::QueryError;

const STATEMENT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadonlyPragmas {
    pub cache_kib: i64,
    pub mmap_bytes: i64,
}

impl Default for ReadonlyPragmas {
    fn default() -> Self {
        let cfg = StoreConfig::default();
        Self {
            cache_kib: cfg.sqlite_cache_kib,
            mmap_bytes: cfg.sqlite_mmap_bytes,
        }
    }
}

pub(crate) fn open_readonly(path: &Path) -> Result<Connection, QueryError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| QueryError::storage(format!("open {}: {e}", path.display())))
}

pub(crate) fn apply_readonly_pragmas(
    conn: &Connection,
    pragmas: ReadonlyPragmas,
) -> Result<(), QueryError> {
    conn.execute_batch(&format!(
        "PRAGMA query_only=ON; PRAGMA temp_store=MEMORY; PRAGMA cache_size=-{}; PRAGMA mmap_size={};",
        pragmas.cache_kib, pragmas.mmap_bytes,
    ))
    .map_err(QueryError::from)
}

/// Shared read-only handle to the primary store.
///
/// Connections are checked out under a short lock and handed back on drop, so
/// concurrent readers run on separate SQLite connections. At most `max_idle`
/// connections are retained between calls.
#[derive(Debug)]
pub struct ConnectionPool {
    path: PathBuf,
    pragmas: ReadonlyPragmas,
    max_idle: usize,
    idle: Mutex<Vec<Connection>>,
}

impl ConnectionPool {
    /// Opens one connection eagerly so a missing or unreadable store fails here.
    pub fn open(
        path: impl Into<PathBuf>,
        max_idle: usize,
        pragmas: ReadonlyPragmas,
    ) -> Result<Self, QueryError> {
        let path = path.into();
        let pool = Self {
            path,
            pragmas,
            max_idle: max_idle.max(1),
            idle: Mutex::new(Vec::new()),
        };
        let first = pool.connect()?;
        pool.release(first);
        Ok(pool)
    }

    pub fn from_config(cfg: &StoreConfig) -> Result<Self, QueryError> {
        Self::open(
            cfg.database_path(),
            cfg.pool_size,
            ReadonlyPragmas {
                cache_kib: cfg.sqlite_cache_kib,
                mmap_bytes: cfg.sqlite_mmap_bytes,
            },
        )
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn acquire(&self) -> Result<PooledConnection<'_>, QueryError> {
        let reused = self
            .idle
            .lock()
            .map_err(|_| QueryError::storage("connection pool lock poisoned"))?
            .pop();
        let conn = match reused {
            Some(conn) => conn,
            None => self.connect()?,
        };
        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
        })
    }

    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn connect(&self) -> Result<Connection, QueryError> {
        let conn = open_readonly(&self.path)?;
        apply_readonly_pragmas(&conn, self.pragmas)?;
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        debug!(path = %self.path.display(), "store connection opened");
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(conn);
            }
        }
    }
}

pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        self.conn
            .as_ref()
            .unwrap_or_else(|| unreachable!("pooled connection used after release"))
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
