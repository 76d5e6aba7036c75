//! # Write Transactions
//!
//! `BEGIN IMMEDIATE` transactions on a pooled connection.
//!
//! ## Why Not `pool.begin()`?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DEFERRED (sqlx default)           IMMEDIATE (this module)              │
//! │                                                                         │
//! │  checkout A: BEGIN                 checkout A: BEGIN IMMEDIATE  ◄ lock  │
//! │  checkout B: BEGIN                 checkout B: BEGIN IMMEDIATE          │
//! │  A: SELECT variant (shared)                     (waits, busy_timeout)   │
//! │  B: SELECT variant (shared)        A: SELECT, UPDATE, INSERT, COMMIT    │
//! │  A: UPDATE → needs RESERVED        B: acquires lock, sees A's writes    │
//! │  B: UPDATE → SQLITE_BUSY ✗         B: SELECT, UPDATE ...                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A deferred transaction that reads before it writes cannot wait for the
//! write lock: SQLite fails it immediately with `SQLITE_BUSY`. Taking the
//! lock at `BEGIN` makes concurrent checkouts queue behind `busy_timeout`
//! instead.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::{DbError, DbResult};

/// A write transaction holding the database write lock.
///
/// Finish it with [`commit`](Self::commit) or [`rollback`](Self::rollback).
/// Dropped unfinished (error path, cancelled future), the connection is
/// closed instead of returned to the pool, and SQLite discards the
/// uncommitted work.
pub struct ImmediateTx {
    conn: PoolConnection<Sqlite>,
    finished: bool,
}

impl ImmediateTx {
    /// Acquires a connection and opens `BEGIN IMMEDIATE` on it.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(ImmediateTx {
            conn,
            finished: false,
        })
    }

    /// The connection every statement of the transaction must run on.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    pub async fn commit(mut self) -> DbResult<()> {
        sqlx::query("COMMIT")
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        self.finished = true;
        Ok(())
    }

    pub async fn rollback(mut self) -> DbResult<()> {
        sqlx::query("ROLLBACK")
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        self.finished = true;
        Ok(())
    }

    /// Rolls back after a failed step, keeping the step's error.
    ///
    /// A failed ROLLBACK is logged; the connection is then closed on drop,
    /// which discards the transaction anyway.
    pub async fn abort<E>(self, err: E) -> E {
        if let Err(rollback_err) = self.rollback().await {
            warn!(error = %rollback_err, "Rollback failed, closing connection");
        }
        err
    }
}

impl Drop for ImmediateTx {
    fn drop(&mut self) {
        if !self.finished {
            self.conn.close_on_drop();
        }
    }
}
