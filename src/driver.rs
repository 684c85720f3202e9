//! The vendor-neutral driver contract.
//!
//! A consuming SQL layer programs against these traits only. Each vendor
//! adapter supplies one concrete type per role; roles are linked through
//! associated types rather than trait objects, so a statement always yields
//! the cursor type of its own vendor.

use async_trait::async_trait;

use crate::context::Context;
use crate::error::SqlDriverError;
use crate::types::{DatabaseType, RowValues};

/// Identity of the driver registration a connector belongs to.
///
/// Used by the consuming layer for driver-name lookups; it carries no behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Driver {
    db_type: DatabaseType,
}

impl Driver {
    #[must_use]
    pub fn new(db_type: DatabaseType) -> Self {
        Self { db_type }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.db_type.driver_name()
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }
}

/// Outcome of a statement executed for its side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows changed, deleted, or inserted by the statement.
    pub rows_affected: u64,
    /// Auto-increment id generated by the statement, if the vendor reports one.
    pub last_insert_id: Option<u64>,
}

impl ExecResult {
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    #[must_use]
    pub fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }
}

/// Produces live connections from a previously built connection string.
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// Open a session and verify it is alive before handing it out.
    ///
    /// A session that opens but fails its liveness check is released before
    /// the error is returned.
    async fn connect(&self, ctx: &Context) -> Result<Self::Conn, SqlDriverError>;

    /// The driver registration this connector belongs to.
    fn driver(&self) -> Driver;
}

/// One physical session.
#[async_trait]
pub trait Connection: Send {
    type Stmt: Statement;
    type Tx: Transaction;

    /// Compile `query` against the session.
    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Self::Stmt, SqlDriverError>;

    /// Start a transaction with the server's default isolation and access mode.
    async fn begin(&self, ctx: &Context) -> Result<Self::Tx, SqlDriverError>;

    /// Release the session. Statements, transactions and cursors derived from
    /// it are invalid afterwards. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), SqlDriverError>;
}

/// A compiled query bound to its connection.
#[async_trait]
pub trait Statement: Send {
    type Rows: Rows;

    /// Number of placeholders, or `None` when argument counting is left to the vendor.
    fn num_input(&self) -> Option<usize>;

    async fn exec(&self, ctx: &Context, args: &[RowValues]) -> Result<ExecResult, SqlDriverError>;

    async fn query(&self, ctx: &Context, args: &[RowValues]) -> Result<Self::Rows, SqlDriverError>;

    async fn close(&mut self) -> Result<(), SqlDriverError>;
}

/// A connection-scoped transaction. Terminal after the first commit or rollback.
#[async_trait]
pub trait Transaction: Send {
    async fn commit(&mut self, ctx: &Context) -> Result<(), SqlDriverError>;

    async fn rollback(&mut self, ctx: &Context) -> Result<(), SqlDriverError>;
}

/// A lazy, forward-only cursor over result rows. Must be closed by the caller.
#[async_trait]
pub trait Rows: Send {
    /// Column names in projection order. Empty if they cannot be determined.
    fn columns(&self) -> Vec<String>;

    /// Scan the next row into `dest`, one slot per column, in column order.
    ///
    /// Returns `Ok(false)` once the result is exhausted; `dest` is left
    /// untouched in that case.
    async fn next(&mut self, ctx: &Context, dest: &mut [RowValues]) -> Result<bool, SqlDriverError>;

    async fn close(&mut self) -> Result<(), SqlDriverError>;
}
