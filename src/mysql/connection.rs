use async_trait::async_trait;
use mysql_async::Conn;
use mysql_async::prelude::Queryable;
use tracing::debug;

use super::prepared::{MysqlStatement, prepare_statement};
use super::session::{Session, SharedSession, acquire};
use super::transaction::{MysqlTx, begin_transaction};
use crate::context::Context;
use crate::driver::Connection;
use crate::error::SqlDriverError;

/// One live MySQL session, as handed out by [`MysqlConnector`](super::MysqlConnector).
pub struct MysqlConnection {
    session: SharedSession,
    server_addr: String,
}

impl std::fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("session", &"<mysql_async::Conn>")
            .field("server_addr", &self.server_addr)
            .finish()
    }
}

impl MysqlConnection {
    pub(crate) fn new(conn: Conn, server_addr: String) -> Self {
        Self {
            session: Session::shared(conn),
            server_addr,
        }
    }

    /// `host:port` this session was opened against.
    #[must_use]
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Round-trip a liveness check on the session.
    ///
    /// # Errors
    /// Returns the vendor error if the server does not answer, or
    /// `SqlDriverError::ConnectionClosed` after `close`.
    pub async fn ping(&self, ctx: &Context) -> Result<(), SqlDriverError> {
        let mut guard = acquire(&self.session)?;
        let conn = guard.ready(ctx).await?;
        let outcome = ctx.run(conn.ping()).await;
        guard.settle(outcome)?;
        debug!(addr = %self.server_addr, "mysql ping ok");
        Ok(())
    }
}

#[async_trait]
impl Connection for MysqlConnection {
    type Stmt = MysqlStatement;
    type Tx = MysqlTx;

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<MysqlStatement, SqlDriverError> {
        prepare_statement(&self.session, ctx, query).await
    }

    async fn begin(&self, ctx: &Context) -> Result<MysqlTx, SqlDriverError> {
        begin_transaction(&self.session, ctx).await
    }

    async fn close(&mut self) -> Result<(), SqlDriverError> {
        let mut guard = acquire(&self.session)?;
        guard.disconnect().await
    }
}
