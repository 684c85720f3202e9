use std::sync::atomic::Ordering;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use tracing::{debug, warn};

use super::session::{SharedSession, TxMarker, acquire};
use crate::context::Context;
use crate::driver::Transaction;
use crate::error::SqlDriverError;

/// Lifecycle of a transaction handle: {Active} --commit/rollback--> {Done}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxState {
    Active,
    Done,
}

impl TxState {
    pub(crate) fn ensure_active(self) -> Result<(), SqlDriverError> {
        match self {
            TxState::Active => Ok(()),
            TxState::Done => Err(SqlDriverError::TxDone),
        }
    }

    /// Move to `Done`. Fails if the transaction already ended.
    pub(crate) fn finish(&mut self) -> Result<(), SqlDriverError> {
        self.ensure_active()?;
        *self = TxState::Done;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum TxEnd {
    Commit,
    Rollback,
}

impl TxEnd {
    fn sql(self) -> &'static str {
        match self {
            TxEnd::Commit => "COMMIT",
            TxEnd::Rollback => "ROLLBACK",
        }
    }
}

/// Transaction on a MySQL session.
///
/// Statements prepared on the parent connection run inside the transaction
/// until it ends. The first `commit` or `rollback` is terminal: any later call
/// returns `SqlDriverError::TxDone`, whether or not the first one succeeded.
/// Only one transaction may be open per connection; `begin` fails with
/// `SqlDriverError::TxActive` until it ends. A handle dropped while active, or
/// whose commit/rollback failed, leaves its server transaction to be rolled
/// back by the next call on the connection.
pub struct MysqlTx {
    session: SharedSession,
    state: TxState,
    marker: TxMarker,
}

impl std::fmt::Debug for MysqlTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlTx")
            .field("session", &"<mysql_async::Conn>")
            .field("state", &self.state)
            .finish()
    }
}

/// Begin a transaction on `session` with the server's default isolation level.
pub(crate) async fn begin_transaction(
    session: &SharedSession,
    ctx: &Context,
) -> Result<MysqlTx, SqlDriverError> {
    let mut guard = acquire(session)?;
    guard.ready(ctx).await?;
    // START TRANSACTION would silently commit the open one.
    if guard.tx_active() {
        return Err(SqlDriverError::TxActive);
    }
    let conn = guard.conn_mut()?;
    let outcome = ctx.run(conn.query_drop("START TRANSACTION")).await;
    guard.settle(outcome)?;
    let marker = guard.open_tx()?;
    debug!("mysql transaction started");

    Ok(MysqlTx {
        session: SharedSession::clone(session),
        state: TxState::Active,
        marker,
    })
}

impl MysqlTx {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TxState::Active
    }

    async fn end(&mut self, ctx: &Context, how: TxEnd) -> Result<(), SqlDriverError> {
        self.state.ensure_active()?;
        // Busy is the caller's sequencing problem and leaves the transaction usable.
        let mut guard = acquire(&self.session)?;
        self.state.finish()?;

        let conn = match guard.conn_mut() {
            Ok(conn) => conn,
            Err(e) => {
                self.marker.store(true, Ordering::Release);
                return Err(e);
            }
        };
        let outcome = ctx.run(conn.query_drop(how.sql())).await;
        match guard.settle(outcome) {
            Ok(()) => {
                guard.close_tx();
                debug!(action = how.sql(), "mysql transaction finished");
                Ok(())
            }
            Err(e) => {
                self.marker.store(true, Ordering::Release);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Transaction for MysqlTx {
    async fn commit(&mut self, ctx: &Context) -> Result<(), SqlDriverError> {
        self.end(ctx, TxEnd::Commit).await
    }

    async fn rollback(&mut self, ctx: &Context) -> Result<(), SqlDriverError> {
        self.end(ctx, TxEnd::Rollback).await
    }
}

impl Drop for MysqlTx {
    fn drop(&mut self) {
        if self.state == TxState::Active {
            self.marker.store(true, Ordering::Release);
            warn!("mysql transaction dropped without commit or rollback; it will be rolled back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mysql::session::Session;

    fn detached_tx() -> (SharedSession, MysqlTx) {
        let session = Session::detached();
        let marker = acquire(&session).unwrap().open_tx().unwrap();
        let tx = MysqlTx {
            session: SharedSession::clone(&session),
            state: TxState::Active,
            marker,
        };
        (session, tx)
    }

    #[tokio::test]
    async fn busy_session_leaves_transaction_open() {
        let (session, mut tx) = detached_tx();
        let ctx = Context::background();

        let held = acquire(&session).unwrap();
        assert!(matches!(tx.commit(&ctx).await, Err(SqlDriverError::Busy)));
        assert!(matches!(tx.rollback(&ctx).await, Err(SqlDriverError::Busy)));
        assert!(tx.is_active());
        drop(held);

        // The session has no vendor connection: the attempt fails but still ends the handle.
        assert!(matches!(tx.commit(&ctx).await, Err(SqlDriverError::ConnectionClosed)));
        assert!(!tx.is_active());
        assert!(matches!(tx.rollback(&ctx).await, Err(SqlDriverError::TxDone)));
        assert!(tx.marker.load(Ordering::Acquire));
    }

    #[test]
    fn dropping_active_handle_abandons_it() {
        let (session, tx) = detached_tx();
        let marker = TxMarker::clone(&tx.marker);
        drop(tx);
        assert!(marker.load(Ordering::Acquire));
        // Still recorded on the session until the next call rolls it back.
        assert!(acquire(&session).unwrap().tx_active());
    }

    #[test]
    fn first_finish_wins() {
        let mut state = TxState::Active;
        assert!(state.ensure_active().is_ok());
        assert!(state.finish().is_ok());
        assert_eq!(state, TxState::Done);
    }

    #[test]
    fn finishing_twice_is_terminal_error() {
        let mut state = TxState::Active;
        state.finish().unwrap();
        assert!(matches!(state.finish(), Err(SqlDriverError::TxDone)));
        assert!(matches!(state.ensure_active(), Err(SqlDriverError::TxDone)));
        assert_eq!(state, TxState::Done);
    }

    #[test]
    fn end_statements() {
        assert_eq!(TxEnd::Commit.sql(), "COMMIT");
        assert_eq!(TxEnd::Rollback.sql(), "ROLLBACK");
    }
}
