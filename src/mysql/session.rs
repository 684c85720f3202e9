use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mysql_async::Conn;
use mysql_async::prelude::Queryable;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::SqlDriverError;

/// One physical session shared by a connection and every handle derived from it.
pub(crate) type SharedSession = Arc<Mutex<Session>>;

/// Shared between a session and its open transaction handle. Set when the
/// handle gives up on the server transaction (dropped while active, or its
/// COMMIT/ROLLBACK failed), so the next user of the session rolls it back.
pub(crate) type TxMarker = Arc<AtomicBool>;

/// Holder for the vendor session. Empty once the connection is closed or the
/// session had to be discarded.
pub(crate) struct Session {
    conn: Option<Conn>,
    tx: Option<TxMarker>,
}

impl Session {
    pub(crate) fn shared(conn: Conn) -> SharedSession {
        Arc::new(Mutex::new(Session {
            conn: Some(conn),
            tx: None,
        }))
    }

    pub(crate) fn conn_mut(&mut self) -> Result<&mut Conn, SqlDriverError> {
        self.conn.as_mut().ok_or(SqlDriverError::ConnectionClosed)
    }

    /// The vendor session, after rolling back any transaction its handle abandoned.
    pub(crate) async fn ready(&mut self, ctx: &Context) -> Result<&mut Conn, SqlDriverError> {
        if self.tx_abandoned() {
            let conn = self.conn_mut()?;
            let outcome = ctx.run(conn.query_drop("ROLLBACK")).await;
            self.settle(outcome)?;
            self.tx = None;
            warn!("rolled back mysql transaction abandoned by its handle");
        }
        self.conn_mut()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub(crate) fn tx_active(&self) -> bool {
        self.tx.is_some()
    }

    fn tx_abandoned(&self) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|marker| marker.load(Ordering::Acquire))
    }

    /// Record a transaction started on the server.
    ///
    /// # Errors
    /// `SqlDriverError::TxActive` while another transaction is still open.
    pub(crate) fn open_tx(&mut self) -> Result<TxMarker, SqlDriverError> {
        if self.tx.is_some() {
            return Err(SqlDriverError::TxActive);
        }
        let marker = TxMarker::default();
        self.tx = Some(Arc::clone(&marker));
        Ok(marker)
    }

    /// The open transaction ended on the server.
    pub(crate) fn close_tx(&mut self) {
        self.tx = None;
    }

    /// Resolve the outcome of a context-bounded vendor call.
    ///
    /// An interrupted call leaves the wire protocol mid-exchange, so the
    /// session is dropped rather than reused.
    pub(crate) fn settle<T>(
        &mut self,
        outcome: Result<Result<T, mysql_async::Error>, SqlDriverError>,
    ) -> Result<T, SqlDriverError> {
        match outcome {
            Ok(result) => result.map_err(SqlDriverError::from),
            Err(interrupted) => {
                self.tx = None;
                if self.conn.take().is_some() {
                    warn!(reason = %interrupted, "discarding mysql session after interrupted call");
                }
                Err(interrupted)
            }
        }
    }

    /// Disconnect and empty the holder. A no-op when already empty.
    ///
    /// The server rolls back whatever transaction was still open.
    pub(crate) async fn disconnect(&mut self) -> Result<(), SqlDriverError> {
        self.tx = None;
        if let Some(conn) = self.conn.take() {
            debug!(id = conn.id(), "closing mysql session");
            conn.disconnect().await?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn detached() -> SharedSession {
        Arc::new(Mutex::new(Session { conn: None, tx: None }))
    }
}

/// Borrow the session for one call.
///
/// Never waits: a session already held by another handle (an open cursor,
/// a concurrent caller) is reported as `Busy`.
pub(crate) fn acquire(session: &SharedSession) -> Result<MutexGuard<'_, Session>, SqlDriverError> {
    session.try_lock().map_err(|_| SqlDriverError::Busy)
}

/// Like [`acquire`], but the guard can be stored in a cursor.
pub(crate) fn acquire_owned(session: &SharedSession) -> Result<OwnedMutexGuard<Session>, SqlDriverError> {
    Arc::clone(session)
        .try_lock_owned()
        .map_err(|_| SqlDriverError::Busy)
}
