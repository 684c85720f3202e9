use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::{BinaryProtocol, Column, Conn, QueryResult, Row, Value};
use tokio::sync::OwnedMutexGuard;

use super::query::{column_names, mysql_extract_value};
use super::session::Session;
use crate::context::Context;
use crate::driver::Rows;
use crate::error::SqlDriverError;
use crate::types::RowValues;

/// Streaming cursor over a prepared statement's result.
///
/// The cursor holds the session until it is closed or dropped: rows are read
/// off the wire one `next` call at a time, so no other call can use the
/// connection meanwhile (they get `SqlDriverError::Busy`). Dropping an
/// unclosed cursor releases the session; the vendor client discards the
/// unread remainder before its next command.
pub struct MysqlRows {
    session: Option<OwnedMutexGuard<Session>>,
    columns: Arc<[Column]>,
    names: Vec<String>,
    exhausted: bool,
}

impl std::fmt::Debug for MysqlRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlRows")
            .field("columns", &self.names)
            .field("open", &self.session.is_some())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// Read the next row of the result pending on `conn`.
async fn fetch_row(conn: &mut Conn) -> mysql_async::Result<Option<Row>> {
    let mut pending: QueryResult<'_, 'static, BinaryProtocol> = QueryResult::new(conn);
    pending.next().await
}

/// Read and discard whatever is left of the result pending on `conn`.
async fn discard_rest(conn: &mut Conn) -> mysql_async::Result<()> {
    let pending: QueryResult<'_, 'static, BinaryProtocol> = QueryResult::new(conn);
    pending.drop_result().await
}

impl MysqlRows {
    pub(crate) fn new(session: OwnedMutexGuard<Session>, columns: Option<Arc<[Column]>>) -> Self {
        let columns: Arc<[Column]> = columns.unwrap_or_else(|| Arc::from(Vec::new()));
        // A statement without a result set has nothing to stream.
        let exhausted = columns.is_empty();
        Self {
            names: column_names(&columns),
            session: Some(session),
            columns,
            exhausted,
        }
    }

    fn scan_into(&self, mut row: Row, dest: &mut [RowValues]) {
        for (idx, (slot, column)) in dest.iter_mut().zip(self.columns.iter()).enumerate() {
            let value = row.take::<Value, usize>(idx).unwrap_or(Value::NULL);
            *slot = mysql_extract_value(value, column);
        }
    }
}

#[async_trait]
impl Rows for MysqlRows {
    fn columns(&self) -> Vec<String> {
        self.names.clone()
    }

    async fn next(&mut self, ctx: &Context, dest: &mut [RowValues]) -> Result<bool, SqlDriverError> {
        if self.session.is_none() {
            return Err(SqlDriverError::RowsClosed);
        }
        if self.exhausted {
            return Ok(false);
        }
        if dest.len() != self.columns.len() {
            return Err(SqlDriverError::ScanError {
                expected: self.columns.len(),
                got: dest.len(),
            });
        }

        let Some(session) = self.session.as_mut() else {
            return Err(SqlDriverError::RowsClosed);
        };
        let conn = session.conn_mut()?;
        let outcome = ctx.run(fetch_row(conn)).await;
        match session.settle(outcome) {
            Ok(Some(row)) => {
                self.scan_into(row, dest);
                Ok(true)
            }
            Ok(None) => {
                self.exhausted = true;
                Ok(false)
            }
            Err(e) => {
                self.exhausted = true;
                Err(e)
            }
        }
    }

    async fn close(&mut self) -> Result<(), SqlDriverError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        if self.exhausted || !session.is_open() {
            return Ok(());
        }
        self.exhausted = true;
        let conn = session.conn_mut()?;
        discard_rest(conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mysql::session::{Session, acquire_owned};
    use mysql_async::consts::ColumnType;

    fn detached_rows() -> MysqlRows {
        let session = Session::detached();
        let guard = acquire_owned(&session).unwrap();
        let columns: Arc<[Column]> = Arc::from(vec![
            Column::new(ColumnType::MYSQL_TYPE_LONG).with_name(b"id"),
            Column::new(ColumnType::MYSQL_TYPE_VAR_STRING).with_name(b"name"),
        ]);
        MysqlRows::new(guard, Some(columns))
    }

    #[tokio::test]
    async fn columns_outlive_close() {
        let mut rows = detached_rows();
        let ctx = Context::background();
        let mut slots = vec![RowValues::Null; 3];
        assert!(matches!(
            rows.next(&ctx, &mut slots).await,
            Err(SqlDriverError::ScanError { expected: 2, got: 3 })
        ));

        rows.close().await.unwrap();
        rows.close().await.unwrap();
        assert!(matches!(
            rows.next(&ctx, &mut slots[..2]).await,
            Err(SqlDriverError::RowsClosed)
        ));
        assert_eq!(rows.columns(), vec!["id".to_string(), "name".to_string()]);
    }

    #[tokio::test]
    async fn statement_without_result_set_is_already_exhausted() {
        let session = Session::detached();
        let mut rows = MysqlRows::new(acquire_owned(&session).unwrap(), None);
        let mut no_slots: [RowValues; 0] = [];
        assert!(rows.columns().is_empty());
        assert!(!rows.next(&Context::background(), &mut no_slots).await.unwrap());
    }
}
