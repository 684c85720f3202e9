use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use tracing::debug;

use super::params::{Params as MysqlParams, convert_params};
use super::rows::MysqlRows;
use super::session::{SharedSession, acquire, acquire_owned};
use crate::context::Context;
use crate::driver::{ExecResult, Statement};
use crate::error::SqlDriverError;
use crate::types::RowValues;

/// Server-side prepared statement bound to the session that compiled it.
///
/// Each `exec`/`query` is independent and may be repeated. The handle is
/// invalid once its connection closes.
pub struct MysqlStatement {
    session: SharedSession,
    stmt: Option<mysql_async::Statement>,
    sql: Arc<String>,
}

impl std::fmt::Debug for MysqlStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlStatement")
            .field("session", &"<mysql_async::Conn>")
            .field("sql", &self.sql)
            .field("open", &self.stmt.is_some())
            .finish()
    }
}

/// Compile `sql` on `session`.
pub(crate) async fn prepare_statement(
    session: &SharedSession,
    ctx: &Context,
    sql: &str,
) -> Result<MysqlStatement, SqlDriverError> {
    let mut guard = acquire(session)?;
    let conn = guard.ready(ctx).await?;
    let outcome = ctx.run(conn.prep(sql)).await;
    let stmt = guard.settle(outcome)?;
    debug!(id = stmt.id(), params = stmt.num_params(), "mysql statement prepared");

    Ok(MysqlStatement {
        session: SharedSession::clone(session),
        stmt: Some(stmt),
        sql: Arc::new(sql.to_owned()),
    })
}

impl MysqlStatement {
    /// Access the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.sql.as_str()
    }

    fn handle(&self) -> Result<&mysql_async::Statement, SqlDriverError> {
        self.stmt.as_ref().ok_or(SqlDriverError::StatementClosed)
    }
}

#[async_trait]
impl Statement for MysqlStatement {
    type Rows = MysqlRows;

    /// Always `None`: the vendor validates the argument count on each call.
    fn num_input(&self) -> Option<usize> {
        None
    }

    async fn exec(&self, ctx: &Context, args: &[RowValues]) -> Result<ExecResult, SqlDriverError> {
        let stmt = self.handle()?;
        let params = convert_params::<MysqlParams>(args)?.0;

        let mut guard = acquire(&self.session)?;
        let conn = guard.ready(ctx).await?;
        let outcome = ctx
            .run(async {
                conn.exec_drop(stmt, params).await?;
                Ok::<_, mysql_async::Error>(ExecResult {
                    rows_affected: conn.affected_rows(),
                    last_insert_id: conn.last_insert_id(),
                })
            })
            .await;
        guard.settle(outcome)
    }

    async fn query(&self, ctx: &Context, args: &[RowValues]) -> Result<MysqlRows, SqlDriverError> {
        let stmt = self.handle()?;
        let params = convert_params::<MysqlParams>(args)?.0;

        let mut guard = acquire_owned(&self.session)?;
        let conn = guard.ready(ctx).await?;
        let outcome = ctx
            .run(async {
                let result = conn.exec_iter(stmt, params).await?;
                Ok::<_, mysql_async::Error>(result.columns())
            })
            .await;
        let columns = guard.settle(outcome)?;
        Ok(MysqlRows::new(guard, columns))
    }

    async fn close(&mut self) -> Result<(), SqlDriverError> {
        let Some(stmt) = self.stmt.take() else {
            return Ok(());
        };
        let mut guard = match acquire(&self.session) {
            Ok(guard) => guard,
            Err(e) => {
                self.stmt = Some(stmt);
                return Err(e);
            }
        };
        // A closed session already freed its statements server-side.
        if !guard.is_open() {
            return Ok(());
        }
        let conn = guard.conn_mut()?;
        conn.close(stmt).await?;
        Ok(())
    }
}
