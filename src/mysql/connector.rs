use std::time::Duration;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder};
use tracing::{debug, warn};

use super::config::{MysqlOptions, resolve_dsn};
use super::connection::MysqlConnection;
use crate::context::Context;
use crate::driver::{Connector, Driver};
use crate::error::SqlDriverError;
use crate::types::DatabaseType;

/// Produces MySQL sessions from a connection string.
///
/// Holds nothing but the string (and an optional connect timeout), so one
/// connector can be reused for any number of independent connections.
///
/// ```rust,no_run
/// use sql_driver_adapter::prelude::*;
///
/// # async fn demo() -> Result<(), SqlDriverError> {
/// let connector = MysqlConnector::new("user:pass@tcp(localhost:3306)/app");
/// let ctx = Context::background();
/// let mut conn = connector.connect(&ctx).await?;
/// let stmt = conn.prepare(&ctx, "SELECT id, name FROM t WHERE id = ?").await?;
/// let rows = stmt.query(&ctx, &[RowValues::Int(5)]).await?;
/// let result = collect_rows(rows, &ctx).await?;
/// # let _ = result;
/// conn.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MysqlConnector {
    dsn: String,
    connect_timeout: Option<Duration>,
}

impl MysqlConnector {
    /// Accepts a `mysql://` URL or a classic `user:pass@tcp(host:port)/db` DSN.
    /// The string is not validated until [`connect`](Connector::connect).
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            connect_timeout: None,
        }
    }

    #[must_use]
    pub fn from_options(opts: &MysqlOptions) -> Self {
        Self {
            dsn: opts.to_dsn(),
            connect_timeout: opts.connect_timeout(),
        }
    }

    /// Bound every connect attempt, on top of whatever deadline the caller's context has.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// Vendor options for `url`, with the vendor statement cache turned off: each
/// prepared statement owns its own server statement, which no other `prep`
/// shares and no cache eviction closes.
fn session_opts(url: &str) -> Result<Opts, SqlDriverError> {
    let opts = Opts::from_url(url).map_err(|e| SqlDriverError::Open(e.into()))?;
    Ok(OptsBuilder::from_opts(opts).stmt_cache_size(0).into())
}

/// Best-effort disconnect of a session that will not be handed out.
async fn release(conn: Conn) {
    if let Err(e) = conn.disconnect().await {
        warn!(error = %e, "failed to release half-open mysql session");
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    type Conn = MysqlConnection;

    async fn connect(&self, ctx: &Context) -> Result<MysqlConnection, SqlDriverError> {
        let target = resolve_dsn(&self.dsn);
        let opts = session_opts(&target.url)?;
        let server_addr = format!("{}:{}", opts.ip_or_hostname(), opts.tcp_port());

        let ctx = match self.connect_timeout.or(target.connect_timeout) {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.clone(),
        };

        debug!(addr = %server_addr, "opening mysql session");
        let mut conn = match ctx.run(Conn::new(opts)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(SqlDriverError::Ping(e)),
            // Dropping the connect future closed any socket it had opened.
            Err(interrupted) => return Err(interrupted),
        };

        match ctx.run(conn.ping()).await {
            Ok(Ok(())) => {
                debug!(addr = %server_addr, id = conn.id(), "mysql session ready");
                Ok(MysqlConnection::new(conn, server_addr))
            }
            Ok(Err(e)) => {
                release(conn).await;
                Err(SqlDriverError::Ping(e))
            }
            Err(interrupted) => {
                release(conn).await;
                Err(interrupted)
            }
        }
    }

    fn driver(&self) -> Driver {
        Driver::new(DatabaseType::Mysql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_identity() {
        let connector = MysqlConnector::new("mysql://u@h/db");
        assert_eq!(connector.driver().name(), "mysql");
        assert_eq!(connector.driver().db_type(), DatabaseType::Mysql);
    }

    #[tokio::test]
    async fn malformed_dsn_is_open_error() {
        let connector = MysqlConnector::new("definitely not a dsn");
        let err = connector.connect(&Context::background()).await.unwrap_err();
        assert!(matches!(err, SqlDriverError::Open(_)), "{err:?}");
        assert!(err.to_string().starts_with("failed to open mysql"));
    }

    #[tokio::test]
    async fn cancelled_context_never_dials() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let connector = MysqlConnector::new("u:p@tcp(192.0.2.1:3306)/db");
        let err = connector.connect(&ctx).await.unwrap_err();
        assert!(matches!(err, SqlDriverError::Cancelled));
    }

    #[test]
    fn statement_cache_is_disabled() {
        let target = resolve_dsn("user:pass@tcp(db.internal:3306)/app");
        let opts = session_opts(&target.url).unwrap();
        assert_eq!(opts.stmt_cache_size(), 0);
        assert_eq!(opts.ip_or_hostname(), "db.internal");

        // An explicit cache size in the URL does not switch it back on.
        let opts = session_opts("mysql://u@h:3306/app?stmt_cache_size=64").unwrap();
        assert_eq!(opts.stmt_cache_size(), 0);
    }

    #[test]
    fn options_carry_timeout_into_connector() {
        let opts = MysqlOptions {
            connect_timeout: Some(4),
            ..MysqlOptions::new("h".into(), "u".into())
        };
        let connector = MysqlConnector::from_options(&opts);
        assert_eq!(connector.connect_timeout, Some(Duration::from_secs(4)));
        assert_eq!(connector.dsn, "mysql://u@h:3306/");
    }
}
