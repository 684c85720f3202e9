use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlDriverError {
    /// The connection string could not be turned into vendor connect options.
    #[cfg(feature = "mysql")]
    #[error("failed to open mysql: {0}")]
    Open(#[source] mysql_async::Error),

    /// The session could not be established or failed its liveness check.
    #[cfg(feature = "mysql")]
    #[error("failed to ping mysql: {0}")]
    Ping(#[source] mysql_async::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    Mysql(#[from] mysql_async::Error),

    #[error("transaction has already been committed or rolled back")]
    TxDone,

    #[error("a transaction is already active on this connection")]
    TxActive,

    #[error("connection is closed")]
    ConnectionClosed,

    #[error("statement is closed")]
    StatementClosed,

    #[error("rows are closed")]
    RowsClosed,

    #[error("connection is busy: another handle holds the session")]
    Busy,

    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("expected {expected} destination arguments in scan, not {got}")]
    ScanError { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),
}

impl SqlDriverError {
    /// True for errors raised because the caller's context ended.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// The vendor client's native error, when this error carries one.
    #[cfg(feature = "mysql")]
    #[must_use]
    pub fn vendor(&self) -> Option<&mysql_async::Error> {
        match self {
            Self::Open(e) | Self::Ping(e) | Self::Mysql(e) => Some(e),
            _ => None,
        }
    }
}
