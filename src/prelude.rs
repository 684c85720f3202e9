//! Convenient imports for common functionality.
//!
//! Brings the driver-contract traits into scope along with the value, error
//! and context types every call needs.

pub use crate::context::Context;
pub use crate::driver::{Connection, Connector, Driver, ExecResult, Rows, Statement, Transaction};
pub use crate::error::SqlDriverError;
pub use crate::results::{CustomDbRow, ResultSet, collect_rows};
pub use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "mysql")]
pub use crate::mysql::{
    MysqlConnection, MysqlConnector, MysqlOptions, MysqlOptionsBuilder, MysqlRows,
    MysqlStatement, MysqlTx,
};
