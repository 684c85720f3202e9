//! Driver adapter layer: bridges a vendor SQL client into a vendor-neutral
//! driver contract (connector, connection, prepared statement, transaction,
//! result cursor) so a higher-level SQL layer can run queries without knowing
//! which vendor sits underneath.
//!
//! Every network-reaching call takes a [`Context`] for cancellation and
//! deadlines. Vendor errors surface untranslated through [`SqlDriverError`].

pub mod context;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod results;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use context::Context;
pub use driver::{Connection, Connector, Driver, ExecResult, Rows, Statement, Transaction};
pub use error::SqlDriverError;
pub use results::{CustomDbRow, ResultSet, collect_rows};
pub use types::{DatabaseType, ParamConverter, RowValues};

#[cfg(feature = "mysql")]
pub use mysql::{
    MysqlConnection, MysqlConnector, MysqlOptions, MysqlOptionsBuilder, MysqlRows,
    MysqlStatement, MysqlTx,
};
