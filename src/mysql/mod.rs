// MySQL adapter - satisfies the driver contract on top of mysql_async
//
// - config: connection-string handling and structured options
// - connector / connection: session setup and ownership
// - prepared / rows: statement execution and streaming cursors
// - transaction: begin/commit/rollback with a terminal-state guard
// - params / query: value marshalling in both directions

pub mod config;
pub mod connection;
pub mod connector;
pub mod params;
pub mod prepared;
pub mod rows;
pub mod transaction;

mod query;
mod session;

pub use config::{MysqlOptions, MysqlOptionsBuilder};
pub use connection::MysqlConnection;
pub use connector::MysqlConnector;
pub use params::Params;
pub use prepared::MysqlStatement;
pub use rows::MysqlRows;
pub use transaction::MysqlTx;
