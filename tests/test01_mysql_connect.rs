#![cfg(feature = "mysql")]

use std::time::Duration;

use sql_driver_adapter::prelude::*;

#[tokio::test]
async fn unreachable_server_is_ping_error() {
    let connector = MysqlConnector::new("user:pass@tcp(127.0.0.1:1)/db")
        .with_connect_timeout(Duration::from_secs(10));
    let err = connector
        .connect(&Context::background())
        .await
        .expect_err("nothing listens on port 1");

    assert!(matches!(err, SqlDriverError::Ping(_)), "{err:?}");
    assert!(err.to_string().starts_with("failed to ping mysql"));
    assert!(err.vendor().is_some());
}

#[tokio::test]
async fn malformed_connection_string_is_open_error() {
    let connector = MysqlConnector::new("mysql://user@host:notaport/db");
    let err = connector
        .connect(&Context::background())
        .await
        .expect_err("port is not a number");

    assert!(matches!(err, SqlDriverError::Open(_)), "{err:?}");
}

#[tokio::test]
async fn connect_honours_deadline() {
    // TEST-NET-1 is never routed, so the dial hangs until the deadline fires.
    let connector = MysqlConnector::new("user:pass@tcp(192.0.2.1:3306)/db");
    let ctx = Context::background().with_timeout(Duration::from_millis(200));
    let err = connector.connect(&ctx).await.expect_err("dial cannot finish");

    assert!(
        matches!(err, SqlDriverError::DeadlineExceeded | SqlDriverError::Ping(_)),
        "{err:?}"
    );
}

#[tokio::test]
async fn connector_advertises_driver() {
    let opts = MysqlOptionsBuilder::new("localhost".into(), "app".into())
        .database(Some("orders".into()))
        .finish();
    let connector = MysqlConnector::from_options(&opts);
    let driver = connector.driver();
    assert_eq!(driver.name(), "mysql");
    assert_eq!(driver.db_type(), DatabaseType::Mysql);
}
