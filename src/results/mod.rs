//! Consumer-side helpers for draining a cursor into owned rows.

mod result_set;
mod row;

use std::sync::Arc;

pub use result_set::ResultSet;
pub use row::CustomDbRow;

use crate::context::Context;
use crate::driver::Rows;
use crate::error::SqlDriverError;
use crate::types::RowValues;

/// Drain `rows` into a [`ResultSet`] and close the cursor.
///
/// One slot buffer is reused for the whole scan; each row's values are moved
/// out of it into the result. The cursor is closed on both the success and
/// the error path.
///
/// # Errors
/// Returns the first scan error, or the close error if scanning succeeded.
pub async fn collect_rows<R>(mut rows: R, ctx: &Context) -> Result<ResultSet, SqlDriverError>
where
    R: Rows,
{
    let columns = Arc::new(rows.columns());
    let mut result_set = ResultSet::default();
    result_set.set_column_names(columns.clone());

    let mut slots = vec![RowValues::Null; columns.len()];
    let scanned = loop {
        match rows.next(ctx, &mut slots).await {
            Ok(true) => {
                let values = slots.iter_mut().map(std::mem::take).collect();
                result_set.add_row_values(values);
            }
            Ok(false) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let closed = rows.close().await;
    scanned?;
    closed?;
    Ok(result_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedRows {
        columns: Vec<String>,
        data: std::vec::IntoIter<Vec<RowValues>>,
    }

    #[async_trait]
    impl Rows for FixedRows {
        fn columns(&self) -> Vec<String> {
            self.columns.clone()
        }

        async fn next(
            &mut self,
            _ctx: &Context,
            dest: &mut [RowValues],
        ) -> Result<bool, SqlDriverError> {
            match self.data.next() {
                Some(row) => {
                    for (slot, value) in dest.iter_mut().zip(row) {
                        *slot = value;
                    }
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn close(&mut self) -> Result<(), SqlDriverError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn collects_rows_by_name() {
        let rows = FixedRows {
            columns: vec!["id".into(), "name".into()],
            data: vec![
                vec![RowValues::Int(5), RowValues::Text("alice".into())],
                vec![RowValues::Int(6), RowValues::Null],
            ]
            .into_iter(),
        };

        let rs = collect_rows(rows, &Context::background()).await.unwrap();
        assert_eq!(rs.results.len(), 2);
        assert_eq!(rs.results[0].get("id"), Some(&RowValues::Int(5)));
        assert_eq!(
            rs.results[0].get("name").and_then(RowValues::as_text),
            Some("alice")
        );
        assert!(rs.results[1].get("name").unwrap().is_null());
        assert!(rs.results[1].get("missing").is_none());
    }

    #[tokio::test]
    async fn empty_result_keeps_columns() {
        let rows = FixedRows {
            columns: vec!["id".into(), "name".into()],
            data: Vec::new().into_iter(),
        };

        let rs = collect_rows(rows, &Context::background()).await.unwrap();
        assert!(rs.results.is_empty());
        assert_eq!(
            rs.get_column_names().map(|c| c.as_slice()),
            Some(&["id".to_string(), "name".to_string()][..])
        );
    }

    #[test]
    fn duplicate_column_names_resolve_to_first() {
        let names = Arc::new(vec!["a".to_string(), "a".to_string()]);
        let row = CustomDbRow::new(names, vec![RowValues::Int(1), RowValues::Int(2)]);
        assert_eq!(row.get("a"), Some(&RowValues::Int(1)));
        assert_eq!(row.get_by_index(1), Some(&RowValues::Int(2)));
    }
}
