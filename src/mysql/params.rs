use chrono::{Datelike, Timelike};
use mysql_async::Value;

use crate::error::SqlDriverError;
use crate::types::{ParamConverter, RowValues};

/// Positional arguments in the vendor's parameter type.
#[derive(Debug)]
pub struct Params(pub mysql_async::Params);

pub(crate) fn convert_params<'a, C>(
    params: &'a [RowValues],
) -> Result<<C as ParamConverter<'a>>::Converted, SqlDriverError>
where
    C: ParamConverter<'a>,
{
    C::convert_sql_params(params)
}

/// Map one driver value onto the vendor value of the same shape.
///
/// MySQL has no wire-level boolean or JSON type: booleans travel as 0/1 and
/// JSON as its serialized text, which is what the server stores for both.
fn row_value_to_mysql_value(value: &RowValues) -> Result<Value, SqlDriverError> {
    Ok(match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::UInt(u) => Value::UInt(*u),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        RowValues::Bool(b) => Value::Int(i64::from(*b)),
        RowValues::Timestamp(dt) => {
            let year = u16::try_from(dt.year()).map_err(|_| {
                SqlDriverError::ParameterError(format!(
                    "timestamp year {} is outside the MySQL DATETIME range",
                    dt.year()
                ))
            })?;
            // chrono encodes a leap second as nanos >= 1e9; MySQL has no such value.
            let micros = (dt.nanosecond() / 1_000).min(999_999);
            Value::Date(
                year,
                u8::try_from(dt.month()).unwrap_or(u8::MAX),
                u8::try_from(dt.day()).unwrap_or(u8::MAX),
                u8::try_from(dt.hour()).unwrap_or(u8::MAX),
                u8::try_from(dt.minute()).unwrap_or(u8::MAX),
                u8::try_from(dt.second()).unwrap_or(u8::MAX),
                micros,
            )
        }
        RowValues::Null => Value::NULL,
        RowValues::JSON(j) => Value::Bytes(j.to_string().into_bytes()),
        RowValues::Blob(bytes) => Value::Bytes(bytes.clone()),
    })
}

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, SqlDriverError> {
        if params.is_empty() {
            return Ok(Params(mysql_async::Params::Empty));
        }
        let values = params
            .iter()
            .map(row_value_to_mysql_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Params(mysql_async::Params::Positional(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn positional(params: &[RowValues]) -> Vec<Value> {
        match convert_params::<Params>(params).unwrap().0 {
            mysql_async::Params::Positional(values) => values,
            other => panic!("expected positional params, got {other:?}"),
        }
    }

    #[test]
    fn keeps_order_and_shape() {
        let values = positional(&[
            RowValues::Int(5),
            RowValues::Text("alice".into()),
            RowValues::Null,
            RowValues::UInt(u64::MAX),
            RowValues::Float(1.5),
            RowValues::Blob(vec![0, 1, 2]),
        ]);
        assert_eq!(
            values,
            vec![
                Value::Int(5),
                Value::Bytes(b"alice".to_vec()),
                Value::NULL,
                Value::UInt(u64::MAX),
                Value::Double(1.5),
                Value::Bytes(vec![0, 1, 2]),
            ]
        );
    }

    #[test]
    fn no_args_is_empty() {
        let converted = convert_params::<Params>(&[]).unwrap();
        assert!(matches!(converted.0, mysql_async::Params::Empty));
    }

    #[test]
    fn bool_json_and_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(13, 4, 5, 678_901)
            .unwrap();
        let values = positional(&[
            RowValues::Bool(true),
            RowValues::JSON(json!({"a": 1})),
            RowValues::Timestamp(ts),
        ]);
        assert_eq!(values[0], Value::Int(1));
        assert_eq!(values[1], Value::Bytes(br#"{"a":1}"#.to_vec()));
        assert_eq!(values[2], Value::Date(2024, 2, 29, 13, 4, 5, 678_901));
    }

    #[test]
    fn rejects_negative_year() {
        let ts = NaiveDate::from_ymd_opt(-1, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = convert_params::<Params>(&[RowValues::Timestamp(ts)]).unwrap_err();
        assert!(matches!(err, SqlDriverError::ParameterError(_)));
    }
}
