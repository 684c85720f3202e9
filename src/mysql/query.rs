use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::{Column, Value};

use crate::types::RowValues;

/// Collation id the server reports for binary (non-text) string columns.
const BINARY_CHARSET: u16 = 63;

pub(crate) fn column_names(columns: &[Column]) -> Vec<String> {
    columns
        .iter()
        .map(|col| col.name_str().into_owned())
        .collect()
}

/// Extract a `RowValues` from a vendor value, using the column metadata to
/// tell text, binary and JSON payloads apart.
pub(crate) fn mysql_extract_value(value: Value, column: &Column) -> RowValues {
    extract_value(
        value,
        column.column_type(),
        column.character_set() == BINARY_CHARSET,
    )
}

pub(crate) fn extract_value(value: Value, column_type: ColumnType, binary: bool) -> RowValues {
    match value {
        Value::NULL => RowValues::Null,
        Value::Int(i) => RowValues::Int(i),
        Value::UInt(u) => RowValues::UInt(u),
        Value::Float(f) => RowValues::Float(f64::from(f)),
        Value::Double(d) => RowValues::Float(d),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map_or_else(
                    // zero dates ('0000-00-00') have no calendar equivalent
                    || {
                        RowValues::Text(format!(
                            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                        ))
                    },
                    RowValues::Timestamp,
                )
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            RowValues::Text(text)
        }
        Value::Bytes(bytes) => match column_type {
            ColumnType::MYSQL_TYPE_JSON => match serde_json::from_slice(&bytes) {
                Ok(json) => RowValues::JSON(json),
                Err(_) => text_or_blob(bytes),
            },
            _ if binary => RowValues::Blob(bytes),
            _ => text_or_blob(bytes),
        },
    }
}

fn text_or_blob(bytes: Vec<u8>) -> RowValues {
    match String::from_utf8(bytes) {
        Ok(text) => RowValues::Text(text),
        Err(e) => RowValues::Blob(e.into_bytes()),
    }
}
