//! Generic row reader.
//!
//! Dumps every row of a table without a compile-time schema. Each cell is
//! decoded from the type the driver reports for that value, so one column
//! can produce different [`Value`] variants from row to row. Types without a
//! mapping fail the whole read.

use common::errors::{AppError, AppResult};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgRow, PgTypeKind};
use sqlx::sqlite::SqliteRow;
use sqlx::types::{BigDecimal, JsonValue, Uuid};
use sqlx::{Column as _, ColumnIndex, Row as _, TypeInfo, ValueRef};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::catalog;
use crate::connector::DbConnection;
use crate::models::{Row, Temporal, Value};

/// Per-engine cell decoder. `Ok(None)` means the type has no mapping.
type CellDecoder<R> = fn(&R, usize, &str) -> Result<Option<Value>, sqlx::Error>;

/// Reads all rows of `table`, columns in result-set order.
///
/// The table is confirmed through the catalog before its quoted name is
/// placed in the query.
pub async fn list_rows(conn: &mut DbConnection, table: &str) -> AppResult<Vec<Row>> {
    let resolved = catalog::resolve_table(conn, table).await?;
    let sql = format!("SELECT * FROM {}", resolved.quoted(conn.kind()));

    match conn {
        DbConnection::Postgres(c) => {
            let rows = sqlx::query(&sql)
                .fetch_all(&mut *c)
                .await
                .map_err(query_error)?;
            rows.iter().map(|r| decode_row(r, decode_pg_cell)).collect()
        }
        DbConnection::MySql(c) => {
            let rows = sqlx::query(&sql)
                .fetch_all(&mut *c)
                .await
                .map_err(query_error)?;
            rows.iter().map(|r| decode_row(r, decode_mysql_cell)).collect()
        }
        DbConnection::Sqlite(c) => {
            let rows = sqlx::query(&sql)
                .fetch_all(&mut *c)
                .await
                .map_err(query_error)?;
            rows.iter().map(|r| decode_row(r, decode_sqlite_cell)).collect()
        }
    }
}

fn decode_row<R>(row: &R, decode: CellDecoder<R>) -> AppResult<Row>
where
    R: sqlx::Row,
    usize: ColumnIndex<R>,
{
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let name = column.name();
            let raw = row.try_get_raw(index).map_err(query_error)?;
            if raw.is_null() {
                return Ok((name.to_string(), Value::Null));
            }
            let type_name = raw.type_info().name().to_string();

            match decode(row, index, &type_name) {
                Ok(Some(value)) => Ok((name.to_string(), value)),
                Ok(None) => Err(AppError::QueryExecution(format!(
                    "column `{}` has unsupported type {}",
                    name, type_name
                ))),
                Err(e) => Err(AppError::QueryExecution(format!(
                    "failed to decode column `{}` ({}): {}",
                    name, type_name, e
                ))),
            }
        })
        .collect()
}

fn decode_pg_cell(row: &PgRow, i: usize, type_name: &str) -> Result<Option<Value>, sqlx::Error> {
    // User-defined enums are reported under their own type name.
    if let PgTypeKind::Enum(_) = row.try_get_raw(i)?.type_info().kind() {
        return Ok(Some(Value::Text(row.try_get_unchecked(i)?)));
    }

    let value = match type_name {
        "BOOL" => Value::Bool(row.try_get(i)?),
        "INT2" => Value::Int(row.try_get::<i16, _>(i)?.into()),
        "INT4" => Value::Int(row.try_get::<i32, _>(i)?.into()),
        "INT8" => Value::Int(row.try_get(i)?),
        "OID" => Value::Int(row.try_get::<Oid, _>(i)?.0.into()),
        "FLOAT4" => Value::Float(row.try_get::<f32, _>(i)?.into()),
        "FLOAT8" => Value::Float(row.try_get(i)?),
        "NUMERIC" => Value::Text(row.try_get::<BigDecimal, _>(i)?.to_string()),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::Text(row.try_get(i)?),
        "UUID" => Value::Text(row.try_get::<Uuid, _>(i)?.to_string()),
        "JSON" | "JSONB" => Value::Text(row.try_get::<JsonValue, _>(i)?.to_string()),
        "BYTEA" => Value::Bytes(row.try_get(i)?),
        "TIMESTAMPTZ" => Value::Temporal(Temporal::TimestampTz(row.try_get(i)?)),
        "TIMESTAMP" => Value::Temporal(Temporal::Timestamp(row.try_get(i)?)),
        "DATE" => Value::Temporal(Temporal::Date(row.try_get(i)?)),
        "TIME" => Value::Temporal(Temporal::Time(row.try_get(i)?)),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn decode_mysql_cell(
    row: &MySqlRow,
    i: usize,
    type_name: &str,
) -> Result<Option<Value>, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get(i)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Value::Int(row.try_get(i)?),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => Value::UInt(row.try_get(i)?),
        "YEAR" => Value::Int(row.try_get_unchecked::<u16, _>(i)?.into()),
        "BIT" => Value::UInt(row.try_get_unchecked(i)?),
        "FLOAT" => Value::Float(row.try_get::<f32, _>(i)?.into()),
        "DOUBLE" => Value::Float(row.try_get(i)?),
        "DECIMAL" => Value::Text(row.try_get::<BigDecimal, _>(i)?.to_string()),
        // Textual types arrive as UTF-8 whatever their collation.
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET"
        | "JSON" => Value::Text(row.try_get_unchecked(i)?),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            Value::Bytes(row.try_get_unchecked(i)?)
        }
        "TIMESTAMP" => {
            Value::Temporal(Temporal::TimestampTz(row.try_get::<DateTime<Utc>, _>(i)?))
        }
        "DATETIME" => Value::Temporal(Temporal::Timestamp(row.try_get::<NaiveDateTime, _>(i)?)),
        "DATE" => Value::Temporal(Temporal::Date(row.try_get::<NaiveDate, _>(i)?)),
        "TIME" => Value::Temporal(Temporal::Time(row.try_get::<NaiveTime, _>(i)?)),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// SQLite reports the storage class of each value, not the declared type.
fn decode_sqlite_cell(
    row: &SqliteRow,
    i: usize,
    type_name: &str,
) -> Result<Option<Value>, sqlx::Error> {
    let value = match type_name {
        "INTEGER" => Value::Int(row.try_get(i)?),
        "REAL" => Value::Float(row.try_get(i)?),
        "TEXT" => Value::Text(row.try_get(i)?),
        "BLOB" => Value::Bytes(row.try_get(i)?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn query_error(e: sqlx::Error) -> AppError {
    AppError::QueryExecution(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector;
    use crate::test_support::SqliteFixture;
    use std::time::Duration;

    async fn rows_of(fixture: &SqliteFixture, table: &str) -> AppResult<Vec<Row>> {
        let mut conn = connector::open(fixture.connection_string(), Duration::from_secs(5))
            .await
            .unwrap();
        let result = list_rows(&mut conn, table).await;
        conn.close().await;
        result
    }

    #[tokio::test]
    async fn test_rows_decode_storage_classes() {
        let fixture = SqliteFixture::new(&[
            "CREATE TABLE users (id INTEGER, name TEXT, score REAL, avatar BLOB, nickname TEXT)",
            "INSERT INTO users VALUES (1, 'alice', 9.5, X'DEADBEEF', NULL)",
            "INSERT INTO users VALUES (2, 'bob', NULL, NULL, 'b')",
        ])
        .await;

        let rows = rows_of(&fixture, "users").await.unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(
            first.column_names().collect::<Vec<_>>(),
            vec!["id", "name", "score", "avatar", "nickname"]
        );
        assert_eq!(first.get("id"), Some(&Value::Int(1)));
        assert_eq!(first.get("name"), Some(&Value::Text("alice".into())));
        assert_eq!(first.get("score"), Some(&Value::Float(9.5)));
        assert_eq!(first.get("avatar"), Some(&Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF])));
        assert_eq!(first.get("nickname"), Some(&Value::Null));

        let second = &rows[1];
        assert_eq!(second.len(), 5);
        assert_eq!(second.get("score"), Some(&Value::Null));
        assert_eq!(second.get("nickname"), Some(&Value::Text("b".into())));
    }

    #[tokio::test]
    async fn test_heterogeneous_values_in_one_column() {
        let fixture = SqliteFixture::new(&[
            "CREATE TABLE mixed (v)",
            "INSERT INTO mixed VALUES (1), ('a'), (2.5), (NULL)",
        ])
        .await;

        let values: Vec<Value> = rows_of(&fixture, "mixed")
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.into_cells().remove(0).1)
            .collect();
        assert_eq!(
            values,
            vec![
                Value::Int(1),
                Value::Text("a".into()),
                Value::Float(2.5),
                Value::Null
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_table_yields_no_rows() {
        let fixture = SqliteFixture::new(&["CREATE TABLE orders (id INTEGER, note TEXT)"]).await;
        assert!(rows_of(&fixture, "orders").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let fixture = SqliteFixture::new(&["CREATE TABLE orders (id INTEGER)"]).await;
        assert!(matches!(
            rows_of(&fixture, "missing").await,
            Err(AppError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injection_attempt_is_not_found() {
        let fixture = SqliteFixture::new(&[
            "CREATE TABLE users (id INTEGER)",
            "INSERT INTO users VALUES (1)",
        ])
        .await;

        assert!(matches!(
            rows_of(&fixture, "users; DROP TABLE users; --").await,
            Err(AppError::TableNotFound(_))
        ));
        assert!(matches!(
            rows_of(&fixture, "x\"; DROP TABLE users; --").await,
            Err(AppError::TableNotFound(_))
        ));
        assert_eq!(rows_of(&fixture, "users").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hostile_table_name_is_quoted() {
        let fixture = SqliteFixture::new(&[
            "CREATE TABLE users (id INTEGER)",
            "INSERT INTO users VALUES (1)",
            "CREATE TABLE \"x\"\"; DROP TABLE users; --\" (v TEXT)",
            "INSERT INTO \"x\"\"; DROP TABLE users; --\" VALUES ('kept')",
        ])
        .await;

        let rows = rows_of(&fixture, "x\"; DROP TABLE users; --").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("v"), Some(&Value::Text("kept".into())));
        assert_eq!(rows_of(&fixture, "users").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_table_name_needing_quotes() {
        let fixture = SqliteFixture::new(&[
            "CREATE TABLE \"order \"\"items\"\"\" (id INTEGER)",
            "INSERT INTO \"order \"\"items\"\"\" VALUES (7)",
        ])
        .await;

        let rows = rows_of(&fixture, "order \"items\"").await.unwrap();
        assert_eq!(rows[0].get("id"), Some(&Value::Int(7)));
    }
}
