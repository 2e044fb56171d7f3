//! Catalog reader.
//!
//! Lists tables and columns of the connection's current schema through the
//! engine's catalog. Caller-supplied names only ever reach the database as
//! bound parameters; identifiers are quoted for data queries only after the
//! catalog has confirmed them.

use common::errors::{AppError, AppResult};

use crate::connector::{DbConnection, DbKind};
use crate::models::{Column, Table};

const PG_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'";
const PG_RESOLVE: &str = "SELECT table_schema::text, table_name::text FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' AND table_name = $1";
const PG_COLUMNS: &str = "SELECT column_name::text, data_type::text FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position";

const MYSQL_TABLES: &str = "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'";
const MYSQL_RESOLVE: &str = "SELECT CAST(TABLE_SCHEMA AS CHAR), CAST(TABLE_NAME AS CHAR) \
     FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' AND TABLE_NAME = ?";
const MYSQL_COLUMNS: &str = "SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR) \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION";

const SQLITE_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'";
const SQLITE_RESOLVE: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' AND name = ?1";
const SQLITE_COLUMNS: &str = "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid";

/// A catalog-confirmed table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTable {
    /// Owning schema; `None` for SQLite.
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedTable {
    /// The quoted `schema.table` (or `table`) for use in SQL text.
    pub fn quoted(&self, kind: DbKind) -> String {
        match &self.schema {
            Some(schema) => format!(
                "{}.{}",
                quote_identifier(kind, schema),
                quote_identifier(kind, &self.name)
            ),
            None => quote_identifier(kind, &self.name),
        }
    }
}

/// Quotes an identifier for the given engine, doubling embedded quote characters.
pub fn quote_identifier(kind: DbKind, ident: &str) -> String {
    match kind {
        DbKind::MySql => format!("`{}`", ident.replace('`', "``")),
        DbKind::Postgres | DbKind::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
    }
}

/// Lists base tables of the current schema in catalog order.
pub async fn list_tables(conn: &mut DbConnection) -> AppResult<Vec<Table>> {
    let names: Vec<String> = match conn {
        DbConnection::Postgres(c) => {
            sqlx::query_scalar::<_, String>(PG_TABLES)
                .fetch_all(&mut *c)
                .await
        }
        DbConnection::MySql(c) => {
            sqlx::query_scalar::<_, String>(MYSQL_TABLES)
                .fetch_all(&mut *c)
                .await
        }
        DbConnection::Sqlite(c) => {
            sqlx::query_scalar::<_, String>(SQLITE_TABLES)
                .fetch_all(&mut *c)
                .await
        }
    }
    .map_err(catalog_error)?;

    Ok(names.into_iter().map(|name| Table { name }).collect())
}

/// Confirms `table` exists in the current schema.
///
/// The name is matched exactly, case and whitespace included.
pub async fn resolve_table(conn: &mut DbConnection, table: &str) -> AppResult<QualifiedTable> {
    let found = match conn {
        DbConnection::Postgres(c) => sqlx::query_as::<_, (String, String)>(PG_RESOLVE)
            .bind(table)
            .fetch_optional(&mut *c)
            .await
            .map(|r| r.map(|(schema, name)| (Some(schema), name))),
        DbConnection::MySql(c) => sqlx::query_as::<_, (String, String)>(MYSQL_RESOLVE)
            .bind(table)
            .fetch_optional(&mut *c)
            .await
            .map(|r| r.map(|(schema, name)| (Some(schema), name))),
        DbConnection::Sqlite(c) => sqlx::query_scalar::<_, String>(SQLITE_RESOLVE)
            .bind(table)
            .fetch_optional(&mut *c)
            .await
            .map(|r| r.map(|name| (None, name))),
    }
    .map_err(catalog_error)?;

    found
        .map(|(schema, name)| QualifiedTable { schema, name })
        .ok_or_else(|| AppError::TableNotFound(table.to_string()))
}

/// Lists the columns of `table` in ordinal order.
///
/// # Errors
/// `AppError::TableNotFound` when the table is not in the current schema.
pub async fn list_columns(conn: &mut DbConnection, table: &str) -> AppResult<Vec<Column>> {
    let resolved = resolve_table(conn, table).await?;

    let columns: Vec<(String, String)> = match conn {
        DbConnection::Postgres(c) => {
            sqlx::query_as::<_, (String, String)>(PG_COLUMNS)
                .bind(resolved.schema.as_deref())
                .bind(&resolved.name)
                .fetch_all(&mut *c)
                .await
        }
        DbConnection::MySql(c) => {
            sqlx::query_as::<_, (String, String)>(MYSQL_COLUMNS)
                .bind(resolved.schema.as_deref())
                .bind(&resolved.name)
                .fetch_all(&mut *c)
                .await
        }
        DbConnection::Sqlite(c) => {
            sqlx::query_as::<_, (String, String)>(SQLITE_COLUMNS)
                .bind(&resolved.name)
                .fetch_all(&mut *c)
                .await
        }
    }
    .map_err(catalog_error)?;

    Ok(columns
        .into_iter()
        .map(|(name, data_type)| Column { name, data_type })
        .collect())
}

fn catalog_error(e: sqlx::Error) -> AppError {
    AppError::CatalogQuery(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector;
    use crate::test_support::SqliteFixture;
    use std::time::Duration;

    async fn connect(fixture: &SqliteFixture) -> DbConnection {
        connector::open(fixture.connection_string(), Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier(DbKind::Postgres, "users"), "\"users\"");
        assert_eq!(quote_identifier(DbKind::Sqlite, "a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_identifier(DbKind::MySql, "a`b"), "`a``b`");
    }

    #[test]
    fn test_qualified_table_quoting() {
        let table = QualifiedTable {
            schema: Some("public".into()),
            name: "Orders".into(),
        };
        assert_eq!(table.quoted(DbKind::Postgres), "\"public\".\"Orders\"");
        assert_eq!(table.quoted(DbKind::MySql), "`public`.`Orders`");

        let table = QualifiedTable {
            schema: None,
            name: "orders".into(),
        };
        assert_eq!(table.quoted(DbKind::Sqlite), "\"orders\"");
    }

    #[tokio::test]
    async fn test_list_tables_in_creation_order() {
        let fixture = SqliteFixture::new(&[
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, email TEXT)",
            "CREATE TABLE orders (id INTEGER, note TEXT)",
            "CREATE VIEW user_emails AS SELECT email FROM users",
        ])
        .await;
        let mut conn = connect(&fixture).await;

        let tables = list_tables(&mut conn).await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        // sqlite_sequence (from AUTOINCREMENT) and views are not listed.
        assert_eq!(names, vec!["users", "orders"]);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_list_tables_empty_database() {
        let fixture = SqliteFixture::new(&[]).await;
        let mut conn = connect(&fixture).await;
        assert!(list_tables(&mut conn).await.unwrap().is_empty());
        conn.close().await;
    }

    #[tokio::test]
    async fn test_list_columns_in_ordinal_order() {
        let fixture = SqliteFixture::new(&[
            "CREATE TABLE users (id INTEGER, email VARCHAR(255), created_at TIMESTAMP)",
        ])
        .await;
        let mut conn = connect(&fixture).await;

        let columns = list_columns(&mut conn, "users").await.unwrap();
        assert_eq!(
            columns,
            vec![
                Column { name: "id".into(), data_type: "INTEGER".into() },
                Column { name: "email".into(), data_type: "VARCHAR(255)".into() },
                Column { name: "created_at".into(), data_type: "TIMESTAMP".into() },
            ]
        );

        // Stable across calls.
        assert_eq!(list_columns(&mut conn, "users").await.unwrap(), columns);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_list_columns_unknown_table() {
        let fixture = SqliteFixture::new(&["CREATE TABLE users (id INTEGER)"]).await;
        let mut conn = connect(&fixture).await;

        let err = list_columns(&mut conn, "does_not_exist").await.unwrap_err();
        assert!(matches!(err, AppError::TableNotFound(ref t) if t == "does_not_exist"));
        conn.close().await;
    }

    #[tokio::test]
    async fn test_table_name_is_not_interpolated() {
        let fixture = SqliteFixture::new(&["CREATE TABLE users (id INTEGER)"]).await;
        let mut conn = connect(&fixture).await;

        let err = list_columns(&mut conn, "users; DROP TABLE users")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TableNotFound(_)));
        let err = list_columns(&mut conn, "x\"; DROP TABLE users; --")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TableNotFound(_)));
        assert_eq!(list_tables(&mut conn).await.unwrap().len(), 1);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_resolve_table_matches_exactly() {
        let fixture = SqliteFixture::new(&["CREATE TABLE \"Weird \"\"Name\" (id INTEGER)"]).await;
        let mut conn = connect(&fixture).await;

        let resolved = resolve_table(&mut conn, "Weird \"Name").await.unwrap();
        assert_eq!(resolved.schema, None);
        assert_eq!(resolved.name, "Weird \"Name");
        assert!(matches!(
            resolve_table(&mut conn, " Weird \"Name").await,
            Err(AppError::TableNotFound(_))
        ));
        conn.close().await;
    }
}
