use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
///
/// All statements go through one connection guarded by a mutex, so each
/// statement runs to completion before the next one starts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path)
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        debug!("SqliteStore: opened {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::with_capacity(column_names.len());
                for (i, name) in column_names.iter().enumerate() {
                    columns.push((name.clone(), row_value_at(row, i)?));
                }
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(affected as u64)
    }

    fn exec_batch(&self, sql: &str) -> Result<(), SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        conn.execute_batch(sql)
            .map_err(|e| SQLError::Execution(e.to_string()))
    }
}

/// Extract a Value from a rusqlite row at a given column index, keeping the
/// storage class SQLite reports for that cell.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_table() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec_batch(
                "CREATE TABLE items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL
                );
                CREATE INDEX idx_items_name ON items(name);",
            )
            .unwrap();
        store
    }

    #[test]
    fn test_insert_returning_assigns_increasing_ids() {
        let store = store_with_table();
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let rows = store
                .query(
                    "INSERT INTO items (name, amount) VALUES (?1, ?2) RETURNING id",
                    &[Value::Text(name.into()), Value::Real(1.5)],
                )
                .unwrap();
            ids.push(rows[0].get_i64("id").unwrap());
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_exec_reports_affected_rows() {
        let store = store_with_table();
        store
            .exec(
                "INSERT INTO items (name, amount) VALUES (?1, ?2)",
                &[Value::Text("a".into()), Value::Real(2.0)],
            )
            .unwrap();

        let updated = store
            .exec(
                "UPDATE items SET amount = ?1 WHERE id = ?2",
                &[Value::Real(3.0), Value::Integer(1)],
            )
            .unwrap();
        assert_eq!(updated, 1);

        let missing = store
            .exec("DELETE FROM items WHERE id = ?1", &[Value::Integer(99)])
            .unwrap();
        assert_eq!(missing, 0);
    }

    #[test]
    fn test_query_preserves_storage_classes() {
        let store = store_with_table();
        store
            .exec(
                "INSERT INTO items (name, amount) VALUES (?1, ?2)",
                &[Value::Text("Alice".into()), Value::Real(1000.0)],
            )
            .unwrap();

        let rows = store
            .query("SELECT id, name, amount, NULL AS nothing FROM items", &[])
            .unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get_i64("id"), Some(1));
        assert_eq!(row.get_str("name"), Some("Alice"));
        assert_eq!(row.get_f64("amount"), Some(1000.0));
        assert_eq!(row.get("nothing"), Some(&Value::Null));
    }

    #[test]
    fn test_bad_sql_is_query_error() {
        let store = store_with_table();
        let err = store.query("SELECT * FROM nowhere", &[]).unwrap_err();
        assert!(matches!(err, SQLError::Query(_)));
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.exec_batch("CREATE TABLE t (x INTEGER)").unwrap();
            store.exec("INSERT INTO t (x) VALUES (?1)", &[Value::Integer(5)]).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        let rows = reopened.query("SELECT x FROM t", &[]).unwrap();
        assert_eq!(rows[0].get_i64("x"), Some(5));
    }
}
