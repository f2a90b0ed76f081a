use super::{Namespace, StateStore};
use crate::model::StoreError;
use chrono::Utc;
use rusqlite::{Connection, params};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// SQLite-backed hash store. Every (namespace, key, field) triple is one row.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the database file and creates the schema if missing.
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS hash_fields (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key, field)
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn read_hash(
        conn: &Connection,
        namespace: Namespace,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT field, value FROM hash_fields WHERE namespace = ?1 AND key = ?2",
        )?;

        let rows = stmt.query_map(params![namespace.as_str(), key], |row| {
            let field: String = row.get(0)?;
            let value: String = row.get(1)?;
            Ok((field, value))
        })?;

        let mut result = HashMap::new();
        for row in rows {
            let (field, value) = row?;
            result.insert(field, value);
        }

        Ok(result)
    }

    fn write_hash(
        conn: &mut Connection,
        namespace: Namespace,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        let updated_at = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO hash_fields (namespace, key, field, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (field, value) in fields {
                stmt.execute(params![namespace.as_str(), key, field, value, &updated_at])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for SqliteStore {
    async fn hgetall(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        let conn = self.conn.lock().await;
        Self::read_hash(&conn, namespace, key)
    }

    async fn hset(
        &self,
        namespace: Namespace,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().await;
        Self::write_hash(&mut conn, namespace, key, fields)
    }
}
