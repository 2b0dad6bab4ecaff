#![allow(dead_code)]

use std::sync::Arc;
use sqlgrain::{Connection, DataGrain, DataRow, DataSource, SchemaTable, SqliteSource};
use tempfile::TempDir;

pub const SCHEMA: &str = "
    CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        item TEXT
    );
";

/// Fresh database file with the test schema; keep the dir alive for the test.
pub fn database() -> (TempDir, SqliteSource) {
    let dir = tempfile::tempdir().unwrap();
    let source = SqliteSource::new(dir.path().join("grain.db"));
    source.connection().unwrap().execute_batch(SCHEMA).unwrap();
    (dir, source)
}

pub fn count(source: &SqliteSource, table: &str) -> i64 {
    let mut conn: Box<dyn Connection> = source.connection().unwrap();
    conn.query_count(&format!("SELECT COUNT(*) FROM {table}"), &[]).unwrap()
}

pub fn users(rows: &[(i64, &str)]) -> DataGrain {
    let table = Arc::new(SchemaTable::builder("users").key("id").build());
    rows.iter()
        .map(|(id, name)| DataRow::builder(Arc::clone(&table)).set("id", *id).set("name", *name).build())
        .collect()
}

pub fn orders(rows: &[(i64, Option<i64>, &str)]) -> DataGrain {
    let table = Arc::new(SchemaTable::builder("orders").key("id").build());
    rows.iter()
        .map(|(id, user, item)| {
            DataRow::builder(Arc::clone(&table))
                .set("id", *id)
                .set("user_id", *user)
                .set("item", *item)
                .build()
        })
        .collect()
}
