mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use common::{count, database, orders, users};
use sqlgrain::operator::{DELETE, DELETE_ALL, INSERT, REFRESH};
use sqlgrain::{Conductor, DataGrain, DataRow, GrainError, SchemaTable, Value};

#[test]
fn test_insert_then_delete() {
    let (_dir, source) = database();
    let conductor = Conductor::new(source.clone());
    let grain = users(&[(1, "A"), (2, "B")]);

    conductor.conduct_named(&grain, INSERT, None).unwrap();
    assert_eq!(count(&source, "users"), 2);

    conductor.conduct_named(&grain, DELETE, None).unwrap();
    assert_eq!(count(&source, "users"), 0);
}

#[test]
fn test_refresh_updates_existing_and_inserts_new() {
    let (_dir, source) = database();
    let conductor = Conductor::new(source.clone());
    conductor.conduct_named(&users(&[(1, "A")]), INSERT, None).unwrap();

    conductor
        .conduct_named(&users(&[(1, "A2"), (2, "B")]), REFRESH, None)
        .unwrap();

    assert_eq!(count(&source, "users"), 2);
    let renamed = conductor
        .conduct_with(|session| {
            session.query_count("SELECT COUNT(*) FROM users WHERE id = 1 AND name = 'A2'", &[])
        })
        .unwrap();
    assert_eq!(renamed, 1);
}

#[test]
fn test_delete_all_clears_each_table_once() {
    let (_dir, source) = database();
    let conductor = Conductor::new(source.clone());
    conductor.conduct_named(&users(&[(1, "A"), (2, "B"), (3, "C")]), INSERT, None).unwrap();
    conductor.conduct_named(&orders(&[(1, Some(1), "pen")]), INSERT, None).unwrap();

    let grain = users(&[(9, "x"), (10, "y")]).aggregate(&orders(&[(9, Some(9), "z")]));
    let out = conductor.conduct_named(&grain, DELETE_ALL, None).unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(count(&source, "users"), 0);
    assert_eq!(count(&source, "orders"), 0);
}

#[test]
fn test_failed_transaction_leaves_no_rows_and_restores_auto_commit() {
    let (_dir, source) = database();
    let conductor = Conductor::new(source.clone());

    conductor
        .conduct_with(|session| {
            let result = session.transaction(None, |session| {
                let insert = conductor.operators().require(session, INSERT)?;
                conductor.apply(session, &users(&[(1, "A"), (2, "B")]), insert.as_ref(), None)?;
                // user_id is NOT NULL
                conductor.apply(session, &orders(&[(1, None, "pen")]), insert.as_ref(), None)
            });
            assert!(matches!(result, Err(GrainError::Sqlite(_))));
            assert!(session.connection().auto_commit()?);
            Ok(())
        })
        .unwrap();

    assert_eq!(count(&source, "users"), 0);
    assert_eq!(count(&source, "orders"), 0);
}

#[test]
fn test_undeclared_column_fails_before_any_write() {
    let (_dir, source) = database();
    let conductor = Conductor::new(source.clone());
    let table = Arc::new(SchemaTable::builder("users").key("id").build());
    let grain: DataGrain = vec![
        DataRow::builder(Arc::clone(&table)).set("id", 1i64).set("name", "A").build(),
        DataRow::builder(table).set("id", 2i64).set("age", 30i64).build(),
    ]
    .into();

    let err = conductor.conduct_named(&grain, INSERT, None).unwrap_err();
    assert!(matches!(err, GrainError::Conduct(_)));
    assert!(matches!(
        err.root(),
        GrainError::ColumnNotFound { column, .. } if column == "age"
    ));
    assert_eq!(count(&source, "users"), 0);
}

#[test]
fn test_missing_table_is_reported() {
    let (_dir, source) = database();
    let conductor = Conductor::new(source);
    let grain: DataGrain = vec![DataRow::builder(Arc::new(SchemaTable::named("ghosts"))).build()].into();
    let err = conductor.conduct_named(&grain, INSERT, None).unwrap_err();
    assert!(err.is_schema_mismatch());
}

#[test]
fn test_lazy_value_is_supplied_once() {
    let (_dir, source) = database();
    let conductor = Conductor::new(source.clone());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let table = Arc::new(SchemaTable::builder("users").key("id").build());
    let grain: DataGrain = vec![DataRow::builder(table)
        .set("id", 1i64)
        .set_lazy("name", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::from("lazy")
        })
        .build()]
    .into();

    let inserted = conductor.conduct_named(&grain, INSERT, None).unwrap();
    conductor.conduct_named(&inserted, DELETE, None).unwrap();

    assert_eq!(inserted.rows()[0].get_data("name"), Some(&Value::from("lazy")));
    assert_eq!(grain.rows()[0].get_data("NAME"), Some(&Value::from("lazy")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(count(&source, "users"), 0);
}
