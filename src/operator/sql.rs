/// Default statement-generating row operators
///
/// Every statement names the table through `SchemaTable::qualified_name` and
/// columns through `SchemaTable::quote`, so after schema loading the catalog
/// spelling is what reaches the database.

use super::RowOperator;
use crate::conductor::Session;
use crate::core::{DataRow, GrainError, Result, SchemaTable, Value};

/// `INSERT INTO t (c, ...) VALUES (?, ...)` over the row's fields in order
pub struct Insert;

/// `UPDATE t SET c = ? ... WHERE k = ? ...`; the SET list skips key columns
pub struct Update;

/// Update when a row with the same key exists, insert otherwise
pub struct Refresh;

/// `DELETE FROM t WHERE k = ? ...`
pub struct Delete;

/// `DELETE FROM t`, meant to run under `TableBased`
pub struct DeleteAll;

/// `TRUNCATE TABLE t`, meant to run under `TableBased`
pub struct Truncate;

impl RowOperator for Insert {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        let (sql, params) = insert_statement(&row);
        session.execute(&sql, &params)?;
        Ok(row)
    }
}

impl RowOperator for Update {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        let (filter, mut params) = key_filter(&row, "update")?;
        let table = row.table();
        let assignments: Vec<_> = row
            .fields()
            .iter()
            .filter(|f| !table.is_key(f.column()))
            .collect();
        if assignments.is_empty() {
            log::debug!("nothing to update in {}: every field is a key", table.name());
            return Ok(row);
        }

        let set = assignments
            .iter()
            .map(|f| format!("{} = ?", table.quote(f.column())))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<Value> = assignments.iter().map(|f| f.value().clone()).collect();
        values.append(&mut params);

        let sql = format!("UPDATE {} SET {set} WHERE {filter}", table.qualified_name());
        session.execute(&sql, &values)?;
        Ok(row)
    }
}

impl RowOperator for Refresh {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        let (filter, params) = key_filter(&row, "refresh")?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {filter}", row.table().qualified_name());
        if session.query_count(&sql, &params)? > 0 {
            Update.operate(session, row)
        } else {
            Insert.operate(session, row)
        }
    }
}

impl RowOperator for Delete {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        let (filter, params) = key_filter(&row, "delete")?;
        let sql = format!("DELETE FROM {} WHERE {filter}", row.table().qualified_name());
        let affected = session.execute(&sql, &params)?;
        if affected == 0 {
            log::debug!("delete matched no rows in {}", row.table().name());
        }
        Ok(row)
    }
}

impl RowOperator for DeleteAll {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        session.execute(&format!("DELETE FROM {}", row.table().qualified_name()), &[])?;
        Ok(row)
    }
}

impl RowOperator for Truncate {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        session.execute(&format!("TRUNCATE TABLE {}", row.table().qualified_name()), &[])?;
        Ok(row)
    }
}

pub(crate) fn insert_statement(row: &DataRow) -> (String, Vec<Value>) {
    let table = row.table();
    if row.fields().is_empty() {
        return (format!("INSERT INTO {} DEFAULT VALUES", table.qualified_name()), Vec::new());
    }
    let columns = row
        .fields()
        .iter()
        .map(|f| table.quote(f.column()))
        .collect::<Vec<_>>()
        .join(", ");
    let marks = vec!["?"; row.fields().len()].join(", ");
    let params = row.fields().iter().map(|f| f.value().clone()).collect();
    (
        format!("INSERT INTO {} ({columns}) VALUES ({marks})", table.qualified_name()),
        params,
    )
}

/// `k1 = ? AND k2 = ?` over the declared keys, with the row's key values.
fn key_filter(row: &DataRow, operation: &str) -> Result<(String, Vec<Value>)> {
    let table: &SchemaTable = row.table();
    if table.keys().is_empty() {
        return Err(GrainError::Precondition(format!(
            "{operation} needs at least one key column on table '{}'",
            table.name()
        )));
    }
    let mut clauses = Vec::with_capacity(table.keys().len());
    let mut params = Vec::with_capacity(table.keys().len());
    for key in table.keys() {
        let value = row.get_data(key).ok_or_else(|| {
            GrainError::Precondition(format!(
                "{operation} on table '{}' needs a value for key column '{key}'",
                table.name()
            ))
        })?;
        clauses.push(format!("{} = ?", table.quote(key)));
        params.push(value.clone());
    }
    Ok((clauses.join(" AND "), params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ScriptedConnection, Vendor, SQLITE};
    use std::sync::Arc;

    fn session(conn: &ScriptedConnection) -> Session {
        Session::new(Box::new(conn.clone()))
    }

    fn user(keys: &[&str]) -> DataRow {
        let table = Arc::new(SchemaTable::builder("users").keys(keys).build());
        DataRow::builder(table).set("id", 1i64).set("name", "A").build()
    }

    #[test]
    fn test_insert_statement() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3"));
        Insert.operate(&mut session(&conn), user(&["id"])).unwrap();
        let recorded = conn.recorded();
        assert_eq!(recorded[0].0, "INSERT INTO \"users\" (\"id\", \"name\") VALUES (?, ?)");
        assert_eq!(recorded[0].1, [Value::Integer(1), Value::from("A")]);
    }

    #[test]
    fn test_update_excludes_keys_from_set() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3"));
        Update.operate(&mut session(&conn), user(&["id"])).unwrap();
        let recorded = conn.recorded();
        assert_eq!(recorded[0].0, "UPDATE \"users\" SET \"name\" = ? WHERE \"id\" = ?");
        assert_eq!(recorded[0].1, [Value::from("A"), Value::Integer(1)]);
    }

    #[test]
    fn test_update_requires_keys() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3"));
        let err = Update.operate(&mut session(&conn), user(&[])).unwrap_err();
        assert!(matches!(err, GrainError::Precondition(_)));
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn test_refresh_inserts_when_missing() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3")).with_count(0);
        Refresh.operate(&mut session(&conn), user(&["id"])).unwrap();
        let statements = conn.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "SELECT COUNT(*) FROM \"users\" WHERE \"id\" = ?");
        assert!(statements[1].starts_with("INSERT"));
    }

    #[test]
    fn test_refresh_updates_when_present() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3")).with_count(1);
        Refresh.operate(&mut session(&conn), user(&["id"])).unwrap();
        let statements = conn.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[1].starts_with("UPDATE"));
    }

    #[test]
    fn test_delete_by_composite_key() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3"));
        Delete.operate(&mut session(&conn), user(&["id", "name"])).unwrap();
        assert_eq!(
            conn.statements(),
            ["DELETE FROM \"users\" WHERE \"id\" = ? AND \"name\" = ?"]
        );
    }

    #[test]
    fn test_missing_key_value() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3"));
        let table = Arc::new(SchemaTable::builder("users").key("id").build());
        let row = DataRow::builder(table).set("name", "A").build();
        assert!(matches!(
            Delete.operate(&mut session(&conn), row),
            Err(GrainError::Precondition(_))
        ));
    }

    #[test]
    fn test_insert_without_fields() {
        let row = DataRow::builder(Arc::new(SchemaTable::named("t"))).build();
        assert_eq!(insert_statement(&row).0, "INSERT INTO \"t\" DEFAULT VALUES");
    }

    #[test]
    fn test_truncate_statement() {
        let conn = ScriptedConnection::new(Vendor::new(SQLITE, "3"));
        let table = Arc::new(SchemaTable::builder("logs").schema("audit").build());
        let row = DataRow::builder(table).build();
        Truncate.operate(&mut session(&conn), row).unwrap();
        assert_eq!(conn.statements(), ["TRUNCATE TABLE \"audit\".\"logs\""]);
    }
}
