use std::sync::Arc;
use super::sql::{Insert, Refresh};
use super::{OperatorMap, PerRow, RowOperator, VendorPredicate, INSERT, REFRESH};
use crate::conductor::Session;
use crate::connection::{Vendor, SQL_SERVER};
use crate::core::{DataRow, Result};

/// Wraps a row operator in `SET IDENTITY_INSERT <table> ON/OFF` whenever the
/// row carries an explicit value for an auto-increment column.
///
/// Only loaded schemas know which columns are auto-increment, so rows that
/// did not pass through the schema loader run unwrapped.
pub struct IdentityInsert<R>(pub R);

impl<R: RowOperator> RowOperator for IdentityInsert<R> {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        if !supplies_identity(&row) {
            return self.0.operate(session, row);
        }

        let table = row.table().qualified_name();
        session.execute(&format!("SET IDENTITY_INSERT {table} ON"), &[])?;
        let result = self.0.operate(session, row);
        let off = session.execute(&format!("SET IDENTITY_INSERT {table} OFF"), &[]);
        match (result, off) {
            (Ok(row), Ok(_)) => Ok(row),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), off) => {
                if let Err(off_err) = off {
                    log::warn!("failed to reset IDENTITY_INSERT on {table}: {off_err}");
                }
                Err(e)
            }
        }
    }
}

fn supplies_identity(row: &DataRow) -> bool {
    let table = row.table();
    row.fields().iter().any(|field| {
        table
            .column(field.column())
            .is_some_and(|c| c.is_auto_increment())
            && !field.value().is_null()
    })
}

/// Built-in rule for SQL Server: insert and refresh toggle `IDENTITY_INSERT`.
pub fn sql_server_rule() -> (VendorPredicate, OperatorMap) {
    let predicate: VendorPredicate = Arc::new(|vendor: &Vendor| vendor.is(SQL_SERVER));
    let mut operators = OperatorMap::new();
    operators.insert(INSERT.to_string(), Arc::new(PerRow(IdentityInsert(Insert))));
    operators.insert(REFRESH.to_string(), Arc::new(PerRow(IdentityInsert(Refresh))));
    (predicate, operators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ScriptedConnection;
    use crate::core::{SchemaTable, Value};
    use crate::decorator::SchemaLoader;
    use crate::decorator::Decorator;

    fn loaded_row(conn: &ScriptedConnection, id: Value) -> (Session, DataRow) {
        let mut session = Session::new(Box::new(conn.clone()));
        let table = Arc::new(SchemaTable::builder("orders").key("id").build());
        let mut row = DataRow::builder(table).set("id", id).set("item", "pen");
        SchemaLoader::new().decorate(&mut session, &mut row).unwrap();
        (session, row.build())
    }

    fn connection() -> ScriptedConnection {
        ScriptedConnection::new(Vendor::new(SQL_SERVER, "16.0"))
            .with_table("orders", &["id", "item"])
            .with_auto_increment("orders", "id")
    }

    #[test]
    fn test_explicit_identity_is_wrapped() {
        let conn = connection();
        let (mut session, row) = loaded_row(&conn, Value::Integer(7));
        IdentityInsert(Insert).operate(&mut session, row).unwrap();
        let statements = conn.statements();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0], "SET IDENTITY_INSERT \"orders\" ON");
        assert!(statements[1].starts_with("INSERT INTO \"orders\""));
        assert_eq!(statements[2], "SET IDENTITY_INSERT \"orders\" OFF");
    }

    #[test]
    fn test_null_identity_is_not_wrapped() {
        let conn = connection();
        let (mut session, row) = loaded_row(&conn, Value::Null);
        IdentityInsert(Insert).operate(&mut session, row).unwrap();
        assert_eq!(conn.statements().len(), 1);
    }

    #[test]
    fn test_identity_reset_after_failure() {
        let conn = connection().failing_on("INSERT INTO");
        let (mut session, row) = loaded_row(&conn, Value::Integer(7));
        assert!(IdentityInsert(Insert).operate(&mut session, row).is_err());
        assert_eq!(
            conn.statements().last().map(String::as_str),
            Some("SET IDENTITY_INSERT \"orders\" OFF")
        );
    }
}
