use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::params_from_iter;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use super::{Connection, DataSource, IsolationLevel, Vendor, SQLITE};
use crate::core::{IdentifierCase, IdentifierRules, Result, SchemaColumn, SchemaTable, Value};

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::SmallInt(i) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*i))),
            Self::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Self::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Self::Text(s) | Self::Char(s) | Self::Json(s) | Self::Enum(_, s) => {
                ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))
            }
            Self::Bytea(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Self::Numeric(d) => ToSqlOutput::Owned(SqlValue::Text(d.to_string())),
            Self::Date(d) => ToSqlOutput::Owned(SqlValue::Text(d.format("%Y-%m-%d").to_string())),
            Self::Timestamp(t) => {
                ToSqlOutput::Owned(SqlValue::Text(t.format("%Y-%m-%d %H:%M:%S%.f").to_string()))
            }
            Self::TimestampTz(t) => ToSqlOutput::Owned(SqlValue::Text(t.to_rfc3339())),
            Self::Uuid(u) => ToSqlOutput::Owned(SqlValue::Text(u.to_string())),
        };
        Ok(out)
    }
}

/// Opens SQLite connections on a database file
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub const fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for SqliteSource {
    fn connection(&self) -> Result<Box<dyn Connection>> {
        let conn = SqliteConnection::open(&self.path)?;
        conn.inner.busy_timeout(self.busy_timeout)?;
        Ok(Box::new(conn))
    }
}

/// [`Connection`] over a `rusqlite` connection
pub struct SqliteConnection {
    inner: rusqlite::Connection,
    /// Auto-commit switched off: statements run inside an explicit transaction
    manual: bool,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = rusqlite::Connection::open(path)?;
        Ok(Self::wrap(inner))
    }

    pub fn open_in_memory() -> Result<Self> {
        let inner = rusqlite::Connection::open_in_memory()?;
        Ok(Self::wrap(inner))
    }

    #[must_use]
    pub const fn wrap(inner: rusqlite::Connection) -> Self {
        Self { inner, manual: false }
    }

    /// Opens the implicit transaction of manual-commit mode if none is open.
    fn begin_if_manual(&mut self) -> Result<()> {
        if self.manual && self.inner.is_autocommit() {
            self.inner.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

impl Connection for SqliteConnection {
    fn vendor(&mut self) -> Result<Vendor> {
        let version: String = self.inner.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        Ok(Vendor::new(SQLITE, &version))
    }

    fn identifier_rules(&mut self) -> Result<IdentifierRules> {
        Ok(IdentifierRules::new("\"", IdentifierCase::Insensitive))
    }

    fn columns(&mut self, table: &SchemaTable) -> Result<Vec<SchemaColumn>> {
        // SQLite has no catalogs; the schema qualifier names an attached database
        let (sql, args) = match table.schema() {
            Some(schema) => (
                "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1, ?2)",
                vec![table.name().to_string(), schema.to_string()],
            ),
            None => (
                "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1)",
                vec![table.name().to_string()],
            ),
        };
        let rules = self.identifier_rules()?;

        let mut stmt = self.inner.prepare(sql)?;
        let raw = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // INTEGER PRIMARY KEY aliases the rowid and is assigned automatically
        let pk_count = raw.iter().filter(|(_, _, _, _, pk)| *pk > 0).count();
        let columns = raw
            .into_iter()
            .map(|(name, sql_type, not_null, default, pk)| {
                let rowid_alias = pk_count == 1 && pk > 0 && sql_type.eq_ignore_ascii_case("INTEGER");
                SchemaColumn::new(table.name(), &name, &rules)
                    .with_sql_type(&sql_type)
                    .with_nullable(!not_null && !rowid_alias)
                    .with_default(default)
                    .with_auto_increment(rowid_alias)
                    .with_primary_key(pk > 0)
            })
            .collect();
        Ok(columns)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        self.begin_if_manual()?;
        let mut stmt = self.inner.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.begin_if_manual()?;
        self.inner.execute_batch(sql)?;
        Ok(())
    }

    fn query_count(&mut self, sql: &str, params: &[Value]) -> Result<i64> {
        self.begin_if_manual()?;
        let mut stmt = self.inner.prepare_cached(sql)?;
        Ok(stmt.query_row(params_from_iter(params.iter()), |row| row.get(0))?)
    }

    fn auto_commit(&mut self) -> Result<bool> {
        Ok(!self.manual)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        if auto_commit && !self.inner.is_autocommit() {
            self.inner.execute_batch("COMMIT")?;
        }
        self.manual = !auto_commit;
        Ok(())
    }

    fn isolation(&mut self) -> Result<Option<IsolationLevel>> {
        let dirty: bool = self.inner.query_row("PRAGMA read_uncommitted", [], |row| row.get(0))?;
        Ok(Some(if dirty {
            IsolationLevel::ReadUncommitted
        } else {
            IsolationLevel::Serializable
        }))
    }

    fn set_isolation(&mut self, level: IsolationLevel) -> Result<()> {
        let dirty = matches!(level, IsolationLevel::ReadUncommitted);
        self.inner
            .execute_batch(&format!("PRAGMA read_uncommitted = {}", i32::from(dirty)))?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.inner.is_autocommit() {
            self.inner.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.inner.is_autocommit() {
            self.inner.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn users() -> SqliteConnection {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(20) NOT NULL DEFAULT 'x', score REAL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_columns_reports_catalog_facts() {
        let mut conn = users();
        let cols = conn.columns(&SchemaTable::named("USERS")).unwrap();
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "score"]);
        assert!(cols[0].is_auto_increment());
        assert!(cols[0].is_primary_key());
        assert!(!cols[1].is_primary_key());
        assert_eq!(cols[1].data_type, Some(DataType::Varchar));
        assert_eq!(cols[1].nullable, Some(false));
        assert_eq!(cols[1].default_value.as_deref(), Some("'x'"));
        assert_eq!(cols[2].nullable, Some(true));
    }

    #[test]
    fn test_columns_of_missing_table_is_empty() {
        let mut conn = users();
        assert!(conn.columns(&SchemaTable::named("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_manual_commit_and_rollback() {
        let mut conn = users();
        conn.set_auto_commit(false).unwrap();
        conn.execute("INSERT INTO users (id, name) VALUES (?, ?)", &[Value::Integer(1), Value::from("a")])
            .unwrap();
        conn.rollback().unwrap();
        assert_eq!(conn.query_count("SELECT COUNT(*) FROM users", &[]).unwrap(), 0);

        conn.execute("INSERT INTO users (id, name) VALUES (?, ?)", &[Value::Integer(2), Value::from("b")])
            .unwrap();
        conn.set_auto_commit(true).unwrap();
        conn.rollback().unwrap();
        assert_eq!(conn.query_count("SELECT COUNT(*) FROM users", &[]).unwrap(), 1);
        assert!(conn.auto_commit().unwrap());
    }

    #[test]
    fn test_isolation_round_trip() {
        let mut conn = users();
        conn.set_isolation(IsolationLevel::ReadUncommitted).unwrap();
        assert_eq!(conn.isolation().unwrap(), Some(IsolationLevel::ReadUncommitted));
        conn.set_isolation(IsolationLevel::Serializable).unwrap();
        assert_eq!(conn.isolation().unwrap(), Some(IsolationLevel::Serializable));
    }

    #[test]
    fn test_vendor_probe() {
        let mut conn = users();
        assert!(conn.vendor().unwrap().is(SQLITE));
    }
}
