/// Connection layer - the seam between the conduction engine and a database
///
/// Operators, decorators and the transaction wrapper only ever talk to
/// `dyn Connection`. `DataSource` hands out connections; dropping a
/// connection releases it.

mod scripted;
mod sqlite;

pub use scripted::ScriptedConnection;
pub use sqlite::{SqliteConnection, SqliteSource, DEFAULT_BUSY_TIMEOUT_MS};

use serde::{Deserialize, Serialize};
use crate::core::{IdentifierRules, Result, SchemaColumn, SchemaTable, Value};

/// Product name reported by Microsoft SQL Server drivers
pub const SQL_SERVER: &str = "Microsoft SQL Server";
/// Product name reported by the bundled SQLite backend
pub const SQLITE: &str = "SQLite";

/// Database product identity, as reported by the metadata probe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vendor {
    pub product_name: String,
    pub product_version: String,
}

impl Vendor {
    #[must_use]
    pub fn new(product_name: &str, product_version: &str) -> Self {
        Self {
            product_name: product_name.to_string(),
            product_version: product_version.to_string(),
        }
    }

    /// Case-insensitive product name match
    #[must_use]
    pub fn is(&self, product_name: &str) -> bool {
        self.product_name.eq_ignore_ascii_case(product_name)
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.product_name, self.product_version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// A single database connection.
///
/// Auto-commit follows the usual driver contract: while it is off, the
/// first statement opens a transaction that stays open until `commit` or
/// `rollback`; switching it back on commits any open transaction.
pub trait Connection: Send {
    /// Metadata probe for the database product
    fn vendor(&mut self) -> Result<Vendor>;

    fn identifier_rules(&mut self) -> Result<IdentifierRules>;

    /// Catalog columns of `table` (respecting its catalog/schema qualifiers),
    /// in catalog order. Empty when the table does not exist.
    fn columns(&mut self, table: &SchemaTable) -> Result<Vec<SchemaColumn>>;

    /// Executes one statement with positional `?` parameters and returns
    /// the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Executes a script of `;`-separated statements without parameters.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Runs a query whose first column of the first row is an integer count.
    fn query_count(&mut self, sql: &str, params: &[Value]) -> Result<i64>;

    fn auto_commit(&mut self) -> Result<bool>;

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;

    /// Current isolation level, `None` when the driver cannot tell.
    fn isolation(&mut self) -> Result<Option<IsolationLevel>>;

    fn set_isolation(&mut self, level: IsolationLevel) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}

/// Source of connections (a pool, a file path, a DSN)
pub trait DataSource: Send + Sync {
    fn connection(&self) -> Result<Box<dyn Connection>>;
}

impl<F> DataSource for F
where
    F: Fn() -> Result<Box<dyn Connection>> + Send + Sync,
{
    fn connection(&self) -> Result<Box<dyn Connection>> {
        self()
    }
}
