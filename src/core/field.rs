use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};
use super::value::Value;

type Supplier = Box<dyn FnOnce() -> Value + Send>;

#[derive(Clone)]
enum Content {
    Eager(Value),
    /// Shared between clones so the supplier runs once for every copy
    Lazy(Arc<LazyLock<Value, Supplier>>),
}

/// One column value of one row.
///
/// Values are either given up front ([`DataField::new`]) or produced by a
/// supplier on first read ([`DataField::lazy`]). A supplier runs at most
/// once; the memoized value is what reads, equality and hashing see.
#[derive(Clone)]
pub struct DataField {
    table: String,
    column: String,
    content: Content,
}

impl DataField {
    pub fn new(table: &str, column: &str, value: impl Into<Value>) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            content: Content::Eager(value.into()),
        }
    }

    pub fn lazy<F>(table: &str, column: &str, supplier: F) -> Self
    where
        F: FnOnce() -> Value + Send + 'static,
    {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            content: Content::Lazy(Arc::new(LazyLock::new(Box::new(supplier)))),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Resolved value, invoking the supplier on first access.
    #[must_use]
    pub fn value(&self) -> &Value {
        match &self.content {
            Content::Eager(value) => value,
            Content::Lazy(cell) => LazyLock::force(cell),
        }
    }

    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        matches!(self.content, Content::Lazy(_))
    }

    /// Same table and column, different value.
    #[must_use]
    pub fn with_value(&self, value: impl Into<Value>) -> Self {
        Self::new(&self.table, &self.column, value)
    }

    /// Same value (and the same memoized supplier), new table/column names.
    #[must_use]
    pub fn rebased(&self, table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            content: self.content.clone(),
        }
    }
}

impl PartialEq for DataField {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.column == other.column && self.value() == other.value()
    }
}

impl Hash for DataField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.column.hash(state);
        self.value().hash(state);
    }
}

impl fmt::Debug for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataField")
            .field("table", &self.table)
            .field("column", &self.column)
            .field("value", self.value())
            .finish()
    }
}
