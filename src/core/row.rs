use std::sync::Arc;
use super::error::{GrainError, Result};
use super::field::DataField;
use super::table::SchemaTable;
use super::value::Value;

/// One record of one table. Immutable; build or rebuild through [`RowBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    schema: Arc<SchemaTable>,
    fields: Vec<DataField>,
    validated: bool,
}

impl DataRow {
    #[must_use]
    pub fn builder(schema: Arc<SchemaTable>) -> RowBuilder {
        RowBuilder {
            schema,
            fields: Vec::new(),
            validated: false,
        }
    }

    /// Builder seeded with this row's schema and fields. Lazy fields keep
    /// sharing their memoized supplier with the original.
    #[must_use]
    pub fn to_builder(&self) -> RowBuilder {
        RowBuilder {
            schema: Arc::clone(&self.schema),
            fields: self.fields.clone(),
            validated: self.validated,
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &Arc<SchemaTable> {
        &self.schema
    }

    #[must_use]
    pub fn table(&self) -> &SchemaTable {
        &self.schema
    }

    #[must_use]
    pub fn fields(&self) -> &[DataField] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, column: &str) -> Option<&DataField> {
        find(&self.schema, &self.fields, column).map(|idx| &self.fields[idx])
    }

    #[must_use]
    pub fn get_data(&self, column: &str) -> Option<&Value> {
        self.field(column).map(DataField::value)
    }

    #[must_use]
    pub const fn is_validated(&self) -> bool {
        self.validated
    }

    /// Validated copy of this row; see [`RowBuilder::validate`].
    pub fn validate(&self) -> Result<Self> {
        if self.validated {
            return Ok(self.clone());
        }
        let mut builder = self.to_builder();
        builder.validate()?;
        Ok(builder.build())
    }
}

/// Mutable view used to construct a [`DataRow`] and by decorators.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    schema: Arc<SchemaTable>,
    fields: Vec<DataField>,
    validated: bool,
}

impl RowBuilder {
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        let field = DataField::new(self.schema.name(), column, value);
        self.put(field);
        self
    }

    #[must_use]
    pub fn set_lazy<F>(mut self, column: &str, supplier: F) -> Self
    where
        F: FnOnce() -> Value + Send + 'static,
    {
        let field = DataField::lazy(self.schema.name(), column, supplier);
        self.put(field);
        self
    }

    /// Adds a field, replacing any field already held for the same column.
    pub fn put(&mut self, field: DataField) {
        match find(&self.schema, &self.fields, field.column()) {
            Some(idx) => self.fields[idx] = field,
            None => self.fields.push(field),
        }
        self.validated = false;
    }

    #[must_use]
    pub const fn schema(&self) -> &Arc<SchemaTable> {
        &self.schema
    }

    #[must_use]
    pub fn fields(&self) -> &[DataField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [DataField] {
        self.validated = false;
        &mut self.fields
    }

    #[must_use]
    pub fn field(&self, column: &str) -> Option<&DataField> {
        find(&self.schema, &self.fields, column).map(|idx| &self.fields[idx])
    }

    #[must_use]
    pub const fn is_validated(&self) -> bool {
        self.validated
    }

    /// Moves the row onto another schema (e.g. the loaded copy of its table).
    pub fn rebase(&mut self, schema: Arc<SchemaTable>) {
        self.schema = schema;
        self.validated = false;
    }

    /// Checks that every field names a column of the schema and respells
    /// the field after the schema column. Stops at the first unknown column.
    pub fn validate(&mut self) -> Result<()> {
        if self.validated {
            return Ok(());
        }
        let mut checked = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let column = self.schema.column(field.column()).ok_or_else(|| {
                GrainError::ColumnNotFound {
                    table: self.schema.name().to_string(),
                    column: field.column().to_string(),
                }
            })?;
            checked.push(field.rebased(self.schema.name(), &column.name));
        }
        self.fields = checked;
        self.validated = true;
        Ok(())
    }

    #[must_use]
    pub fn build(self) -> DataRow {
        DataRow {
            schema: self.schema,
            fields: self.fields,
            validated: self.validated,
        }
    }
}

fn find(schema: &SchemaTable, fields: &[DataField], column: &str) -> Option<usize> {
    let rules = schema.rules();
    let wanted = rules.normalize(column);
    fields.iter().position(|f| rules.normalize(f.column()) == wanted)
}
