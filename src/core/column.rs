use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use super::data_type::DataType;
use super::identifier::IdentifierRules;

/// Column metadata. Declared columns carry only a name; loaded columns
/// carry whatever the catalog reported.
///
/// Equality and hashing use the vendor-normalized name only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub table: String,
    key: String,
    pub sql_type: Option<String>,
    pub data_type: Option<DataType>,
    pub nullable: Option<bool>,
    pub default_value: Option<String>,
    pub auto_increment: Option<bool>,
    /// Part of the table's primary key in the catalog
    pub primary_key: Option<bool>,
}

impl SchemaColumn {
    #[must_use]
    pub fn new(table: &str, name: &str, rules: &IdentifierRules) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            key: rules.normalize(name),
            sql_type: None,
            data_type: None,
            nullable: None,
            default_value: None,
            auto_increment: None,
            primary_key: None,
        }
    }

    /// Sets the vendor type name and derives the neutral [`DataType`] from it.
    #[must_use]
    pub fn with_sql_type(mut self, sql_type: &str) -> Self {
        self.data_type = Some(DataType::from_sql_type(sql_type));
        self.sql_type = Some(sql_type.to_string());
        self
    }

    #[must_use]
    pub const fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    #[must_use]
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    #[must_use]
    pub fn with_default(mut self, default_value: Option<String>) -> Self {
        self.default_value = default_value;
        self
    }

    #[must_use]
    pub const fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = Some(auto_increment);
        self
    }

    #[must_use]
    pub const fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    /// Vendor-normalized name used for lookups
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment.unwrap_or(false)
    }

    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key.unwrap_or(false)
    }
}

impl PartialEq for SchemaColumn {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SchemaColumn {}

impl Hash for SchemaColumn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::IdentifierCase;

    #[test]
    fn test_equality_by_normalized_name() {
        let rules = IdentifierRules::new("\"", IdentifierCase::Upper);
        let declared = SchemaColumn::new("users", "id", &rules);
        let loaded = SchemaColumn::new("USERS", "ID", &rules)
            .with_sql_type("NUMBER(10)")
            .with_nullable(false);
        assert_eq!(declared, loaded);
        assert_eq!(loaded.data_type, Some(DataType::Numeric));
    }

    #[test]
    fn test_case_sensitive_columns_differ() {
        let rules = IdentifierRules::new("\"", IdentifierCase::Sensitive);
        assert_ne!(SchemaColumn::new("t", "Id", &rules), SchemaColumn::new("t", "id", &rules));
    }
}
