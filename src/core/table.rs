use std::collections::HashMap;
use super::column::SchemaColumn;
use super::identifier::IdentifierRules;

/// Table metadata: name, ordered keys and ordered columns.
///
/// A declared table only knows its name, keys and the columns the fixture
/// mentioned. The schema loader replaces it with a loaded copy built from
/// the live catalog; nothing is mutated in place.
#[derive(Debug, Clone)]
pub struct SchemaTable {
    name: String,
    catalog: Option<String>,
    schema: Option<String>,
    keys: Vec<String>,
    columns: Vec<SchemaColumn>,
    positions: HashMap<String, usize>,
    rules: IdentifierRules,
    loaded: bool,
}

impl SchemaTable {
    #[must_use]
    pub fn builder(name: &str) -> TableBuilder {
        TableBuilder {
            name: name.to_string(),
            catalog: None,
            schema: None,
            keys: Vec::new(),
            columns: Vec::new(),
            rules: IdentifierRules::default(),
        }
    }

    /// Declared table with no keys and no columns.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::builder(name).build()
    }

    /// Loaded copy of this table: catalog columns replace declared ones and
    /// the declared keys are respelled the way the catalog spells them.
    #[must_use]
    pub fn loaded(&self, name: &str, columns: Vec<SchemaColumn>, rules: IdentifierRules) -> Self {
        let positions: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| (rules.normalize(&col.name), idx))
            .collect();
        let keys = self
            .keys
            .iter()
            .map(|key| {
                positions
                    .get(&rules.normalize(key))
                    .map_or_else(|| key.clone(), |&idx| columns[idx].name.clone())
            })
            .collect();

        Self {
            name: name.to_string(),
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
            keys,
            columns,
            positions,
            rules,
            loaded: true,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[must_use]
    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    #[must_use]
    pub const fn rules(&self) -> &IdentifierRules {
        &self.rules
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.positions.get(&self.rules.normalize(name)).copied()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.get_column_index(name).map(|idx| &self.columns[idx])
    }

    #[must_use]
    pub fn column_at(&self, index: usize) -> Option<&SchemaColumn> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn is_key(&self, column: &str) -> bool {
        let wanted = self.rules.normalize(column);
        self.keys.iter().any(|k| self.rules.normalize(k) == wanted)
    }

    /// Cache identity: `catalog.schema.name`, normalized under the given rules.
    #[must_use]
    pub fn identifier(&self, rules: &IdentifierRules) -> String {
        [self.catalog.as_deref(), self.schema.as_deref(), Some(self.name.as_str())]
            .into_iter()
            .flatten()
            .map(|part| rules.normalize(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quoted identifier for one column of this table.
    #[must_use]
    pub fn quote(&self, name: &str) -> String {
        self.rules.quote(name)
    }

    /// Fully qualified, quoted table reference for SQL text.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        [self.catalog.as_deref(), self.schema.as_deref(), Some(self.name.as_str())]
            .into_iter()
            .flatten()
            .map(|part| self.rules.quote(part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl PartialEq for SchemaTable {
    fn eq(&self, other: &Self) -> bool {
        self.identifier(&self.rules) == other.identifier(&other.rules)
    }
}

pub struct TableBuilder {
    name: String,
    catalog: Option<String>,
    schema: Option<String>,
    keys: Vec<String>,
    columns: Vec<String>,
    rules: IdentifierRules,
}

impl TableBuilder {
    #[must_use]
    pub fn catalog(mut self, catalog: &str) -> Self {
        self.catalog = Some(catalog.to_string());
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.keys.push(key.to_string());
        self
    }

    #[must_use]
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keys.extend(keys.into_iter().map(|k| k.as_ref().to_string()));
        self
    }

    #[must_use]
    pub fn column(mut self, name: &str) -> Self {
        self.columns.push(name.to_string());
        self
    }

    #[must_use]
    pub fn rules(mut self, rules: IdentifierRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn build(self) -> SchemaTable {
        let mut columns: Vec<SchemaColumn> = Vec::new();
        let mut positions = HashMap::new();
        for name in self.keys.iter().chain(self.columns.iter()) {
            let key = self.rules.normalize(name);
            if !positions.contains_key(&key) {
                positions.insert(key, columns.len());
                columns.push(SchemaColumn::new(&self.name, name, &self.rules));
            }
        }

        SchemaTable {
            name: self.name,
            catalog: self.catalog,
            schema: self.schema,
            keys: self.keys,
            columns,
            positions,
            rules: self.rules,
            loaded: false,
        }
    }
}
