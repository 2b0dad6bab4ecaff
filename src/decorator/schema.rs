use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use super::Decorator;
use crate::conductor::Session;
use crate::core::{GrainError, IdentifierRules, Result, RowBuilder, SchemaColumn, SchemaTable};

/// Catalog facts for one table, as first loaded
struct Loaded {
    name: String,
    columns: Vec<SchemaColumn>,
    rules: IdentifierRules,
}

/// Attaches live catalog metadata to rows and validates them against it.
///
/// Catalog lookups are cached per normalized table identifier for the
/// lifetime of the loader (one loader per conductor). The cache is never
/// invalidated, so DDL issued after the first lookup is not observed.
#[derive(Default)]
pub struct SchemaLoader {
    cache: RwLock<HashMap<String, Arc<Loaded>>>,
}

impl SchemaLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded copy of `declared`, keeping its declared keys.
    pub fn load(&self, session: &mut Session, declared: &SchemaTable) -> Result<SchemaTable> {
        let rules = session.identifier_rules()?;
        let id = declared.identifier(&rules);

        let hit = self.cache.read().expect("RwLock poisoned").get(&id).cloned();
        let loaded = match hit {
            Some(loaded) => loaded,
            None => {
                let columns = session.connection().columns(declared)?;
                if columns.is_empty() {
                    return Err(GrainError::TableNotFound(declared.name().to_string()));
                }
                log::debug!("loaded {} columns for table {id}", columns.len());
                let loaded = Arc::new(Loaded {
                    name: columns[0].table.clone(),
                    columns,
                    rules,
                });
                self.cache
                    .write()
                    .expect("RwLock poisoned")
                    .insert(id, Arc::clone(&loaded));
                loaded
            }
        };

        let table = declared.loaded(&loaded.name, loaded.columns.clone(), loaded.rules.clone());
        if let Some(missing) = table.keys().iter().find(|key| table.column(key).is_none()) {
            return Err(GrainError::ColumnNotFound {
                table: table.name().to_string(),
                column: missing.clone(),
            });
        }
        Ok(table)
    }

    /// Number of tables held in the cache
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.read().expect("RwLock poisoned").len()
    }
}

impl Decorator for SchemaLoader {
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()> {
        if row.is_validated() {
            return Ok(());
        }
        if !row.schema().is_loaded() {
            let table = self.load(session, row.schema())?;
            row.rebase(Arc::new(table));
        }
        row.validate()
    }
}
