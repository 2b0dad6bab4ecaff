use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use super::{Connection, IsolationLevel, Vendor};
use crate::core::{GrainError, IdentifierRules, Result, SchemaColumn, SchemaTable, Value};

/// In-process [`Connection`] that records every statement instead of
/// running it. Catalog contents, count results and failures are scripted
/// up front. Clones share the same state, so a clone handed to a
/// conductor can be inspected afterwards.
#[derive(Clone)]
pub struct ScriptedConnection {
    state: Arc<Mutex<State>>,
}

struct State {
    vendor: Vendor,
    rules: IdentifierRules,
    tables: HashMap<String, Vec<SchemaColumn>>,
    counts: VecDeque<i64>,
    fail_on: Option<String>,
    log: Vec<(String, Vec<Value>)>,
    auto_commit: bool,
    isolation: Option<IsolationLevel>,
    vendor_probes: usize,
    commits: usize,
    rollbacks: usize,
}

impl ScriptedConnection {
    #[must_use]
    pub fn new(vendor: Vendor) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                vendor,
                rules: IdentifierRules::default(),
                tables: HashMap::new(),
                counts: VecDeque::new(),
                fail_on: None,
                log: Vec::new(),
                auto_commit: true,
                isolation: Some(IsolationLevel::ReadCommitted),
                vendor_probes: 0,
                commits: 0,
                rollbacks: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("ScriptedConnection state poisoned")
    }

    #[must_use]
    pub fn with_rules(self, rules: IdentifierRules) -> Self {
        self.lock().rules = rules;
        self
    }

    /// Registers a table with untyped columns.
    #[must_use]
    pub fn with_table(self, table: &str, columns: &[&str]) -> Self {
        {
            let mut state = self.lock();
            let key = state.rules.normalize(table);
            let cols = columns
                .iter()
                .map(|c| SchemaColumn::new(table, c, &state.rules))
                .collect();
            state.tables.insert(key, cols);
        }
        self
    }

    /// Marks an already registered column as auto-increment.
    #[must_use]
    pub fn with_auto_increment(self, table: &str, column: &str) -> Self {
        {
            let mut state = self.lock();
            let key = state.rules.normalize(table);
            let wanted = state.rules.normalize(column);
            if let Some(cols) = state.tables.get_mut(&key) {
                for col in cols.iter_mut().filter(|c| c.key() == wanted) {
                    *col = col.clone().with_auto_increment(true);
                }
            }
        }
        self
    }

    /// Queues the result of the next `query_count` call (default 0).
    #[must_use]
    pub fn with_count(self, count: i64) -> Self {
        self.lock().counts.push_back(count);
        self
    }

    /// Any statement containing `fragment` fails with a database error.
    #[must_use]
    pub fn failing_on(self, fragment: &str) -> Self {
        self.lock().fail_on = Some(fragment.to_string());
        self
    }

    /// SQL text of every statement seen, in order
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.lock().log.iter().map(|(sql, _)| sql.clone()).collect()
    }

    #[must_use]
    pub fn recorded(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().log.clone()
    }

    #[must_use]
    pub fn vendor_probes(&self) -> usize {
        self.lock().vendor_probes
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    fn record(&self, sql: &str, params: &[Value]) -> Result<()> {
        let mut state = self.lock();
        state.log.push((sql.to_string(), params.to_vec()));
        match &state.fail_on {
            Some(fragment) if sql.contains(fragment.as_str()) => {
                Err(GrainError::Database(format!("scripted failure: {sql}")))
            }
            _ => Ok(()),
        }
    }
}

impl Connection for ScriptedConnection {
    fn vendor(&mut self) -> Result<Vendor> {
        let mut state = self.lock();
        state.vendor_probes += 1;
        Ok(state.vendor.clone())
    }

    fn identifier_rules(&mut self) -> Result<IdentifierRules> {
        Ok(self.lock().rules.clone())
    }

    fn columns(&mut self, table: &SchemaTable) -> Result<Vec<SchemaColumn>> {
        let state = self.lock();
        let key = state.rules.normalize(table.name());
        Ok(state.tables.get(&key).cloned().unwrap_or_default())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        self.record(sql, params)?;
        Ok(1)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.record(sql, &[])
    }

    fn query_count(&mut self, sql: &str, params: &[Value]) -> Result<i64> {
        self.record(sql, params)?;
        Ok(self.lock().counts.pop_front().unwrap_or(0))
    }

    fn auto_commit(&mut self) -> Result<bool> {
        Ok(self.lock().auto_commit)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.lock().auto_commit = auto_commit;
        Ok(())
    }

    fn isolation(&mut self) -> Result<Option<IsolationLevel>> {
        Ok(self.lock().isolation)
    }

    fn set_isolation(&mut self, level: IsolationLevel) -> Result<()> {
        self.lock().isolation = Some(level);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.lock().commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.lock().rollbacks += 1;
        Ok(())
    }
}
