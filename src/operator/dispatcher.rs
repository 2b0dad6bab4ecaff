use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use super::sql::{Delete, DeleteAll, Insert, Refresh, Truncate, Update};
use super::{identity, Noop, Operator, PerRow, TableBased};
use super::{DELETE, DELETE_ALL, INSERT, NONE, REFRESH, TRUNCATE, UPDATE};
use crate::conductor::Session;
use crate::connection::Vendor;
use crate::core::{GrainError, Result};

pub type VendorPredicate = Arc<dyn Fn(&Vendor) -> bool + Send + Sync>;
pub type OperatorMap = HashMap<String, Arc<dyn Operator>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    /// Registered by the caller
    User,
    /// Shipped with the crate
    BuiltIn,
}

/// Operators that apply when the connected vendor matches `predicate`
#[derive(Clone)]
pub struct VendorRule {
    pub origin: RuleOrigin,
    pub predicate: VendorPredicate,
    pub operators: OperatorMap,
}

/// Resolves operator names to implementations for the connected vendor.
///
/// Rules are kept in one ordered list: user rules in registration order,
/// then built-in rules. The first rule whose predicate matches the vendor wins;
/// a name it does not override falls back to the default operators. Every
/// resolution, including a miss, is cached by name for the lifetime of the
/// factory, and the vendor is probed at most once per factory.
pub struct OperatorFactory {
    rules: Vec<VendorRule>,
    defaults: OperatorMap,
    vendor: RwLock<Option<Vendor>>,
    cache: RwLock<HashMap<String, Option<Arc<dyn Operator>>>>,
}

impl Default for OperatorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorFactory {
    /// Factory with the default operators and the built-in vendor rules
    #[must_use]
    pub fn new() -> Self {
        let (predicate, operators) = identity::sql_server_rule();
        Self {
            rules: vec![VendorRule {
                origin: RuleOrigin::BuiltIn,
                predicate,
                operators,
            }],
            defaults: default_operators(),
            vendor: RwLock::new(None),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a user rule after earlier user rules and ahead of the
    /// built-in ones.
    pub fn register<P>(&mut self, predicate: P, operators: OperatorMap)
    where
        P: Fn(&Vendor) -> bool + Send + Sync + 'static,
    {
        let at = self
            .rules
            .iter()
            .position(|r| r.origin == RuleOrigin::BuiltIn)
            .unwrap_or(self.rules.len());
        self.rules.insert(
            at,
            VendorRule {
                origin: RuleOrigin::User,
                predicate: Arc::new(predicate),
                operators,
            },
        );
        self.cache.get_mut().expect("RwLock poisoned").clear();
    }

    /// Replaces or adds a default operator used when no rule overrides it.
    pub fn set_default(&mut self, name: &str, operator: Arc<dyn Operator>) {
        self.defaults.insert(name.to_string(), operator);
        self.cache.get_mut().expect("RwLock poisoned").clear();
    }

    pub fn rules(&self) -> &[VendorRule] {
        &self.rules
    }

    /// Whether any default or rule defines `name`, without touching the database.
    #[must_use]
    pub fn knows(&self, name: &str) -> bool {
        self.defaults.contains_key(name) || self.rules.iter().any(|r| r.operators.contains_key(name))
    }

    /// Operator registered under `name` for the session's vendor.
    pub fn get(&self, session: &mut Session, name: &str) -> Result<Option<Arc<dyn Operator>>> {
        if let Some(cached) = self.cache.read().expect("RwLock poisoned").get(name) {
            return Ok(cached.clone());
        }

        let vendor = self.vendor(session)?;
        let resolved = self.resolve(&vendor, name);
        log::debug!(
            "operator '{name}' for {vendor}: {}",
            if resolved.is_some() { "resolved" } else { "not found" }
        );
        self.cache
            .write()
            .expect("RwLock poisoned")
            .insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Like [`get`](Self::get) but a missing operator is an error.
    pub fn require(&self, session: &mut Session, name: &str) -> Result<Arc<dyn Operator>> {
        self.get(session, name)?
            .ok_or_else(|| GrainError::OperatorNotFound(name.to_string()))
    }

    fn vendor(&self, session: &mut Session) -> Result<Vendor> {
        if let Some(vendor) = self.vendor.read().expect("RwLock poisoned").as_ref() {
            return Ok(vendor.clone());
        }
        let vendor = session.vendor()?;
        *self.vendor.write().expect("RwLock poisoned") = Some(vendor.clone());
        Ok(vendor)
    }

    fn resolve(&self, vendor: &Vendor, name: &str) -> Option<Arc<dyn Operator>> {
        match self.rules.iter().find(|rule| (rule.predicate)(vendor)) {
            Some(rule) => rule
                .operators
                .get(name)
                .or_else(|| self.defaults.get(name))
                .cloned(),
            None => self.defaults.get(name).cloned(),
        }
    }
}

fn default_operators() -> OperatorMap {
    let mut operators = OperatorMap::new();
    operators.insert(INSERT.to_string(), Arc::new(PerRow(Insert)));
    operators.insert(UPDATE.to_string(), Arc::new(PerRow(Update)));
    operators.insert(REFRESH.to_string(), Arc::new(PerRow(Refresh)));
    operators.insert(DELETE.to_string(), Arc::new(PerRow(Delete)));
    operators.insert(DELETE_ALL.to_string(), Arc::new(TableBased(DeleteAll)));
    operators.insert(TRUNCATE.to_string(), Arc::new(TableBased(Truncate)));
    operators.insert(NONE.to_string(), Arc::new(Noop));
    operators
}
