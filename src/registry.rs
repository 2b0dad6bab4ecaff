use std::collections::HashMap;
use std::sync::Arc;
use crate::conductor::Session;
use crate::core::{GrainError, Result, Value};
use crate::decorator::Decorator;
use crate::operator::Operator;

/// Zero-argument value source, e.g. for lazy replacements
pub type Supplier = Arc<dyn Fn() -> Value + Send + Sync>;

/// Raw piece of work run against the session, e.g. a SQL script
pub type SqlFunction = Arc<dyn Fn(&mut Session) -> Result<()> + Send + Sync>;

/// Dynamic operator lookup consulted after the local operator map
pub type OperatorLookup = Arc<dyn Fn(&str) -> Option<Arc<dyn Operator>> + Send + Sync>;

/// Named operators, decorators, suppliers and functions available to
/// fixtures.
///
/// Lookups try the local map first, then (operators only) the dynamic
/// lookup, then the parent configuration.
#[derive(Clone, Default)]
pub struct Configuration {
    parent: Option<Arc<Configuration>>,
    operators: HashMap<String, Arc<dyn Operator>>,
    operator_lookup: Option<OperatorLookup>,
    decorators: HashMap<String, Arc<dyn Decorator>>,
    suppliers: HashMap<String, Supplier>,
    functions: HashMap<String, SqlFunction>,
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty configuration that delegates misses to `parent`
    #[must_use]
    pub fn child(parent: Arc<Self>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_operator(mut self, name: &str, operator: impl Operator + 'static) -> Self {
        self.operators.insert(name.to_string(), Arc::new(operator));
        self
    }

    #[must_use]
    pub fn with_operator_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Arc<dyn Operator>> + Send + Sync + 'static,
    {
        self.operator_lookup = Some(Arc::new(lookup));
        self
    }

    #[must_use]
    pub fn with_decorator(mut self, name: &str, decorator: impl Decorator + 'static) -> Self {
        self.decorators.insert(name.to_string(), Arc::new(decorator));
        self
    }

    #[must_use]
    pub fn with_supplier<F>(mut self, name: &str, supplier: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.suppliers.insert(name.to_string(), Arc::new(supplier));
        self
    }

    #[must_use]
    pub fn with_function<F>(mut self, name: &str, function: F) -> Self
    where
        F: Fn(&mut Session) -> Result<()> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Arc::new(function));
        self
    }

    pub fn operator(&self, name: &str) -> Option<Arc<dyn Operator>> {
        self.operators
            .get(name)
            .cloned()
            .or_else(|| self.operator_lookup.as_ref().and_then(|lookup| lookup(name)))
            .or_else(|| self.parent.as_ref().and_then(|p| p.operator(name)))
    }

    pub fn decorator(&self, name: &str) -> Option<Arc<dyn Decorator>> {
        self.decorators
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.decorator(name)))
    }

    pub fn supplier(&self, name: &str) -> Option<Supplier> {
        self.suppliers
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.supplier(name)))
    }

    pub fn function(&self, name: &str) -> Option<SqlFunction> {
        self.functions
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.function(name)))
    }

    pub fn require_decorator(&self, name: &str) -> Result<Arc<dyn Decorator>> {
        self.decorator(name).ok_or_else(|| missing("decorator", name))
    }

    pub fn require_supplier(&self, name: &str) -> Result<Supplier> {
        self.supplier(name).ok_or_else(|| missing("supplier", name))
    }

    pub fn require_function(&self, name: &str) -> Result<SqlFunction> {
        self.function(name).ok_or_else(|| missing("function", name))
    }
}

fn missing(kind: &'static str, name: &str) -> GrainError {
    GrainError::ResourceNotFound {
        kind,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Noop, PerRow, Insert};

    #[test]
    fn test_local_then_lookup_then_parent() {
        let parent = Arc::new(
            Configuration::new()
                .with_operator("seed", Noop)
                .with_supplier("now", || Value::Integer(1)),
        );
        let child = Configuration::child(Arc::clone(&parent))
            .with_operator("seed", PerRow(Insert))
            .with_operator_lookup(|name| {
                (name == "dynamic").then(|| Arc::new(Noop) as Arc<dyn Operator>)
            });

        let local = child.operator("seed").unwrap();
        assert!(!Arc::ptr_eq(&local, &parent.operator("seed").unwrap()));
        assert!(child.operator("dynamic").is_some());
        assert!(child.operator("other").is_none());
        assert_eq!(child.require_supplier("now").unwrap()(), Value::Integer(1));
    }

    #[test]
    fn test_missing_names_are_reported_with_kind() {
        let config = Configuration::new();
        assert!(matches!(
            config.require_decorator("nulls"),
            Err(GrainError::ResourceNotFound { kind: "decorator", name }) if name == "nulls"
        ));
        assert!(matches!(
            config.require_function("setup.sql"),
            Err(GrainError::ResourceNotFound { kind: "function", .. })
        ));
    }
}
