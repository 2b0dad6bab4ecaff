use crate::connection::{Connection, IsolationLevel, Vendor};
use crate::core::{IdentifierRules, Result, Value};
use crate::transaction;

/// Request-scoped execution context.
///
/// Owns the connection checked out for one conduct call and is passed by
/// `&mut` to every decorator, operator and function that runs during the
/// call. Dropping the session releases the connection.
pub struct Session {
    connection: Box<dyn Connection>,
    vendor: Option<Vendor>,
    rules: Option<IdentifierRules>,
}

impl Session {
    #[must_use]
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Self {
            connection,
            vendor: None,
            rules: None,
        }
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        self.connection.as_mut()
    }

    /// Vendor of the session's connection, probed at most once per session.
    pub fn vendor(&mut self) -> Result<Vendor> {
        if let Some(vendor) = &self.vendor {
            return Ok(vendor.clone());
        }
        let vendor = self.connection.vendor()?;
        log::debug!("connected to {vendor}");
        self.vendor = Some(vendor.clone());
        Ok(vendor)
    }

    pub fn identifier_rules(&mut self) -> Result<IdentifierRules> {
        if let Some(rules) = &self.rules {
            return Ok(rules.clone());
        }
        let rules = self.connection.identifier_rules()?;
        self.rules = Some(rules.clone());
        Ok(rules)
    }

    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        log::debug!("{sql} {params:?}");
        self.connection.execute(sql, params)
    }

    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        log::debug!("batch: {sql}");
        self.connection.execute_batch(sql)
    }

    pub fn query_count(&mut self, sql: &str, params: &[Value]) -> Result<i64> {
        log::debug!("{sql} {params:?}");
        self.connection.query_count(sql, params)
    }

    /// Runs `f` inside a transaction on this session's connection,
    /// see [`transaction::within`].
    pub fn transaction<T, F>(&mut self, isolation: Option<IsolationLevel>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        transaction::within(self, isolation, f)
    }
}
