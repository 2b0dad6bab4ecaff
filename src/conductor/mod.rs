/// Conductor - entry point that applies grains through a data source
///
/// Each conduct call checks out one connection, wraps it in a [`Session`],
/// loads schemas, decorates, runs the operator and releases the connection.

pub mod session;

pub use session::Session;

use std::sync::Arc;
use crate::connection::{Connection, DataSource, IsolationLevel, Vendor};
use crate::core::{DataGrain, GrainError, Result};
use crate::decorator::{Decorator, SchemaLoader};
use crate::operator::{Operator, OperatorFactory, OperatorMap};

/// Translates any failure observed by the conductor into the error it surfaces
pub type ErrorMapper = Arc<dyn Fn(GrainError) -> GrainError + Send + Sync>;

/// Default mapping: wrap once in [`GrainError::Conduct`].
#[must_use]
pub fn wrap_error(err: GrainError) -> GrainError {
    match err {
        GrainError::Conduct(_) => err,
        other => GrainError::Conduct(Box::new(other)),
    }
}

pub struct Conductor {
    source: Arc<dyn DataSource>,
    schema: SchemaLoader,
    operators: OperatorFactory,
    errors: ErrorMapper,
    isolation: Option<IsolationLevel>,
}

impl Conductor {
    pub fn new(source: impl DataSource + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            schema: SchemaLoader::new(),
            operators: OperatorFactory::new(),
            errors: Arc::new(wrap_error),
            isolation: None,
        }
    }

    #[must_use]
    pub fn with_error_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(GrainError) -> GrainError + Send + Sync + 'static,
    {
        self.errors = Arc::new(mapper);
        self
    }

    /// Isolation level requested by [`transaction`](Self::transaction)
    #[must_use]
    pub const fn with_isolation(mut self, isolation: Option<IsolationLevel>) -> Self {
        self.isolation = isolation;
        self
    }

    #[must_use]
    pub fn with_operators(mut self, operators: OperatorFactory) -> Self {
        self.operators = operators;
        self
    }

    /// Adds a user vendor rule; see [`OperatorFactory::register`].
    pub fn register<P>(&mut self, predicate: P, operators: OperatorMap)
    where
        P: Fn(&Vendor) -> bool + Send + Sync + 'static,
    {
        self.operators.register(predicate, operators);
    }

    pub fn operators(&self) -> &OperatorFactory {
        &self.operators
    }

    pub fn schema_loader(&self) -> &SchemaLoader {
        &self.schema
    }

    pub const fn isolation(&self) -> Option<IsolationLevel> {
        self.isolation
    }

    /// Runs `f` with a fresh session and maps any error it returns.
    ///
    /// The connection is checked out before `f` runs and dropped right after,
    /// whatever `f` returned.
    pub fn conduct_with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        let connection: Box<dyn Connection> = self.source.connection().map_err(|e| (self.errors)(e))?;
        let mut session = Session::new(connection);
        let result = f(&mut session);
        drop(session);
        result.map_err(|e| {
            log::warn!("conduct failed: {e}");
            (self.errors)(e)
        })
    }

    /// Schema loading followed by the optional extra decorator.
    pub fn decorate(
        &self,
        session: &mut Session,
        grain: &DataGrain,
        decorator: Option<&dyn Decorator>,
    ) -> Result<DataGrain> {
        let loaded = grain.decorate(session, &self.schema)?;
        match decorator {
            Some(decorator) => loaded.decorate(session, decorator),
            None => Ok(loaded),
        }
    }

    /// Decorates `grain` and applies `operator` within an existing session.
    pub fn apply(
        &self,
        session: &mut Session,
        grain: &DataGrain,
        operator: &dyn Operator,
        decorator: Option<&dyn Decorator>,
    ) -> Result<DataGrain> {
        let decorated = self.decorate(session, grain, decorator)?;
        log::info!(
            "applying {} rows over tables {:?}",
            decorated.len(),
            decorated.tables()
        );
        operator.operate(session, decorated)
    }

    pub fn conduct(
        &self,
        grain: &DataGrain,
        operator: &dyn Operator,
        decorator: Option<&dyn Decorator>,
    ) -> Result<DataGrain> {
        self.conduct_with(|session| self.apply(session, grain, operator, decorator))
    }

    /// Like [`conduct`](Self::conduct) with the operator resolved by name for
    /// the connected vendor.
    pub fn conduct_named(
        &self,
        grain: &DataGrain,
        operator: &str,
        decorator: Option<&dyn Decorator>,
    ) -> Result<DataGrain> {
        self.conduct_with(|session| {
            let operator = self.operators.require(session, operator)?;
            self.apply(session, grain, operator.as_ref(), decorator)
        })
    }

    /// Runs `f` in one transaction on one connection.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        self.conduct_with(|session| session.transaction(self.isolation, f))
    }
}
