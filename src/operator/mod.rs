/// Operator module - named strategies that apply a grain to the database
///
/// Structure:
/// - sql: default statement-generating operators (insert, update, refresh, delete, ...)
/// - identity: SQL Server identity-column handling
/// - dispatcher: vendor-aware name → operator resolution with caching

pub mod sql;
pub mod identity;
pub mod dispatcher;

pub use dispatcher::{OperatorFactory, OperatorMap, RuleOrigin, VendorPredicate, VendorRule};
pub use identity::IdentityInsert;
pub use sql::{Delete, DeleteAll, Insert, Refresh, Truncate, Update};

use std::collections::HashSet;
use std::sync::Arc;
use crate::conductor::Session;
use crate::core::{DataGrain, DataRow, Result};

pub const INSERT: &str = "insert";
pub const UPDATE: &str = "update";
pub const REFRESH: &str = "refresh";
pub const DELETE: &str = "delete";
pub const DELETE_ALL: &str = "delete-all";
pub const TRUNCATE: &str = "truncate";
pub const NONE: &str = "none";

/// Applies a whole grain and returns the grain as it now stands
pub trait Operator: Send + Sync {
    fn operate(&self, session: &mut Session, grain: DataGrain) -> Result<DataGrain>;
}

/// Applies a single row
pub trait RowOperator: Send + Sync {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow>;
}

impl<O: Operator + ?Sized> Operator for Arc<O> {
    fn operate(&self, session: &mut Session, grain: DataGrain) -> Result<DataGrain> {
        (**self).operate(session, grain)
    }
}

impl<R: RowOperator + ?Sized> RowOperator for Arc<R> {
    fn operate(&self, session: &mut Session, row: DataRow) -> Result<DataRow> {
        (**self).operate(session, row)
    }
}

/// Grain-level form of a row operator: rows in order, first to last
pub struct PerRow<R>(pub R);

impl<R: RowOperator> Operator for PerRow<R> {
    fn operate(&self, session: &mut Session, grain: DataGrain) -> Result<DataGrain> {
        let mut rows = Vec::with_capacity(grain.len());
        for row in grain.into_rows() {
            rows.push(self.0.operate(session, row)?);
        }
        Ok(DataGrain::new(rows))
    }
}

/// Runs a table-wide row operator once per distinct table of the grain.
///
/// The set of processed tables lives for one `operate` call, not for the
/// lifetime of the instance: a dispatched operator is cached and shared, so
/// the same instance must clear a table again on every later grain.
pub struct TableBased<R>(pub R);

impl<R: RowOperator> Operator for TableBased<R> {
    fn operate(&self, session: &mut Session, grain: DataGrain) -> Result<DataGrain> {
        let rules = session.identifier_rules()?;
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(grain.len());
        for row in grain.into_rows() {
            if seen.insert(row.table().identifier(&rules)) {
                rows.push(self.0.operate(session, row)?);
            } else {
                log::debug!("table {} already processed, skipping row", row.table().name());
                rows.push(row);
            }
        }
        Ok(DataGrain::new(rows))
    }
}

/// Leaves the database and the grain untouched
pub struct Noop;

impl Operator for Noop {
    fn operate(&self, _session: &mut Session, grain: DataGrain) -> Result<DataGrain> {
        Ok(grain)
    }
}

/// Operator backed by a closure
pub struct FnOperator<F>(F);

impl<F> Operator for FnOperator<F>
where
    F: Fn(&mut Session, DataGrain) -> Result<DataGrain> + Send + Sync,
{
    fn operate(&self, session: &mut Session, grain: DataGrain) -> Result<DataGrain> {
        (self.0)(session, grain)
    }
}

pub fn from_fn<F>(f: F) -> FnOperator<F>
where
    F: Fn(&mut Session, DataGrain) -> Result<DataGrain> + Send + Sync,
{
    FnOperator(f)
}
