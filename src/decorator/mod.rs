//! Row decorators.
//!
//! A decorator receives the mutable builder view of a row before an
//! operator sees it. Decorators compose with [`chain`] and [`predicate`];
//! field-level decorators ([`FieldDecorator`]) lift to row level with
//! [`FieldDecorator::into_decorator`].

mod replace;
mod schema;

pub use replace::{ReplaceFieldDataDecorator, ReplaceBuilder};
pub use schema::SchemaLoader;

use std::sync::Arc;
use crate::conductor::Session;
use crate::core::{DataField, Result, RowBuilder};

pub trait Decorator: Send + Sync {
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()>;
}

impl<D: Decorator + ?Sized> Decorator for Arc<D> {
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()> {
        (**self).decorate(session, row)
    }
}

impl<D: Decorator + ?Sized> Decorator for Box<D> {
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()> {
        (**self).decorate(session, row)
    }
}

/// Decorator backed by a closure
pub struct FnDecorator<F>(F);

impl<F> Decorator for FnDecorator<F>
where
    F: Fn(&mut Session, &mut RowBuilder) -> Result<()> + Send + Sync,
{
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()> {
        (self.0)(session, row)
    }
}

pub fn from_fn<F>(f: F) -> FnDecorator<F>
where
    F: Fn(&mut Session, &mut RowBuilder) -> Result<()> + Send + Sync,
{
    FnDecorator(f)
}

/// Runs every decorator in order. Errors still stop the chain.
pub struct Chain {
    decorators: Vec<Arc<dyn Decorator>>,
}

impl Decorator for Chain {
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()> {
        for decorator in &self.decorators {
            decorator.decorate(session, row)?;
        }
        Ok(())
    }
}

pub fn chain<I>(decorators: I) -> Chain
where
    I: IntoIterator<Item = Arc<dyn Decorator>>,
{
    Chain {
        decorators: decorators.into_iter().collect(),
    }
}

/// Runs the inner decorator only for rows accepted by the predicate
pub struct Guarded<P, D> {
    predicate: P,
    inner: D,
}

impl<P, D> Decorator for Guarded<P, D>
where
    P: Fn(&RowBuilder) -> bool + Send + Sync,
    D: Decorator,
{
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()> {
        if (self.predicate)(row) {
            self.inner.decorate(session, row)
        } else {
            Ok(())
        }
    }
}

pub fn predicate<P, D>(predicate: P, inner: D) -> Guarded<P, D>
where
    P: Fn(&RowBuilder) -> bool + Send + Sync,
    D: Decorator,
{
    Guarded { predicate, inner }
}

/// Predicate accepting rows of one table (compared under the row's identifier rules)
pub fn on_table(table: &str) -> impl Fn(&RowBuilder) -> bool + Send + Sync + use<> {
    let table = table.to_string();
    move |row: &RowBuilder| {
        let rules = row.schema().rules();
        rules.normalize(row.schema().name()) == rules.normalize(&table)
    }
}

/// Decorator applied to each field of a row independently
pub trait FieldDecorator: Send + Sync {
    fn decorate(&self, session: &mut Session, field: &mut DataField) -> Result<()>;

    fn into_decorator(self) -> PerField<Self>
    where
        Self: Sized,
    {
        PerField(self)
    }
}

/// Row-level form of a [`FieldDecorator`]
pub struct PerField<D>(D);

impl<D: FieldDecorator> Decorator for PerField<D> {
    fn decorate(&self, session: &mut Session, row: &mut RowBuilder) -> Result<()> {
        for field in row.fields_mut() {
            self.0.decorate(session, field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ScriptedConnection, Vendor, SQLITE};
    use crate::core::{DataRow, SchemaTable, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session() -> Session {
        Session::new(Box::new(ScriptedConnection::new(Vendor::new(SQLITE, "3"))))
    }

    fn row(table: &str) -> RowBuilder {
        DataRow::builder(Arc::new(SchemaTable::named(table))).set("n", 1i64)
    }

    fn increment() -> Arc<dyn Decorator> {
        Arc::new(from_fn(|_, row: &mut RowBuilder| {
            let n = row.field("n").and_then(|f| f.value().as_int()).unwrap_or(0);
            let field = row.field("n").map(|f| f.with_value(n + 1));
            if let Some(field) = field {
                row.put(field);
            }
            Ok(())
        }))
    }

    #[test]
    fn test_chain_runs_all_in_order() {
        let mut session = session();
        let mut builder = row("t");
        chain([increment(), increment(), increment()])
            .decorate(&mut session, &mut builder)
            .unwrap();
        assert_eq!(builder.field("n").map(|f| f.value().clone()), Some(Value::Integer(4)));
    }

    #[test]
    fn test_predicate_guards_by_table() {
        let mut session = session();
        let guarded = predicate(on_table("USERS"), increment());

        let mut users = row("users");
        guarded.decorate(&mut session, &mut users).unwrap();
        let mut orders = row("orders");
        guarded.decorate(&mut session, &mut orders).unwrap();

        assert_eq!(users.field("n").map(|f| f.value().clone()), Some(Value::Integer(2)));
        assert_eq!(orders.field("n").map(|f| f.value().clone()), Some(Value::Integer(1)));
    }

    struct Counting(AtomicUsize);

    impl FieldDecorator for Counting {
        fn decorate(&self, _: &mut Session, _: &mut DataField) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_field_decorator_visits_every_field() {
        let mut session = session();
        let mut builder = row("t").set("a", 1i64).set("b", 2i64);
        let per_field = Counting(AtomicUsize::new(0)).into_decorator();
        per_field.decorate(&mut session, &mut builder).unwrap();
        assert_eq!(per_field.0 .0.load(Ordering::SeqCst), 3);
    }
}
