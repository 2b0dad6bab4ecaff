use std::sync::Arc;
use super::FieldDecorator;
use crate::conductor::Session;
use crate::core::{DataField, Result, Value};

type FieldPredicate = Box<dyn Fn(&DataField) -> bool + Send + Sync>;
type Replacement = Box<dyn Fn(&DataField) -> DataField + Send + Sync>;

/// Replaces field values by rule, e.g. the marker `"[null]"` by SQL NULL.
///
/// Rules are tried in registration order and only the first rule whose
/// predicate accepts a field is applied to that field.
pub struct ReplaceFieldDataDecorator {
    rules: Vec<(FieldPredicate, Replacement)>,
}

impl ReplaceFieldDataDecorator {
    #[must_use]
    pub fn builder() -> ReplaceBuilder {
        ReplaceBuilder { rules: Vec::new() }
    }
}

impl FieldDecorator for ReplaceFieldDataDecorator {
    fn decorate(&self, _session: &mut Session, field: &mut DataField) -> Result<()> {
        if let Some((_, replace)) = self.rules.iter().find(|(accepts, _)| accepts(&*field)) {
            *field = replace(&*field);
        }
        Ok(())
    }
}

pub struct ReplaceBuilder {
    rules: Vec<(FieldPredicate, Replacement)>,
}

impl ReplaceBuilder {
    /// Fields equal to `from` become `to`.
    #[must_use]
    pub fn replace_value(self, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        let from = from.into();
        let to = to.into();
        self.replace_with(move |f| f.value() == &from, move |f| f.with_value(to.clone()))
    }

    /// Fields equal to `marker` get a lazily computed value; `supplier`
    /// runs at most once per replaced field, on first read.
    #[must_use]
    pub fn replace_lazy<S>(self, marker: impl Into<Value>, supplier: S) -> Self
    where
        S: Fn() -> Value + Send + Sync + 'static,
    {
        let marker = marker.into();
        let supplier = Arc::new(supplier);
        self.replace_with(
            move |f| f.value() == &marker,
            move |f| {
                let supplier = Arc::clone(&supplier);
                DataField::lazy(f.table(), f.column(), move || (*supplier)())
            },
        )
    }

    #[must_use]
    pub fn replace_with<P, R>(mut self, predicate: P, replacement: R) -> Self
    where
        P: Fn(&DataField) -> bool + Send + Sync + 'static,
        R: Fn(&DataField) -> DataField + Send + Sync + 'static,
    {
        self.rules.push((Box::new(predicate), Box::new(replacement)));
        self
    }

    #[must_use]
    pub fn build(self) -> ReplaceFieldDataDecorator {
        ReplaceFieldDataDecorator { rules: self.rules }
    }
}
