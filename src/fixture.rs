//! Fixtures: ordered sections with a symmetric build/clean pair.
//!
//! A front end (a file format, a test macro, hand-written code) translates
//! its document into [`Section`]s. [`Fixture::resolve`] checks every name
//! against a [`Configuration`] and the conductor's operators up front, so a
//! typo fails before anything touches the database.

use std::sync::Arc;
use crate::conductor::{Conductor, Session};
use crate::core::{DataGrain, GrainError, Result};
use crate::decorator::Decorator;
use crate::operator::Operator;
use crate::registry::{Configuration, SqlFunction};

pub enum Section {
    /// A grain applied with `build` and later removed with `clean`
    Data {
        grain: DataGrain,
        build: String,
        clean: String,
        decorator: Option<String>,
    },
    /// Registered functions run on build and on clean
    Function {
        build: Option<String>,
        clean: Option<String>,
    },
}

impl Section {
    pub fn data(grain: DataGrain, build: &str, clean: &str) -> Self {
        Self::Data {
            grain,
            build: build.to_string(),
            clean: clean.to_string(),
            decorator: None,
        }
    }

    /// Sets the decorator of a data section; function sections are unchanged.
    #[must_use]
    pub fn decorated(mut self, name: &str) -> Self {
        if let Self::Data { decorator, .. } = &mut self {
            *decorator = Some(name.to_string());
        }
        self
    }

    pub fn function(build: Option<&str>, clean: Option<&str>) -> Self {
        Self::Function {
            build: build.map(str::to_string),
            clean: clean.map(str::to_string),
        }
    }
}

#[derive(Default)]
pub struct Fixture {
    sections: Vec<Section>,
}

impl Fixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Resolves every operator, decorator and function name.
    ///
    /// Operators come from `config` first; names it does not define are left
    /// to the conductor's vendor dispatch and must at least be known there.
    pub fn resolve<'c>(self, config: &Configuration, conductor: &'c Conductor) -> Result<PreparedFixture<'c>> {
        let operator = |name: String| -> Result<OperatorRef> {
            if let Some(op) = config.operator(&name) {
                Ok(OperatorRef::Resolved(op))
            } else if conductor.operators().knows(&name) {
                Ok(OperatorRef::Dispatched(name))
            } else {
                Err(GrainError::ResourceNotFound { kind: "operator", name })
            }
        };
        let function = |name: Option<String>| name.map(|n| config.require_function(&n)).transpose();

        let mut steps = Vec::with_capacity(self.sections.len());
        for section in self.sections {
            steps.push(match section {
                Section::Data { grain, build, clean, decorator } => Step::Data {
                    grain,
                    build: operator(build)?,
                    clean: operator(clean)?,
                    decorator: decorator.map(|d| config.require_decorator(&d)).transpose()?,
                },
                Section::Function { build, clean } => Step::Function {
                    build: function(build)?,
                    clean: function(clean)?,
                },
            });
        }

        Ok(PreparedFixture {
            conductor,
            steps,
            built: None,
        })
    }
}

enum OperatorRef {
    Resolved(Arc<dyn Operator>),
    Dispatched(String),
}

impl OperatorRef {
    fn get(&self, conductor: &Conductor, session: &mut Session) -> Result<Arc<dyn Operator>> {
        match self {
            Self::Resolved(op) => Ok(Arc::clone(op)),
            Self::Dispatched(name) => conductor.operators().require(session, name),
        }
    }
}

enum Step {
    Data {
        grain: DataGrain,
        build: OperatorRef,
        clean: OperatorRef,
        decorator: Option<Arc<dyn Decorator>>,
    },
    Function {
        build: Option<SqlFunction>,
        clean: Option<SqlFunction>,
    },
}

impl Step {
    fn build(&self, conductor: &Conductor, session: &mut Session) -> Result<Option<DataGrain>> {
        match self {
            Self::Data { grain, build, decorator, .. } => {
                let op = build.get(conductor, session)?;
                conductor
                    .apply(session, grain, op.as_ref(), decorator.as_deref())
                    .map(Some)
            }
            Self::Function { build, .. } => {
                if let Some(f) = build {
                    f(session)?;
                }
                Ok(None)
            }
        }
    }

    fn clean(&self, conductor: &Conductor, session: &mut Session, built: Option<&DataGrain>) -> Result<()> {
        match (self, built) {
            (Self::Data { clean, .. }, Some(grain)) => {
                let op = clean.get(conductor, session)?;
                conductor.apply(session, grain, op.as_ref(), None)?;
                Ok(())
            }
            (Self::Function { clean: Some(f), .. }, _) => f(session),
            _ => Ok(()),
        }
    }
}

/// A fixture whose names are all resolved, bound to one conductor.
///
/// `build` applies the sections in order inside one transaction and keeps
/// the grains the build operators returned. `clean` runs each clean
/// operator on exactly those grains, last section first, also inside one
/// transaction.
pub struct PreparedFixture<'c> {
    conductor: &'c Conductor,
    steps: Vec<Step>,
    built: Option<Vec<Option<DataGrain>>>,
}

impl PreparedFixture<'_> {
    pub fn build(&mut self) -> Result<()> {
        if self.built.is_some() {
            return Err(GrainError::Usage("fixture is already built".to_string()));
        }
        let conductor = self.conductor;
        let steps = &self.steps;
        let built = conductor.transaction(|session| {
            steps
                .iter()
                .map(|step| step.build(conductor, session))
                .collect::<Result<Vec<_>>>()
        })?;
        log::info!("fixture built: {} sections", built.len());
        self.built = Some(built);
        Ok(())
    }

    pub fn clean(&mut self) -> Result<()> {
        let Some(built) = self.built.as_ref() else {
            return Err(GrainError::Usage("clean called before build".to_string()));
        };
        let conductor = self.conductor;
        let steps = &self.steps;
        conductor.transaction(|session| {
            for (step, grain) in steps.iter().zip(built).rev() {
                step.clean(conductor, session, grain.as_ref())?;
            }
            Ok(())
        })?;
        self.built = None;
        Ok(())
    }

    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Grains returned by the build operators, in section order
    pub fn built(&self) -> impl Iterator<Item = &DataGrain> {
        self.built.iter().flatten().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, ScriptedConnection, Vendor, SQLITE};
    use crate::core::{DataRow, SchemaTable, Value};
    use crate::decorator::ReplaceFieldDataDecorator;
    use crate::decorator::FieldDecorator;
    use crate::operator::{DELETE, INSERT};

    fn scripted() -> ScriptedConnection {
        ScriptedConnection::new(Vendor::new(SQLITE, "3"))
            .with_table("users", &["id", "name"])
            .with_table("orders", &["id", "user_id"])
    }

    fn conductor(conn: &ScriptedConnection) -> Conductor {
        let conn = conn.clone();
        Conductor::new(move || -> Result<Box<dyn Connection>> { Ok(Box::new(conn.clone())) })
    }

    fn row(table: &str, column: &str, value: &str) -> DataGrain {
        let schema = Arc::new(SchemaTable::builder(table).key("id").build());
        DataGrain::new(vec![DataRow::builder(schema).set("id", 1i64).set(column, value).build()])
    }

    #[test]
    fn test_clean_reverses_build() {
        let conn = scripted();
        let conductor = conductor(&conn);
        let config = Configuration::new().with_function("mark", |s: &mut Session| s.execute_batch("-- mark"));
        let mut fixture = Fixture::new()
            .section(Section::data(row("users", "name", "A"), INSERT, DELETE))
            .section(Section::function(Some("mark"), Some("mark")))
            .section(Section::data(row("orders", "user_id", "1"), INSERT, DELETE))
            .resolve(&config, &conductor)
            .unwrap();

        fixture.build().unwrap();
        assert_eq!(fixture.built().count(), 2);
        fixture.clean().unwrap();
        assert!(!fixture.is_built());

        let statements = conn.statements();
        assert_eq!(statements.len(), 6);
        assert!(statements[0].starts_with("INSERT INTO \"users\""));
        assert!(statements[2].starts_with("INSERT INTO \"orders\""));
        assert!(statements[3].starts_with("DELETE FROM \"orders\""));
        assert_eq!(statements[4], "-- mark");
        assert!(statements[5].starts_with("DELETE FROM \"users\""));
        assert_eq!(conn.commits(), 2);
    }

    #[test]
    fn test_clean_uses_built_grain() {
        let conn = scripted();
        let conductor = conductor(&conn);
        let config = Configuration::new().with_decorator(
            "rename",
            ReplaceFieldDataDecorator::builder()
                .replace_value("[me]", "Alice")
                .build()
                .into_decorator(),
        );
        let mut fixture = Fixture::new()
            .section(Section::data(row("users", "name", "[me]"), INSERT, "update").decorated("rename"))
            .resolve(&config, &conductor)
            .unwrap();
        fixture.build().unwrap();
        fixture.clean().unwrap();

        let recorded = conn.recorded();
        assert_eq!(recorded[1].0, "UPDATE \"users\" SET \"name\" = ? WHERE \"id\" = ?");
        assert_eq!(recorded[1].1[0], Value::from("Alice"));
    }

    #[test]
    fn test_clean_before_build_is_usage_error() {
        let conn = scripted();
        let conductor = conductor(&conn);
        let mut fixture = Fixture::new()
            .section(Section::data(row("users", "name", "A"), INSERT, DELETE))
            .resolve(&Configuration::new(), &conductor)
            .unwrap();
        assert!(matches!(fixture.clean(), Err(GrainError::Usage(_))));
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn test_unknown_names_fail_at_resolve() {
        let conn = scripted();
        let conductor = conductor(&conn);
        let unknown_op = Fixture::new()
            .section(Section::data(row("users", "name", "A"), "merge", DELETE))
            .resolve(&Configuration::new(), &conductor);
        assert!(matches!(unknown_op, Err(GrainError::ResourceNotFound { kind: "operator", .. })));

        let unknown_decorator = Fixture::new()
            .section(Section::data(row("users", "name", "A"), INSERT, DELETE).decorated("nulls"))
            .resolve(&Configuration::new(), &conductor);
        assert!(matches!(
            unknown_decorator,
            Err(GrainError::ResourceNotFound { kind: "decorator", .. })
        ));
        assert_eq!(conn.vendor_probes(), 0);
    }

    #[test]
    fn test_failed_build_rolls_back_and_stays_unbuilt() {
        let conn = scripted().failing_on("INSERT INTO \"orders\"");
        let conductor = conductor(&conn);
        let mut fixture = Fixture::new()
            .section(Section::data(row("users", "name", "A"), INSERT, DELETE))
            .section(Section::data(row("orders", "user_id", "1"), INSERT, DELETE))
            .resolve(&Configuration::new(), &conductor)
            .unwrap();

        assert!(fixture.build().is_err());
        assert_eq!(conn.rollbacks(), 1);
        assert!(matches!(fixture.clean(), Err(GrainError::Usage(_))));
    }
}
