// sqlgrain - test-fixture data conduction for relational databases
// Grains of rows are decorated against the live schema and applied through
// named, vendor-aware operators

// Clippy configuration
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::type_complexity)]
#![allow(clippy::module_name_repetitions)]

// Schema model, tabular data model, values, errors
pub mod core;

// Connection seam and the SQLite backend
pub mod connection;

// Row decorators, schema loading
pub mod decorator;

// Default operators and vendor dispatch
pub mod operator;

// Conductor and request-scoped session
pub mod conductor;

// Transactional surrounding
pub mod transaction;

// Named operators, decorators, suppliers and functions
pub mod registry;

// Resource loading and SQL scripts
pub mod resource;

// Symmetric build/clean over sections
pub mod fixture;

// Layered runtime settings
pub mod settings;

// Re-export commonly used types for convenience
pub use crate::core::{DataField, DataGrain, DataRow, GrainError, Result, SchemaColumn, SchemaTable, Value};
pub use connection::{Connection, DataSource, IsolationLevel, SqliteSource, Vendor};
pub use decorator::{Decorator, FieldDecorator, ReplaceFieldDataDecorator, SchemaLoader};
pub use operator::{Operator, OperatorFactory, RowOperator};
pub use conductor::{Conductor, Session};
pub use registry::Configuration;
pub use resource::{DirectoryLoader, ResourceLoader};
pub use fixture::{Fixture, PreparedFixture, Section};
pub use settings::Settings;
