// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod identifier;
pub mod column;
pub mod table;
pub mod field;
pub mod row;
pub mod grain;

// Re-exports for convenience
pub use error::{GrainError, Result};
pub use value::Value;
pub use data_type::DataType;
pub use identifier::{IdentifierCase, IdentifierRules};
pub use column::SchemaColumn;
pub use table::{SchemaTable, TableBuilder};
pub use field::DataField;
pub use row::{DataRow, RowBuilder};
pub use grain::DataGrain;
