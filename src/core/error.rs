use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrainError {
    /// A declared field has no matching column in the live table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Operator '{0}' not found")]
    OperatorNotFound(String),
    #[error("{kind} '{name}' not found")]
    ResourceNotFound { kind: &'static str, name: String },
    #[error("Precondition failed: {0}")]
    Precondition(String),
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Database error: {0}")]
    Database(String),
    /// Single error kind surfaced by the conductor for any failure it observed
    #[error("Conduct failed: {0}")]
    Conduct(Box<GrainError>),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl GrainError {
    /// Unwraps any `Conduct` layers and returns the underlying failure.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Conduct(inner) => inner.root(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self.root(), Self::ColumnNotFound { .. } | Self::TableNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, GrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_nested_conduct() {
        let err = GrainError::Conduct(Box::new(GrainError::Conduct(Box::new(
            GrainError::TableNotFound("users".to_string()),
        ))));
        assert!(matches!(err.root(), GrainError::TableNotFound(t) if t == "users"));
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn test_display() {
        let err = GrainError::ColumnNotFound {
            table: "users".to_string(),
            column: "age".to_string(),
        };
        assert_eq!(err.to_string(), "Column 'age' not found in table 'users'");
    }
}
