use serde::{Deserialize, Serialize};

/// Vendor-neutral classification of a column type reported by the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    // Numeric types
    SmallInt,
    Integer,
    BigInt,
    Real,
    Numeric,
    // String types
    Text,
    Varchar,
    Char,
    // Boolean
    Boolean,
    // Date/Time types
    Date,
    Timestamp,
    TimestampTz,
    // Special types
    Uuid,
    Json,
    Bytea,
    /// Type name not recognised
    Other,
}

impl DataType {
    /// Classifies a declared SQL type name such as `VARCHAR(32)` or `bigint`.
    ///
    /// Known names are matched first; anything else falls back to the
    /// SQLite affinity rules (substring search on INT, CHAR/CLOB/TEXT,
    /// BLOB, REAL/FLOA/DOUB).
    #[must_use]
    pub fn from_sql_type(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();

        match base {
            "SMALLINT" | "INT2" | "TINYINT" => return Self::SmallInt,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" | "SERIAL" => return Self::Integer,
            "BIGINT" | "INT8" | "BIGSERIAL" => return Self::BigInt,
            "REAL" | "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE" | "DOUBLE PRECISION" => {
                return Self::Real;
            }
            "NUMERIC" | "DECIMAL" | "NUMBER" | "MONEY" => return Self::Numeric,
            "TEXT" | "CLOB" | "NTEXT" => return Self::Text,
            "VARCHAR" | "NVARCHAR" | "VARCHAR2" | "CHARACTER VARYING" => return Self::Varchar,
            "CHAR" | "NCHAR" | "CHARACTER" => return Self::Char,
            "BOOL" | "BOOLEAN" | "BIT" => return Self::Boolean,
            "DATE" => return Self::Date,
            "DATETIME" | "TIMESTAMP" | "DATETIME2" => return Self::Timestamp,
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" | "DATETIMEOFFSET" => {
                return Self::TimestampTz;
            }
            "UUID" | "UNIQUEIDENTIFIER" => return Self::Uuid,
            "JSON" | "JSONB" => return Self::Json,
            "BLOB" | "BYTEA" | "VARBINARY" | "BINARY" => return Self::Bytea,
            _ => {}
        }

        if upper.contains("INT") {
            Self::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Self::Text
        } else if upper.contains("BLOB") {
            Self::Bytea
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Self::Real
        } else if upper.is_empty() {
            Self::Other
        } else {
            Self::Numeric
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_type_names() {
        assert_eq!(DataType::from_sql_type("integer"), DataType::Integer);
        assert_eq!(DataType::from_sql_type("VARCHAR(32)"), DataType::Varchar);
        assert_eq!(DataType::from_sql_type("timestamp with time zone"), DataType::TimestampTz);
        assert_eq!(DataType::from_sql_type("bytea"), DataType::Bytea);
    }

    #[test]
    fn test_affinity_fallback() {
        assert_eq!(DataType::from_sql_type("UNSIGNED BIG INT"), DataType::Integer);
        assert_eq!(DataType::from_sql_type("VARYING CHARACTER(255)"), DataType::Text);
        assert_eq!(DataType::from_sql_type("DECIMAL(10,5)"), DataType::Numeric);
        assert_eq!(DataType::from_sql_type(""), DataType::Other);
    }
}
