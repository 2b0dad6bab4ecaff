use serde::{Deserialize, Serialize};

/// How a vendor stores unquoted identifiers in its catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IdentifierCase {
    /// Folded to upper case (Oracle, DB2, H2)
    Upper,
    /// Folded to lower case (PostgreSQL)
    Lower,
    /// Stored as written, compared case-insensitively (SQLite, SQL Server, MySQL on most platforms)
    #[default]
    Insensitive,
    /// Stored and compared exactly as written
    Sensitive,
}

/// Vendor identifier rules: case folding and the quote string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierRules {
    pub quote: String,
    pub case: IdentifierCase,
}

impl IdentifierRules {
    #[must_use]
    pub fn new(quote: &str, case: IdentifierCase) -> Self {
        Self {
            quote: quote.to_string(),
            case,
        }
    }

    /// Comparison key for an identifier under these rules.
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        match self.case {
            IdentifierCase::Upper => name.to_uppercase(),
            IdentifierCase::Lower | IdentifierCase::Insensitive => name.to_lowercase(),
            IdentifierCase::Sensitive => name.to_string(),
        }
    }

    /// Quotes an identifier, doubling embedded quote characters.
    /// A blank quote string means the vendor does not support quoting.
    #[must_use]
    pub fn quote(&self, name: &str) -> String {
        if self.quote.trim().is_empty() {
            return name.to_string();
        }
        let escaped = name.replace(&self.quote, &self.quote.repeat(2));
        format!("{q}{escaped}{q}", q = self.quote)
    }
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self::new("\"", IdentifierCase::default())
    }
}
