use super::error::Result;
use super::row::DataRow;
use crate::conductor::Session;
use crate::decorator::Decorator;

/// Ordered rows, possibly of several tables: the unit of fixture data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataGrain {
    rows: Vec<DataRow>,
}

impl DataGrain {
    #[must_use]
    pub const fn new(rows: Vec<DataRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataRow> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<DataRow> {
        self.rows
    }

    /// New grain whose rows were each rebuilt through `decorator`.
    /// This grain is left untouched.
    pub fn decorate(&self, session: &mut Session, decorator: &dyn Decorator) -> Result<Self> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut builder = row.to_builder();
            decorator.decorate(session, &mut builder)?;
            rows.push(builder.build());
        }
        Ok(Self { rows })
    }

    /// This grain's rows followed by `other`'s rows.
    #[must_use]
    pub fn aggregate(&self, other: &Self) -> Self {
        let mut rows = Vec::with_capacity(self.rows.len() + other.rows.len());
        rows.extend(self.rows.iter().cloned());
        rows.extend(other.rows.iter().cloned());
        Self { rows }
    }

    /// Distinct table names in first-seen order.
    #[must_use]
    pub fn tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            let name = row.table().name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl From<Vec<DataRow>> for DataGrain {
    fn from(rows: Vec<DataRow>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<DataRow> for DataGrain {
    fn from_iter<I: IntoIterator<Item = DataRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DataGrain {
    type Item = &'a DataRow;
    type IntoIter = std::slice::Iter<'a, DataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
