use ahash::AHashMap;

use crate::{
    assemble::coefficient_column_name,
    error::{Error, Result},
    table::FeatureTable,
};

/// Dependent variable plus an ordered list of independent variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegressionSpec {
    dependent: String,
    independent: Vec<String>,
}

impl RegressionSpec {
    pub fn new(dependent: impl Into<String>, independent: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            dependent: dependent.into(),
            independent: independent.into_iter().map(Into::into).collect(),
        }
    }

    #[inline] pub fn dependent(&self) -> &str { &self.dependent }

    #[inline] pub fn independent(&self) -> &[String] { &self.independent }

    /// Number of coefficients per observation, intercept included.
    #[inline] pub fn num_params(&self) -> usize { self.independent.len() + 1 }

    /// Fewest complete rows a fit can use.
    #[inline] pub fn min_rows(&self) -> usize { self.independent.len() + 2 }

    /// Check that every variable is a numeric column of `table`, that there is
    /// at least one independent variable, that no column is used twice, and
    /// that no two independent variables share a coefficient column.
    pub fn validate(&self, table: &FeatureTable) -> Result<()> {
        if self.independent.is_empty() {
            return Err(Error::InvalidSpecification("select at least one independent variable".into()));
        }

        for name in std::iter::once(&self.dependent).chain(&self.independent) {
            let column = table.column(name)
                .ok_or_else(|| Error::InvalidSpecification(format!("column {name:?} does not exist")))?;
            if !column.is_numeric() {
                return Err(Error::InvalidSpecification(format!("column {name:?} is not numeric")));
            }
        }

        if self.independent.contains(&self.dependent) {
            return Err(Error::InvalidSpecification(format!(
                "{:?} cannot be both the dependent and an independent variable", self.dependent
            )));
        }

        let mut columns = AHashMap::new();
        for name in &self.independent {
            let column = coefficient_column_name(name);
            match columns.insert(column.clone(), name) {
                Some(previous) if previous == name => {
                    return Err(Error::InvalidSpecification(format!("independent variable {name:?} is listed twice")));
                }
                Some(previous) => {
                    return Err(Error::InvalidSpecification(format!(
                        "independent variables {previous:?} and {name:?} would both be published as {column:?}"
                    )));
                }
                None => {}
            }
        }

        Ok(())
    }
}
