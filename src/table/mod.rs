//! Tabular survey data with an explicit column schema.

mod io;
mod schema;

use std::{collections::HashSet, path::Path};

use polars::prelude::{BooleanChunked, Column, DataFrame, DataType, NewChunkedArray, PlSmallStr};

pub use schema::{ColumnKind, ColumnSchema};

pub(crate) use io::write_csv_bytes;

use crate::error::{Error, Result, Stage};

/// Column carrying each record's position in the source CSV.
pub const ROW_ID: &str = "__row_id";

/// An ordered set of survey records, each identified by its original row id.
#[derive(Clone, Debug)]
pub struct FeatureTable {
    data: DataFrame,
    schema: Vec<ColumnSchema>,
}

impl FeatureTable {
    /// Wrap a freshly loaded DataFrame: trim column names, reject duplicates,
    /// number the rows and fix the column schema.
    pub fn from_dataframe(mut df: DataFrame) -> Result<Self> {
        let trimmed = df.get_column_names().iter()
            .map(|name| name.as_str().trim().to_string())
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        for name in &trimmed {
            if name == ROW_ID || !seen.insert(name.as_str()) {
                return Err(Error::DuplicateColumn(name.clone()));
            }
        }
        df.set_column_names(trimmed.iter().map(String::as_str))
            .map_err(Error::data(Stage::Table))?;

        let height = df.height() as u32;
        df.insert_column(0, Column::new(PlSmallStr::from_static(ROW_ID), (0..height).collect::<Vec<u32>>()))
            .map_err(Error::data(Stage::Table))?;

        let schema = df.get_columns().iter().skip(1)
            .map(|column| ColumnSchema::infer(column.name().as_str(), column.dtype(), column.null_count()))
            .collect();

        Ok(Self { data: df, schema })
    }

    /// Parse CSV bytes (header row required).
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_dataframe(io::read_csv_bytes(bytes)?)
    }

    /// Read a CSV file from disk.
    pub fn read_csv(path: &Path) -> Result<Self> {
        Self::from_dataframe(io::read_csv_file(path)?)
    }

    /// Number of records.
    #[inline] pub fn height(&self) -> usize { self.data.height() }

    /// Whether the table has no records.
    #[inline] pub fn is_empty(&self) -> bool { self.data.height() == 0 }

    /// Column schema in column order (the row id column is not listed).
    #[inline] pub fn schema(&self) -> &[ColumnSchema] { &self.schema }

    /// Column names in column order (the row id column is not listed).
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|column| column.name.as_str()).collect()
    }

    /// Look up the schema entry of a column.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.schema.iter().find(|column| column.name == name)
    }

    #[inline] pub fn has_column(&self, name: &str) -> bool { self.column(name).is_some() }

    /// Columns usable as regression variables.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.schema.iter()
            .filter(|column| column.is_numeric())
            .map(|column| column.name.as_str())
            .collect()
    }

    /// Original row ids, in table order.
    pub fn row_ids(&self) -> Result<Vec<u32>> {
        let column = self.data.column(ROW_ID).map_err(Error::data(Stage::Table))?;
        Ok(column.u32().map_err(Error::data(Stage::Table))?.into_no_null_iter().collect())
    }

    /// Values of a column cast to f64. Unparseable or missing cells are `None`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.data.column(name).map_err(|_| Error::MissingColumn(name.to_string()))?;
        let cast = column.cast(&DataType::Float64).map_err(Error::data(Stage::Table))?;
        Ok(cast.f64().map_err(Error::data(Stage::Table))?.into_iter().collect())
    }

    /// Values of a column rendered as strings.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.data.column(name).map_err(|_| Error::MissingColumn(name.to_string()))?;
        let cast = column.cast(&DataType::String).map_err(Error::data(Stage::Table))?;
        Ok(cast.str().map_err(Error::data(Stage::Table))?
            .into_iter()
            .map(|value| value.map(str::to_owned))
            .collect())
    }

    /// Add a numeric column, replacing any existing column of the same name.
    pub fn set_numeric_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        let column = Column::new(name.into(), values);
        let null_count = column.null_count();
        self.data.with_column(column).map_err(Error::data(Stage::Assemble))?;

        let entry = ColumnSchema { name: name.to_string(), kind: ColumnKind::Numeric, nullable: null_count > 0 };
        match self.schema.iter_mut().find(|column| column.name == name) {
            Some(existing) => *existing = entry,
            None => self.schema.push(entry),
        }
        Ok(())
    }

    /// Keep only the rows flagged in `keep`.
    pub(crate) fn filter_rows(&self, keep: &[bool]) -> Result<Self> {
        let mask = BooleanChunked::from_slice(PlSmallStr::from_static("keep"), keep);
        let data = self.data.filter(&mask).map_err(Error::data(Stage::Table))?;
        let schema = self.schema.iter()
            .map(|entry| {
                let null_count = data.column(&entry.name).map(|c| c.null_count()).unwrap_or(0);
                ColumnSchema { nullable: null_count > 0, ..entry.clone() }
            })
            .collect();
        Ok(Self { data, schema })
    }

    /// Re-declare a column as the geometry column.
    pub(crate) fn mark_geometry(&mut self, name: &str) {
        if let Some(column) = self.schema.iter_mut().find(|column| column.name == name) {
            column.kind = ColumnKind::Geometry;
        }
    }

    /// The underlying frame, including the row id column.
    #[inline] pub fn dataframe(&self) -> &DataFrame { &self.data }

    /// The frame as the survey host sees it: no row id column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        self.data.drop(ROW_ID).map_err(Error::data(Stage::Table))
    }

    /// Serialize as CSV (no row id column).
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut df = self.to_dataframe()?;
        io::write_csv_bytes(&mut df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "name, x#number ,y#number,label\na,1,2.5,foo\nb,2,,bar\nc,3,4.5,\n";

    #[test]
    fn trims_names_and_numbers_rows() {
        let table = FeatureTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(table.column_names(), vec!["name", "x#number", "y#number", "label"]);
        assert_eq!(table.row_ids().unwrap(), vec![0, 1, 2]);
        assert_eq!(table.height(), 3);
    }

    #[test]
    fn schema_records_kind_and_nullability() {
        let table = FeatureTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(table.numeric_columns(), vec!["x#number", "y#number"]);

        let y = table.column("y#number").unwrap();
        assert_eq!(y.kind, ColumnKind::Numeric);
        assert!(y.nullable);
        assert!(!table.column("x#number").unwrap().nullable);
        assert_eq!(table.column("name").unwrap().kind, ColumnKind::Text);
    }

    #[test]
    fn duplicate_names_after_trim_are_rejected() {
        let err = FeatureTable::from_csv_bytes(b"a, a\n1,2\n").unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn numeric_values_keep_nulls() {
        let table = FeatureTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(table.numeric_values("y#number").unwrap(), vec![Some(2.5), None, Some(4.5)]);
        assert!(matches!(table.numeric_values("nope"), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn set_numeric_column_replaces_by_name() {
        let mut table = FeatureTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        table.set_numeric_column("z#number", vec![Some(1.0), None, Some(3.0)]).unwrap();
        table.set_numeric_column("z#number", vec![Some(7.0), Some(8.0), Some(9.0)]).unwrap();

        assert_eq!(table.column_names().iter().filter(|n| **n == "z#number").count(), 1);
        assert_eq!(table.numeric_values("z#number").unwrap(), vec![Some(7.0), Some(8.0), Some(9.0)]);
        assert!(!table.column("z#number").unwrap().nullable);
    }

    #[test]
    fn filter_rows_preserves_row_ids() {
        let table = FeatureTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        let filtered = table.filter_rows(&[true, false, true]).unwrap();
        assert_eq!(filtered.row_ids().unwrap(), vec![0, 2]);
        assert!(!filtered.column("y#number").unwrap().nullable);
    }

    #[test]
    fn csv_output_omits_row_ids() {
        let table = FeatureTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        let text = String::from_utf8(table.to_csv_bytes().unwrap()).unwrap();
        assert!(text.starts_with("name,x#number,y#number,label\n"));
        assert!(!text.contains(ROW_ID));
    }
}
