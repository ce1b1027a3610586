//! Merging model output back onto the survey table.

use ahash::AHashMap;
use polars::prelude::{Column, DataFrame, PlSmallStr};

use crate::{
    error::{Error, Result, Stage},
    gwr::{FittedModel, RegressionSpec, INTERCEPT},
    moran::MoranStatistics,
    table::{write_csv_bytes, FeatureTable},
};

/// Tag the survey host uses to mark numeric columns.
pub const NUMBER_TAG: &str = "#number";

/// Column holding residuals.
pub const RESIDUAL: &str = "residual";
/// Column holding fitted values.
pub const FITTED: &str = "fitted";
/// Column holding local Moran's I.
pub const LOCAL_I: &str = "local_I";

/// Column name under which a computed numeric value is published.
/// An existing `#number` tag on `base` is not repeated.
pub fn numeric_column_name(base: &str) -> String {
    let base = base.trim();
    let base = base.strip_suffix(NUMBER_TAG).unwrap_or(base).trim_end();
    format!("{base}{NUMBER_TAG}")
}

/// Column name of a derived variable, in the host's spaced form (`ratio #number`).
pub fn derived_column_name(base: &str) -> String {
    let base = base.trim();
    let base = base.strip_suffix(NUMBER_TAG).unwrap_or(base).trim_end();
    format!("{base} {NUMBER_TAG}")
}

/// Column holding the local coefficient of the independent variable `variable`.
pub fn coefficient_column_name(variable: &str) -> String {
    let variable = variable.trim();
    let variable = variable.strip_suffix(NUMBER_TAG).unwrap_or(variable).trim_end();
    numeric_column_name(&format!("coef_{variable}"))
}

/// Names of the coefficient columns, intercept first.
pub fn coefficient_column_names(spec: &RegressionSpec) -> Vec<String> {
    std::iter::once(numeric_column_name(INTERCEPT))
        .chain(spec.independent().iter().map(|name| coefficient_column_name(name)))
        .collect()
}

/// Spread `values` (aligned with `row_ids`) over every row of `table`, leaving nulls
/// where a row has no value.
fn align(table_rows: &[u32], row_ids: &[u32], values: impl Iterator<Item = f64>) -> Vec<Option<f64>> {
    let by_row = row_ids.iter().copied().zip(values).collect::<AHashMap<u32, f64>>();
    table_rows.iter().map(|row| by_row.get(row).copied()).collect()
}

/// Copy of `original` with coefficient, fitted, residual and local Moran's I columns.
///
/// Rows the model did not use get nulls. Columns with the same names are
/// replaced, so assembling twice yields the same columns. Without `moran` the
/// local I column is all null.
pub fn assemble(
    original: &FeatureTable,
    spec: &RegressionSpec,
    model: &FittedModel,
    moran: Option<&MoranStatistics>,
) -> Result<FeatureTable> {
    let rows = original.row_ids()?;
    let mut table = original.clone();

    for (j, name) in coefficient_column_names(spec).iter().enumerate() {
        let values = align(&rows, &model.row_ids, model.params.column(j).iter().copied());
        table.set_numeric_column(name, values)?;
    }
    table.set_numeric_column(&numeric_column_name(FITTED), align(&rows, &model.row_ids, model.fitted.iter().copied()))?;
    table.set_numeric_column(&numeric_column_name(RESIDUAL), align(&rows, &model.row_ids, model.residuals.iter().copied()))?;

    let local_i = match moran {
        Some(stats) => align(&rows, &model.row_ids, stats.local_i.iter().copied()),
        None => vec![None; rows.len()],
    };
    table.set_numeric_column(&numeric_column_name(LOCAL_I), local_i)?;

    Ok(table)
}

fn artifact(model: &FittedModel, columns: impl IntoIterator<Item = Column>) -> Result<Vec<u8>> {
    let row_id = Column::new(PlSmallStr::from_static("row_id"), model.row_ids.clone());
    let mut df = DataFrame::new(std::iter::once(row_id).chain(columns).collect())
        .map_err(Error::data(Stage::Assemble))?;
    write_csv_bytes(&mut df)
}

/// CSV of the local coefficients, one row per observation used in the fit.
pub fn coefficients_csv(spec: &RegressionSpec, model: &FittedModel) -> Result<Vec<u8>> {
    let columns = coefficient_column_names(spec).into_iter().enumerate()
        .map(|(j, name)| Column::new(name.into(), model.params.column(j).to_vec()))
        .collect::<Vec<_>>();
    artifact(model, columns)
}

/// CSV of fitted values and residuals, one row per observation used in the fit.
pub fn residuals_csv(model: &FittedModel) -> Result<Vec<u8>> {
    artifact(model, [
        Column::new(numeric_column_name(FITTED).into(), model.fitted.to_vec()),
        Column::new(numeric_column_name(RESIDUAL).into(), model.residuals.to_vec()),
    ])
}
