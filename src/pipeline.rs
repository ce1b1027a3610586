//! A full analysis run: geometry, regression, autocorrelation, assembly.

use crate::{
    assemble,
    config::PipelineConfig,
    error::{Error, Result},
    geometry::{self, GeoTable, GeometrySource},
    gwr::{self, FittedModel, GwrData, RegressionSpec},
    moran::{self, MoranStatistics},
    session::Session,
    table::FeatureTable,
};

/// Row accounting and non-fatal problems of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunMetadata {
    pub geometry_source: GeometrySource,
    /// Rows in the source table.
    pub rows: usize,
    /// Rows without a usable geometry.
    pub rows_without_geometry: usize,
    /// Rows with geometry but a missing regression variable.
    pub rows_dropped: usize,
    /// Why Moran's I is missing, when it is.
    pub autocorrelation_error: Option<String>,
}

/// Everything a run produces.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub spec: RegressionSpec,
    pub model: FittedModel,
    pub moran: Option<MoranStatistics>,
    /// The source table with the computed columns added.
    pub augmented: FeatureTable,
    pub metadata: RunMetadata,
}

impl RunOutcome {
    /// Geometries of the augmented table, for mapping.
    pub fn geo(&self) -> Result<GeoTable> {
        geometry::resolve(&self.augmented)
    }

    pub fn coefficients_csv(&self) -> Result<Vec<u8>> {
        assemble::coefficients_csv(&self.spec, &self.model)
    }

    pub fn residuals_csv(&self) -> Result<Vec<u8>> {
        assemble::residuals_csv(&self.model)
    }
}

/// Run the analysis on `table`.
///
/// Input and model errors end the run. An autocorrelation failure does not:
/// the regression results are kept, the local I column is left empty and the
/// reason is recorded in the metadata.
pub fn run_table(table: &FeatureTable, spec: &RegressionSpec, config: &PipelineConfig) -> Result<RunOutcome> {
    let verbose = config.verbose;

    let geo = geometry::resolve(table)?;
    if verbose > 0 {
        eprintln!("[geometry] {} of {} rows have geometry ({:?})", geo.len(), table.height(), geo.source());
    }

    let data = GwrData::prepare(&geo, spec)?;
    if verbose > 0 {
        eprintln!("[gwr] fitting {} rows ({} dropped for missing values)", data.len(), data.dropped());
    }

    let model = gwr::fit(&data, spec, &config.gwr)?;
    if verbose > 0 {
        eprintln!("[gwr] bandwidth {} (AICc {:.3}, R² {:.4}, {} candidates)",
            model.bandwidth, model.aicc, model.r2, model.search.evaluated.len());
    }
    if verbose > 1 {
        for (bandwidth, score) in &model.search.evaluated {
            eprintln!("[gwr]   bw {bandwidth:>6} AICc {score:.4}");
        }
    }

    let residuals = model.residuals.to_vec();
    let (moran, autocorrelation_error) =
        match moran::analyze(data.shapes(), &residuals, data.row_ids(), &config.moran) {
            Ok(stats) => {
                if verbose > 0 {
                    eprintln!("[moran] {:?} weights: I = {:.4}, p = {}", stats.weights, stats.global_i,
                        stats.p_value.map_or("n/a".to_string(), |p| format!("{p:.4}")));
                }
                (Some(stats), None)
            }
            Err(e) if e.is_recoverable() => {
                if verbose > 0 { eprintln!("{e}"); }
                (None, Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };

    let augmented = assemble::assemble(table, spec, &model, moran.as_ref())?;
    if verbose > 0 {
        eprintln!("[assemble] {} rows, {} columns", augmented.height(), augmented.column_names().len());
    }

    Ok(RunOutcome {
        spec: spec.clone(),
        metadata: RunMetadata {
            geometry_source: geo.source().clone(),
            rows: table.height(),
            rows_without_geometry: table.height() - geo.len(),
            rows_dropped: model.dropped_rows,
            autocorrelation_error,
        },
        model,
        moran,
        augmented,
    })
}

/// Run the analysis on the session's source table. The session's previous
/// results are replaced only when the run succeeds.
pub fn run<'a>(session: &'a mut Session, spec: &RegressionSpec, config: &PipelineConfig) -> Result<&'a RunOutcome> {
    let table = session.source()
        .ok_or_else(|| Error::Source(format!("session {:?} has no survey loaded", session.id())))?;
    let outcome = run_table(table, spec, config)?;
    Ok(session.replace(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    fn points() -> FeatureTable {
        let mut csv = String::from("lat,lon,x,y\n");
        for i in 0..15 {
            let x = ((i * 4) % 9) as f64;
            csv.push_str(&format!("{},{},{x},{}\n", i / 5, i % 5, 1.0 + 2.0 * x + 0.1 * ((i * 7) % 3) as f64));
        }
        FeatureTable::from_csv_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn run_stores_outcome_in_session() {
        let mut session = Session::new("s");
        session.load(points());
        let spec = RegressionSpec::new("y", ["x"]);

        let outcome = run(&mut session, &spec, &PipelineConfig::default()).unwrap();
        assert_eq!(outcome.augmented.height(), 15);
        assert!(outcome.moran.is_some());
        assert_eq!(outcome.metadata.rows_without_geometry, 0);
        assert!(session.augmented().unwrap().has_column("local_I#number"));
    }

    #[test]
    fn model_error_keeps_previous_results() {
        let mut session = Session::new("s");
        session.load(points());
        run(&mut session, &RegressionSpec::new("y", ["x"]), &PipelineConfig::default()).unwrap();

        let err = run(&mut session, &RegressionSpec::new("y", ["y"]), &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Model);
        assert!(session.last().is_some());
    }

    #[test]
    fn empty_session_is_an_input_error() {
        let mut session = Session::new("s");
        let err = run(&mut session, &RegressionSpec::new("y", ["x"]), &PipelineConfig::default()).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
