//! Geographically-weighted regression with an adaptive bisquare kernel.
//!
//! The bandwidth (a nearest-neighbour count) is chosen by golden-section
//! search on the corrected AIC, then every observation gets its own weighted
//! least-squares fit. Coefficients are ordered `[intercept, x_1, .., x_k]`
//! following the order of the independent variables in the [`RegressionSpec`].

mod kernel;
mod local;
mod search;
mod spec;

use ndarray::{Array1, Array2};

pub use search::BandwidthSearch;
pub use spec::RegressionSpec;

use crate::{
    config::GwrConfig,
    error::{Error, Result},
    geometry::{GeoTable, Shape},
};

/// Name of the first coefficient.
pub const INTERCEPT: &str = "Intercept";

/// Complete rows of a geo table projected onto the regression variables.
#[derive(Clone, Debug)]
pub struct GwrData {
    coords: Vec<[f64; 2]>,
    y: Array1<f64>,
    /// Design matrix with a leading column of ones.
    x: Array2<f64>,
    row_ids: Vec<u32>,
    shapes: Vec<Shape>,
    dropped: usize,
}

impl GwrData {
    /// Keep the rows of `geo` with a finite value in every variable of `spec`
    /// and a usable location (the point itself, or the polygon centroid).
    pub fn prepare(geo: &GeoTable, spec: &RegressionSpec) -> Result<Self> {
        spec.validate(geo.table())?;

        let table = geo.table();
        let dependent = table.numeric_values(spec.dependent())?;
        let independent = spec.independent().iter()
            .map(|name| table.numeric_values(name))
            .collect::<Result<Vec<_>>>()?;
        let all_row_ids = table.row_ids()?;

        let p = spec.num_params();
        let mut coords = Vec::new();
        let mut y = Vec::new();
        let mut x = Vec::new();
        let mut row_ids = Vec::new();
        let mut shapes = Vec::new();

        for (i, shape) in geo.shapes().iter().enumerate() {
            let Some(yi) = dependent[i].filter(|v| v.is_finite()) else { continue };
            let Some(xi) = independent.iter()
                .map(|column| column[i].filter(|v| v.is_finite()))
                .collect::<Option<Vec<f64>>>() else { continue };
            let Some(centroid) = shape.centroid().filter(|c| c.x().is_finite() && c.y().is_finite()) else { continue };

            coords.push([centroid.x(), centroid.y()]);
            y.push(yi);
            x.push(1.0);
            x.extend(xi);
            row_ids.push(all_row_ids[i]);
            shapes.push(shape.clone());
        }

        let n = y.len();
        if n < spec.min_rows() {
            return Err(Error::InsufficientData { required: spec.min_rows(), available: n });
        }

        Ok(Self {
            coords,
            y: Array1::from_vec(y),
            x: Array2::from_shape_vec((n, p), x).map_err(|e| Error::InvalidSpecification(e.to_string()))?,
            row_ids,
            shapes,
            dropped: geo.len() - n,
        })
    }

    /// Number of complete rows.
    #[inline] pub fn len(&self) -> usize { self.y.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.y.is_empty() }

    /// Rows of the geo table left out for missing values.
    #[inline] pub fn dropped(&self) -> usize { self.dropped }

    /// Original row ids of the complete rows.
    #[inline] pub fn row_ids(&self) -> &[u32] { &self.row_ids }

    /// Geometries of the complete rows.
    #[inline] pub fn shapes(&self) -> &[Shape] { &self.shapes }

    /// Locations used by the kernel.
    #[inline] pub fn coords(&self) -> &[[f64; 2]] { &self.coords }

    /// Number of coefficients per observation, intercept included.
    #[inline] pub fn num_params(&self) -> usize { self.x.ncols() }
}

/// Output of one GWR fit.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedModel {
    /// Adaptive bandwidth, in nearest neighbours.
    pub bandwidth: usize,
    pub aicc: f64,
    pub r2: f64,
    /// Trace of the hat matrix.
    pub effective_params: f64,
    /// `n × (1 + k)` local coefficients, intercept first.
    pub params: Array2<f64>,
    pub fitted: Array1<f64>,
    /// Observed minus fitted.
    pub residuals: Array1<f64>,
    /// Original row ids, aligned with the rows of `params`.
    pub row_ids: Vec<u32>,
    /// Rows of the geo table left out for missing values.
    pub dropped_rows: usize,
    /// `[Intercept, x_1, .., x_k]`.
    pub coefficient_names: Vec<String>,
    pub search: BandwidthSearch,
}

impl FittedModel {
    #[inline] pub fn len(&self) -> usize { self.row_ids.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.row_ids.is_empty() }
}

/// Interval of neighbour counts searched for `n` rows and `p` coefficients.
fn search_interval(n: usize, p: usize, config: &GwrConfig) -> (usize, usize) {
    let upper = config.max_bandwidth.unwrap_or(n).clamp(1, n);
    let lower = config.min_bandwidth
        .unwrap_or_else(|| (40 + 2 * p).min(n).max(p + 2))
        .clamp(1, upper);
    (lower, upper)
}

/// Select a bandwidth for `data`.
pub fn select_bandwidth(data: &GwrData, config: &GwrConfig) -> Result<BandwidthSearch> {
    let (lower, upper) = search_interval(data.len(), data.num_params(), config);
    search::golden_section(lower, upper, config.tolerance, config.max_iter, |bandwidth| {
        local::fit_at(data, bandwidth)
            .map(|fit| local::aicc(data.len(), fit.rss, fit.tr_s))
            .unwrap_or(f64::INFINITY)
    })
    .map_err(Error::BandwidthSearchFailed)
}

/// Select a bandwidth and fit the model at it.
pub fn fit(data: &GwrData, spec: &RegressionSpec, config: &GwrConfig) -> Result<FittedModel> {
    let search = select_bandwidth(data, config)?;

    let fit = local::fit_at(data, search.bandwidth)
        .map_err(|i| Error::SingularSystem { row: data.row_ids[i] })?;

    let mean = data.y.mean().unwrap_or(0.0);
    let tss = data.y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    let r2 = if tss > 0.0 { 1.0 - fit.rss / tss } else { f64::NAN };

    Ok(FittedModel {
        bandwidth: search.bandwidth,
        aicc: local::aicc(data.len(), fit.rss, fit.tr_s),
        r2,
        effective_params: fit.tr_s,
        params: fit.params,
        fitted: fit.fitted,
        residuals: fit.residuals,
        row_ids: data.row_ids.clone(),
        dropped_rows: data.dropped,
        coefficient_names: std::iter::once(INTERCEPT.to_string())
            .chain(spec.independent().iter().cloned())
            .collect(),
        search,
    })
}
