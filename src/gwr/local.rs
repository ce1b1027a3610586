use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use super::{kernel::Kernel, GwrData};

/// Every local regression evaluated at one bandwidth.
#[derive(Debug)]
pub(super) struct LocalFit {
    pub(super) params: Array2<f64>,
    pub(super) fitted: Array1<f64>,
    pub(super) residuals: Array1<f64>,
    pub(super) rss: f64,
    /// Trace of the hat matrix.
    pub(super) tr_s: f64,
}

/// Solve `(XᵀW_iX) β_i = XᵀW_iy` for every observation `i`.
/// Returns the position of the first observation whose local system is singular.
pub(super) fn fit_at(data: &GwrData, bandwidth: usize) -> Result<LocalFit, usize> {
    let (n, p) = data.x.dim();
    let mut kernel = Kernel::new(&data.coords);
    let mut params = Array2::<f64>::zeros((n, p));
    let mut fitted = Array1::<f64>::zeros(n);
    let mut tr_s = 0.0;

    for i in 0..n {
        let weights = kernel.bisquare(i, bandwidth);

        let mut xtwx = DMatrix::<f64>::zeros(p, p);
        let mut xtwy = DVector::<f64>::zeros(p);
        for (j, &w) in weights.iter().enumerate() {
            if w == 0.0 { continue }
            let row = data.x.row(j);
            for a in 0..p {
                xtwy[a] += w * row[a] * data.y[j];
                for b in 0..p {
                    xtwx[(a, b)] += w * row[a] * row[b];
                }
            }
        }

        let inverse = xtwx.clone().cholesky()
            .map(|c| c.inverse())
            .or_else(|| xtwx.try_inverse())
            .filter(|m| m.iter().all(|v| v.is_finite()))
            .ok_or(i)?;

        let beta = &inverse * &xtwy;
        let xi = DVector::from_iterator(p, data.x.row(i).iter().copied());

        fitted[i] = xi.dot(&beta);
        tr_s += weights[i] * xi.dot(&(&inverse * &xi));
        for a in 0..p { params[(i, a)] = beta[a] }
    }

    let residuals = &data.y - &fitted;
    let rss = residuals.iter().map(|r| r * r).sum();

    Ok(LocalFit { params, fitted, residuals, rss, tr_s })
}

/// Corrected Akaike information criterion of a GWR fit. Infinite when the
/// effective number of parameters leaves no residual degrees of freedom.
pub(super) fn aicc(n: usize, rss: f64, tr_s: f64) -> f64 {
    let n = n as f64;
    let denom = n - tr_s - 2.0;
    if denom <= 0.0 || !rss.is_finite() { return f64::INFINITY }

    let rss = rss.max(f64::MIN_POSITIVE);
    let llf = -0.5 * n * rss.ln() - 0.5 * n * (1.0 + (2.0 * PI / n).ln());
    -2.0 * llf + 2.0 * n * (tr_s + 1.0) / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aicc_is_infinite_without_degrees_of_freedom() {
        assert!(aicc(4, 1.0, 2.5).is_infinite());
        assert!(aicc(10, 1.0, 2.0).is_finite());
    }

    #[test]
    fn aicc_prefers_smaller_residuals_at_equal_complexity() {
        assert!(aicc(30, 1.0, 3.0) < aicc(30, 2.0, 3.0));
    }

    #[test]
    fn aicc_penalizes_complexity() {
        assert!(aicc(30, 1.0, 3.0) < aicc(30, 1.0, 6.0));
    }
}
