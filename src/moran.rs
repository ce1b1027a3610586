//! Global and local Moran's I over regression residuals.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    config::MoranConfig,
    error::{Error, Result},
    geometry::Shape,
    weights::{SpatialWeights, WeightsKind},
};

/// Spatial autocorrelation of one vector of values.
#[derive(Clone, Debug, PartialEq)]
pub struct MoranStatistics {
    pub weights: WeightsKind,
    /// Global Moran's I.
    pub global_i: f64,
    /// Expected I under spatial randomness, -1/(n-1).
    pub expected_i: f64,
    /// Folded pseudo p-value from random permutations; `None` when no permutations were run.
    pub p_value: Option<f64>,
    pub permutations: usize,
    /// Local Moran's I, aligned with the input values.
    pub local_i: Vec<f64>,
}

/// Build weights for `shapes` and compute Moran's I of `values` over them.
/// `row_ids` name the observations in error messages.
pub fn analyze(shapes: &[Shape], values: &[f64], row_ids: &[u32], config: &MoranConfig) -> Result<MoranStatistics> {
    let weights = SpatialWeights::build(shapes, config.knn)?;

    let islands = weights.islands();
    if !islands.is_empty() {
        let rows = islands.iter()
            .map(|&i| row_ids.get(i).map_or_else(|| i.to_string(), u32::to_string))
            .collect::<Vec<_>>();
        return Err(Error::AutocorrelationFailed(format!(
            "{} observation(s) have no neighbours under {:?} weights (rows {})",
            islands.len(), weights.kind(), rows.join(", "),
        )));
    }

    moran(values, &weights, config)
}

/// Moran's I of `values` under row-standardized `weights`.
pub fn moran(values: &[f64], weights: &SpatialWeights, config: &MoranConfig) -> Result<MoranStatistics> {
    let n = values.len();
    if n != weights.len() {
        return Err(Error::AutocorrelationFailed(format!("{n} values for {} weight rows", weights.len())));
    }
    if n < 3 {
        return Err(Error::AutocorrelationFailed(format!("need at least 3 observations, got {n}")));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::AutocorrelationFailed("values contain NaN or infinity".into()));
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let z = values.iter().map(|v| v - mean).collect::<Vec<_>>();
    let sum_sq = z.iter().map(|d| d * d).sum::<f64>();
    if sum_sq <= f64::EPSILON * n as f64 {
        return Err(Error::AutocorrelationFailed("values are constant".into()));
    }

    let s0 = weights.total_weight();
    let scale = n as f64 / s0;
    let statistic = |z: &[f64]| -> f64 {
        let lag = weights.spatial_lag(z);
        scale * z.iter().zip(&lag).map(|(a, b)| a * b).sum::<f64>() / sum_sq
    };

    let global_i = statistic(&z);

    let lag = weights.spatial_lag(&z);
    let local_i = z.iter().zip(&lag)
        .map(|(zi, li)| (n - 1) as f64 * zi * li / sum_sq)
        .collect();

    let p_value = (config.permutations > 0).then(|| {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut shuffled = z.clone();
        let mut larger = 0usize;
        for _ in 0..config.permutations {
            shuffled.shuffle(&mut rng);
            if statistic(&shuffled) >= global_i { larger += 1 }
        }
        // Fold onto the tail the observed value lies in.
        if config.permutations - larger < larger { larger = config.permutations - larger }
        (larger + 1) as f64 / (config.permutations + 1) as f64
    });

    Ok(MoranStatistics {
        weights: weights.kind(),
        global_i,
        expected_i: -1.0 / (n - 1) as f64,
        p_value,
        permutations: config.permutations,
        local_i,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::{polygon, MultiPolygon, Point};

    /// A path 0 - 1 - 2 - ... - (n-1).
    fn chain(n: usize) -> SpatialWeights {
        let adjacency = (0..n)
            .map(|i| {
                let mut v = Vec::new();
                if i > 0 { v.push(i as u32 - 1) }
                if i + 1 < n { v.push(i as u32 + 1) }
                v
            })
            .collect::<Vec<_>>();
        SpatialWeights::from_adjacency(WeightsKind::Queen, &adjacency)
    }

    fn config() -> MoranConfig { MoranConfig { knn: 5, permutations: 199, seed: 7 } }

    #[test]
    fn smooth_trend_is_positively_autocorrelated() {
        let values = (0..20).map(|i| i as f64).collect::<Vec<_>>();
        let stats = moran(&values, &chain(20), &config()).unwrap();

        assert!(stats.global_i > 0.8);
        assert_abs_diff_eq!(stats.expected_i, -1.0 / 19.0);
        assert!(stats.p_value.unwrap() <= 0.01);
        assert_eq!(stats.local_i.len(), 20);
    }

    #[test]
    fn alternating_values_are_negatively_autocorrelated() {
        let values = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect::<Vec<_>>();
        let stats = moran(&values, &chain(20), &config()).unwrap();
        assert!(stats.global_i < -0.8);
        assert!(stats.local_i.iter().all(|&v| v < 0.0));
    }

    #[test]
    fn local_values_average_to_global_for_row_standardized_weights() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let stats = moran(&values, &chain(8), &config()).unwrap();
        let mean_local = stats.local_i.iter().sum::<f64>() / 8.0;
        // sum(local) = (n-1)/n * n * I when S0 = n
        assert_abs_diff_eq!(mean_local, stats.global_i * 7.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn permutation_p_value_is_reproducible() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let a = moran(&values, &chain(8), &config()).unwrap();
        let b = moran(&values, &chain(8), &config()).unwrap();
        assert_eq!(a, b);
        let p = a.p_value.unwrap();
        assert!(p > 0.0 && p <= 1.0);
    }

    #[test]
    fn no_permutations_means_no_p_value() {
        let values = [1.0, 2.0, 4.0, 8.0];
        let stats = moran(&values, &chain(4), &MoranConfig { permutations: 0, ..config() }).unwrap();
        assert!(stats.p_value.is_none());
    }

    #[test]
    fn constant_or_short_inputs_fail() {
        assert!(matches!(moran(&[2.0; 5], &chain(5), &config()), Err(Error::AutocorrelationFailed(_))));
        assert!(matches!(moran(&[1.0, 2.0], &chain(2), &config()), Err(Error::AutocorrelationFailed(_))));
        assert!(matches!(moran(&[1.0, 2.0, 3.0], &chain(4), &config()), Err(Error::AutocorrelationFailed(_))));
    }

    #[test]
    fn isolated_polygon_fails_with_its_row_id() {
        let square = |x: f64| Shape::Polygon(MultiPolygon::new(vec![polygon![
            (x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0), (x: x, y: 0.0),
        ]]));
        let shapes = vec![square(0.0), square(1.0), square(2.0), square(10.0)];
        let err = analyze(&shapes, &[1.0, 2.0, 3.0, 4.0], &[4, 5, 6, 9], &config()).unwrap_err();
        match err {
            Error::AutocorrelationFailed(message) => assert!(message.contains("rows 9")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn points_use_knn_and_succeed() {
        let shapes = (0..12)
            .map(|i| Shape::Point(Point::new((i % 4) as f64, (i / 4) as f64)))
            .collect::<Vec<_>>();
        let values = (0..12).map(|i| (i % 4) as f64 + 0.1 * i as f64).collect::<Vec<_>>();
        let row_ids = (0..12).collect::<Vec<u32>>();
        let stats = analyze(&shapes, &values, &row_ids, &config()).unwrap();
        assert_eq!(stats.weights, WeightsKind::Knn(5));
        assert_eq!(stats.local_i.len(), 12);
    }
}
