use std::collections::BTreeMap;

/// Golden-section step as a fraction of the interval, (3 - sqrt 5) / 2.
const DELTA: f64 = 0.38197;

/// Result of a bandwidth search.
#[derive(Clone, Debug, PartialEq)]
pub struct BandwidthSearch {
    /// Selected number of nearest neighbours.
    pub bandwidth: usize,
    /// Criterion value at the selected bandwidth.
    pub score: f64,
    pub iterations: usize,
    /// Every distinct bandwidth evaluated, with its score.
    pub evaluated: Vec<(usize, f64)>,
}

/// Minimize `score` over integer bandwidths in `[lower, upper]` by golden-section search.
/// Scores are cached, so each bandwidth is evaluated at most once.
pub(super) fn golden_section(
    lower: usize,
    upper: usize,
    tolerance: f64,
    max_iter: usize,
    mut score: impl FnMut(usize) -> f64,
) -> Result<BandwidthSearch, String> {
    let mut cache = BTreeMap::<usize, f64>::new();
    let mut eval = |bw: f64| -> f64 {
        let bw = bw.round().max(1.0) as usize;
        *cache.entry(bw).or_insert_with(|| score(bw))
    };

    let (mut a, mut c) = (lower as f64, upper as f64);
    let mut b = a + DELTA * (c - a).abs();
    let mut d = c - DELTA * (c - a).abs();

    let mut best = (b.round() as usize, f64::INFINITY);
    let mut diff = f64::INFINITY;
    let mut iterations = 0;

    while diff.abs() > tolerance && iterations < max_iter {
        iterations += 1;
        b = b.round();
        d = d.round();

        let score_b = eval(b);
        let score_d = eval(d);

        if score_b <= score_d {
            best = (b as usize, score_b);
            c = d;
            d = b;
            b = a + DELTA * (c - a).abs();
        } else {
            best = (d as usize, score_d);
            a = b;
            b = d;
            d = c - DELTA * (c - a).abs();
        }
        diff = score_b - score_d;
    }

    if !best.1.is_finite() {
        return Err(format!("no bandwidth between {lower} and {upper} neighbours gives a finite AICc"));
    }
    if diff.abs() > tolerance {
        return Err(format!("no convergence after {iterations} iterations (last change {diff:e})"));
    }

    Ok(BandwidthSearch {
        bandwidth: best.0,
        score: best.1,
        iterations,
        evaluated: cache.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_minimum_of_convex_function() {
        let search = golden_section(10, 200, 1e-5, 200, |bw| ((bw as f64) - 73.0).powi(2)).unwrap();
        assert!(search.bandwidth.abs_diff(73) <= 2, "bandwidth {}", search.bandwidth);
        assert!(search.evaluated.len() < 40);
    }

    #[test]
    fn degenerate_interval_evaluates_once() {
        let mut calls = 0;
        let search = golden_section(10, 10, 1e-5, 200, |bw| { calls += 1; bw as f64 }).unwrap();
        assert_eq!(search.bandwidth, 10);
        assert_eq!(calls, 1);
        assert_eq!(search.evaluated, vec![(10, 10.0)]);
    }

    #[test]
    fn all_infinite_scores_fail() {
        let err = golden_section(5, 50, 1e-5, 200, |_| f64::INFINITY).unwrap_err();
        assert!(err.contains("finite"));
    }

    #[test]
    fn is_deterministic() {
        let f = |bw: usize| ((bw as f64) * 0.37).sin() + (bw as f64) * 0.01;
        assert_eq!(golden_section(4, 120, 1e-5, 200, f), golden_section(4, 120, 1e-5, 200, f));
    }
}
