/// Adaptive bisquare kernel over a set of locations. Distances are computed
/// one observation at a time into reused buffers.
#[derive(Debug)]
pub(super) struct Kernel<'a> {
    coords: &'a [[f64; 2]],
    weights: Vec<f64>,
    scratch: Vec<f64>,
}

/// Widen each adaptive bandwidth slightly so the farthest included neighbour
/// keeps a non-zero weight.
const BANDWIDTH_PAD: f64 = 1.000_000_1;

impl<'a> Kernel<'a> {
    pub(super) fn new(coords: &'a [[f64; 2]]) -> Self {
        Self {
            coords,
            weights: Vec::with_capacity(coords.len()),
            scratch: Vec::with_capacity(coords.len()),
        }
    }

    #[inline] pub(super) fn len(&self) -> usize { self.coords.len() }

    /// Adaptive bisquare weights of every observation relative to `i`, using
    /// the distance to the `bandwidth`-th nearest observation (self included).
    pub(super) fn bisquare(&mut self, i: usize, bandwidth: usize) -> &[f64] {
        let k = bandwidth.clamp(1, self.len());
        let [xi, yi] = self.coords[i];

        self.weights.clear();
        self.weights.extend(self.coords.iter().map(|b| (xi - b[0]).hypot(yi - b[1])));
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.weights);
        let (_, kth, _) = self.scratch.select_nth_unstable_by(k - 1, f64::total_cmp);
        let h = *kth * BANDWIDTH_PAD;

        for w in self.weights.iter_mut() {
            let d = *w;
            *w = if d >= h {
                0.0
            } else {
                let r = d / h;
                (1.0 - r * r).powi(2)
            };
        }
        &self.weights
    }
}
