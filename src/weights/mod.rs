//! Row-standardized spatial weights over the records of a geo table.

mod bbox;
mod knn;
mod queen;

use crate::{error::{Error, Result}, geometry::Shape};

/// Neighbour relation used to build the weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightsKind {
    /// Each point's `k` nearest points.
    Knn(usize),
    /// Polygons sharing any boundary point.
    Queen,
}

/// A row-standardized spatial weights matrix in compressed sparse row format.
#[derive(Clone, Debug)]
pub struct SpatialWeights {
    kind: WeightsKind,
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,
    edge_weights: Vec<f64>,
}

impl SpatialWeights {
    /// Build from neighbour lists, giving every neighbour of a row equal weight
    /// so each non-empty row sums to 1.
    pub(crate) fn from_adjacency(kind: WeightsKind, adjacency: &[Vec<u32>]) -> Self {
        Self {
            kind,
            size: adjacency.len(),
            offsets: std::iter::once(0u32).chain(
                adjacency.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: adjacency.iter().flatten().copied().collect(),
            edge_weights: adjacency.iter()
                .flat_map(|neighbors| {
                    let w = 1.0 / neighbors.len() as f64;
                    neighbors.iter().map(move |_| w)
                })
                .collect(),
        }
    }

    /// Pick the neighbour relation for a set of shapes: k nearest neighbours
    /// when every record is a point, queen contiguity otherwise.
    pub fn build(shapes: &[Shape], knn: usize) -> Result<Self> {
        if shapes.iter().all(Shape::is_point) {
            if shapes.len() < 2 {
                return Err(Error::AutocorrelationFailed("need at least two points for neighbour weights".into()));
            }
            let k = knn.min(shapes.len() - 1);
            let points = shapes.iter().filter_map(Shape::centroid).collect::<Vec<_>>();
            Ok(Self::from_adjacency(WeightsKind::Knn(k), &knn::knn_adjacency(&points, k)))
        } else {
            let adjacency = queen::queen_adjacency(shapes)
                .map_err(|e| Error::AutocorrelationFailed(format!("contiguity failed: {e}")))?;
            Ok(Self::from_adjacency(WeightsKind::Queen, &adjacency))
        }
    }

    #[inline] pub fn kind(&self) -> WeightsKind { self.kind }

    /// Number of observations.
    #[inline] pub fn len(&self) -> usize { self.size }

    #[inline] pub fn is_empty(&self) -> bool { self.size == 0 }

    /// Number of (directed) neighbour links.
    #[inline] pub fn link_count(&self) -> usize { self.edges.len() }

    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Number of neighbours of a given observation.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Neighbours of a given observation.
    #[inline]
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |v| self.edges[v] as usize)
    }

    /// Neighbours and weights of a given observation.
    #[inline]
    pub fn neighbors_with_weights(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.range(node).map(move |v| (self.edges[v] as usize, self.edge_weights[v]))
    }

    /// Observations without neighbours.
    pub fn islands(&self) -> Vec<usize> {
        (0..self.size).filter(|&node| self.degree(node) == 0).collect()
    }

    /// Sum of all weights (S0).
    pub fn total_weight(&self) -> f64 { self.edge_weights.iter().sum() }

    /// Weighted average of each observation's neighbours' values.
    pub fn spatial_lag(&self, values: &[f64]) -> Vec<f64> {
        assert_eq!(values.len(), self.size, "values.len() must equal the number of observations");
        (0..self.size)
            .map(|node| self.neighbors_with_weights(node).map(|(j, w)| w * values[j]).sum())
            .collect()
    }
}
