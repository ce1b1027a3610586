use geo::Point;
use rstar::{primitives::GeomWithData, RTree};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Connect each point to its `k` nearest other points (Euclidean, in coordinate units).
/// The relation is not symmetric.
pub(super) fn knn_adjacency(points: &[Point<f64>], k: usize) -> Vec<Vec<u32>> {
    let rtree = RTree::bulk_load(
        points.iter().enumerate()
            .map(|(i, point)| IndexedPoint::new([point.x(), point.y()], i))
            .collect()
    );

    points.iter().enumerate()
        .map(|(i, point)| {
            let mut neighbors = rtree.nearest_neighbor_iter(&[point.x(), point.y()])
                .map(|item| item.data)
                .filter(|&j| j != i)
                .take(k)
                .map(|j| j as u32)
                .collect::<Vec<_>>();
            neighbors.sort_unstable();
            neighbors
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_nearest_points_excluding_self() {
        let points = [0.0, 1.0, 2.0, 10.0, 11.0].map(|x| Point::new(x, 0.0));
        let adjacency = knn_adjacency(&points, 2);

        assert_eq!(adjacency[0], vec![1, 2]);
        assert_eq!(adjacency[3], vec![2, 4]);
        assert_eq!(adjacency[4], vec![2, 3]);
    }

    #[test]
    fn duplicate_locations_still_exclude_self() {
        let points = [Point::new(0.0, 0.0), Point::new(0.0, 0.0), Point::new(5.0, 0.0)];
        let adjacency = knn_adjacency(&points, 1);
        assert_eq!(adjacency[0], vec![1]);
        assert_eq!(adjacency[1], vec![0]);
    }
}
