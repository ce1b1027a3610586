use anyhow::Result;
use geo::{BoundingRect, MultiPolygon, Relate};
use rstar::{RTree, AABB};

use super::bbox::BoundingBox;
use crate::geometry::Shape;

/// Queen contiguity: two records are neighbours when their boundaries share at
/// least one point (a vertex or an edge). Points never touch a boundary and so
/// end up without neighbours.
pub(super) fn queen_adjacency(shapes: &[Shape]) -> Result<Vec<Vec<u32>>> {
    let polygons = shapes.iter()
        .map(|shape| match shape {
            Shape::Polygon(polygons) => Some(polygons),
            Shape::Point(_) => None,
        })
        .collect::<Vec<Option<&MultiPolygon<f64>>>>();

    let rtree = RTree::bulk_load(
        polygons.iter().enumerate()
            .filter_map(|(i, polygon)| Some(BoundingBox::new(i, polygon.as_ref()?.bounding_rect()?)))
            .collect()
    );

    let mut adjacency = vec![Vec::new(); shapes.len()];
    for (i, polygon) in polygons.iter().enumerate() {
        let Some(polygon) = polygon else { continue };
        let Some(rect) = polygon.bounding_rect() else { continue };
        let search = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        for cand in rtree.locate_in_envelope_intersecting(&search) {
            let j = cand.idx();
            if j <= i { continue } // check each unordered pair once
            let Some(other) = polygons[j] else { continue };

            // DE-9IM index 4 is Boundary/Boundary; any non-empty intersection counts.
            let im = polygon.relate(other);
            if im.matches("****T****")? {
                adjacency[i].push(j as u32);
                adjacency[j].push(i as u32);
            }
        }
    }

    // Neighbour order follows index order, independent of R-tree traversal.
    for neighbors in &mut adjacency { neighbors.sort_unstable() }
    Ok(adjacency)
}
