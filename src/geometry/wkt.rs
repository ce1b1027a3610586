use std::sync::LazyLock;

use geo::{Geometry, HasDimensions, MultiPolygon};
use regex::Regex;
use wkt::TryFromWkt;

use super::Shape;

/// Optional PostGIS-style `SRID=4326;` prefix.
static SRID_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*SRID=\d+\s*;").expect("valid SRID pattern")
});

/// Parse one WKT cell. `Ok(None)` means the cell holds an empty geometry.
pub(super) fn parse_shape(text: &str) -> Result<Option<Shape>, String> {
    let body = SRID_PREFIX.replace(text, "");
    let geometry = Geometry::<f64>::try_from_wkt_str(body.trim())
        .map_err(|e| e.to_string())?;

    if geometry.is_empty() { return Ok(None) }

    match geometry {
        Geometry::Point(point) => Ok(Some(Shape::Point(point))),
        Geometry::MultiPoint(points) if points.0.len() == 1 => Ok(Some(Shape::Point(points.0[0]))),
        Geometry::Polygon(polygon) => Ok(Some(Shape::Polygon(MultiPolygon::new(vec![polygon])))),
        Geometry::MultiPolygon(polygons) => Ok(Some(Shape::Polygon(polygons))),
        other => Err(format!("unsupported geometry type {}", geometry_type(&other))),
    }
}

fn geometry_type(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points_and_polygons() {
        let Some(Shape::Point(point)) = parse_shape("POINT (-117.2 32.8)").unwrap() else { panic!("expected point") };
        assert_eq!((point.x(), point.y()), (-117.2, 32.8));

        let Some(Shape::Polygon(polygons)) = parse_shape("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap() else {
            panic!("expected polygon")
        };
        assert_eq!(polygons.0.len(), 1);
    }

    #[test]
    fn strips_srid_prefix() {
        assert!(matches!(parse_shape("SRID=4326;POINT(1 2)"), Ok(Some(Shape::Point(_)))));
    }

    #[test]
    fn rejects_garbage_and_lines() {
        assert!(parse_shape("not a geometry").is_err());
        let err = parse_shape("LINESTRING (0 0, 1 1)").unwrap_err();
        assert!(err.contains("LineString"));
    }
}
