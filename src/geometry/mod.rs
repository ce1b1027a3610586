//! Locating or constructing the geometry of each survey record.

mod wkt;

use geo::{BoundingRect, Centroid, MultiPolygon, Point, Rect};

use crate::{error::{Error, Result}, table::FeatureTable};

/// Coordinate reference system of every resolved geometry (WGS84 lon/lat).
pub const EPSG_WGS84: u32 = 4326;

/// Geometry of a single record.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Point(Point<f64>),
    Polygon(MultiPolygon<f64>),
}

impl Shape {
    #[inline] pub fn is_point(&self) -> bool { matches!(self, Shape::Point(_)) }

    /// Representative location: the point itself, or the polygon centroid.
    pub fn centroid(&self) -> Option<Point<f64>> {
        match self {
            Shape::Point(point) => Some(*point),
            Shape::Polygon(polygons) => polygons.centroid(),
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Shape::Point(point) => Some(point.bounding_rect()),
            Shape::Polygon(polygons) => polygons.bounding_rect(),
        }
    }
}

/// Where the geometry of a table came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometrySource {
    Wkt { column: String },
    LatLon { latitude: String, longitude: String },
}

/// A feature table restricted to records with geometry, aligned row-for-row with `shapes`.
#[derive(Clone, Debug)]
pub struct GeoTable {
    table: FeatureTable,
    shapes: Vec<Shape>,
    source: GeometrySource,
}

impl GeoTable {
    #[inline] pub fn table(&self) -> &FeatureTable { &self.table }

    #[inline] pub fn shapes(&self) -> &[Shape] { &self.shapes }

    #[inline] pub fn source(&self) -> &GeometrySource { &self.source }

    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    #[inline] pub fn epsg(&self) -> u32 { EPSG_WGS84 }

    /// Whether every record is a point.
    pub fn all_points(&self) -> bool { self.shapes.iter().all(Shape::is_point) }

    /// Bounding rectangle of all geometries.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(Shape::bounding_rect)
            .reduce(|a, b| Rect::new(
                geo::Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                geo::Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            ))
    }
}

/// Find a column whose lowercase name contains `needle`.
fn find_column<'a>(table: &'a FeatureTable, needle: &str) -> Option<&'a str> {
    table.column_names().into_iter()
        .find(|name| name.to_lowercase().contains(needle))
}

/// Find a column whose lowercase name equals one of `names`.
fn find_exact<'a>(table: &'a FeatureTable, names: &[&str]) -> Option<&'a str> {
    table.column_names().into_iter()
        .find(|name| names.contains(&name.to_lowercase().as_str()))
}

/// Attach a geometry to every record that has one.
///
/// A column whose name contains "geometry" is parsed as WKT; records with an
/// empty cell are left out, and any malformed cell fails the whole table.
/// Otherwise a latitude/longitude column pair is used and records missing
/// either coordinate are left out.
pub fn resolve(table: &FeatureTable) -> Result<GeoTable> {
    if let Some(column) = find_column(table, "geometry") {
        return resolve_wkt(table, column);
    }

    let latitude = find_column(table, "latitude").or_else(|| find_exact(table, &["lat"]));
    let longitude = find_column(table, "longitude").or_else(|| find_exact(table, &["lon", "lng", "long"]));
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => resolve_lat_lon(table, latitude, longitude),
        _ => Err(Error::GeometryNotFound),
    }
}

fn resolve_wkt(table: &FeatureTable, column: &str) -> Result<GeoTable> {
    let cells = table.text_values(column)?;
    let row_ids = table.row_ids()?;

    let mut keep = Vec::with_capacity(cells.len());
    let mut shapes = Vec::with_capacity(cells.len());
    for (cell, row) in cells.iter().zip(row_ids) {
        let shape = match cell.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => wkt::parse_shape(text).map_err(|reason| Error::GeometryParseError {
                row,
                column: column.to_string(),
                reason,
            })?,
        };
        keep.push(shape.is_some());
        shapes.extend(shape);
    }

    let mut filtered = table.filter_rows(&keep)?;
    filtered.mark_geometry(column);

    Ok(GeoTable { table: filtered, shapes, source: GeometrySource::Wkt { column: column.to_string() } })
}

fn resolve_lat_lon(table: &FeatureTable, latitude: &str, longitude: &str) -> Result<GeoTable> {
    let lats = table.numeric_values(latitude)?;
    let lons = table.numeric_values(longitude)?;

    let mut keep = Vec::with_capacity(lats.len());
    let mut shapes = Vec::with_capacity(lats.len());
    for (lat, lon) in lats.into_iter().zip(lons) {
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                keep.push(true);
                shapes.push(Shape::Point(Point::new(lon, lat)));
            }
            _ => keep.push(false),
        }
    }

    Ok(GeoTable {
        table: table.filter_rows(&keep)?,
        shapes,
        source: GeometrySource::LatLon { latitude: latitude.to_string(), longitude: longitude.to_string() },
    })
}
