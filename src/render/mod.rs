//! SVG maps of a geo table, optionally colored by a numeric column.

mod color;

use std::{fs, io::Write, path::Path};

use anyhow::{anyhow, Context, Result};
use geo::{Coord, CoordsIter, LineString, MultiPolygon};

use crate::geometry::{GeoTable, Shape};

/// Projection function: lon/lat -> SVG coords (x,y)
type Projection = dyn Fn(&Coord<f64>) -> (f64, f64);

const WIDTH: f64 = 1200.0;
const MARGIN: f64 = 10.0;
const POINT_RADIUS: f64 = 4.0;

/// Columns whose values make up a record's tooltip, in order.
const TOOLTIP_COLUMNS: [[&str; 2]; 3] = [["#name", "name"], ["#img", "img"], ["#link", "link"]];

/// Escape text for use inside SVG content or attributes.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build a compact SVG path string for a MultiPolygon (exteriors + holes).
fn multipolygon_to_path(shape: &MultiPolygon<f64>, project: &Projection) -> String {
    let mut out = String::new();

    for polygon in &shape.0 {
        out.push_str(&ring_to_path(polygon.exterior(), project));
        for interior in polygon.interiors() {
            out.push_str(&ring_to_path(interior, project));
        }
    }

    out
}

/// Build a compact SVG path string for a LineString (ring).
fn ring_to_path(ring: &LineString<f64>, project: &Projection) -> String {
    let mut out = String::new();

    let mut coords = ring.coords_iter()
        .map(|coord| project(&coord));
    if let Some((x, y)) = coords.next() {
        out.push_str(&format!(" M{x:.3},{y:.3}"));
        for (x, y) in coords {
            out.push_str(&format!(" L{x:.3},{y:.3}"));
        }
        out.push('Z');
    }

    out
}

/// Tooltip text of every record: the name/image/link columns that exist,
/// followed by the mapped value.
fn tooltips(geo: &GeoTable, column: Option<&str>, values: &[Option<f64>]) -> Result<Vec<String>> {
    let table = geo.table();
    let names = table.column_names();
    let mut parts = vec![Vec::<String>::new(); geo.len()];

    for candidates in TOOLTIP_COLUMNS {
        let Some(name) = candidates.iter()
            .find_map(|c| names.iter().find(|n| n.eq_ignore_ascii_case(c)).copied()) else { continue };
        for (part, value) in parts.iter_mut().zip(table.text_values(name)?) {
            part.extend(value.filter(|v| !v.is_empty()));
        }
    }

    if let Some(column) = column {
        for (part, value) in parts.iter_mut().zip(values) {
            part.push(match value {
                Some(v) => format!("{column}: {v}"),
                None => format!("{column}: no value"),
            });
        }
    }

    Ok(parts.into_iter().map(|lines| lines.join("\n")).collect())
}

fn write_svg(writer: &mut impl Write, geo: &GeoTable, column: Option<&str>) -> Result<()> {
    let bounds = geo.bounds()
        .ok_or_else(|| anyhow!("[render] Could not determine bounds; nothing to draw."))?;

    let span = if bounds.width() > 0.0 { bounds.width() } else if bounds.height() > 0.0 { bounds.height() } else { 1.0 };
    let scale = (WIDTH - 2.0 * MARGIN) / span;
    let height = bounds.height() * scale + 2.0 * MARGIN;

    // --- Map lon/lat -> SVG coords (preserve aspect, Y down) ---
    let project = move |coord: &Coord<f64>| -> (f64, f64) {
        let x = MARGIN + (coord.x - bounds.min().x) * scale;
        let y = MARGIN + (bounds.max().y - coord.y) * scale; // invert vertically
        (x, y)
    };

    let values = match column {
        Some(column) => geo.table().numeric_values(column)
            .with_context(|| format!("[render] column {column:?} cannot be mapped"))?,
        None => vec![None; geo.len()],
    };
    let colors = match column {
        Some(_) => color::fill_colors(&values),
        None => vec![color::MISSING; geo.len()],
    };
    let titles = tooltips(geo, column, &values)?;

    writeln!(writer, r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"##)?;
    writeln!(writer, r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height:.3}" viewBox="0 0 {WIDTH} {height:.3}" data-epsg="{}">"##, geo.epsg())?;
    writeln!(writer, r##"<defs>
<style>
    .blk {{ stroke: #111827; stroke-width: 0.5; fill-opacity: 0.85; }}
    .pt {{ stroke: #111827; stroke-width: 0.5; }}
</style>
</defs>"##)?;
    writeln!(writer, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;

    for ((shape, fill), title) in geo.shapes().iter().zip(&colors).zip(&titles) {
        let title = if title.is_empty() { String::new() } else { format!("<title>{}</title>", escape(title)) };
        match shape {
            Shape::Polygon(polygons) => writeln!(
                writer, r#"<path class="blk" fill="{fill}" d="{}">{title}</path>"#,
                multipolygon_to_path(polygons, &project),
            )?,
            Shape::Point(point) => {
                let (cx, cy) = project(&point.0);
                writeln!(writer, r#"<circle class="pt" cx="{cx:.3}" cy="{cy:.3}" r="{POINT_RADIUS}" fill="{fill}">{title}</circle>"#)?;
            }
        }
    }

    writeln!(writer, "</svg>")?;
    Ok(())
}

/// Render `geo` as an SVG document. With `column`, records are filled on a
/// light→dark ramp over the column's range, and records without a value are grey.
pub fn to_svg(geo: &GeoTable, column: Option<&str>) -> Result<String> {
    let mut buffer = Vec::new();
    write_svg(&mut buffer, geo, column)?;
    String::from_utf8(buffer).context("[render] SVG output is not valid UTF-8")
}

/// Render `geo` to an SVG file at `path`.
pub fn write_svg_file(geo: &GeoTable, column: Option<&str>, path: &Path) -> Result<()> {
    let svg = to_svg(geo, column)?;
    fs::write(path, svg).with_context(|| format!("[render] Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry, table::FeatureTable};

    fn geo(csv: &str) -> GeoTable {
        geometry::resolve(&FeatureTable::from_csv_bytes(csv.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn points_become_circles_with_tooltips() {
        let geo = geo("#name,lat,lon,v#number\nA & B,0,0,1\nC,1,2,\n");
        let svg = to_svg(&geo, Some("v#number")).unwrap();

        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("<title>A &amp; B\nv#number: 1</title>"));
        assert!(svg.contains(r##"fill="#bdbdbd""##));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn polygons_become_paths() {
        let geo = geo("geometry,v\n\"POLYGON((0 0,1 0,1 1,0 1,0 0))\",1\n\"POLYGON((1 0,2 0,2 1,1 1,1 0))\",2\n");
        let svg = to_svg(&geo, Some("v")).unwrap();

        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("#deebf7"));
        assert!(svg.contains("#08519c"));
    }

    #[test]
    fn unknown_column_is_an_error() {
        let geo = geo("lat,lon\n0,0\n");
        assert!(to_svg(&geo, Some("missing")).is_err());
        assert!(to_svg(&geo, None).unwrap().contains("<circle"));
    }

    #[test]
    fn writes_file() {
        let geo = geo("lat,lon\n0,0\n1,1\n");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.svg");
        write_svg_file(&geo, None, &path).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().starts_with("<?xml"));
    }
}
