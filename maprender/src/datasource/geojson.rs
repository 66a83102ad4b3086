//! Minimal GeoJSON reader and writer.
//!
//! Accepts a `FeatureCollection`, a single `Feature` or a bare geometry.
//! Features without a numeric `id` are numbered from 1 in document order.

use std::collections::BTreeMap;

use serde_json::{json, Map as JsonMap, Value as Json};

use super::{Feature, Value};
use crate::error::{MapError, MapResult};
use crate::geometry::{
    rings, Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};

/// Parses GeoJSON text into features.
pub fn parse(text: &str) -> MapResult<Vec<Feature>> {
    let doc: Json = serde_json::from_str(text)
        .map_err(|e| MapError::Datasource(format!("failed to parse GeoJSON: {}", e)))?;
    parse_value(&doc)
}

pub fn parse_value(doc: &Json) -> MapResult<Vec<Feature>> {
    let kind = member_str(doc, "type")?;
    match kind {
        "FeatureCollection" => {
            let items = doc
                .get("features")
                .and_then(Json::as_array)
                .ok_or_else(|| invalid("FeatureCollection without a 'features' array"))?;
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| parse_feature(item, idx as i64 + 1))
                .collect()
        }
        "Feature" => Ok(vec![parse_feature(doc, 1)?]),
        _ => Ok(vec![Feature::new(1, parse_geometry(doc)?)]),
    }
}

fn parse_feature(item: &Json, fallback_id: i64) -> MapResult<Feature> {
    if member_str(item, "type")? != "Feature" {
        return Err(invalid("expected a Feature object"));
    }
    let geometry = item
        .get("geometry")
        .ok_or_else(|| invalid("Feature without geometry"))?;
    let id = item.get("id").and_then(Json::as_i64).unwrap_or(fallback_id);

    let mut properties = BTreeMap::new();
    if let Some(props) = item.get("properties").and_then(Json::as_object) {
        for (name, value) in props {
            properties.insert(name.clone(), Value::from_json(value));
        }
    }

    Ok(Feature {
        id,
        geometry: parse_geometry(geometry)?,
        properties,
    })
}

fn parse_geometry(g: &Json) -> MapResult<Geometry> {
    let kind = member_str(g, "type")?;
    if kind == "GeometryCollection" {
        let members = g
            .get("geometries")
            .and_then(Json::as_array)
            .ok_or_else(|| invalid("GeometryCollection without a 'geometries' array"))?;
        return Ok(Geometry::GeometryCollection(GeometryCollection::new_from(
            members.iter().map(parse_geometry).collect::<MapResult<Vec<_>>>()?,
        )));
    }
    let coords = g
        .get("coordinates")
        .ok_or_else(|| invalid(&format!("{} without coordinates", kind)))?;
    Ok(match kind {
        "Point" => Geometry::Point(Point::from(position(coords)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            positions(coords)?.into_iter().map(Point::from).collect(),
        )),
        "LineString" => Geometry::LineString(LineString::new(positions(coords)?)),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(line_strings(coords)?)),
        "Polygon" => Geometry::Polygon(polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            array(coords)?
                .iter()
                .map(polygon)
                .collect::<MapResult<Vec<_>>>()?,
        )),
        other => return Err(invalid(&format!("unsupported geometry type '{}'", other))),
    })
}

fn position(v: &Json) -> MapResult<Coord> {
    let pair = array(v)?;
    match (
        pair.first().and_then(Json::as_f64),
        pair.get(1).and_then(Json::as_f64),
    ) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(invalid("position must hold two numbers")),
    }
}

fn positions(v: &Json) -> MapResult<Vec<Coord>> {
    array(v)?.iter().map(position).collect()
}

fn line_strings(v: &Json) -> MapResult<Vec<LineString>> {
    array(v)?
        .iter()
        .map(|line| positions(line).map(LineString::new))
        .collect()
}

/// Exterior ring first, holes after.
fn polygon(v: &Json) -> MapResult<Polygon> {
    let mut lines = line_strings(v)?.into_iter();
    let exterior = lines.next().ok_or_else(|| invalid("Polygon without rings"))?;
    Ok(Polygon::new(exterior, lines.collect()))
}

fn array(v: &Json) -> MapResult<&Vec<Json>> {
    v.as_array().ok_or_else(|| invalid("expected a coordinate array"))
}

fn member_str<'a>(v: &'a Json, key: &str) -> MapResult<&'a str> {
    v.get(key)
        .and_then(Json::as_str)
        .ok_or_else(|| invalid(&format!("missing '{}' member", key)))
}

fn invalid(reason: &str) -> MapError {
    MapError::Datasource(format!("invalid GeoJSON: {}", reason))
}

/// Writes features as a `FeatureCollection`.
pub fn to_string(features: &[Feature]) -> String {
    let items: Vec<Json> = features.iter().map(feature_json).collect();
    json!({ "type": "FeatureCollection", "features": items }).to_string()
}

fn feature_json(f: &Feature) -> Json {
    let properties: JsonMap<String, Json> = f
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    json!({
        "type": "Feature",
        "id": f.id,
        "geometry": geometry_json(&f.geometry),
        "properties": properties,
    })
}

fn geometry_json(g: &Geometry) -> Json {
    fn pos(c: &Coord) -> Json {
        json!([c.x, c.y])
    }
    fn line(ls: &LineString) -> Json {
        Json::Array(ls.coords().map(pos).collect())
    }
    fn poly(p: &Polygon) -> Json {
        Json::Array(rings(p).map(line).collect())
    }
    let (kind, coordinates) = match g {
        Geometry::Point(p) => ("Point", pos(&p.0)),
        Geometry::MultiPoint(mp) => (
            "MultiPoint",
            Json::Array(mp.iter().map(|p| pos(&p.0)).collect()),
        ),
        Geometry::Line(l) => ("LineString", json!([pos(&l.start), pos(&l.end)])),
        Geometry::LineString(ls) => ("LineString", line(ls)),
        Geometry::MultiLineString(mls) => {
            ("MultiLineString", Json::Array(mls.iter().map(line).collect()))
        }
        Geometry::Polygon(p) => ("Polygon", poly(p)),
        Geometry::Rect(r) => ("Polygon", poly(&r.to_polygon())),
        Geometry::Triangle(t) => ("Polygon", poly(&t.to_polygon())),
        Geometry::MultiPolygon(mp) => ("MultiPolygon", Json::Array(mp.iter().map(poly).collect())),
        Geometry::GeometryCollection(gc) => {
            let geometries: Vec<Json> = gc.iter().map(geometry_json).collect();
            return json!({ "type": "GeometryCollection", "geometries": geometries });
        }
    };
    json!({ "type": kind, "coordinates": coordinates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryExt;

    const POINTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]},
             "properties": {"id": 1, "name": "A"}},
            {"type": "Feature", "id": 42, "geometry": {"type": "Point", "coordinates": [3, 4]},
             "properties": {"id": 2, "name": "B"}}
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let features = parse(POINTS).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id, 1);
        assert_eq!(features[1].id, 42);
        assert_eq!(features[0].get("name"), Some(&Value::from("A")));
        assert_eq!(features[1].geometry, Geometry::Point(Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_parse_bare_polygon() {
        let features =
            parse(r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].geometry.envelope().to_array(), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_parse_polygon_with_hole() {
        let features = parse(
            r#"{"type":"Polygon","coordinates":[
                [[0,0],[10,0],[10,10],[0,10],[0,0]],
                [[4,4],[6,4],[6,6],[4,6],[4,4]]]}"#,
        )
        .unwrap();
        let Geometry::Polygon(p) = &features[0].geometry else {
            panic!("expected a polygon");
        };
        assert_eq!(p.interiors().len(), 1);
        assert_eq!(rings(p).count(), 2);
    }

    #[test]
    fn test_geometry_collection_written_and_reparsed() {
        let text = r#"{"type":"GeometryCollection","geometries":[
            {"type":"Point","coordinates":[1,2]},
            {"type":"LineString","coordinates":[[0,0],[5,5]]}]}"#;
        let features = parse(text).unwrap();
        assert_eq!(features[0].geometry.envelope().to_array(), [0.0, 0.0, 5.0, 5.0]);
        assert_eq!(parse(&to_string(&features)).unwrap(), features);
    }

    #[test]
    fn test_parse_errors_are_datasource_errors() {
        use crate::error::ErrorKind;
        assert_eq!(parse("not json").unwrap_err().kind(), ErrorKind::Datasource);
        assert_eq!(
            parse(r#"{"type":"Point","coordinates":["a"]}"#).unwrap_err().kind(),
            ErrorKind::Datasource
        );
    }

    #[test]
    fn test_written_collection_reparses() {
        let features = parse(POINTS).unwrap();
        let reparsed = parse(&to_string(&features)).unwrap();
        assert_eq!(reparsed, features);
    }
}
