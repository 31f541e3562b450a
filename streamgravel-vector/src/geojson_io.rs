use crate::{PolygonRings, VectorFeature, VectorGeometry, VectorLayer};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value as GeoValue};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::fs::{self, File};
use std::io::{Error, ErrorKind, Write};
use streamgravel_common::structures::{Point2D, Polyline};

fn to_point(position: &[f64]) -> Result<Point2D, Error> {
    if position.len() < 2 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "GeoJSON position with fewer than two coordinates.",
        ));
    }
    Ok(Point2D::new(position[0], position[1]))
}

fn to_points(positions: &[Vec<f64>]) -> Result<Vec<Point2D>, Error> {
    positions.iter().map(|p| to_point(p)).collect()
}

fn to_rings(rings: &[Vec<Vec<f64>>]) -> Result<PolygonRings, Error> {
    rings.iter().map(|r| to_points(r)).collect()
}

fn from_points(points: &[Point2D]) -> Vec<Vec<f64>> {
    points.iter().map(|p| vec![p.x, p.y]).collect()
}

fn convert_geometry(value: &GeoValue) -> Result<VectorGeometry, Error> {
    let geometry = match value {
        GeoValue::Point(p) => VectorGeometry::Point(to_point(p)?),
        GeoValue::LineString(line) => VectorGeometry::PolyLine(Polyline::new(to_points(line)?)),
        GeoValue::MultiLineString(lines) => {
            let mut parts = Vec::with_capacity(lines.len());
            for line in lines {
                parts.push(to_points(line)?);
            }
            VectorGeometry::PolyLine(Polyline::from_parts(parts))
        }
        GeoValue::Polygon(rings) => VectorGeometry::Polygon(vec![to_rings(rings)?]),
        GeoValue::MultiPolygon(polys) => {
            let mut out = Vec::with_capacity(polys.len());
            for rings in polys {
                out.push(to_rings(rings)?);
            }
            VectorGeometry::Polygon(out)
        }
        _ => VectorGeometry::Null,
    };
    Ok(geometry)
}

fn to_geojson_value(geometry: &VectorGeometry) -> Option<GeoValue> {
    match geometry {
        VectorGeometry::Null => None,
        VectorGeometry::Point(p) => Some(GeoValue::Point(vec![p.x, p.y])),
        VectorGeometry::PolyLine(line) => {
            if line.num_parts() == 1 {
                Some(GeoValue::LineString(from_points(line.part(0))))
            } else {
                Some(GeoValue::MultiLineString(
                    line.part_iter().map(from_points).collect(),
                ))
            }
        }
        VectorGeometry::Polygon(polys) => {
            let converted: Vec<Vec<Vec<Vec<f64>>>> = polys
                .iter()
                .map(|rings| rings.iter().map(|r| from_points(r)).collect())
                .collect();
            if converted.len() == 1 {
                converted.into_iter().next().map(GeoValue::Polygon)
            } else {
                Some(GeoValue::MultiPolygon(converted))
            }
        }
    }
}

/// Parses the EPSG code from an OGC CRS name such as
/// `urn:ogc:def:crs:EPSG::26912` or `EPSG:26912`.
pub fn epsg_from_crs_name(name: &str) -> Option<u16> {
    let upper = name.to_uppercase();
    let pos = upper.rfind("EPSG")?;
    let digits: String = upper[pos + 4..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u16>().ok()
}

fn epsg_from_foreign_members(members: &Option<JsonMap<String, JsonValue>>) -> u16 {
    members
        .as_ref()
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .and_then(epsg_from_crs_name)
        .unwrap_or(0)
}

fn convert_feature(feature: &Feature) -> Result<VectorFeature, Error> {
    let geometry = match &feature.geometry {
        Some(g) => convert_geometry(&g.value)?,
        None => VectorGeometry::Null,
    };
    Ok(VectorFeature {
        geometry,
        attributes: feature.properties.clone().unwrap_or_default(),
    })
}

pub fn parse_geojson(text: &str, file_name: &str) -> Result<VectorLayer, Error> {
    let gj: GeoJson = text.parse().map_err(|e| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Error parsing GeoJSON {}: {}", file_name, e),
        )
    })?;
    let mut layer = VectorLayer::new(file_name, 0);
    match gj {
        GeoJson::FeatureCollection(fc) => {
            layer.epsg_code = epsg_from_foreign_members(&fc.foreign_members);
            for feature in &fc.features {
                layer.add_feature(convert_feature(feature)?);
            }
        }
        GeoJson::Feature(feature) => {
            layer.epsg_code = epsg_from_foreign_members(&feature.foreign_members);
            layer.add_feature(convert_feature(&feature)?);
        }
        GeoJson::Geometry(geometry) => {
            layer.epsg_code = epsg_from_foreign_members(&geometry.foreign_members);
            layer.add_feature(VectorFeature::new(convert_geometry(&geometry.value)?));
        }
    }
    Ok(layer)
}

pub fn read_geojson(file_name: &str) -> Result<VectorLayer, Error> {
    let text = fs::read_to_string(file_name).map_err(|e| {
        Error::new(e.kind(), format!("Unable to open vector {}: {}", file_name, e))
    })?;
    parse_geojson(&text, file_name)
}

pub fn to_feature_collection(layer: &VectorLayer) -> FeatureCollection {
    let features = layer
        .features
        .iter()
        .map(|f| Feature {
            bbox: None,
            geometry: to_geojson_value(&f.geometry).map(Geometry::new),
            id: None,
            properties: Some(f.attributes.clone()),
            foreign_members: None,
        })
        .collect();

    let mut foreign_members: Option<JsonMap<String, JsonValue>> = None;
    if layer.epsg_code != 0 {
        let mut members = JsonMap::new();
        members.insert(
            "crs".to_string(),
            json!({
                "type": "name",
                "properties": {"name": format!("urn:ogc:def:crs:EPSG::{}", layer.epsg_code)}
            }),
        );
        foreign_members = Some(members);
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}

pub fn write_geojson(layer: &VectorLayer, file_name: &str) -> Result<(), Error> {
    let geojson = GeoJson::FeatureCollection(to_feature_collection(layer)).to_string();
    let mut file = File::create(file_name)?;
    file.write_all(geojson.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShapeType;

    const STREAMS: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::26912"}},
        "features": [
            {"type": "Feature", "properties": {"FID": 0, "GNIS_Name": "Temple Fork"},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [30.0, 40.0]]}},
            {"type": "Feature", "properties": {"FID": 1},
             "geometry": {"type": "MultiLineString", "coordinates": [[[0.0, 0.0], [1.0, 0.0]], [[2.0, 0.0], [3.0, 0.0]]]}}
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let layer = parse_geojson(STREAMS, "streams.geojson").unwrap();
        assert_eq!(layer.epsg_code, 26912);
        assert_eq!(layer.num_features(), 2);
        assert!(layer.is_shape_type(ShapeType::PolyLine));
        match &layer.features[0].geometry {
            VectorGeometry::PolyLine(line) => assert_eq!(line.length(), 50.0),
            other => panic!("unexpected geometry {:?}", other),
        }
        match &layer.features[1].geometry {
            VectorGeometry::PolyLine(line) => assert_eq!(line.num_parts(), 2),
            other => panic!("unexpected geometry {:?}", other),
        }
        assert_eq!(
            layer.features[0].attributes.get("GNIS_Name"),
            Some(&json!("Temple Fork"))
        );
    }

    #[test]
    fn test_write_preserves_crs_and_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let layer = parse_geojson(STREAMS, "streams.geojson").unwrap();
        write_geojson(&layer, path.to_str().unwrap()).unwrap();
        let reread = read_geojson(path.to_str().unwrap()).unwrap();
        assert_eq!(reread.epsg_code, 26912);
        assert_eq!(reread.features, layer.features);
    }

    #[test]
    fn test_crs_name_forms() {
        assert_eq!(epsg_from_crs_name("urn:ogc:def:crs:EPSG::4326"), Some(4326));
        assert_eq!(epsg_from_crs_name("EPSG:32612"), Some(32612));
        assert_eq!(epsg_from_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84"), None);
    }
}
