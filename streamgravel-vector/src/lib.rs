/*
This crate is part of the StreamGravel fluvial grain size library.
License: MIT
*/

//! Vector feature layers with attribute tables, read from and written to
//! GeoJSON.

mod geojson_io;

pub use self::geojson_io::{
    epsg_from_crs_name, parse_geojson, read_geojson, to_feature_collection, write_geojson,
};

use serde_json::{Map as JsonMap, Value as JsonValue};
use std::io::Error;
use streamgravel_common::structures::{BoundingBox, Point2D, Polyline};

/// A polygon as an exterior ring followed by zero or more holes.
pub type PolygonRings = Vec<Vec<Point2D>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VectorGeometry {
    Null,
    Point(Point2D),
    PolyLine(Polyline),
    /// One or more polygons (a multipolygon when more than one).
    Polygon(Vec<PolygonRings>),
}

impl VectorGeometry {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            VectorGeometry::Null => ShapeType::Null,
            VectorGeometry::Point(_) => ShapeType::Point,
            VectorGeometry::PolyLine(_) => ShapeType::PolyLine,
            VectorGeometry::Polygon(_) => ShapeType::Polygon,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            VectorGeometry::Null => BoundingBox::default(),
            VectorGeometry::Point(p) => BoundingBox::from_points(&[*p]),
            VectorGeometry::PolyLine(line) => line.bounding_box(),
            VectorGeometry::Polygon(polys) => {
                let mut bb = BoundingBox::default();
                for rings in polys {
                    if let Some(exterior) = rings.first() {
                        bb.expand_to(&BoundingBox::from_points(exterior));
                    }
                }
                bb
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VectorFeature {
    pub geometry: VectorGeometry,
    pub attributes: JsonMap<String, JsonValue>,
}

impl VectorFeature {
    pub fn new(geometry: VectorGeometry) -> VectorFeature {
        VectorFeature {
            geometry,
            attributes: JsonMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: JsonValue) -> VectorFeature {
        self.attributes.insert(name.to_string(), value);
        self
    }

    /// Numeric attribute lookup. Numbers stored as strings are accepted,
    /// as attribute tables converted from shapefiles often carry them.
    pub fn get_attribute_as_f64(&self, name: &str) -> Option<f64> {
        match self.attributes.get(name)? {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorLayer {
    pub file_name: String,
    /// 0 when the coordinate system is unknown.
    pub epsg_code: u16,
    pub features: Vec<VectorFeature>,
}

impl VectorLayer {
    pub fn new(file_name: &str, epsg_code: u16) -> VectorLayer {
        VectorLayer {
            file_name: file_name.to_string(),
            epsg_code,
            features: vec![],
        }
    }

    pub fn read(file_name: &str) -> Result<VectorLayer, Error> {
        read_geojson(file_name)
    }

    pub fn write(&self) -> Result<(), Error> {
        write_geojson(self, &self.file_name)
    }

    pub fn add_feature(&mut self, feature: VectorFeature) {
        self.features.push(feature);
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// True when every non-null feature has the given shape type.
    pub fn is_shape_type(&self, shape_type: ShapeType) -> bool {
        self.features
            .iter()
            .map(|f| f.geometry.shape_type())
            .filter(|t| *t != ShapeType::Null)
            .all(|t| t == shape_type)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::default();
        for f in &self.features {
            bb.expand_to(&f.geometry.bounding_box());
        }
        bb
    }
}
