use crate::errors::SamplingError;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::io::{Error, ErrorKind};
use streamgravel_common::algorithms::{clip_polyline_to_polygons, point_buffer, point_in_rings};
use streamgravel_common::structures::{BoundingBox, Point2D, Polyline};
use streamgravel_raster::{Raster, RasterConfigs};
use streamgravel_vector::{PolygonRings, ShapeType, VectorFeature, VectorGeometry, VectorLayer};

/// One polyline feature of a network, borrowed from its layer.
#[derive(Clone, Copy, Debug)]
pub struct PolylineRecord<'a> {
    pub index: usize,
    pub polyline: &'a Polyline,
    pub attributes: &'a JsonMap<String, JsonValue>,
}

type PolygonEnvelope = GeomWithData<Rectangle<[f64; 2]>, (usize, usize)>;

/// A polygon layer with an R-tree over the envelopes of its polygons, for
/// point-in-polygon queries against large layers. Tree entries carry the
/// feature index and the polygon index within a multipolygon feature.
pub struct IndexedPolygonLayer {
    layer: VectorLayer,
    tree: RTree<PolygonEnvelope>,
}

impl IndexedPolygonLayer {
    pub fn new(layer: VectorLayer) -> Result<IndexedPolygonLayer, Error> {
        if !layer.is_shape_type(ShapeType::Polygon) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("{} must contain polygon features.", layer.file_name),
            ));
        }
        let mut envelopes = vec![];
        for (fid, feature) in layer.features.iter().enumerate() {
            if let VectorGeometry::Polygon(polys) = &feature.geometry {
                for (pid, rings) in polys.iter().enumerate() {
                    if let Some(exterior) = rings.first() {
                        let bb = BoundingBox::from_points(exterior);
                        if bb.is_empty() {
                            continue;
                        }
                        envelopes.push(GeomWithData::new(
                            Rectangle::from_corners([bb.min_x, bb.min_y], [bb.max_x, bb.max_y]),
                            (fid, pid),
                        ));
                    }
                }
            }
        }
        Ok(IndexedPolygonLayer {
            layer,
            tree: RTree::bulk_load(envelopes),
        })
    }

    pub fn layer(&self) -> &VectorLayer {
        &self.layer
    }

    /// Index of the first feature (in layer order) containing the point.
    pub fn find_feature(&self, point: &Point2D) -> Option<usize> {
        let mut candidates: Vec<(usize, usize)> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x, point.y]))
            .map(|e| e.data)
            .collect();
        candidates.sort_unstable();
        candidates.into_iter().find_map(|(fid, pid)| {
            match &self.layer.features[fid].geometry {
                VectorGeometry::Polygon(polys) if point_in_rings(point, &polys[pid]) => Some(fid),
                _ => None,
            }
        })
    }
}

/// Vector operations consumed by the grain size pipeline.
pub trait GeometryService: Sync {
    /// Clips polyline features to the polygons of `boundary`, keeping each
    /// feature's attributes. Features falling wholly outside are dropped.
    fn clip(&self, network: &VectorLayer, boundary: &VectorLayer) -> Result<VectorLayer, Error>;

    fn iterate_polylines<'a>(
        &self,
        network: &'a VectorLayer,
    ) -> Box<dyn Iterator<Item = PolylineRecord<'a>> + Send + 'a>;

    fn point_buffer(&self, point: &Point2D, radius: f64) -> PolygonRings;

    fn intersect_attribute<'a>(
        &self,
        point: &Point2D,
        polygons: &'a IndexedPolygonLayer,
        attribute: &str,
    ) -> Result<&'a JsonValue, SamplingError>;

    /// Burns a polygon into a raster of the given cell size: 1 inside,
    /// nodata elsewhere. The grid is aligned to multiples of `cell_size`.
    fn rasterize_polygon(&self, polygon: &[Vec<Point2D>], cell_size: f64) -> Result<Raster, Error>;
}

/// Planar (projected coordinate) implementation of `GeometryService`.
#[derive(Clone, Debug)]
pub struct PlanarGeometryService {
    /// Number of edges used to approximate a circular buffer.
    pub buffer_segments: usize,
}

impl Default for PlanarGeometryService {
    fn default() -> PlanarGeometryService {
        PlanarGeometryService {
            buffer_segments: 36,
        }
    }
}

impl GeometryService for PlanarGeometryService {
    fn clip(&self, network: &VectorLayer, boundary: &VectorLayer) -> Result<VectorLayer, Error> {
        if !boundary.is_shape_type(ShapeType::Polygon) || boundary.num_features() == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The clipping boundary must contain at least one polygon.",
            ));
        }
        let polygons: Vec<&PolygonRings> = boundary
            .features
            .iter()
            .filter_map(|f| match &f.geometry {
                VectorGeometry::Polygon(polys) => Some(polys),
                _ => None,
            })
            .flatten()
            .collect();
        let boundary_bb = boundary.bounding_box();

        let mut output = VectorLayer::new(&network.file_name, network.epsg_code);
        for feature in &network.features {
            let line = match &feature.geometry {
                VectorGeometry::PolyLine(line) => line,
                _ => continue,
            };
            if !line.bounding_box().intersects(&boundary_bb) {
                continue;
            }
            let mut parts: Vec<Vec<Point2D>> = vec![];
            for part in line.part_iter() {
                parts.extend(clip_polyline_to_polygons(part, &polygons));
            }
            if parts.is_empty() {
                continue;
            }
            output.add_feature(VectorFeature {
                geometry: VectorGeometry::PolyLine(Polyline::from_parts(parts)),
                attributes: feature.attributes.clone(),
            });
        }
        Ok(output)
    }

    fn iterate_polylines<'a>(
        &self,
        network: &'a VectorLayer,
    ) -> Box<dyn Iterator<Item = PolylineRecord<'a>> + Send + 'a> {
        Box::new(
            network
                .features
                .iter()
                .filter_map(|f| match &f.geometry {
                    VectorGeometry::PolyLine(line) => Some((line, &f.attributes)),
                    _ => None,
                })
                .enumerate()
                .map(|(index, (polyline, attributes))| PolylineRecord {
                    index,
                    polyline,
                    attributes,
                }),
        )
    }

    fn point_buffer(&self, point: &Point2D, radius: f64) -> PolygonRings {
        vec![point_buffer(point, radius, self.buffer_segments)]
    }

    fn intersect_attribute<'a>(
        &self,
        point: &Point2D,
        polygons: &'a IndexedPolygonLayer,
        attribute: &str,
    ) -> Result<&'a JsonValue, SamplingError> {
        let fid = polygons
            .find_feature(point)
            .ok_or_else(|| SamplingError::NoIntersectingPolygon {
                point: *point,
                layer: polygons.layer.file_name.clone(),
            })?;
        polygons.layer.features[fid]
            .attributes
            .get(attribute)
            .ok_or_else(|| SamplingError::InvalidAttribute {
                field: attribute.to_string(),
                feature: fid,
                layer: polygons.layer.file_name.clone(),
            })
    }

    fn rasterize_polygon(&self, polygon: &[Vec<Point2D>], cell_size: f64) -> Result<Raster, Error> {
        if !(cell_size > 0f64) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The rasterization cell size must be positive.",
            ));
        }
        let bb = match polygon.first() {
            Some(exterior) if exterior.len() > 2 => BoundingBox::from_points(exterior),
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "Cannot rasterize an empty polygon.",
                ))
            }
        };
        let west = (bb.min_x / cell_size).floor() * cell_size;
        let south = (bb.min_y / cell_size).floor() * cell_size;
        let east = (bb.max_x / cell_size).ceil() * cell_size;
        let north = (bb.max_y / cell_size).ceil() * cell_size;
        let configs = RasterConfigs {
            rows: (((north - south) / cell_size).round() as usize).max(1),
            columns: (((east - west) / cell_size).round() as usize).max(1),
            nodata: -32768.0,
            north,
            south,
            east,
            west,
            resolution_x: cell_size,
            resolution_y: cell_size,
            ..Default::default()
        };
        let mut output = Raster::initialize_using_config("rasterized.asc", &configs);
        let rows = output.configs.rows as isize;
        let columns = output.configs.columns as isize;
        for row in 0..rows {
            for col in 0..columns {
                let centre = Point2D::new(output.get_x_from_column(col), output.get_y_from_row(row));
                if point_in_rings(&centre, polygon) {
                    output[(row, col)] = 1f64;
                }
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(min_x: f64, min_y: f64, size: f64) -> PolygonRings {
        vec![vec![
            Point2D::new(min_x, min_y),
            Point2D::new(min_x + size, min_y),
            Point2D::new(min_x + size, min_y + size),
            Point2D::new(min_x, min_y + size),
            Point2D::new(min_x, min_y),
        ]]
    }

    fn precip_layer() -> IndexedPolygonLayer {
        let mut layer = VectorLayer::new("precip.geojson", 0);
        layer.add_feature(
            VectorFeature::new(VectorGeometry::Polygon(vec![square(0.0, 0.0, 100.0)]))
                .with_attribute("Inches", json!(20.0)),
        );
        layer.add_feature(
            VectorFeature::new(VectorGeometry::Polygon(vec![
                square(100.0, 0.0, 100.0),
                square(300.0, 0.0, 50.0),
            ]))
            .with_attribute("Inches", json!(30.0)),
        );
        layer.add_feature(VectorFeature::new(VectorGeometry::Polygon(vec![square(
            0.0, 200.0, 10.0,
        )])));
        IndexedPolygonLayer::new(layer).unwrap()
    }

    #[test]
    fn test_intersect_attribute() {
        let gs = PlanarGeometryService::default();
        let layer = precip_layer();
        let v = gs
            .intersect_attribute(&Point2D::new(50.0, 50.0), &layer, "Inches")
            .unwrap();
        assert_eq!(v, &json!(20.0));
        let v = gs
            .intersect_attribute(&Point2D::new(325.0, 25.0), &layer, "Inches")
            .unwrap();
        assert_eq!(v, &json!(30.0));
        // a point on the shared edge resolves to the first feature
        let v = gs
            .intersect_attribute(&Point2D::new(100.0, 50.0), &layer, "Inches")
            .unwrap();
        assert_eq!(v, &json!(20.0));
        assert!(matches!(
            gs.intersect_attribute(&Point2D::new(250.0, 50.0), &layer, "Inches"),
            Err(SamplingError::NoIntersectingPolygon { .. })
        ));
        assert!(matches!(
            gs.intersect_attribute(&Point2D::new(5.0, 205.0), &layer, "Inches"),
            Err(SamplingError::InvalidAttribute { feature: 2, .. })
        ));
    }

    #[test]
    fn test_non_polygon_layer_rejected() {
        let mut layer = VectorLayer::new("points.geojson", 0);
        layer.add_feature(VectorFeature::new(VectorGeometry::Point(Point2D::new(0.0, 0.0))));
        assert!(IndexedPolygonLayer::new(layer).is_err());
    }

    #[test]
    fn test_clip_preserves_attributes() {
        let gs = PlanarGeometryService::default();
        let mut network = VectorLayer::new("streams.geojson", 26912);
        network.add_feature(
            VectorFeature::new(VectorGeometry::PolyLine(Polyline::new(vec![
                Point2D::new(-50.0, 50.0),
                Point2D::new(50.0, 50.0),
            ])))
            .with_attribute("StreamName", json!("Temple Fork")),
        );
        network.add_feature(VectorFeature::new(VectorGeometry::PolyLine(Polyline::new(
            vec![Point2D::new(500.0, 500.0), Point2D::new(600.0, 600.0)],
        ))));
        let mut boundary = VectorLayer::new("huc10.geojson", 26912);
        boundary.add_feature(VectorFeature::new(VectorGeometry::Polygon(vec![square(
            0.0, 0.0, 100.0,
        )])));

        let clipped = gs.clip(&network, &boundary).unwrap();
        assert_eq!(clipped.num_features(), 1);
        assert_eq!(clipped.epsg_code, 26912);
        assert_eq!(
            clipped.features[0].attributes.get("StreamName"),
            Some(&json!("Temple Fork"))
        );
        match &clipped.features[0].geometry {
            VectorGeometry::PolyLine(line) => {
                assert_eq!(line.first_point(), Some(Point2D::new(0.0, 50.0)));
                assert!((line.length() - 50.0).abs() < 1e-9);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_clip_across_adjacent_boundary_polygons() {
        let gs = PlanarGeometryService::default();
        let mut network = VectorLayer::new("streams.geojson", 0);
        network.add_feature(VectorFeature::new(VectorGeometry::PolyLine(Polyline::new(
            vec![Point2D::new(50.0, 190.0), Point2D::new(50.0, 10.0)],
        ))));
        let mut boundary = VectorLayer::new("huc12.geojson", 0);
        boundary.add_feature(VectorFeature::new(VectorGeometry::Polygon(vec![square(
            0.0, 0.0, 100.0,
        )])));
        boundary.add_feature(VectorFeature::new(VectorGeometry::Polygon(vec![square(
            0.0, 100.0, 100.0,
        )])));

        let clipped = gs.clip(&network, &boundary).unwrap();
        assert_eq!(clipped.num_features(), 1);
        match &clipped.features[0].geometry {
            VectorGeometry::PolyLine(line) => {
                assert_eq!(line.num_parts(), 1);
                assert_eq!(line.first_point(), Some(Point2D::new(50.0, 190.0)));
                assert_eq!(line.last_point(), Some(Point2D::new(50.0, 10.0)));
                assert!((line.length() - 180.0).abs() < 1e-9);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_iterate_polylines_skips_other_geometries() {
        let gs = PlanarGeometryService::default();
        let mut network = VectorLayer::new("streams.geojson", 0);
        network.add_feature(VectorFeature::new(VectorGeometry::Null));
        network.add_feature(VectorFeature::new(VectorGeometry::PolyLine(Polyline::new(
            vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)],
        ))));
        let records: Vec<PolylineRecord> = gs.iterate_polylines(&network).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].index, 0);
    }

    #[test]
    fn test_rasterize_polygon() {
        let gs = PlanarGeometryService::default();
        let r = gs.rasterize_polygon(&square(3.0, 3.0, 14.0), 10.0).unwrap();
        assert_eq!(r.configs.west, 0.0);
        assert_eq!(r.configs.north, 20.0);
        assert_eq!(r.configs.rows, 2);
        assert_eq!(r.configs.columns, 2);
        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(r[(row, col)], 1.0);
            }
        }
        let ring = gs.point_buffer(&Point2D::new(50.0, 50.0), 20.0);
        let r = gs.rasterize_polygon(&ring, 10.0).unwrap();
        assert_eq!(r[(0, 0)], -32768.0);
        assert_eq!(r[(1, 1)], 1.0);
    }
}
