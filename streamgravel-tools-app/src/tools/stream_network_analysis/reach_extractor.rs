use crate::errors::SamplingError;
use crate::tools::gis_analysis::{GeometryService, PolylineRecord};
use serde_json::{Map as JsonMap, Value as JsonValue};
use streamgravel_common::structures::{Point2D, Polyline};
use streamgravel_vector::VectorLayer;

/// The geometry of a single reach, borrowed from the stream network.
#[derive(Clone, Debug)]
pub struct ReachGeometry<'a> {
    /// Position of the reach among the network's line features.
    pub id: usize,
    pub polyline: &'a Polyline,
    pub attributes: &'a JsonMap<String, JsonValue>,
    pub first_point: Point2D,
    pub last_point: Point2D,
    /// Arc length in map units.
    pub length: f64,
    pub centroid: Point2D,
}

impl<'a> ReachGeometry<'a> {
    fn from_record(record: PolylineRecord<'a>) -> Result<ReachGeometry<'a>, SamplingError> {
        let line = record.polyline;
        match (line.first_point(), line.last_point(), line.centroid()) {
            (Some(first_point), Some(last_point), Some(centroid)) => Ok(ReachGeometry {
                id: record.index,
                polyline: line,
                attributes: record.attributes,
                first_point,
                last_point,
                length: line.length(),
                centroid,
            }),
            _ => Err(SamplingError::EmptyGeometry),
        }
    }
}

/// Yields one `ReachGeometry` per line feature of a stream network, in
/// feature order. Features without vertices are yielded as errors so the
/// caller can count them as skipped.
pub struct ReachGeometryExtractor<'a> {
    records: Box<dyn Iterator<Item = PolylineRecord<'a>> + Send + 'a>,
    total: usize,
}

impl<'a> ReachGeometryExtractor<'a> {
    pub fn new<G: GeometryService>(geometry: &G, network: &'a VectorLayer) -> Self {
        let total = geometry.iterate_polylines(network).count();
        ReachGeometryExtractor {
            records: geometry.iterate_polylines(network),
            total,
        }
    }

    /// Number of reaches in the network.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<'a> Iterator for ReachGeometryExtractor<'a> {
    type Item = (usize, Result<ReachGeometry<'a>, SamplingError>);

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some((record.index, ReachGeometry::from_record(record)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}
