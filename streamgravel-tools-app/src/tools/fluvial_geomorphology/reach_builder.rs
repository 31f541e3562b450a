use super::config::{GrainSizeConfig, SamplePoint};
use super::hydraulics::{self, Region};
use super::reach::{Reach, ReachHydraulics, ReachSamples};
use super::samplers::{PrecipitationSampler, TemperatureSampler, TerrainSampler};
use crate::errors::GrainSizeError;
use crate::tools::gis_analysis::GeometryService;
use crate::tools::hydro_analysis::TerrainService;
use crate::tools::stream_network_analysis::ReachGeometry;
use streamgravel_common::structures::Point2D;

/// Samples the input surfaces along one reach and turns the samples into a
/// `Reach` with its grain size computed.
pub struct ReachBuilder<'a, T: TerrainService, G: GeometryService> {
    terrain: TerrainSampler<'a, T, G>,
    precipitation: PrecipitationSampler<'a, G>,
    temperature: Option<TemperatureSampler<'a, T>>,
    region: Region,
    mannings_n: f64,
    shields: f64,
    search_radius: f64,
    sample_point: SamplePoint,
}

impl<'a, T: TerrainService, G: GeometryService> ReachBuilder<'a, T, G> {
    pub fn new(
        terrain: TerrainSampler<'a, T, G>,
        precipitation: PrecipitationSampler<'a, G>,
        temperature: Option<TemperatureSampler<'a, T>>,
        config: &GrainSizeConfig,
    ) -> Self {
        ReachBuilder {
            terrain,
            precipitation,
            temperature,
            region: config.region,
            mannings_n: config.mannings_n,
            shields: config.shields,
            search_radius: config.search_radius,
            sample_point: config.sample_point,
        }
    }

    /// Builds a reach. A `GrainSizeError::Sampling` error means this reach
    /// alone cannot be estimated; any other error is fatal for the run.
    pub fn build(&self, geometry: &ReachGeometry) -> Result<Reach, GrainSizeError> {
        let first_elevation = self.terrain.elevation_at(&geometry.first_point)?;
        let last_elevation = self.terrain.elevation_at(&geometry.last_point)?;
        let slope = hydraulics::slope(geometry.length, first_elevation - last_elevation)?;

        let (point, elevation) = match self.sample_point {
            SamplePoint::First => (geometry.first_point, first_elevation),
            SamplePoint::Last => (geometry.last_point, last_elevation),
            SamplePoint::Centroid => (
                geometry.centroid,
                self.terrain.elevation_at(&geometry.centroid)?,
            ),
        };
        let drainage_area = self
            .terrain
            .flow_accumulation_near(&point, self.search_radius)?;
        let precipitation = self.precipitation.precipitation_at(&point)?;
        let min_jan_temp = self.min_jan_temp_at(&point)?;

        let width_area = self.terrain.area_units().to_square_kilometers(drainage_area);
        let width = hydraulics::width(width_area, precipitation);
        let q2 = hydraulics::q2(
            drainage_area,
            precipitation,
            elevation,
            self.region,
            min_jan_temp,
        )?;

        let mut reach = Reach::new(
            geometry.id,
            geometry.polyline.clone(),
            geometry.attributes.clone(),
            ReachHydraulics { width, q2, slope },
            ReachSamples {
                first_elevation,
                last_elevation,
                drainage_area,
                precipitation,
                min_jan_temp,
            },
        );
        reach.compute_grain_size(self.mannings_n, self.shields);
        Ok(reach)
    }

    fn min_jan_temp_at(&self, point: &Point2D) -> Result<Option<f64>, GrainSizeError> {
        if !self.region.requires_min_jan_temp() {
            return Ok(None);
        }
        match &self.temperature {
            Some(sampler) => Ok(Some(sampler.min_jan_temp_at(point)?)),
            None => Err(GrainSizeError::configuration(
                "Region 100 requires a minimum January temperature raster (--min_jan_temp).",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SamplingError;
    use crate::tools::fluvial_geomorphology::config::AreaUnits;
    use crate::tools::gis_analysis::{IndexedPolygonLayer, PlanarGeometryService};
    use crate::tools::hydro_analysis::test_grids::grid;
    use crate::tools::hydro_analysis::D8TerrainService;
    use approx::assert_relative_eq;
    use serde_json::{json, Map as JsonMap};
    use streamgravel_common::structures::Polyline;
    use streamgravel_raster::Raster;
    use streamgravel_vector::{VectorFeature, VectorGeometry, VectorLayer};

    fn precip_layer(inches: f64) -> IndexedPolygonLayer {
        let ring = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(100.0, 0.0),
            Point2D::new(100.0, 100.0),
            Point2D::new(0.0, 100.0),
            Point2D::new(0.0, 0.0),
        ];
        let mut layer = VectorLayer::new("precip.geojson", 0);
        layer.add_feature(
            VectorFeature::new(VectorGeometry::Polygon(vec![vec![ring]]))
                .with_attribute("Inches", json!(inches)),
        );
        IndexedPolygonLayer::new(layer).unwrap()
    }

    fn dem() -> Raster {
        grid(&[
            &[10.0, 10.0, 10.0],
            &[9.0, 9.0, 9.0],
            &[8.0, 8.0, 8.0],
        ])
    }

    fn geometry<'a>(
        line: &'a Polyline,
        attributes: &'a JsonMap<String, serde_json::Value>,
    ) -> ReachGeometry<'a> {
        ReachGeometry {
            id: 7,
            polyline: line,
            attributes,
            first_point: line.first_point().unwrap(),
            last_point: line.last_point().unwrap(),
            length: line.length(),
            centroid: line.centroid().unwrap(),
        }
    }

    #[test]
    fn test_build_reach() {
        let terrain = D8TerrainService::default();
        let gs = PlanarGeometryService::default();
        let dem = dem();
        let fa = grid(&[
            &[1.0, 1.0, 1.0],
            &[2.0, 2.0, 2.0],
            &[3.0, 3.0, 3.0],
        ]);
        let polygons = precip_layer(20.0);
        let config = GrainSizeConfig::new("dem.asc", "s.geojson", "p.geojson", "out", Region::R5);
        let builder = ReachBuilder::new(
            TerrainSampler::new(&terrain, &gs, &dem, &fa, AreaUnits::SquareKilometers),
            PrecipitationSampler::new(&gs, &polygons, "Inches"),
            None,
            &config,
        );
        let line = Polyline::new(vec![Point2D::new(15.0, 25.0), Point2D::new(15.0, 5.0)]);
        let attributes = JsonMap::new();
        let reach = builder.build(&geometry(&line, &attributes)).unwrap();

        assert_eq!(reach.id(), 7);
        assert_relative_eq!(reach.slope(), 0.1, max_relative = 1e-12);
        // the last point sits in the bottom row; its neighbourhood max is 3 cells
        assert_relative_eq!(reach.samples().drainage_area, 3.0e-4, max_relative = 1e-12);
        assert_relative_eq!(reach.samples().precipitation, 50.8, max_relative = 1e-12);
        assert_relative_eq!(
            reach.width(),
            hydraulics::width(3.0e-4, 50.8),
            max_relative = 1e-9
        );
        assert!(reach.has_grain_size());
        assert!(reach.grain_size() > 0.0);
    }

    #[test]
    fn test_width_uses_square_kilometers() {
        let terrain = D8TerrainService::default();
        let gs = PlanarGeometryService::default();
        let dem = dem();
        let fa = grid(&[
            &[1.0, 1.0, 1.0],
            &[2.0, 2.0, 2.0],
            &[3.0, 3.0, 3.0],
        ]);
        let polygons = precip_layer(20.0);
        let line = Polyline::new(vec![Point2D::new(15.0, 25.0), Point2D::new(15.0, 5.0)]);
        let attributes = JsonMap::new();
        let mut config = GrainSizeConfig::new("dem.asc", "s.geojson", "p.geojson", "out", Region::R1);

        let build = |config: &GrainSizeConfig| {
            let builder = ReachBuilder::new(
                TerrainSampler::new(&terrain, &gs, &dem, &fa, config.area_units),
                PrecipitationSampler::new(&gs, &polygons, "Inches"),
                None,
                config,
            );
            builder.build(&geometry(&line, &attributes)).unwrap()
        };
        let km = build(&config);
        config.area_units = AreaUnits::SquareMiles;
        let mi = build(&config);

        assert_relative_eq!(
            mi.samples().drainage_area,
            300.0 / 2_589_988.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(km.width(), mi.width(), max_relative = 1e-12);
        assert_relative_eq!(km.width(), hydraulics::width(3.0e-4, 50.8), max_relative = 1e-12);
        assert!(mi.q2() < km.q2());
    }

    #[test]
    fn test_sampling_failures() {
        let terrain = D8TerrainService::default();
        let gs = PlanarGeometryService::default();
        let dem = dem();
        let fa = dem.clone();
        let polygons = precip_layer(20.0);
        let config = GrainSizeConfig::new("dem.asc", "s.geojson", "p.geojson", "out", Region::R1);
        let builder = ReachBuilder::new(
            TerrainSampler::new(&terrain, &gs, &dem, &fa, AreaUnits::SquareKilometers),
            PrecipitationSampler::new(&gs, &polygons, "Inches"),
            None,
            &config,
        );
        let attributes = JsonMap::new();

        let outside = Polyline::new(vec![Point2D::new(15.0, 25.0), Point2D::new(45.0, 25.0)]);
        assert!(matches!(
            builder.build(&geometry(&outside, &attributes)),
            Err(GrainSizeError::Sampling(SamplingError::OutsideExtent { .. }))
        ));

        let closed = Polyline::new(vec![Point2D::new(15.0, 25.0), Point2D::new(15.0, 25.0)]);
        assert!(matches!(
            builder.build(&geometry(&closed, &attributes)),
            Err(GrainSizeError::Sampling(SamplingError::ZeroLengthReach))
        ));
    }

    #[test]
    fn test_region_100_without_temperature_is_fatal() {
        let terrain = D8TerrainService::default();
        let gs = PlanarGeometryService::default();
        let dem = dem();
        let fa = dem.clone();
        let polygons = precip_layer(20.0);
        let config = GrainSizeConfig::new("dem.asc", "s.geojson", "p.geojson", "out", Region::R100);
        let builder = ReachBuilder::new(
            TerrainSampler::new(&terrain, &gs, &dem, &fa, AreaUnits::SquareKilometers),
            PrecipitationSampler::new(&gs, &polygons, "Inches"),
            None,
            &config,
        );
        let line = Polyline::new(vec![Point2D::new(15.0, 25.0), Point2D::new(15.0, 5.0)]);
        let attributes = JsonMap::new();
        assert!(matches!(
            builder.build(&geometry(&line, &attributes)),
            Err(GrainSizeError::Configuration(_))
        ));

        let temps = grid(&[&[-8.0, -8.0, -8.0], &[-8.0, -8.0, -8.0], &[-8.0, -8.0, -8.0]]);
        let builder = ReachBuilder::new(
            TerrainSampler::new(&terrain, &gs, &dem, &fa, AreaUnits::SquareKilometers),
            PrecipitationSampler::new(&gs, &polygons, "Inches"),
            Some(TemperatureSampler::new(&terrain, &temps)),
            &config,
        );
        let reach = builder.build(&geometry(&line, &attributes)).unwrap();
        assert_relative_eq!(
            reach.samples().min_jan_temp.unwrap(),
            265.15,
            max_relative = 1e-12
        );
    }
}
