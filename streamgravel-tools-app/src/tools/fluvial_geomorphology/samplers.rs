use super::config::AreaUnits;
use super::hydraulics::CM_PER_INCH;
use crate::errors::SamplingError;
use crate::tools::gis_analysis::{GeometryService, IndexedPolygonLayer};
use crate::tools::hydro_analysis::TerrainService;
use serde_json::Value as JsonValue;
use streamgravel_common::structures::Point2D;
use streamgravel_raster::Raster;

const KELVIN_OFFSET: f64 = 273.15;

/// Point queries against the elevation and flow-accumulation surfaces.
pub struct TerrainSampler<'a, T: TerrainService, G: GeometryService> {
    terrain: &'a T,
    geometry: &'a G,
    elevation: &'a Raster,
    flow_accumulation: &'a Raster,
    area_units: AreaUnits,
}

impl<'a, T: TerrainService, G: GeometryService> TerrainSampler<'a, T, G> {
    pub fn new(
        terrain: &'a T,
        geometry: &'a G,
        elevation: &'a Raster,
        flow_accumulation: &'a Raster,
        area_units: AreaUnits,
    ) -> Self {
        TerrainSampler {
            terrain,
            geometry,
            elevation,
            flow_accumulation,
            area_units,
        }
    }

    pub fn area_units(&self) -> AreaUnits {
        self.area_units
    }

    pub fn elevation_at(&self, point: &Point2D) -> Result<f64, SamplingError> {
        self.terrain.sample_value(self.elevation, point)
    }

    /// Drainage area (in the configured units) of the highest-accumulation
    /// cell within `search_radius` of the point.
    pub fn flow_accumulation_near(
        &self,
        point: &Point2D,
        search_radius: f64,
    ) -> Result<f64, SamplingError> {
        let buffer = self.geometry.point_buffer(point, search_radius);
        let cells = self.terrain.zonal_max(self.flow_accumulation, &buffer)?;
        let area = cells * self.terrain.cell_area(self.flow_accumulation)
            / self.area_units.square_meters_per_unit();
        Ok(area.max(0f64))
    }
}

/// Mean annual precipitation lookups against a polygon layer whose attribute
/// is recorded in inches.
pub struct PrecipitationSampler<'a, G: GeometryService> {
    geometry: &'a G,
    polygons: &'a IndexedPolygonLayer,
    field: String,
}

impl<'a, G: GeometryService> PrecipitationSampler<'a, G> {
    pub fn new(geometry: &'a G, polygons: &'a IndexedPolygonLayer, field: &str) -> Self {
        PrecipitationSampler {
            geometry,
            polygons,
            field: field.to_string(),
        }
    }

    /// Precipitation in centimetres. Negative or non-numeric attribute
    /// values are rejected.
    pub fn precipitation_at(&self, point: &Point2D) -> Result<f64, SamplingError> {
        let value = self
            .geometry
            .intersect_attribute(point, self.polygons, &self.field)?;
        let inches = match value {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match inches {
            Some(v) if v.is_finite() && v >= 0f64 => Ok(v * CM_PER_INCH),
            _ => Err(SamplingError::InvalidAttribute {
                field: self.field.clone(),
                feature: self.polygons.find_feature(point).unwrap_or(0),
                layer: self.polygons.layer().file_name.clone(),
            }),
        }
    }
}

/// Minimum January temperature lookups against a raster in degrees Celsius.
pub struct TemperatureSampler<'a, T: TerrainService> {
    terrain: &'a T,
    raster: &'a Raster,
}

impl<'a, T: TerrainService> TemperatureSampler<'a, T> {
    pub fn new(terrain: &'a T, raster: &'a Raster) -> Self {
        TemperatureSampler { terrain, raster }
    }

    /// Temperature in kelvin.
    pub fn min_jan_temp_at(&self, point: &Point2D) -> Result<f64, SamplingError> {
        Ok(self.terrain.sample_value(self.raster, point)? + KELVIN_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::gis_analysis::PlanarGeometryService;
    use crate::tools::hydro_analysis::test_grids::grid;
    use crate::tools::hydro_analysis::D8TerrainService;
    use approx::assert_relative_eq;
    use serde_json::json;
    use streamgravel_vector::{VectorFeature, VectorGeometry, VectorLayer};

    fn fa_grid() -> Raster {
        grid(&[
            &[1.0, 1.0, 1.0, 1.0, 1.0],
            &[1.0, 2.0, 3.0, 2.0, 1.0],
            &[1.0, 3.0, 9.0, 4.0, 1.0],
            &[1.0, 2.0, 40.0, 2.0, 1.0],
            &[1.0, 1.0, 50.0, 1.0, 1.0],
        ])
    }

    #[test]
    fn test_flow_accumulation_near() {
        let terrain = D8TerrainService::default();
        let geometry = PlanarGeometryService::default();
        let dem = fa_grid();
        let fa = fa_grid();
        let sampler =
            TerrainSampler::new(&terrain, &geometry, &dem, &fa, AreaUnits::SquareKilometers);
        // 12 m reaches the four edge neighbours; 40 cells of 100 m2
        let area = sampler
            .flow_accumulation_near(&Point2D::new(25.0, 25.0), 12.0)
            .unwrap();
        assert_relative_eq!(area, 0.004, max_relative = 1e-12);

        let sampler = TerrainSampler::new(&terrain, &geometry, &dem, &fa, AreaUnits::SquareMiles);
        let area = sampler
            .flow_accumulation_near(&Point2D::new(25.0, 25.0), 12.0)
            .unwrap();
        assert_relative_eq!(area, 4000.0 / 2_589_988.0, max_relative = 1e-12);

        assert_eq!(sampler.elevation_at(&Point2D::new(25.0, 5.0)).unwrap(), 50.0);
        assert!(matches!(
            sampler.elevation_at(&Point2D::new(-5.0, 5.0)),
            Err(SamplingError::OutsideExtent { .. })
        ));
    }

    #[test]
    fn test_precipitation_in_centimetres() {
        let square = vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
            Point2D::new(0.0, 0.0),
        ]];
        let mut layer = VectorLayer::new("precip.geojson", 0);
        layer.add_feature(
            VectorFeature::new(VectorGeometry::Polygon(vec![square.clone()]))
                .with_attribute("Inches", json!(20))
                .with_attribute("Zone", json!("A"))
                .with_attribute("Bad", json!(-3.5)),
        );
        let polygons = IndexedPolygonLayer::new(layer).unwrap();
        let geometry = PlanarGeometryService::default();

        let sampler = PrecipitationSampler::new(&geometry, &polygons, "Inches");
        assert_relative_eq!(
            sampler.precipitation_at(&Point2D::new(5.0, 5.0)).unwrap(),
            50.8,
            max_relative = 1e-12
        );
        assert!(matches!(
            sampler.precipitation_at(&Point2D::new(50.0, 5.0)),
            Err(SamplingError::NoIntersectingPolygon { .. })
        ));

        let sampler = PrecipitationSampler::new(&geometry, &polygons, "Zone");
        assert!(matches!(
            sampler.precipitation_at(&Point2D::new(5.0, 5.0)),
            Err(SamplingError::InvalidAttribute { feature: 0, .. })
        ));

        let sampler = PrecipitationSampler::new(&geometry, &polygons, "Bad");
        assert!(matches!(
            sampler.precipitation_at(&Point2D::new(5.0, 5.0)),
            Err(SamplingError::InvalidAttribute { feature: 0, .. })
        ));
    }

    #[test]
    fn test_temperature_in_kelvin() {
        let terrain = D8TerrainService::default();
        let temps = grid(&[&[-10.0, -8.5]]);
        let sampler = TemperatureSampler::new(&terrain, &temps);
        assert_relative_eq!(
            sampler.min_jan_temp_at(&Point2D::new(15.0, 5.0)).unwrap(),
            264.65,
            max_relative = 1e-12
        );
    }
}
