use super::d8_flow_accumulation::d8_flow_accumulation;
use super::d8_pointer::d8_pointer;
use super::fill_depressions::fill_depressions;
use crate::errors::SamplingError;
use std::io::Error;
use std::path::Path;
use streamgravel_common::algorithms::point_in_rings;
use streamgravel_common::structures::{BoundingBox, Point2D};
use streamgravel_raster::Raster;

/// Raster terrain operations consumed by the grain size pipeline.
/// Implementations must be shareable across worker threads.
pub trait TerrainService: Sync {
    fn fill(&self, dem: &Raster) -> Result<Raster, Error>;
    fn flow_direction(&self, filled: &Raster) -> Result<Raster, Error>;
    fn flow_accumulation(&self, pointer: &Raster) -> Result<Raster, Error>;
    /// Area of one cell in squared map units.
    fn cell_area(&self, raster: &Raster) -> f64;
    fn sample_value(&self, raster: &Raster, point: &Point2D) -> Result<f64, SamplingError>;
    /// Maximum valid cell value within a polygon (exterior ring plus holes).
    fn zonal_max(&self, raster: &Raster, polygon: &[Vec<Point2D>]) -> Result<f64, SamplingError>;
}

/// Terrain service backed by in-memory rasters and D8 hydrology.
#[derive(Clone, Debug)]
pub struct D8TerrainService {
    /// Gradient imposed across filled flats, in elevation units per cell.
    pub flat_increment: f64,
}

impl Default for D8TerrainService {
    fn default() -> D8TerrainService {
        D8TerrainService {
            flat_increment: 1.0e-5,
        }
    }
}

fn derived_file_name(input: &Raster, suffix: &str) -> String {
    let path = Path::new(&input.file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("terrain");
    path.with_file_name(format!("{}_{}.asc", stem, suffix))
        .to_string_lossy()
        .to_string()
}

impl TerrainService for D8TerrainService {
    fn fill(&self, dem: &Raster) -> Result<Raster, Error> {
        fill_depressions(dem, &derived_file_name(dem, "filled"), self.flat_increment)
    }

    fn flow_direction(&self, filled: &Raster) -> Result<Raster, Error> {
        Ok(d8_pointer(filled, &derived_file_name(filled, "d8")))
    }

    fn flow_accumulation(&self, pointer: &Raster) -> Result<Raster, Error> {
        d8_flow_accumulation(pointer, &derived_file_name(pointer, "fa"))
    }

    fn cell_area(&self, raster: &Raster) -> f64 {
        raster.cell_area()
    }

    fn sample_value(&self, raster: &Raster, point: &Point2D) -> Result<f64, SamplingError> {
        if !raster.contains_point(point) {
            return Err(SamplingError::OutsideExtent {
                point: *point,
                source_name: raster.file_name.clone(),
            });
        }
        let value = raster[(raster.get_row_from_y(point.y), raster.get_column_from_x(point.x))];
        if value == raster.configs.nodata {
            return Err(SamplingError::NoData {
                point: *point,
                source_name: raster.file_name.clone(),
            });
        }
        Ok(value)
    }

    // A polygon narrower than a cell may contain no cell centres; the cell
    // under the polygon's envelope centre is used in that case.
    fn zonal_max(&self, raster: &Raster, polygon: &[Vec<Point2D>]) -> Result<f64, SamplingError> {
        let bb = match polygon.first() {
            Some(exterior) => BoundingBox::from_points(exterior),
            None => BoundingBox::default(),
        };
        let centre = Point2D::new(
            (bb.min_x + bb.max_x) / 2.0,
            (bb.min_y + bb.max_y) / 2.0,
        );
        if bb.is_empty() {
            return self.sample_value(raster, &centre);
        }

        let nodata = raster.configs.nodata;
        let last_row = raster.configs.rows as isize - 1;
        let last_col = raster.configs.columns as isize - 1;
        let row_start = raster.get_row_from_y(bb.max_y).max(0);
        let row_end = raster.get_row_from_y(bb.min_y).min(last_row);
        let col_start = raster.get_column_from_x(bb.min_x).max(0);
        let col_end = raster.get_column_from_x(bb.max_x).min(last_col);

        let mut max_val = f64::NEG_INFINITY;
        let mut num_cells = 0usize;
        for row in row_start..=row_end {
            for col in col_start..=col_end {
                let z = raster[(row, col)];
                if z == nodata {
                    continue;
                }
                let cell_centre =
                    Point2D::new(raster.get_x_from_column(col), raster.get_y_from_row(row));
                if point_in_rings(&cell_centre, polygon) {
                    num_cells += 1;
                    if z > max_val {
                        max_val = z;
                    }
                }
            }
        }
        if num_cells > 0 {
            return Ok(max_val);
        }
        self.sample_value(raster, &centre)
    }
}
