pub mod d8_flow_accumulation;
pub mod d8_pointer;
pub mod fill_depressions;
mod terrain_service;

pub use self::terrain_service::{D8TerrainService, TerrainService};

#[cfg(test)]
pub(crate) mod test_grids {
    use streamgravel_raster::{Raster, RasterConfigs};

    /// Builds a 10 m raster with its south-west corner at the origin.
    pub fn grid(values: &[&[f64]]) -> Raster {
        let configs = RasterConfigs {
            rows: values.len(),
            columns: values[0].len(),
            nodata: -9999.0,
            north: values.len() as f64 * 10.0,
            south: 0.0,
            east: values[0].len() as f64 * 10.0,
            west: 0.0,
            resolution_x: 10.0,
            resolution_y: 10.0,
            ..Default::default()
        };
        let mut r = Raster::initialize_using_config("grid.asc", &configs);
        for (row, line) in values.iter().enumerate() {
            r.set_row_data(row as isize, line.to_vec());
        }
        r
    }
}
