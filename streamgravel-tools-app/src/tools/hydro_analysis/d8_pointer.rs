/*
Part of the StreamGravel fluvial grain size tools.
License: MIT
*/

use rayon::prelude::*;
use streamgravel_raster::Raster;

/// Neighbour offsets in clockwise order starting at the north-east cell.
pub const DX: [isize; 8] = [1, 1, 1, 0, -1, -1, -1, 0];
pub const DY: [isize; 8] = [-1, 0, 1, 1, 1, 0, -1, -1];

/// Base-2 pointer values matching `DX`/`DY`:
///
/// ```text
/// |  64 | 128 |   1 |
/// |  32 |   0 |   2 |
/// |  16 |   8 |   4 |
/// ```
pub const POINTER_VALUES: [f64; 8] = [1f64, 2f64, 4f64, 8f64, 16f64, 32f64, 64f64, 128f64];

/// Maps a pointer value to its neighbour index, or `None` for 0 (no
/// downslope neighbour) and unrecognized values.
pub fn pointer_to_direction(value: f64) -> Option<usize> {
    POINTER_VALUES.iter().position(|&v| v == value)
}

/// Computes the D8 (steepest descent) flow pointer of a depressionless DEM.
/// Cells without a lower neighbour receive 0; nodata cells stay nodata.
pub fn d8_pointer(dem: &Raster, output_file: &str) -> Raster {
    let rows = dem.configs.rows as isize;
    let columns = dem.configs.columns as isize;
    let nodata = dem.configs.nodata;
    let cell_size_x = dem.configs.resolution_x;
    let cell_size_y = dem.configs.resolution_y;
    let diag_cell_size = (cell_size_x * cell_size_x + cell_size_y * cell_size_y).sqrt();
    let grid_lengths = [
        diag_cell_size,
        cell_size_x,
        diag_cell_size,
        cell_size_y,
        diag_cell_size,
        cell_size_x,
        diag_cell_size,
        cell_size_y,
    ];

    let row_data: Vec<Vec<f64>> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut data = vec![nodata; columns as usize];
            for col in 0..columns {
                let z = dem[(row, col)];
                if z == nodata {
                    continue;
                }
                let mut dir = 0f64;
                let mut max_slope = f64::MIN;
                for i in 0..8 {
                    let zn = dem[(row + DY[i], col + DX[i])];
                    if zn != nodata {
                        let slope = (z - zn) / grid_lengths[i];
                        if slope > max_slope && slope > 0f64 {
                            max_slope = slope;
                            dir = POINTER_VALUES[i];
                        }
                    }
                }
                data[col as usize] = dir;
            }
            data
        })
        .collect();

    let mut output = Raster::initialize_using_file(output_file, dem);
    for (row, data) in row_data.into_iter().enumerate() {
        output.set_row_data(row as isize, data);
    }
    output.add_metadata_entry("Created by StreamGravel's d8_pointer".to_string());
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::hydro_analysis::test_grids::grid;

    #[test]
    fn test_steepest_descent() {
        let dem = grid(&[
            &[9.0, 8.0, 7.0],
            &[8.0, 5.0, 4.0],
            &[7.0, 4.0, 1.0],
        ]);
        let pntr = d8_pointer(&dem, "pntr.asc");
        // centre cell drains diagonally to the south-east corner
        assert_eq!(pntr[(1, 1)], 4.0);
        assert_eq!(pntr[(0, 0)], 4.0);
        assert_eq!(pntr[(1, 2)], 8.0);
        assert_eq!(pntr[(2, 2)], 0.0);
    }

    #[test]
    fn test_pointer_to_direction() {
        assert_eq!(pointer_to_direction(1.0), Some(0));
        assert_eq!(pointer_to_direction(128.0), Some(7));
        assert_eq!(pointer_to_direction(0.0), None);
        assert_eq!(pointer_to_direction(3.0), None);
    }
}
