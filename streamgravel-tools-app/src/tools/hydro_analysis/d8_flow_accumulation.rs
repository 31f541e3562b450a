/*
Part of the StreamGravel fluvial grain size tools.
License: MIT
*/

use super::d8_pointer::{pointer_to_direction, DX, DY};
use std::io::Error;
use streamgravel_common::structures::Array2D;
use streamgravel_raster::Raster;

/// Accumulates contributing cells down a D8 pointer grid. Each valid cell
/// counts itself, so headwater cells hold 1 and the value at a cell is the
/// number of cells draining through it.
pub fn d8_flow_accumulation(pntr: &Raster, output_file: &str) -> Result<Raster, Error> {
    let rows = pntr.configs.rows as isize;
    let columns = pntr.configs.columns as isize;
    let nodata = pntr.configs.nodata;

    // The neighbour at index i flows into the centre cell when its pointer
    // faces back, i.e. points in direction (i + 4) % 8.
    let mut num_inflowing: Array2D<i8> = Array2D::new(rows, columns, -1, -1)?;
    for row in 0..rows {
        for col in 0..columns {
            if pntr[(row, col)] == nodata {
                continue;
            }
            let mut count = 0i8;
            for i in 0..8 {
                let p = pntr[(row + DY[i], col + DX[i])];
                if p != nodata && pointer_to_direction(p) == Some((i + 4) % 8) {
                    count += 1;
                }
            }
            num_inflowing.set_value(row, col, count);
        }
    }

    let mut output = Raster::initialize_using_file(output_file, pntr);
    let mut stack = Vec::with_capacity((rows * columns) as usize);
    for row in 0..rows {
        for col in 0..columns {
            if pntr[(row, col)] != nodata {
                output[(row, col)] = 1f64;
                if num_inflowing.get_value(row, col) == 0i8 {
                    stack.push((row, col));
                }
            }
        }
    }

    while let Some((row, col)) = stack.pop() {
        let fa = output[(row, col)];
        num_inflowing.set_value(row, col, -1i8);
        if let Some(dir) = pointer_to_direction(pntr[(row, col)]) {
            let rn = row + DY[dir];
            let cn = col + DX[dir];
            if pntr[(rn, cn)] != nodata {
                output[(rn, cn)] += fa;
                let remaining = num_inflowing.get_value(rn, cn) - 1;
                num_inflowing.set_value(rn, cn, remaining);
                if remaining == 0 {
                    stack.push((rn, cn));
                }
            }
        }
    }

    output.add_metadata_entry("Created by StreamGravel's d8_flow_accumulation".to_string());
    Ok(output)
}
