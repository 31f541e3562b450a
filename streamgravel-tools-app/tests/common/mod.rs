#![allow(dead_code)]

use serde_json::json;
use std::path::Path;
use streamgravel_common::structures::{Point2D, Polyline};
use streamgravel_raster::{Raster, RasterConfigs};
use streamgravel_vector::{VectorFeature, VectorGeometry, VectorLayer};

pub const CELL_SIZE: f64 = 10.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A square DEM of `size` x `size` 10 m cells with its south-west corner at
/// the origin. `elevation(row, col)` gives each cell's value.
pub fn dem<F: Fn(isize, isize) -> f64>(file_name: &str, size: usize, elevation: F) -> Raster {
    let configs = RasterConfigs {
        rows: size,
        columns: size,
        nodata: -9999.0,
        north: size as f64 * CELL_SIZE,
        south: 0.0,
        east: size as f64 * CELL_SIZE,
        west: 0.0,
        resolution_x: CELL_SIZE,
        resolution_y: CELL_SIZE,
        ..Default::default()
    };
    let mut r = Raster::initialize_using_config(file_name, &configs);
    for row in 0..size as isize {
        for col in 0..size as isize {
            r[(row, col)] = elevation(row, col);
        }
    }
    r
}

pub fn flat_dem(file_name: &str, size: usize) -> Raster {
    dem(file_name, size, |_, _| 100.0)
}

/// Elevation rises one metre per row towards the north.
pub fn south_sloping_dem(file_name: &str, size: usize) -> Raster {
    dem(file_name, size, move |row, _| 100.0 + (size as isize - 1 - row) as f64)
}

/// North-to-south lines running down the centre of columns.
pub fn stream_network(file_name: &str, xs: &[f64], top: f64, bottom: f64) -> VectorLayer {
    let mut layer = VectorLayer::new(file_name, 0);
    for (i, &x) in xs.iter().enumerate() {
        layer.add_feature(
            VectorFeature::new(VectorGeometry::PolyLine(Polyline::new(vec![
                Point2D::new(x, top),
                Point2D::new(x, (top + bottom) / 2.0),
                Point2D::new(x, bottom),
            ])))
            .with_attribute("StreamId", json!(i)),
        );
    }
    layer
}

pub fn square_polygon(min: f64, max: f64) -> Vec<Vec<Point2D>> {
    vec![vec![
        Point2D::new(min, min),
        Point2D::new(max, min),
        Point2D::new(max, max),
        Point2D::new(min, max),
        Point2D::new(min, min),
    ]]
}

/// One precipitation polygon spanning `min..max` in both axes.
pub fn precip_layer(file_name: &str, min: f64, max: f64, inches: f64) -> VectorLayer {
    let mut layer = VectorLayer::new(file_name, 0);
    layer.add_feature(
        VectorFeature::new(VectorGeometry::Polygon(vec![square_polygon(min, max)]))
            .with_attribute("Inches", json!(inches)),
    );
    layer
}

pub fn boundary_layer(file_name: &str, min: f64, max: f64) -> VectorLayer {
    let mut layer = VectorLayer::new(file_name, 0);
    layer.add_feature(VectorFeature::new(VectorGeometry::Polygon(vec![
        square_polygon(min, max),
    ])));
    layer
}

pub fn path_str(dir: &Path, file: &str) -> String {
    dir.join(file).to_string_lossy().to_string()
}
