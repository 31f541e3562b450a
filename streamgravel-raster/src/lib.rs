/*
This crate is part of the StreamGravel fluvial grain size library.
License: MIT
*/

//! In-memory georeferenced rasters.
//!
//! Cells are addressed by `(row, column)` with row 0 at the northern edge.
//! Reads outside the grid return the nodata value, so neighbourhood scans
//! need no explicit edge handling.

pub mod formats;

use std::io::{Error, ErrorKind};
use std::ops::{Index, IndexMut};
use std::path::Path;
use streamgravel_common::structures::Point2D;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RasterType {
    ArcAscii,
    Unknown,
}

/// Determines the raster format from the file extension.
pub fn get_raster_type_from_file(file_name: &str) -> RasterType {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "asc" | "txt" => RasterType::ArcAscii,
        _ => RasterType::Unknown,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RasterConfigs {
    pub title: String,
    pub rows: usize,
    pub columns: usize,
    pub nodata: f64,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// 0 when the coordinate system is unknown.
    pub epsg_code: u16,
    /// Well-known text of the coordinate system, copied to the `.prj` sidecar.
    pub projection: String,
    pub metadata: Vec<String>,
}

impl Default for RasterConfigs {
    fn default() -> RasterConfigs {
        RasterConfigs {
            title: String::new(),
            rows: 0,
            columns: 0,
            nodata: -32768.0,
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
            resolution_x: f64::NEG_INFINITY,
            resolution_y: f64::NEG_INFINITY,
            minimum: f64::INFINITY,
            maximum: f64::NEG_INFINITY,
            epsg_code: 0,
            projection: String::new(),
            metadata: vec![],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Raster {
    pub file_name: String,
    pub file_mode: String,
    pub raster_type: RasterType,
    pub configs: RasterConfigs,
    data: Vec<f64>,
}

impl Index<(isize, isize)> for Raster {
    type Output = f64;

    fn index(&self, index: (isize, isize)) -> &f64 {
        let (row, column) = index;
        if column < 0
            || row < 0
            || column >= self.configs.columns as isize
            || row >= self.configs.rows as isize
        {
            return &self.configs.nodata;
        }
        &self.data[row as usize * self.configs.columns + column as usize]
    }
}

impl IndexMut<(isize, isize)> for Raster {
    fn index_mut(&mut self, index: (isize, isize)) -> &mut f64 {
        let (row, column) = index;
        if column < 0
            || row < 0
            || column >= self.configs.columns as isize
            || row >= self.configs.rows as isize
        {
            panic!(
                "Raster index ({}, {}) out of bounds for {}",
                row, column, self.file_name
            );
        }
        &mut self.data[row as usize * self.configs.columns + column as usize]
    }
}

impl Raster {
    /// Opens a raster. Mode `"r"` reads the file from disk; any other mode
    /// is rejected here, new rasters are created with the `initialize_*`
    /// constructors.
    pub fn new<'a>(file_name: &'a str, file_mode: &'a str) -> Result<Raster, Error> {
        let fm = file_mode.to_lowercase();
        if !fm.contains('r') {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Raster::new only opens existing files; use initialize_using_file to create one.",
            ));
        }
        let raster_type = get_raster_type_from_file(file_name);
        let mut r = Raster {
            file_name: file_name.to_string(),
            file_mode: fm,
            raster_type,
            configs: RasterConfigs::default(),
            data: vec![],
        };
        match raster_type {
            RasterType::ArcAscii => {
                formats::arcascii::read_arcascii(file_name, &mut r.configs, &mut r.data)?;
            }
            RasterType::Unknown => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unrecognized raster type for {}", file_name),
                ));
            }
        }
        formats::prj::read_prj_sidecar(file_name, &mut r.configs)?;
        r.update_min_max();
        Ok(r)
    }

    /// Creates a new raster sharing the extent, resolution and coordinate
    /// system of `input`, with every cell set to nodata.
    pub fn initialize_using_file<'a>(file_name: &'a str, input: &'a Raster) -> Raster {
        let mut configs = input.configs.clone();
        configs.metadata.clear();
        Raster::initialize_using_config(file_name, &configs)
    }

    pub fn initialize_using_config<'a>(file_name: &'a str, configs: &'a RasterConfigs) -> Raster {
        let mut configs = configs.clone();
        if configs.resolution_x <= 0f64 && configs.columns > 0 {
            configs.resolution_x = (configs.east - configs.west) / configs.columns as f64;
        }
        if configs.resolution_y <= 0f64 && configs.rows > 0 {
            configs.resolution_y = (configs.north - configs.south) / configs.rows as f64;
        }
        let data = vec![configs.nodata; configs.rows * configs.columns];
        Raster {
            file_name: file_name.to_string(),
            file_mode: "w".to_string(),
            raster_type: get_raster_type_from_file(file_name),
            configs,
            data,
        }
    }

    pub fn get_value(&self, row: isize, column: isize) -> f64 {
        self[(row, column)]
    }

    pub fn set_value(&mut self, row: isize, column: isize, value: f64) {
        if column >= 0
            && row >= 0
            && (column as usize) < self.configs.columns
            && (row as usize) < self.configs.rows
        {
            self.data[row as usize * self.configs.columns + column as usize] = value;
        }
    }

    pub fn set_row_data(&mut self, row: isize, values: Vec<f64>) {
        for (column, value) in values.into_iter().enumerate() {
            self.set_value(row, column as isize, value);
        }
    }

    /// Area of a single cell in squared map units.
    pub fn cell_area(&self) -> f64 {
        self.configs.resolution_x * self.configs.resolution_y
    }

    pub fn get_row_from_y(&self, y: f64) -> isize {
        ((self.configs.north - y) / self.configs.resolution_y).floor() as isize
    }

    pub fn get_column_from_x(&self, x: f64) -> isize {
        ((x - self.configs.west) / self.configs.resolution_x).floor() as isize
    }

    /// x coordinate of the centre of `column`.
    pub fn get_x_from_column(&self, column: isize) -> f64 {
        self.configs.west + self.configs.resolution_x * (column as f64 + 0.5)
    }

    /// y coordinate of the centre of `row`.
    pub fn get_y_from_row(&self, row: isize) -> f64 {
        self.configs.north - self.configs.resolution_y * (row as f64 + 0.5)
    }

    /// True when the point lies within the raster's extent. The southern
    /// and eastern edges are exclusive, matching the cell lookup.
    pub fn contains_point(&self, point: &Point2D) -> bool {
        point.x >= self.configs.west
            && point.x < self.configs.east
            && point.y > self.configs.south
            && point.y <= self.configs.north
    }

    pub fn update_min_max(&mut self) {
        let nodata = self.configs.nodata;
        self.configs.minimum = f64::INFINITY;
        self.configs.maximum = f64::NEG_INFINITY;
        for &v in self.data.iter().filter(|&&v| v != nodata) {
            if v < self.configs.minimum {
                self.configs.minimum = v;
            }
            if v > self.configs.maximum {
                self.configs.maximum = v;
            }
        }
    }

    pub fn add_metadata_entry(&mut self, value: String) {
        self.configs.metadata.push(value);
    }

    pub fn is_same_geometry(&self, other: &Raster) -> bool {
        self.configs.rows == other.configs.rows
            && self.configs.columns == other.configs.columns
            && (self.configs.north - other.configs.north).abs() < f64::EPSILON * 1000.0
            && (self.configs.west - other.configs.west).abs() < f64::EPSILON * 1000.0
            && (self.configs.resolution_x - other.configs.resolution_x).abs() < f64::EPSILON
            && (self.configs.resolution_y - other.configs.resolution_y).abs() < f64::EPSILON
    }

    pub fn write(&mut self) -> Result<(), Error> {
        self.update_min_max();
        match self.raster_type {
            RasterType::ArcAscii => {
                formats::arcascii::write_arcascii(self)?;
            }
            RasterType::Unknown => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unrecognized output raster type for {}", self.file_name),
                ));
            }
        }
        formats::prj::write_prj_sidecar(&self.file_name, &self.configs)?;
        Ok(())
    }

    pub(crate) fn data(&self) -> &[f64] {
        &self.data
    }
}
