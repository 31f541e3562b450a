use super::pipeline::ReachCollection;
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Error, Write};
use streamgravel_vector::{VectorFeature, VectorGeometry, VectorLayer};

pub const GEOJSON_OUTPUT_FILE: &str = "GrainSize.geojson";
pub const REPORT_OUTPUT_FILE: &str = "GrainSizeReport.txt";

/// A destination for the result set of a run.
pub trait ReachSink {
    fn name(&self) -> String;
    fn write(&mut self, collection: &ReachCollection) -> Result<(), Error>;
}

/// Writes each built reach as a polyline feature carrying the source
/// attributes plus `GrainSize`, `Width`, `Q2` and `Slope`.
pub struct GeoJsonSink {
    pub file_name: String,
}

impl GeoJsonSink {
    pub fn new(file_name: &str) -> GeoJsonSink {
        GeoJsonSink {
            file_name: file_name.to_string(),
        }
    }

    pub fn to_layer(&self, collection: &ReachCollection) -> VectorLayer {
        let mut layer = VectorLayer::new(&self.file_name, collection.epsg_code);
        for reach in &collection.reaches {
            let mut feature =
                VectorFeature::new(VectorGeometry::PolyLine(reach.polyline().clone()));
            feature.attributes = reach.attributes().clone();
            let attrs = &mut feature.attributes;
            attrs.insert("GrainSize".to_string(), json!(reach.grain_size()));
            attrs.insert("Width".to_string(), json!(reach.width()));
            attrs.insert("Q2".to_string(), json!(reach.q2()));
            attrs.insert("Slope".to_string(), json!(reach.slope()));
            layer.add_feature(feature);
        }
        layer
    }
}

impl ReachSink for GeoJsonSink {
    fn name(&self) -> String {
        self.file_name.clone()
    }

    fn write(&mut self, collection: &ReachCollection) -> Result<(), Error> {
        self.to_layer(collection).write()
    }
}

/// Writes a plain-text table of reach hydraulics and grain sizes.
pub struct TextReportSink {
    pub file_name: String,
}

impl TextReportSink {
    pub fn new(file_name: &str) -> TextReportSink {
        TextReportSink {
            file_name: file_name.to_string(),
        }
    }

    pub fn render<W: Write>(
        &self,
        collection: &ReachCollection,
        out: &mut W,
    ) -> Result<(), Error> {
        let config = &collection.config;
        writeln!(out, "Grain Size Distribution Report")?;
        writeln!(out, "DEM: {}", config.dem_file)?;
        writeln!(out, "Stream network: {}", config.streams_file)?;
        writeln!(out, "Precipitation: {}", config.precip_file)?;
        if let Some(b) = &config.boundary_file {
            writeln!(out, "Boundary: {}", b)?;
        }
        writeln!(out, "Region: {}", config.region)?;
        writeln!(out, "Manning's n: {}", config.mannings_n)?;
        writeln!(out, "Shields critical stress: {}", config.shields)?;
        writeln!(out, "Drainage area units: {}", config.area_units)?;
        writeln!(out)?;
        writeln!(
            out,
            "{:>8} {:>12} {:>14} {:>10} {:>12} {:>12} {:>16}",
            "Reach",
            "Length (m)",
            "Drainage Area",
            "Width (m)",
            "Q2 (m3/s)",
            "Slope",
            "Grain Size (mm)"
        )?;
        for reach in &collection.reaches {
            writeln!(
                out,
                "{:>8} {:>12.2} {:>14.4} {:>10.3} {:>12.3} {:>12.6} {:>16.2}",
                reach.id(),
                reach.length(),
                reach.samples().drainage_area,
                reach.width(),
                reach.q2(),
                reach.slope(),
                reach.grain_size()
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Reaches: {} total, {} built, {} skipped",
            collection.total(),
            collection.reaches.len(),
            collection.skipped.len()
        )?;
        for s in &collection.skipped {
            writeln!(out, "Skipped reach {}: {}", s.id, s.reason)?;
        }
        Ok(())
    }
}

impl ReachSink for TextReportSink {
    fn name(&self) -> String {
        self.file_name.clone()
    }

    fn write(&mut self, collection: &ReachCollection) -> Result<(), Error> {
        let f = File::create(&self.file_name)?;
        let mut writer = BufWriter::new(f);
        self.render(collection, &mut writer)?;
        writer.flush()
    }
}

/// The GeoJSON and text report sinks, writing into `output_dir`.
pub fn default_sinks(output_dir: &str) -> Vec<Box<dyn ReachSink>> {
    let dir = std::path::Path::new(output_dir);
    let path = |f: &str| dir.join(f).to_string_lossy().to_string();
    vec![
        Box::new(GeoJsonSink::new(&path(GEOJSON_OUTPUT_FILE))),
        Box::new(TextReportSink::new(&path(REPORT_OUTPUT_FILE))),
    ]
}
