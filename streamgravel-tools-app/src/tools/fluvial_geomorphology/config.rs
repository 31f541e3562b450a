use super::hydraulics::{Region, SQ_M_PER_SQ_KM, SQ_M_PER_SQ_MI};
use crate::errors::GrainSizeError;
use std::fmt;
use std::str::FromStr;

/// Units in which drainage area is expressed before entering the regional
/// discharge equations. Channel width always uses square kilometres.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaUnits {
    SquareKilometers,
    /// Legacy convention, kept for comparison with older results.
    SquareMiles,
}

impl AreaUnits {
    pub fn square_meters_per_unit(&self) -> f64 {
        match self {
            AreaUnits::SquareKilometers => SQ_M_PER_SQ_KM,
            AreaUnits::SquareMiles => SQ_M_PER_SQ_MI,
        }
    }

    pub fn to_square_kilometers(&self, area: f64) -> f64 {
        area * self.square_meters_per_unit() / SQ_M_PER_SQ_KM
    }
}

impl FromStr for AreaUnits {
    type Err = GrainSizeError;

    fn from_str(s: &str) -> Result<AreaUnits, GrainSizeError> {
        match s.trim().to_lowercase().as_str() {
            "km2" | "sq_km" | "square_kilometers" => Ok(AreaUnits::SquareKilometers),
            "mi2" | "sq_mi" | "square_miles" => Ok(AreaUnits::SquareMiles),
            other => Err(GrainSizeError::configuration(format!(
                "Unrecognized area units '{}'; use km2 or mi2.",
                other
            ))),
        }
    }
}

impl fmt::Display for AreaUnits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AreaUnits::SquareKilometers => write!(f, "km2"),
            AreaUnits::SquareMiles => write!(f, "mi2"),
        }
    }
}

/// The point of a reach at which drainage area and precipitation are sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplePoint {
    First,
    Last,
    Centroid,
}

impl FromStr for SamplePoint {
    type Err = GrainSizeError;

    fn from_str(s: &str) -> Result<SamplePoint, GrainSizeError> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(SamplePoint::First),
            "last" => Ok(SamplePoint::Last),
            "centroid" => Ok(SamplePoint::Centroid),
            other => Err(GrainSizeError::configuration(format!(
                "Unrecognized sample point '{}'; use first, last or centroid.",
                other
            ))),
        }
    }
}

/// Parameters of a grain size run.
#[derive(Clone, Debug, PartialEq)]
pub struct GrainSizeConfig {
    pub dem_file: String,
    pub streams_file: String,
    pub precip_file: String,
    pub boundary_file: Option<String>,
    pub min_jan_temp_file: Option<String>,
    pub output_dir: String,
    pub mannings_n: f64,
    pub shields: f64,
    pub region: Region,
    pub precip_field: String,
    pub search_radius: f64,
    pub area_units: AreaUnits,
    pub sample_point: SamplePoint,
    pub save_terrain: bool,
    /// Worker threads; values below 1 use every available core.
    pub max_procs: isize,
}

impl GrainSizeConfig {
    pub const DEFAULT_MANNINGS_N: f64 = 0.035;
    pub const DEFAULT_SHIELDS: f64 = 0.047;
    pub const DEFAULT_SEARCH_RADIUS: f64 = 20.0;
    pub const DEFAULT_PRECIP_FIELD: &'static str = "Inches";

    pub fn new(
        dem_file: &str,
        streams_file: &str,
        precip_file: &str,
        output_dir: &str,
        region: Region,
    ) -> GrainSizeConfig {
        GrainSizeConfig {
            dem_file: dem_file.to_string(),
            streams_file: streams_file.to_string(),
            precip_file: precip_file.to_string(),
            boundary_file: None,
            min_jan_temp_file: None,
            output_dir: output_dir.to_string(),
            mannings_n: GrainSizeConfig::DEFAULT_MANNINGS_N,
            shields: GrainSizeConfig::DEFAULT_SHIELDS,
            region,
            precip_field: GrainSizeConfig::DEFAULT_PRECIP_FIELD.to_string(),
            search_radius: GrainSizeConfig::DEFAULT_SEARCH_RADIUS,
            area_units: AreaUnits::SquareKilometers,
            sample_point: SamplePoint::Last,
            save_terrain: false,
            max_procs: -1,
        }
    }

    pub fn validate(&self) -> Result<(), GrainSizeError> {
        let required = [
            (&self.dem_file, "--dem"),
            (&self.streams_file, "--streams"),
            (&self.precip_file, "--precip"),
            (&self.output_dir, "--out_dir"),
        ];
        for (value, flag) in required {
            if value.trim().is_empty() {
                return Err(GrainSizeError::configuration(format!(
                    "Required parameter {} not specified.",
                    flag
                )));
            }
        }
        let positive = [
            (self.mannings_n, "--mannings_n"),
            (self.shields, "--shields"),
            (self.search_radius, "--search_radius"),
        ];
        for (value, flag) in positive {
            if !(value > 0f64) || !value.is_finite() {
                return Err(GrainSizeError::configuration(format!(
                    "{} must be a positive number (got {}).",
                    flag, value
                )));
            }
        }
        if self.precip_field.trim().is_empty() {
            return Err(GrainSizeError::configuration(
                "--precip_field must name an attribute of the precipitation layer.",
            ));
        }
        if self.region.requires_min_jan_temp() && self.min_jan_temp_file.is_none() {
            return Err(GrainSizeError::configuration(
                "Region 100 requires a minimum January temperature raster (--min_jan_temp).",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GrainSizeConfig {
        GrainSizeConfig::new("dem.asc", "streams.geojson", "precip.geojson", "out", Region::R1)
    }

    #[test]
    fn test_defaults_validate() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let mut c = config();
        c.shields = 0.0;
        assert!(matches!(c.validate(), Err(GrainSizeError::Configuration(_))));

        let mut c = config();
        c.dem_file.clear();
        let msg = c.validate().unwrap_err().to_string();
        assert!(msg.contains("--dem"));

        let mut c = config();
        c.region = Region::R100;
        assert!(c.validate().is_err());
        c.min_jan_temp_file = Some("jan_tmin.asc".to_string());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("KM2".parse::<AreaUnits>().unwrap(), AreaUnits::SquareKilometers);
        assert_eq!("mi2".parse::<AreaUnits>().unwrap(), AreaUnits::SquareMiles);
        assert!("acres".parse::<AreaUnits>().is_err());
        assert_eq!("Centroid".parse::<SamplePoint>().unwrap(), SamplePoint::Centroid);
        assert!("middle".parse::<SamplePoint>().is_err());
    }
}
