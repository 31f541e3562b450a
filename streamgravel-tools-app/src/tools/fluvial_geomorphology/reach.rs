use super::hydraulics;
use serde_json::{Map as JsonMap, Value as JsonValue};
use streamgravel_common::structures::Polyline;

/// Grain size of a reach whose computation has not run yet.
pub const GRAIN_SIZE_UNSET: f64 = -1.0;

/// Values sampled from the input surfaces for one reach.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReachSamples {
    /// Elevation (m) at the first vertex.
    pub first_elevation: f64,
    /// Elevation (m) at the last vertex.
    pub last_elevation: f64,
    /// Drainage area at the representative point, in the configured units.
    pub drainage_area: f64,
    /// Mean annual precipitation (cm).
    pub precipitation: f64,
    /// Minimum January temperature (K), sampled only for region 100.
    pub min_jan_temp: Option<f64>,
}

/// The hydraulic parameters of a reach, used to estimate its grain size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReachHydraulics {
    pub width: f64,
    pub q2: f64,
    pub slope: f64,
}

/// One stream segment with its hydraulic parameters and grain size.
#[derive(Clone, Debug, PartialEq)]
pub struct Reach {
    id: usize,
    polyline: Polyline,
    attributes: JsonMap<String, JsonValue>,
    hydraulics: ReachHydraulics,
    samples: ReachSamples,
    grain_size: f64,
}

impl Reach {
    pub fn new(
        id: usize,
        polyline: Polyline,
        attributes: JsonMap<String, JsonValue>,
        hydraulics: ReachHydraulics,
        samples: ReachSamples,
    ) -> Reach {
        Reach {
            id,
            polyline,
            attributes,
            hydraulics,
            samples,
            grain_size: GRAIN_SIZE_UNSET,
        }
    }

    /// Computes and stores the median grain size (mm). A reach's grain size
    /// is computed once; later calls return the stored value.
    pub fn compute_grain_size(&mut self, mannings_n: f64, shields: f64) -> f64 {
        if !self.has_grain_size() {
            self.grain_size = hydraulics::grain_size(
                mannings_n,
                self.hydraulics.q2,
                self.hydraulics.width,
                self.hydraulics.slope,
                shields,
            );
        }
        self.grain_size
    }

    pub fn has_grain_size(&self) -> bool {
        self.grain_size != GRAIN_SIZE_UNSET
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    pub fn attributes(&self) -> &JsonMap<String, JsonValue> {
        &self.attributes
    }

    pub fn length(&self) -> f64 {
        self.polyline.length()
    }

    pub fn width(&self) -> f64 {
        self.hydraulics.width
    }

    pub fn q2(&self) -> f64 {
        self.hydraulics.q2
    }

    pub fn slope(&self) -> f64 {
        self.hydraulics.slope
    }

    pub fn grain_size(&self) -> f64 {
        self.grain_size
    }

    pub fn samples(&self) -> &ReachSamples {
        &self.samples
    }
}
