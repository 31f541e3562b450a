//! Regional regression equations and channel hydraulics used to estimate
//! median bed grain size.
//!
//! Units: drainage area in km², precipitation in cm, elevation in m,
//! discharge in m³/s, width in m, grain size in mm.

use crate::errors::{GrainSizeError, SamplingError};
use std::fmt;

pub const CFS_PER_CMS: f64 = 35.3147;
pub const CM_PER_INCH: f64 = 2.54;
pub const MIN_CHANNEL_WIDTH: f64 = 0.3;
pub const SQ_M_PER_SQ_KM: f64 = 1.0e6;
pub const SQ_M_PER_SQ_MI: f64 = 2_589_988.0;

/// A flood-frequency region with its own two-year discharge equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R12,
    R13,
    R14,
    R15,
    R16,
    /// Minimum January temperature region.
    R100,
}

impl Region {
    pub const ALL: [Region; 15] = [
        Region::R1,
        Region::R2,
        Region::R3,
        Region::R4,
        Region::R5,
        Region::R6,
        Region::R7,
        Region::R8,
        Region::R9,
        Region::R12,
        Region::R13,
        Region::R14,
        Region::R15,
        Region::R16,
        Region::R100,
    ];

    pub fn from_number(number: i64) -> Result<Region, GrainSizeError> {
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.number() == number)
            .ok_or_else(|| {
                GrainSizeError::configuration(format!(
                    "Unsupported region number {}. Valid regions are 1-9, 12-16 and 100.",
                    number
                ))
            })
    }

    pub fn number(&self) -> i64 {
        match self {
            Region::R1 => 1,
            Region::R2 => 2,
            Region::R3 => 3,
            Region::R4 => 4,
            Region::R5 => 5,
            Region::R6 => 6,
            Region::R7 => 7,
            Region::R8 => 8,
            Region::R9 => 9,
            Region::R12 => 12,
            Region::R13 => 13,
            Region::R14 => 14,
            Region::R15 => 15,
            Region::R16 => 16,
            Region::R100 => 100,
        }
    }

    pub fn requires_min_jan_temp(&self) -> bool {
        *self == Region::R100
    }

    pub fn requires_elevation(&self) -> bool {
        matches!(self, Region::R12 | Region::R13 | Region::R14 | Region::R15)
    }

    /// Two-year peak discharge in ft³/s.
    fn q2_cfs(&self, fa: f64, p: f64, elev_km: f64, temp_k: f64) -> f64 {
        match self {
            Region::R1 => 0.35 * fa.powf(0.923) * p.powf(1.24),
            Region::R2 => 0.09 * fa.powf(0.877) * p.powf(1.51),
            Region::R3 => 0.817 * fa.powf(0.877) * p.powf(1.02),
            Region::R4 => 0.025 * fa.powf(0.880) * p.powf(1.70),
            Region::R5 => 14.7 * fa.powf(0.815),
            Region::R6 => 2.24 * fa.powf(0.719) * p.powf(0.833),
            Region::R7 => 8.77 * fa.powf(0.629),
            Region::R8 => 12.0 * fa.powf(0.761),
            Region::R9 => 0.803 * fa.powf(0.672) * p.powf(1.16),
            Region::R12 => 0.508 * fa.powf(0.901) * elev_km.powf(0.132) * p.powf(0.926),
            Region::R13 => 12.6 * fa.powf(0.879) * elev_km.powf(-0.161),
            Region::R14 | Region::R15 => 9.49 * fa.powf(0.903) * elev_km.powf(0.055),
            Region::R16 => 0.000141 * fa.powf(0.904) * p.powf(3.25),
            Region::R100 => 0.00013 * fa.powf(0.8) * p.powf(1.24) * temp_k.powf(2.53),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Bankfull channel width (m) from drainage area (km²) and mean annual
/// precipitation (cm), floored at `MIN_CHANNEL_WIDTH`.
pub fn width(fa: f64, precip_cm: f64) -> f64 {
    (0.177 * fa.powf(0.397) * precip_cm.powf(0.453)).max(MIN_CHANNEL_WIDTH)
}

/// Two-year flood discharge (m³/s) for a region.
///
/// `elevation` (m) is used by regions 12-15 and must be positive there.
/// `min_jan_temp` (K) is required by region 100.
pub fn q2(
    fa: f64,
    precip_cm: f64,
    elevation: f64,
    region: Region,
    min_jan_temp: Option<f64>,
) -> Result<f64, GrainSizeError> {
    if region.requires_elevation() && !(elevation > 0f64) {
        return Err(SamplingError::InvalidElevation { elevation }.into());
    }
    let temp_k = match (region.requires_min_jan_temp(), min_jan_temp) {
        (true, Some(t)) => t,
        (true, None) => {
            return Err(GrainSizeError::configuration(
                "Region 100 requires a minimum January temperature raster (--min_jan_temp).",
            ))
        }
        (false, _) => 0f64,
    };
    let fa = fa.max(0f64);
    Ok(region.q2_cfs(fa, precip_cm, elevation / 1000.0, temp_k) / CFS_PER_CMS)
}

/// Channel slope as absolute elevation drop over reach length.
pub fn slope(length: f64, drop: f64) -> Result<f64, SamplingError> {
    if !(length > 0f64) || !length.is_finite() {
        return Err(SamplingError::ZeroLengthReach);
    }
    Ok(drop.abs() / length)
}

/// Median grain diameter (mm) from Manning's n, Q2 (m³/s), width (m),
/// slope and the critical Shields stress.
pub fn grain_size(mannings_n: f64, q2: f64, width: f64, slope: f64, shields: f64) -> f64 {
    if width == 0f64 {
        return 0f64;
    }
    let d_m = 1.65 * mannings_n.powf(0.6) * q2.powf(0.6) * width.powf(-0.6) * slope.powf(0.7)
        / shields;
    d_m * 1000.0
}
