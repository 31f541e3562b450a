use std::io::{Error, ErrorKind};
use streamgravel_common::structures::Point2D;
use thiserror::Error;

/// A failure confined to a single reach. The reach is skipped and the run
/// continues.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SamplingError {
    #[error("point {point} lies outside the extent of {source_name}")]
    OutsideExtent { point: Point2D, source_name: String },
    #[error("{source_name} has no data at point {point}")]
    NoData { point: Point2D, source_name: String },
    #[error("point {point} does not intersect any polygon in {layer}")]
    NoIntersectingPolygon { point: Point2D, layer: String },
    #[error("attribute '{field}' of polygon {feature} in {layer} is missing or not numeric")]
    InvalidAttribute {
        field: String,
        feature: usize,
        layer: String,
    },
    #[error("elevation {elevation} m is not positive; the regional Q2 equation needs a positive elevation")]
    InvalidElevation { elevation: f64 },
    #[error("reach has zero length")]
    ZeroLengthReach,
    #[error("reach has no vertices")]
    EmptyGeometry,
}

#[derive(Debug, Error)]
pub enum GrainSizeError {
    /// Invalid parameters or inputs; raised before any reach is processed.
    #[error("{0}")]
    Configuration(String),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Io(#[from] Error),
    #[error("Processing cancelled.")]
    Cancelled,
}

impl GrainSizeError {
    pub fn configuration<S: Into<String>>(message: S) -> GrainSizeError {
        GrainSizeError::Configuration(message.into())
    }
}

impl From<GrainSizeError> for Error {
    fn from(e: GrainSizeError) -> Error {
        match e {
            GrainSizeError::Io(e) => e,
            GrainSizeError::Configuration(msg) => Error::new(ErrorKind::InvalidInput, msg),
            GrainSizeError::Sampling(e) => Error::new(ErrorKind::InvalidData, e.to_string()),
            GrainSizeError::Cancelled => Error::new(ErrorKind::Interrupted, "Processing cancelled."),
        }
    }
}
