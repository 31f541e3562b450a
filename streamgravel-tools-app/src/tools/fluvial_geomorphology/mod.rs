//! Reach-scale grain size estimation.

pub mod config;
mod grain_size_distribution;
pub mod hydraulics;
pub mod output;
pub mod pipeline;
pub mod reach;
mod reach_builder;
pub mod samplers;

pub use self::config::{AreaUnits, GrainSizeConfig, SamplePoint};
pub use self::grain_size_distribution::{parse_args, GrainSizeDistribution};
pub use self::hydraulics::Region;
pub use self::output::{default_sinks, GeoJsonSink, ReachSink, TextReportSink};
pub use self::pipeline::{
    CancellationToken, GrainSizePipeline, PipelineEvent, PipelineInputs, PipelineStage,
    PipelineSummary, ReachCollection, SkippedReach,
};
pub use self::reach::{Reach, ReachHydraulics, ReachSamples, GRAIN_SIZE_UNSET};
pub use self::reach_builder::ReachBuilder;
