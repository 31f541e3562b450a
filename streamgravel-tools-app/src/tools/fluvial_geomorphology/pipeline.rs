use super::config::GrainSizeConfig;
use super::output::ReachSink;
use super::reach::Reach;
use super::reach_builder::ReachBuilder;
use super::samplers::{PrecipitationSampler, TemperatureSampler, TerrainSampler};
use crate::errors::{GrainSizeError, SamplingError};
use crate::tools::gis_analysis::{GeometryService, IndexedPolygonLayer};
use crate::tools::hydro_analysis::TerrainService;
use crate::tools::stream_network_analysis::ReachGeometryExtractor;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use streamgravel_raster::Raster;
use streamgravel_vector::{ShapeType, VectorLayer};

pub const FLOW_ACCUMULATION_FILE: &str = "flow_accumulation.asc";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    Clip,
    DeriveTerrain,
    BuildReaches,
    WriteOutputs,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            PipelineStage::Init => "Validating inputs",
            PipelineStage::Clip => "Clipping stream network",
            PipelineStage::DeriveTerrain => "Deriving flow accumulation",
            PipelineStage::BuildReaches => "Estimating reach grain sizes",
            PipelineStage::WriteOutputs => "Writing outputs",
            PipelineStage::Done => "Done",
        };
        write!(f, "{}", s)
    }
}

/// Notifications emitted while a pipeline runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PipelineEvent {
    Stage(PipelineStage),
    Progress { completed: usize, total: usize },
}

/// Cooperative cancellation flag shared between a running pipeline and its
/// controller.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The data sets a run works on, already read into memory.
pub struct PipelineInputs {
    pub dem: Raster,
    pub streams: VectorLayer,
    pub precip: VectorLayer,
    pub boundary: Option<VectorLayer>,
    pub min_jan_temp: Option<Raster>,
}

impl PipelineInputs {
    pub fn read(config: &GrainSizeConfig) -> Result<PipelineInputs, GrainSizeError> {
        let dem = Raster::new(&config.dem_file, "r")?;
        let streams = VectorLayer::read(&config.streams_file)?;
        let precip = VectorLayer::read(&config.precip_file)?;
        let boundary = match &config.boundary_file {
            Some(f) => Some(VectorLayer::read(f)?),
            None => None,
        };
        let min_jan_temp = match &config.min_jan_temp_file {
            Some(f) => Some(Raster::new(f, "r")?),
            None => None,
        };
        Ok(PipelineInputs {
            dem,
            streams,
            precip,
            boundary,
            min_jan_temp,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedReach {
    pub id: usize,
    pub reason: SamplingError,
}

/// The result set of a run: built reaches and skipped reaches, both in
/// network order.
#[derive(Clone, Debug)]
pub struct ReachCollection {
    pub reaches: Vec<Reach>,
    pub skipped: Vec<SkippedReach>,
    pub epsg_code: u16,
    pub config: GrainSizeConfig,
}

impl ReachCollection {
    pub fn total(&self) -> usize {
        self.reaches.len() + self.skipped.len()
    }
}

#[derive(Clone, Debug)]
pub struct PipelineSummary {
    pub total: usize,
    pub built: usize,
    pub skipped: Vec<SkippedReach>,
    pub elapsed: Duration,
}

type EventCallback = Box<dyn Fn(PipelineEvent) + Send + Sync>;

/// Sequences clipping, terrain derivation, reach estimation and output.
pub struct GrainSizePipeline<T: TerrainService, G: GeometryService> {
    terrain: T,
    geometry: G,
    config: GrainSizeConfig,
    cancel: CancellationToken,
    on_event: Option<EventCallback>,
}

impl<T: TerrainService, G: GeometryService> GrainSizePipeline<T, G> {
    pub fn new(terrain: T, geometry: G, config: GrainSizeConfig) -> Self {
        GrainSizePipeline {
            terrain,
            geometry,
            config,
            cancel: CancellationToken::new(),
            on_event: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn on_event<F: Fn(PipelineEvent) + Send + Sync + 'static>(mut self, callback: F) -> Self {
        self.on_event = Some(Box::new(callback));
        self
    }

    fn emit(&self, event: PipelineEvent) {
        if let PipelineEvent::Stage(stage) = event {
            info!("{}", stage);
        }
        if let Some(callback) = &self.on_event {
            callback(event);
        }
    }

    fn check_cancelled(&self) -> Result<(), GrainSizeError> {
        if self.cancel.is_cancelled() {
            return Err(GrainSizeError::Cancelled);
        }
        Ok(())
    }

    /// Runs every stage and hands the result set to `sinks`. Nothing is
    /// written unless every reach has been processed.
    pub fn run(
        &self,
        inputs: PipelineInputs,
        sinks: &mut [Box<dyn ReachSink>],
    ) -> Result<PipelineSummary, GrainSizeError> {
        let start = Instant::now();
        let (collection, flow_accumulation) = self.process(inputs)?;
        self.check_cancelled()?;

        self.emit(PipelineEvent::Stage(PipelineStage::WriteOutputs));
        fs::create_dir_all(&self.config.output_dir)?;
        if self.config.save_terrain {
            let mut fa = flow_accumulation;
            fa.file_name = Path::new(&self.config.output_dir)
                .join(FLOW_ACCUMULATION_FILE)
                .to_string_lossy()
                .to_string();
            fa.write()?;
        }
        for sink in sinks.iter_mut() {
            debug!("Writing {}", sink.name());
            sink.write(&collection)?;
        }
        self.emit(PipelineEvent::Stage(PipelineStage::Done));

        Ok(PipelineSummary {
            total: collection.total(),
            built: collection.reaches.len(),
            skipped: collection.skipped,
            elapsed: start.elapsed(),
        })
    }

    /// Runs the stages up to and including reach building. Returns the result
    /// set and the derived flow-accumulation raster.
    pub fn process(
        &self,
        inputs: PipelineInputs,
    ) -> Result<(ReachCollection, Raster), GrainSizeError> {
        self.emit(PipelineEvent::Stage(PipelineStage::Init));
        self.validate(&inputs)?;
        let PipelineInputs {
            dem,
            streams,
            precip,
            boundary,
            min_jan_temp,
        } = inputs;
        let epsg_code = [dem.configs.epsg_code, streams.epsg_code]
            .iter()
            .copied()
            .find(|&c| c != 0)
            .unwrap_or(0);
        let precip = IndexedPolygonLayer::new(precip)
            .map_err(|e| GrainSizeError::configuration(e.to_string()))?;

        let network = match &boundary {
            Some(b) => {
                self.check_cancelled()?;
                self.emit(PipelineEvent::Stage(PipelineStage::Clip));
                let clipped = self.geometry.clip(&streams, b)?;
                info!(
                    "{} of {} stream features fall within the boundary",
                    clipped.num_features(),
                    streams.num_features()
                );
                clipped
            }
            None => streams,
        };

        self.check_cancelled()?;
        self.emit(PipelineEvent::Stage(PipelineStage::DeriveTerrain));
        let filled = self.terrain.fill(&dem)?;
        let pointer = self.terrain.flow_direction(&filled)?;
        drop(filled);
        let flow_accumulation = self.terrain.flow_accumulation(&pointer)?;
        drop(pointer);

        self.check_cancelled()?;
        self.emit(PipelineEvent::Stage(PipelineStage::BuildReaches));
        let builder = ReachBuilder::new(
            TerrainSampler::new(
                &self.terrain,
                &self.geometry,
                &dem,
                &flow_accumulation,
                self.config.area_units,
            ),
            PrecipitationSampler::new(&self.geometry, &precip, &self.config.precip_field),
            min_jan_temp
                .as_ref()
                .map(|r| TemperatureSampler::new(&self.terrain, r)),
            &self.config,
        );
        let extractor = ReachGeometryExtractor::new(&self.geometry, &network);
        let total = extractor.total();
        let completed = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads())
            .build()
            .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;
        let mut outcomes: Vec<(usize, Result<Result<Reach, SamplingError>, GrainSizeError>)> =
            pool.install(|| {
                extractor
                    .par_bridge()
                    .map(|(id, geometry)| {
                        if self.cancel.is_cancelled() {
                            return (id, Err(GrainSizeError::Cancelled));
                        }
                        let outcome = match geometry {
                            Ok(g) => match builder.build(&g) {
                                Ok(reach) => Ok(Ok(reach)),
                                Err(GrainSizeError::Sampling(e)) => Ok(Err(e)),
                                Err(e) => Err(e),
                            },
                            Err(e) => Ok(Err(e)),
                        };
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        self.emit(PipelineEvent::Progress {
                            completed: done,
                            total,
                        });
                        (id, outcome)
                    })
                    .collect()
            });
        outcomes.sort_by_key(|(id, _)| *id);

        let mut reaches = Vec::with_capacity(outcomes.len());
        let mut skipped = vec![];
        for (id, outcome) in outcomes {
            match outcome? {
                Ok(reach) => reaches.push(reach),
                Err(reason) => {
                    warn!("Skipping reach {}: {}", id, reason);
                    skipped.push(SkippedReach { id, reason });
                }
            }
        }
        info!(
            "{} reaches built, {} skipped",
            reaches.len(),
            skipped.len()
        );

        Ok((
            ReachCollection {
                reaches,
                skipped,
                epsg_code,
                config: self.config.clone(),
            },
            flow_accumulation,
        ))
    }

    fn num_threads(&self) -> usize {
        if self.config.max_procs > 0 {
            self.config.max_procs as usize
        } else {
            num_cpus::get()
        }
    }

    fn validate(&self, inputs: &PipelineInputs) -> Result<(), GrainSizeError> {
        self.config.validate()?;
        if inputs.dem.configs.rows == 0 || inputs.dem.configs.columns == 0 {
            return Err(GrainSizeError::configuration(format!(
                "The DEM {} contains no cells.",
                inputs.dem.file_name
            )));
        }
        if !inputs.streams.is_shape_type(ShapeType::PolyLine) {
            return Err(GrainSizeError::configuration(format!(
                "The stream network {} must contain polyline features.",
                inputs.streams.file_name
            )));
        }
        if !inputs.precip.is_shape_type(ShapeType::Polygon) {
            return Err(GrainSizeError::configuration(format!(
                "The precipitation layer {} must contain polygon features.",
                inputs.precip.file_name
            )));
        }
        if let Some(b) = &inputs.boundary {
            if !b.is_shape_type(ShapeType::Polygon) || b.num_features() == 0 {
                return Err(GrainSizeError::configuration(format!(
                    "The clipping boundary {} must contain polygon features.",
                    b.file_name
                )));
            }
        }
        if self.config.region.requires_min_jan_temp() && inputs.min_jan_temp.is_none() {
            return Err(GrainSizeError::configuration(
                "Region 100 requires a minimum January temperature raster (--min_jan_temp).",
            ));
        }

        let mut codes: Vec<(&str, u16)> = vec![
            (inputs.dem.file_name.as_str(), inputs.dem.configs.epsg_code),
            (inputs.streams.file_name.as_str(), inputs.streams.epsg_code),
            (inputs.precip.file_name.as_str(), inputs.precip.epsg_code),
        ];
        if let Some(b) = &inputs.boundary {
            codes.push((b.file_name.as_str(), b.epsg_code));
        }
        if let Some(t) = &inputs.min_jan_temp {
            codes.push((t.file_name.as_str(), t.configs.epsg_code));
        }
        let known: Vec<&(&str, u16)> = codes.iter().filter(|(_, c)| *c != 0).collect();
        if let Some((first_name, first_code)) = known.first() {
            for (name, code) in known.iter().skip(1) {
                if code != first_code {
                    return Err(GrainSizeError::configuration(format!(
                        "Spatial reference mismatch: {} is EPSG:{} but {} is EPSG:{}.",
                        first_name, first_code, name, code
                    )));
                }
            }
        }
        Ok(())
    }
}
