/*
This tool is part of the StreamGravel fluvial grain size tools.
Author: Braden Anderson
License: MIT
*/

use super::config::{AreaUnits, GrainSizeConfig, SamplePoint};
use super::hydraulics::Region;
use super::output::default_sinks;
use super::pipeline::{GrainSizePipeline, PipelineEvent, PipelineInputs};
use crate::errors::GrainSizeError;
use crate::tools::gis_analysis::PlanarGeometryService;
use crate::tools::hydro_analysis::D8TerrainService;
use crate::tools::*;
use std::env;
use std::io::{Error, ErrorKind};
use std::path;
use std::sync::Mutex;
use std::time::Instant;
use streamgravel_common::utils::get_formatted_elapsed_time;

/// Estimates the median bed grain size of every reach in a stream network.
pub struct GrainSizeDistribution {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl GrainSizeDistribution {
    pub fn new() -> GrainSizeDistribution {
        let name = "GrainSizeDistribution".to_string();
        let toolbox = "Fluvial Geomorphology".to_string();
        let description = "Estimates the median gravel grain size of each stream reach from channel width, two-year flood discharge and slope.".to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input DEM File".to_owned(),
            flags: vec!["--dem".to_owned()],
            description: "Input raster DEM file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Input Stream Network File".to_owned(),
            flags: vec!["--streams".to_owned()],
            description: "Input vector stream network (polylines).".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Line,
            )),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Input Precipitation File".to_owned(),
            flags: vec!["--precip".to_owned()],
            description: "Input vector of mean annual precipitation polygons (inches).".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Polygon,
            )),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Precipitation Field".to_owned(),
            flags: vec!["--precip_field".to_owned()],
            description: "Precipitation attribute field, in inches.".to_owned(),
            parameter_type: ParameterType::VectorAttributeField(
                AttributeType::Number,
                "--precip".to_string(),
            ),
            default_value: Some(GrainSizeConfig::DEFAULT_PRECIP_FIELD.to_string()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Input Clipping Boundary File".to_owned(),
            flags: vec!["--boundary".to_owned()],
            description: "Optional sub-basin polygon (e.g. a HUC10) used to clip the stream network.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Polygon,
            )),
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Output Directory".to_owned(),
            flags: vec!["--out_dir".to_owned()],
            description: "Directory receiving GrainSize.geojson and GrainSizeReport.txt.".to_owned(),
            parameter_type: ParameterType::Directory,
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Manning's n".to_owned(),
            flags: vec!["--mannings_n".to_owned()],
            description: "Manning roughness coefficient.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some(GrainSizeConfig::DEFAULT_MANNINGS_N.to_string()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Shields Critical Stress".to_owned(),
            flags: vec!["--shields".to_owned()],
            description: "Critical Shields shear-stress coefficient (t_c).".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some(GrainSizeConfig::DEFAULT_SHIELDS.to_string()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Region Number".to_owned(),
            flags: vec!["--region".to_owned()],
            description: "Flood-frequency region (1-9, 12-16 or 100).".to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Minimum January Temperature File".to_owned(),
            flags: vec!["--min_jan_temp".to_owned()],
            description: "Raster of minimum January temperature (degrees C); required for region 100.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Search Radius".to_owned(),
            flags: vec!["--search_radius".to_owned()],
            description: "Radius (map units) searched for the maximum flow accumulation.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some(GrainSizeConfig::DEFAULT_SEARCH_RADIUS.to_string()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Drainage Area Units".to_owned(),
            flags: vec!["--area_units".to_owned()],
            description: "Drainage area units used by the regional equations.".to_owned(),
            parameter_type: ParameterType::OptionList(vec!["km2".to_owned(), "mi2".to_owned()]),
            default_value: Some("km2".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Sample Point".to_owned(),
            flags: vec!["--sample_point".to_owned()],
            description: "Reach point at which drainage area and precipitation are sampled.".to_owned(),
            parameter_type: ParameterType::OptionList(vec![
                "last".to_owned(),
                "first".to_owned(),
                "centroid".to_owned(),
            ]),
            default_value: Some("last".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Save Flow Accumulation".to_owned(),
            flags: vec!["--save_terrain".to_owned()],
            description: "Write the derived flow-accumulation raster to the output directory.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_string()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Maximum Processors".to_owned(),
            flags: vec!["--max_procs".to_owned()],
            description: "Number of worker threads; -1 uses every core.".to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: Some("-1".to_owned()),
            optional: true,
        });

        let sep: String = path::MAIN_SEPARATOR.to_string();
        let exe = env::current_exe().unwrap_or_default();
        let e = format!("{}", exe.display());
        let mut parent = exe.clone();
        parent.pop();
        let p = format!("{}", parent.display());
        let mut short_exe = e
            .replace(&p, "")
            .replace(".exe", "")
            .replace(".", "")
            .replace(&sep, "");
        if e.contains(".exe") {
            short_exe += ".exe";
        }
        let usage = format!(
            ">>.*{0} -r={1} -v --wd=\"*path*to*data*\" --dem='dem.asc' --streams='streams.geojson' --precip='precip.geojson' --boundary='huc10.geojson' --out_dir='grain_size' --region=1",
            short_exe, name
        )
        .replace("*", &sep);

        GrainSizeDistribution {
            name,
            description,
            toolbox,
            parameters,
            example_usage: usage,
        }
    }
}

impl Default for GrainSizeDistribution {
    fn default() -> GrainSizeDistribution {
        GrainSizeDistribution::new()
    }
}

fn parse_f64(flag: &str, value: &str) -> Result<f64, GrainSizeError> {
    value.trim().parse::<f64>().map_err(|_| {
        GrainSizeError::configuration(format!("{} expects a number (got '{}').", flag, value))
    })
}

fn parse_i64(flag: &str, value: &str) -> Result<i64, GrainSizeError> {
    value.trim().parse::<i64>().map_err(|_| {
        GrainSizeError::configuration(format!("{} expects an integer (got '{}').", flag, value))
    })
}

fn resolve(working_directory: &str, file: &str) -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    if file.is_empty() || file.contains(&sep) || file.contains('/') {
        file.to_string()
    } else {
        format!("{}{}", working_directory, file)
    }
}

/// Parses the tool's command-line arguments into a validated configuration.
pub fn parse_args(
    args: &[String],
    working_directory: &str,
) -> Result<GrainSizeConfig, GrainSizeError> {
    if args.is_empty() {
        return Err(GrainSizeError::configuration("Tool run with no parameters."));
    }
    let mut dem_file = String::new();
    let mut streams_file = String::new();
    let mut precip_file = String::new();
    let mut boundary_file = String::new();
    let mut min_jan_temp_file = String::new();
    let mut output_dir = String::new();
    let mut region: Option<i64> = None;
    let mut mannings_n = GrainSizeConfig::DEFAULT_MANNINGS_N;
    let mut shields = GrainSizeConfig::DEFAULT_SHIELDS;
    let mut precip_field = GrainSizeConfig::DEFAULT_PRECIP_FIELD.to_string();
    let mut search_radius = GrainSizeConfig::DEFAULT_SEARCH_RADIUS;
    let mut area_units = AreaUnits::SquareKilometers;
    let mut sample_point = SamplePoint::Last;
    let mut save_terrain = false;
    let mut max_procs: isize = -1;

    for i in 0..args.len() {
        let mut arg = args[i].replace('\"', "");
        arg = arg.replace('\'', "");
        let cmd = arg.splitn(2, '=');
        let vec = cmd.collect::<Vec<&str>>();
        let keyval = vec.len() > 1;
        let flag = vec[0].to_lowercase();
        let value = || -> Result<String, GrainSizeError> {
            if keyval {
                Ok(vec[1].to_string())
            } else {
                args.get(i + 1)
                    .map(|v| v.replace('\"', "").replace('\'', ""))
                    .ok_or_else(|| {
                        GrainSizeError::configuration(format!("No value given for {}.", flag))
                    })
            }
        };
        match flag.trim_start_matches('-') {
            "dem" => dem_file = value()?,
            "streams" => streams_file = value()?,
            "precip" => precip_file = value()?,
            "boundary" => boundary_file = value()?,
            "min_jan_temp" => min_jan_temp_file = value()?,
            "out_dir" => output_dir = value()?,
            "region" => region = Some(parse_i64("--region", &value()?)?),
            "mannings_n" => mannings_n = parse_f64("--mannings_n", &value()?)?,
            "shields" => shields = parse_f64("--shields", &value()?)?,
            "precip_field" => precip_field = value()?,
            "search_radius" => search_radius = parse_f64("--search_radius", &value()?)?,
            "area_units" => area_units = value()?.parse()?,
            "sample_point" => sample_point = value()?.parse()?,
            "save_terrain" => {
                save_terrain = !keyval || vec[1].to_lowercase().contains("true");
            }
            "max_procs" => max_procs = parse_i64("--max_procs", &value()?)? as isize,
            _ => {}
        }
    }

    let region = match region {
        Some(r) => Region::from_number(r)?,
        None => {
            return Err(GrainSizeError::configuration(
                "Required parameter --region not specified.",
            ))
        }
    };
    let mut config = GrainSizeConfig::new(
        &resolve(working_directory, &dem_file),
        &resolve(working_directory, &streams_file),
        &resolve(working_directory, &precip_file),
        &resolve(working_directory, &output_dir),
        region,
    );
    if !boundary_file.is_empty() {
        config.boundary_file = Some(resolve(working_directory, &boundary_file));
    }
    if !min_jan_temp_file.is_empty() {
        config.min_jan_temp_file = Some(resolve(working_directory, &min_jan_temp_file));
    }
    config.mannings_n = mannings_n;
    config.shields = shields;
    config.precip_field = precip_field;
    config.search_radius = search_radius;
    config.area_units = area_units;
    config.sample_point = sample_point;
    config.save_terrain = save_terrain;
    config.max_procs = max_procs;
    config.validate()?;
    Ok(config)
}

/// Percentage to report for a progress event, if it moves past the last one
/// reported. Workers finish out of order, so smaller values are dropped.
fn advance_progress(old: &mut Option<usize>, completed: usize, total: usize) -> Option<usize> {
    if total == 0 {
        return None;
    }
    let progress = 100 * completed / total;
    match *old {
        Some(last) if progress <= last => None,
        _ => {
            *old = Some(progress);
            Some(progress)
        }
    }
}

impl StreamGravelTool for GrainSizeDistribution {
    fn get_source_file(&self) -> String {
        String::from(file!())
    }

    fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    fn get_tool_parameters(&self) -> String {
        match serde_json::to_string(&self.parameters) {
            Ok(json_str) => format!("{{\"parameters\":{}}}", json_str),
            Err(err) => format!("{:?}", err),
        }
    }

    fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    fn get_toolbox(&self) -> String {
        self.toolbox.clone()
    }

    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error> {
        let mut config = parse_args(&args, working_directory)?;
        if config.max_procs < 1 {
            let configs = streamgravel_common::configs::get_configs()?;
            config.max_procs = configs.max_procs;
        }

        if verbose {
            let tool_name = self.get_tool_name();
            let welcome_len = format!("* Welcome to {} *", tool_name).len().max(28);
            println!("{}", "*".repeat(welcome_len));
            println!(
                "* Welcome to {} {}*",
                tool_name,
                " ".repeat(welcome_len - 15 - tool_name.len())
            );
            println!(
                "* Powered by StreamGravel {}*",
                " ".repeat(welcome_len - 27)
            );
            println!("{}", "*".repeat(welcome_len));
        }

        if verbose {
            println!("Reading input data...");
        }
        let inputs = PipelineInputs::read(&config)?;
        let output_dir = config.output_dir.clone();

        let start = Instant::now();
        let old_progress: Mutex<Option<usize>> = Mutex::new(None);
        let pipeline = GrainSizePipeline::new(
            D8TerrainService::default(),
            PlanarGeometryService::default(),
            config,
        )
        .on_event(move |event| {
            if !verbose {
                return;
            }
            match event {
                PipelineEvent::Stage(stage) => println!("{}...", stage),
                PipelineEvent::Progress { completed, total } => {
                    if let Ok(mut old) = old_progress.lock() {
                        if let Some(progress) = advance_progress(&mut old, completed, total) {
                            println!("Progress: {}%", progress);
                        }
                    }
                }
            }
        });

        let mut sinks = default_sinks(&output_dir);
        let summary = pipeline.run(inputs, &mut sinks)?;
        let elapsed_time = get_formatted_elapsed_time(start);

        if summary.built == 0 && summary.total > 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "None of the {} reaches could be estimated; see the report in {}.",
                    summary.total, output_dir
                ),
            ));
        }

        if verbose {
            println!(
                "Reaches: {} total, {} built, {} skipped",
                summary.total,
                summary.built,
                summary.skipped.len()
            );
            println!(
                "{}",
                &format!("Elapsed Time (excluding I/O): {}", elapsed_time)
            );
        }

        Ok(())
    }
}
