pub mod fluvial_geomorphology;
pub mod gis_analysis;
pub mod hydro_analysis;
pub mod stream_network_analysis;

use serde_derive::Serialize;
use std::fmt;
use std::io::{Error, ErrorKind};

pub use self::fluvial_geomorphology::GrainSizeDistribution;

/// Common interface of every command-line tool in the suite.
pub trait StreamGravelTool {
    fn get_source_file(&self) -> String;
    fn get_tool_name(&self) -> String;
    fn get_tool_description(&self) -> String;
    fn get_tool_parameters(&self) -> String;
    fn get_example_usage(&self) -> String;
    fn get_toolbox(&self) -> String;
    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error>;
}

#[derive(Serialize, Clone, Debug)]
pub struct ToolParameter {
    pub name: String,
    pub flags: Vec<String>,
    pub description: String,
    pub parameter_type: ParameterType,
    pub default_value: Option<String>,
    pub optional: bool,
}

impl fmt::Display for ToolParameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(e) => write!(f, "{{\"error\": \"{}\"}}", e),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum ParameterType {
    Boolean,
    String,
    Integer,
    Float,
    VectorAttributeField(AttributeType, String),
    ExistingFile(ParameterFileType),
    NewFile(ParameterFileType),
    Directory,
    OptionList(Vec<String>),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum ParameterFileType {
    Any,
    Raster,
    Vector(VectorGeometryType),
    Text,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum VectorGeometryType {
    Any,
    Point,
    Line,
    Polygon,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum AttributeType {
    Any,
    Number,
    Text,
}

/// Locates tools by name and dispatches runs, help and parameter queries.
pub struct ToolManager {
    pub working_dir: String,
    pub verbose: bool,
    tool_names: Vec<String>,
}

impl ToolManager {
    pub fn new<'a>(working_directory: &'a str, verbose_mode: &'a bool) -> Result<ToolManager, Error> {
        let tool_names = vec!["GrainSizeDistribution".to_string()];
        Ok(ToolManager {
            working_dir: working_directory.to_string(),
            verbose: *verbose_mode,
            tool_names,
        })
    }

    pub fn get_tool(&self, tool_name: &str) -> Option<Box<dyn StreamGravelTool + 'static>> {
        match tool_name.to_lowercase().replace('_', "").as_ref() {
            "grainsizedistribution" | "grainsize" => Some(Box::new(GrainSizeDistribution::new())),
            _ => None,
        }
    }

    fn find_tool(&self, tool_name: &str) -> Result<Box<dyn StreamGravelTool + 'static>, Error> {
        self.get_tool(tool_name).ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("Unrecognized tool name {}.", tool_name),
            )
        })
    }

    pub fn run_tool(&self, tool_name: String, args: Vec<String>) -> Result<(), Error> {
        let tool = self.find_tool(&tool_name)?;
        tool.run(args, &self.working_dir, self.verbose)
    }

    pub fn tool_help(&self, tool_name: String) -> Result<(), Error> {
        println!("{}", self.get_tool_help(&tool_name)?);
        Ok(())
    }

    pub fn get_tool_help(&self, tool_name: &str) -> Result<String, Error> {
        let tool = self.find_tool(tool_name)?;
        let parameters: serde_json::Value = serde_json::from_str(&tool.get_tool_parameters())
            .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;

        let mut s = format!(
            "{}\nDescription:\n{}\nToolbox: {}\nParameters:\n\n",
            tool.get_tool_name(),
            tool.get_tool_description(),
            tool.get_toolbox()
        );
        s.push_str("Flag               Description\n");
        s.push_str("-----------------  -----------\n");
        if let Some(params) = parameters["parameters"].as_array() {
            for p in params {
                let flags = p["flags"]
                    .as_array()
                    .map(|f| {
                        f.iter()
                            .filter_map(|v| v.as_str())
                            .collect::<Vec<&str>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                let description = p["description"].as_str().unwrap_or_default();
                s.push_str(&format!("{:<18} {}\n", flags, description));
            }
        }
        s.push_str(&format!("\n\nExample usage:\n{}\n", tool.get_example_usage()));
        Ok(s)
    }

    pub fn tool_parameters(&self, tool_name: String) -> Result<(), Error> {
        let tool = self.find_tool(&tool_name)?;
        println!("{}", tool.get_tool_parameters());
        Ok(())
    }

    pub fn toolbox(&self, tool_name: String) -> Result<(), Error> {
        let tool = self.find_tool(&tool_name)?;
        println!("{}", tool.get_toolbox());
        Ok(())
    }

    pub fn list_tools(&self) {
        println!("All {} Available Tools:", self.tool_names.len());
        for name in &self.tool_names {
            if let Some(tool) = self.get_tool(name) {
                println!("{}: {}", tool.get_tool_name(), tool.get_tool_description());
            }
        }
    }
}
