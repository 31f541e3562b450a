/*
This code is part of the StreamGravel fluvial grain size tools.
License: MIT
*/

use std::env;
use std::io::{Error, ErrorKind};
use std::path;
use std::process;
use streamgravel_common::configs::get_configs;
use streamgravel_tools::tools::ToolManager;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    env_logger::init();
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

fn run() -> Result<(), Error> {
    let sep: &str = &path::MAIN_SEPARATOR.to_string();
    let configs = get_configs()?;
    let mut working_dir = configs.working_directory.clone();
    let mut verbose = configs.verbose_mode;
    let mut tool_name = String::new();
    let mut run_tool = false;
    let mut tool_help = false;
    let mut tool_parameters = false;
    let mut toolbox = false;
    let mut list_tools = false;
    let mut tool_args_vec: Vec<String> = vec![];

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        help();
        return Ok(());
    }
    for arg in &args {
        let flag_val = arg.to_lowercase().replace("--", "-");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val == "-version" {
            version();
            return Ok(());
        } else if flag_val.starts_with("-cd") || flag_val.starts_with("-wd") {
            let v = arg
                .splitn(2, '=')
                .nth(1)
                .unwrap_or_default()
                .replace('\"', "")
                .replace('\'', "");
            working_dir = v.trim().to_string();
            if !working_dir.is_empty() && !working_dir.ends_with(sep) {
                working_dir.push_str(sep);
            }
        } else if flag_val.starts_with("-run") || flag_val.starts_with("-r=") || flag_val == "-r" {
            if let Some(v) = arg.splitn(2, '=').nth(1) {
                tool_name = v.replace('\"', "").replace('\'', "");
            }
            run_tool = true;
        } else if flag_val.starts_with("-toolhelp") {
            if let Some(v) = arg.splitn(2, '=').nth(1) {
                tool_name = v.replace('\"', "").replace('\'', "");
            }
            tool_help = true;
        } else if flag_val.starts_with("-toolparameters") {
            if let Some(v) = arg.splitn(2, '=').nth(1) {
                tool_name = v.replace('\"', "").replace('\'', "");
            }
            tool_parameters = true;
        } else if flag_val.starts_with("-toolbox") {
            if let Some(v) = arg.splitn(2, '=').nth(1) {
                tool_name = v.replace('\"', "").replace('\'', "");
            }
            toolbox = true;
        } else if flag_val == "-listtools" || flag_val == "-list_tools" {
            list_tools = true;
        } else if flag_val == "-v" || flag_val == "-v=true" {
            verbose = true;
        } else if flag_val == "-v=false" {
            verbose = false;
        } else if arg.starts_with('-') {
            tool_args_vec.push(arg.trim().to_string());
        } else if run_tool && tool_name.is_empty() {
            tool_name = arg.trim().to_string();
        } else {
            tool_args_vec.push(arg.trim().to_string());
        }
    }

    let tm = ToolManager::new(&working_dir, &verbose)?;
    if run_tool {
        if tool_name.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "No tool specified with --run."));
        }
        tm.run_tool(tool_name, tool_args_vec)
    } else if tool_help {
        tm.tool_help(tool_name)
    } else if tool_parameters {
        tm.tool_parameters(tool_name)
    } else if toolbox {
        tm.toolbox(tool_name)
    } else if list_tools {
        tm.list_tools();
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidInput,
            "Unrecognized command. Use --help for usage.",
        ))
    }
}

fn help() {
    let mut ext = "";
    if cfg!(target_os = "windows") {
        ext = ".exe";
    }
    let exe_name = &format!("streamgravel_tools{}", ext);
    let s = r#"streamgravel_tools Help

The following commands are recognized:
--cd, --wd          Changes the working directory; used in conjunction with --run flag.
-h, --help          Prints help information.
--listtools         Lists all available tools.
-r, --run           Runs a tool; used in conjunction with --wd flag; -r="GrainSizeDistribution".
--toolbox           Prints the toolbox associated with a tool; --toolbox=GrainSizeDistribution.
--toolhelp          Prints the help associated with a tool; --toolhelp="GrainSizeDistribution".
--toolparameters    Prints the parameters (in json form) for a specific tool.
-v                  Verbose mode. Without this flag, tool outputs will not be printed.
--version           Prints the version information.

Set RUST_LOG=info (or debug) for diagnostic log records on stderr.

Example Usage:
>> ./streamgravel_tools -r=GrainSizeDistribution -v --wd="/path/to/data/" --dem=dem.asc --streams=streams.geojson --precip=precip.geojson --out_dir=/path/to/out --region=1
"#
    .replace("streamgravel_tools", exe_name);
    println!("{}", s);
}

fn version() {
    println!(
        "StreamGravel Tools v{}\nFluvial grain size estimation for stream networks.",
        VERSION
    );
}
