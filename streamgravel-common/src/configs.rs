//! User settings stored in `settings.json` beside the executable.

use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configs {
    pub verbose_mode: bool,
    pub working_directory: String,
    /// Upper bound on worker threads; values < 1 mean "all cores".
    pub max_procs: isize,
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            verbose_mode: false,
            working_directory: String::new(),
            max_procs: -1,
        }
    }
}

fn settings_path() -> Result<PathBuf, Error> {
    let mut path = env::current_exe()?;
    path.pop();
    path.push("settings.json");
    Ok(path)
}

/// Reads the settings file next to the executable. A missing file yields
/// the default settings; a malformed one is an error.
pub fn get_configs() -> Result<Configs, Error> {
    read_configs_from(&settings_path()?)
}

pub fn read_configs_from(path: &Path) -> Result<Configs, Error> {
    if !path.exists() {
        return Ok(Configs::default());
    }
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Error parsing {}: {}", path.display(), e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let configs = read_configs_from(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(configs, Configs::default());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let configs: Configs = serde_json::from_str(r#"{"max_procs": 4}"#).unwrap();
        assert_eq!(configs.max_procs, 4);
        assert!(!configs.verbose_mode);
    }
}
