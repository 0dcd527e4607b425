//! Reader and reference-data settings.
//!
//! Defaults match the conventions of the model's own output. A YAML file can
//! override any subset; missing keys keep their defaults.

use std::{
    env,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ReadError, ReadResult},
    schema::InferenceThresholds,
};

/// Width of the name field when no column follows it in the header.
pub const DEFAULT_NAME_FIELD_WIDTH: usize = 25;

pub const DEFAULT_PATH_ENV_VAR: &str = "DSSAT_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub inference: InferenceThresholds,
    pub name_field: NameFieldOptions,
    pub reference: ReferenceConfig,
}

impl Config {
    pub fn load(path: &Path) -> ReadResult<Self> {
        let file = File::open(path).map_err(|err| ReadError::from_io(path, err))?;
        let config: Config = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| ReadError::config(format!("Parsing {path:?}: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> ReadResult<Self> {
        let config: Config = serde_yaml::from_str(text)
            .map_err(|err| ReadError::config(format!("Parsing configuration: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReadResult<()> {
        self.inference.validate()?;
        if self.name_field.name_marker.trim().is_empty() {
            return Err(ReadError::config("name_field.name_marker cannot be empty"));
        }
        if self.name_field.default_width == 0 {
            return Err(ReadError::config("name_field.default_width must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NameFieldOptions {
    /// Header token fragment identifying the free-text name column.
    pub name_marker: String,
    /// Header token prefix identifying the experiment name column.
    pub experiment_marker: String,
    pub default_width: usize,
    pub year_columns: Vec<String>,
    /// Candidates holding a day code, tried in order.
    pub day_columns: Vec<String>,
}

impl Default for NameFieldOptions {
    fn default() -> Self {
        Self {
            name_marker: "TNAM".to_string(),
            experiment_marker: "EXNAME".to_string(),
            default_width: DEFAULT_NAME_FIELD_WIDTH,
            year_columns: vec!["YEAR".to_string(), "YR".to_string()],
            day_columns: ["PDAT", "SDAT", "HDAT", "MDAT", "DOY"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Environment variable that, when set, replaces `search_paths`.
    pub env_var: String,
    pub search_paths: Vec<PathBuf>,
    pub variable_file: String,
    pub detail_file: String,
    pub profile_file: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        let mut search_paths = vec![
            PathBuf::from(r"C:\DSSAT48"),
            PathBuf::from("/opt/DSSAT48"),
            PathBuf::from("/usr/local/DSSAT48"),
        ];
        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join("DSSAT48"));
        }
        Self {
            env_var: DEFAULT_PATH_ENV_VAR.to_string(),
            search_paths,
            variable_file: "DATA.CDE".to_string(),
            detail_file: "DETAIL.CDE".to_string(),
            profile_file: "DSSATPRO.v48".to_string(),
        }
    }
}

impl ReferenceConfig {
    /// Directories to search, honouring the environment override.
    pub fn resolved_search_paths(&self) -> Vec<PathBuf> {
        match env::var_os(&self.env_var) {
            Some(value) if !value.is_empty() => env::split_paths(&value).collect(),
            _ => self.search_paths.clone(),
        }
    }

    /// First existing `file_name` under the search paths.
    pub fn locate(&self, file_name: &str) -> Option<PathBuf> {
        self.resolved_search_paths()
            .into_iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = Config::from_yaml_str("{}").expect("parse defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_yaml_overrides_selected_keys() {
        let config = Config::from_yaml_str(
            "inference:\n  numeric_ratio: 0.9\nname_field:\n  default_width: 30\n",
        )
        .expect("parse overrides");
        assert_eq!(config.inference.numeric_ratio, 0.9);
        assert_eq!(config.inference.date_ratio, 0.8);
        assert_eq!(config.name_field.default_width, 30);
        assert_eq!(config.name_field.name_marker, "TNAM");
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let err = Config::from_yaml_str("inference:\n  categorical_ratio: 0.95\n").unwrap_err();
        assert!(matches!(err, ReadError::Config { .. }));
    }

    #[test]
    fn env_override_replaces_search_paths() {
        let config = ReferenceConfig {
            env_var: "DSSAT_TABLES_TEST_OVERRIDE_UNSET".to_string(),
            search_paths: vec![PathBuf::from("/nowhere")],
            ..ReferenceConfig::default()
        };
        assert_eq!(config.resolved_search_paths(), vec![PathBuf::from("/nowhere")]);
        assert!(config.locate("DATA.CDE").is_none());
    }
}
