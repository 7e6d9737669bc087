//! Stack configuration file (`stackgen.toml`)

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Deserialize;
use stackgen_core::{StackContext, Value};
use stackgen_provider_aws::schemas::types::{aws_region, instance_type};

pub const DEFAULT_CONFIG_FILE: &str = "stackgen.toml";

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Directory holding policy and user-data templates, relative to the config file
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Components emitted after the base and network fragments
    #[serde(default)]
    pub components: Vec<String>,

    pub context: StackContext,
}

impl StackConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => ConfigError::FileNotFound(path.display().to_string()),
            _ => ConfigError::Read {
                path: path.display().to_string(),
                message: error.to_string(),
            },
        })?;

        let mut config = Self::parse(&contents)?;
        if config.template_dir.is_relative() {
            let base = path.parent().unwrap_or(Path::new("."));
            config.template_dir = base.join(&config.template_dir);
        }
        log::debug!(
            "Loaded {} with template dir {}",
            path.display(),
            config.template_dir.display()
        );
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: StackConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.context
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        aws_region()
            .validate(&Value::from(&self.context.region))
            .map_err(|e| ConfigError::Invalid(format!("context.region: {}", e)))?;
        instance_type()
            .validate(&Value::from(&self.context.instance_type))
            .map_err(|e| ConfigError::Invalid(format!("context.instance_type: {}", e)))?;
        Ok(())
    }
}
