use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Options that control how an evaluator runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorOptions {
    /// Record which requests asked for which (default: false)
    #[serde(default)]
    pub record_dependencies: bool,

    /// Log every detected cycle at warn level (default: false)
    #[serde(default)]
    pub debug_cycles: bool,

    /// Collect per-kind computation counts and timings (default: false)
    #[serde(default)]
    pub collect_statistics: bool,

    /// Pretty-print diagnostics (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            record_dependencies: false,
            debug_cycles: false,
            collect_statistics: false,
            pretty: true,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorConfig {
    #[serde(default)]
    pub evaluator_options: EvaluatorOptions,
}

/// Options given on the command line; `None` keeps the file's value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub record_dependencies: Option<bool>,
    pub debug_cycles: Option<bool>,
    pub collect_statistics: Option<bool>,
    pub pretty: Option<bool>,
}

enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

impl EvaluatorConfig {
    /// Load configuration from a YAML or JSON file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Yaml => serde_yaml::from_str(&content)?,
        };
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<(), ConfigError> {
        let config = EvaluatorConfig::default();
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(&config)?,
            Format::Yaml => serde_yaml::to_string(&config)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply command line overrides on top of this configuration
    pub fn merge_with_cli(&mut self, overrides: &CliOverrides) {
        let options = &mut self.evaluator_options;
        if let Some(record) = overrides.record_dependencies {
            options.record_dependencies = record;
        }
        if let Some(debug) = overrides.debug_cycles {
            options.debug_cycles = debug;
        }
        if let Some(collect) = overrides.collect_statistics {
            options.collect_statistics = collect;
        }
        if let Some(pretty) = overrides.pretty {
            options.pretty = pretty;
        }
    }
}
