//! Workbench configuration, loaded from YAML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kt_model::GraphDefaults;

use crate::chart::ChartSettings;
use crate::error::{AppError, AppResult};

/// Settings of a workbench session. Every field has a default, so an empty
/// file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Folder scanned for importable track files at startup.
    pub import_folder: Option<PathBuf>,
    /// File extension (without the dot) of importable track files.
    pub import_extension: String,
    /// Size of the computation pool; 0 lets rayon decide.
    pub worker_threads: usize,
    /// Start with one trace and one graph bound to it.
    pub seed_defaults: bool,
    pub graph_defaults: GraphDefaults,
    pub chart: ChartSettings,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            import_folder: None,
            import_extension: "txt".to_string(),
            worker_threads: 0,
            seed_defaults: true,
            graph_defaults: GraphDefaults::default(),
            chart: ChartSettings::default(),
        }
    }
}

impl WorkbenchConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| AppError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kt_model::{Channel, Style};

    #[test]
    fn empty_config_is_default() {
        assert_eq!(WorkbenchConfig::from_yaml("").unwrap(), WorkbenchConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let yaml = r#"
import_extension: csv
worker_threads: 2
graph_defaults:
  y_channel: velocity
  style: points
chart:
  title: Ramp study
"#;
        let config = WorkbenchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.import_extension, "csv");
        assert_eq!(config.worker_threads, 2);
        assert!(config.seed_defaults);
        assert_eq!(config.graph_defaults.x_channel, Channel::Time);
        assert_eq!(config.graph_defaults.y_channel, Channel::Velocity);
        assert_eq!(config.graph_defaults.style, Style::Points);
        assert_eq!(config.chart.title, "Ramp study");
        assert_eq!(config.chart.x_label, "xAxis");
    }
}
