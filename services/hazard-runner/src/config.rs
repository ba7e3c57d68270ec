//! Runner configuration.
//!
//! One YAML file with a section per concern; every section and field is
//! optional and falls back to its default. `${VAR}` and `${VAR:-default}`
//! are expanded from the environment before parsing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use classification::{WeightConfig, WeightTable};
use grid_processor::{EngineConfig, GridAlgorithm};
use pipeline::DataLayout;
use serde::{Deserialize, Serialize};

/// Top-level runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub layout: DataLayout,
    pub weights: WeightConfig,
    pub engine: EngineConfig,
    /// Interpolation used when gridding forecast points.
    pub gridding: GridAlgorithm,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            layout: DataLayout::default(),
            weights: WeightConfig::default(),
            engine: EngineConfig::from_env(),
            gridding: GridAlgorithm::default(),
        }
    }
}

impl RunnerConfig {
    /// Load from a YAML file, or defaults plus environment when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read runner config from {:?}", path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse runner config from {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: RunnerConfig = serde_yaml::from_str(&expanded)?;
        Ok(config)
    }

    /// Validate the engine section and build the weight table.
    pub fn validate(&self) -> Result<WeightTable> {
        self.engine
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid engine configuration")?;
        let weights = self.weights.build()?;
        Ok(weights)
    }
}

/// Expand `${VAR}` and `${VAR:-default}` in YAML content.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
