use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings for the adaptive bandwidth search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GwrConfig {
    /// Stop when successive criterion values differ by less than this.
    pub tolerance: f64,
    /// Upper bound on golden-section iterations.
    pub max_iter: usize,
    /// Override the lower end of the neighbour-count search interval.
    pub min_bandwidth: Option<usize>,
    /// Override the upper end of the neighbour-count search interval.
    pub max_bandwidth: Option<usize>,
}

impl Default for GwrConfig {
    fn default() -> Self {
        Self { tolerance: 1.0e-5, max_iter: 200, min_bandwidth: None, max_bandwidth: None }
    }
}

/// Settings for spatial weights and Moran's I inference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoranConfig {
    /// Neighbour count for point data.
    pub knn: usize,
    /// Random permutations used for the pseudo p-value.
    pub permutations: usize,
    /// Seed for the permutation generator; fixed so reruns agree.
    pub seed: u64,
}

impl Default for MoranConfig {
    fn default() -> Self {
        Self { knn: 5, permutations: 999, seed: 12345 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub gwr: GwrConfig,
    pub moran: MoranConfig,
    /// Progress verbosity (0 = quiet).
    #[serde(skip)]
    pub verbose: u8,
}

impl PipelineConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("[config] Invalid config in {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json_str(r#"{ "moran": { "permutations": 99 } }"#).unwrap();
        assert_eq!(config.moran.permutations, 99);
        assert_eq!(config.moran.knn, 5);
        assert_eq!(config.gwr, GwrConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(PipelineConfig::from_json_str("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(PipelineConfig::from_json_str("{ gwr: ").is_err());
    }
}
