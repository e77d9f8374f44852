use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which column classifier the engine injects into the profiler and builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClassifierKind {
    /// Classify from the first non-empty value only.
    #[default]
    SingleSample,
    /// Classify from the share of all non-empty values.
    Majority,
}

/// Tunable constants for profiling and chart building.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub classifier: ClassifierKind,
    #[serde(default = "default_majority_threshold")]
    pub majority_threshold: f64,
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,
    #[serde(default = "default_mixed_row_limit")]
    pub mixed_row_limit: usize,
    #[serde(default = "default_waterfall_row_limit")]
    pub waterfall_row_limit: usize,
    #[serde(default = "default_bullet_row_limit")]
    pub bullet_row_limit: usize,
    #[serde(default = "default_bubble_radius_scale")]
    pub bubble_radius_scale: f64,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default)]
    pub strict_bindings: bool,
    #[serde(default = "default_temporal_formats")]
    pub temporal_formats: Vec<String>,
}

fn default_majority_threshold() -> f64 { 0.8 }
fn default_max_categories() -> usize { 10 }
fn default_mixed_row_limit() -> usize { 20 }
fn default_waterfall_row_limit() -> usize { 15 }
fn default_bullet_row_limit() -> usize { 15 }
fn default_bubble_radius_scale() -> f64 { 2.0 }
fn default_histogram_bins() -> usize { 20 }

fn default_temporal_formats() -> Vec<String> {
    [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%b %d %Y",
        "%d %b %Y",
        "%B %d, %Y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            majority_threshold: default_majority_threshold(),
            max_categories: default_max_categories(),
            mixed_row_limit: default_mixed_row_limit(),
            waterfall_row_limit: default_waterfall_row_limit(),
            bullet_row_limit: default_bullet_row_limit(),
            bubble_radius_scale: default_bubble_radius_scale(),
            histogram_bins: default_histogram_bins(),
            strict_bindings: false,
            temporal_formats: default_temporal_formats(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        if !(0.0..=1.0).contains(&config.majority_threshold) {
            anyhow::bail!(
                "majorityThreshold must be within 0..=1, got {}",
                config.majority_threshold
            );
        }
        Ok(config)
    }
}
