//! Baseline documents produced by the analyzer container.
//!
//! `statistics.json` describes per-feature distributions of the reference
//! dataset and `constraints.json` holds the rules every monitoring run checks
//! captured traffic against. Both documents carry fields this crate does not
//! model (KLL sketches, string statistics, ...); those are kept in `extra`
//! maps so an edited document round-trips without losing anything.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feature type inferred by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum InferredType {
    Integral,
    Fractional,
    String,
    Unknown,
}

/// `statistics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub version: f64,

    pub dataset: DatasetStatistics,

    #[serde(default)]
    pub features: Vec<FeatureStatistics>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Dataset level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub item_count: u64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Statistics of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStatistics {
    pub name: String,

    pub inferred_type: InferredType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerical_statistics: Option<NumericalStatistics>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Descriptive statistics of a numeric feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalStatistics {
    pub common: CommonStatistics,
    pub mean: f64,
    pub sum: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Presence counts shared by every feature type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonStatistics {
    pub num_present: u64,
    pub num_missing: u64,
}

/// `constraints.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub version: f64,

    #[serde(default)]
    pub features: Vec<FeatureConstraint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_config: Option<MonitoringConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Constraints {
    /// Returns the monitoring section, inserting the analyzer defaults when absent.
    pub fn monitoring_config_mut(&mut self) -> &mut MonitoringConfig {
        self.monitoring_config.get_or_insert_with(MonitoringConfig::default)
    }
}

/// Rules for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConstraint {
    pub name: String,

    pub inferred_type: InferredType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_constraints: Option<NumConstraints>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Numeric rules for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumConstraints {
    pub is_non_negative: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `Enabled` / `Disabled` switch used throughout the monitoring config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Toggle {
    Enabled,
    Disabled,
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        if value { Self::Enabled } else { Self::Disabled }
    }
}

/// Statistical comparison used for the baseline drift check.
///
/// `Robust` is the analyzer's choice for small samples; `Simple` compares
/// distance against the threshold directly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ComparisonMethod {
    Simple,
    Robust,
}

/// `monitoring_config` section of `constraints.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub evaluate_constraints: Toggle,
    pub emit_metrics: Toggle,
    pub datatype_check_threshold: f64,
    pub domain_content_threshold: f64,
    pub distribution_constraints: DistributionConstraints,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            evaluate_constraints: Toggle::Enabled,
            emit_metrics: Toggle::Enabled,
            datatype_check_threshold: 1.0,
            domain_content_threshold: 1.0,
            distribution_constraints: DistributionConstraints::default(),
            extra: Map::new(),
        }
    }
}

/// Drift comparison settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionConstraints {
    pub perform_comparison: Toggle,
    pub comparison_threshold: f64,
    pub comparison_method: ComparisonMethod,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DistributionConstraints {
    fn default() -> Self {
        Self {
            perform_comparison: Toggle::Enabled,
            comparison_threshold: 0.1,
            comparison_method: ComparisonMethod::Robust,
            extra: Map::new(),
        }
    }
}
