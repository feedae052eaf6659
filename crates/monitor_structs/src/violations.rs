use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// File name of the violations document a monitoring run writes.
pub const VIOLATIONS_FILE_NAME: &str = "constraint_violations.json";

/// File name of the statistics document a monitoring run or baseline job writes.
pub const STATISTICS_FILE_NAME: &str = "statistics.json";

/// File name of the constraints document a baseline job writes.
pub const CONSTRAINTS_FILE_NAME: &str = "constraints.json";

/// `constraint_violations.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub violations: Vec<Violation>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One deviation of captured traffic from a baseline constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Feature the check ran against
    pub feature_name: String,

    /// Check kind, e.g. `data_type_check` or `baseline_drift_check`
    pub constraint_check_type: String,

    /// Human readable explanation from the analyzer
    pub description: String,
}
