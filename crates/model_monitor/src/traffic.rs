//! Synthetic traffic for a deployed endpoint.
//!
//! Rows come from the labelled validation set. A [`Perturbation`] can shift
//! one feature so the captured traffic drifts away from the baseline.

use core::fmt;
use core::str::FromStr;
use core::time::Duration;
use std::path::Path;

use monitor_structs::{FEATURE_COUNT, FeatureRow, FeatureRowError};
use sagemaker_client::SageMakerApi;
use tracing::{debug, info};

use crate::error::{MonitorError, Result, local_io};
use crate::inference;

/// Change applied to one feature of every generated row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perturbation {
    Scale { feature: usize, factor: f32 },
    Offset { feature: usize, delta: f32 },
    Constant { feature: usize, value: f32 },
    Negate { feature: usize },
}

impl Perturbation {
    #[must_use]
    pub const fn feature(self) -> usize {
        match self {
            Self::Scale { feature, .. }
            | Self::Offset { feature, .. }
            | Self::Constant { feature, .. }
            | Self::Negate { feature } => feature,
        }
    }

    /// Returns `row` with the perturbation applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature index is out of range or the result is
    /// not finite.
    pub fn apply(self, row: FeatureRow) -> Result<FeatureRow, FeatureRowError> {
        let index = self.feature();
        let current = *row
            .values()
            .get(index)
            .ok_or(FeatureRowError::IndexOutOfRange { index })?;

        let value = match self {
            Self::Scale { factor, .. } => current * factor,
            Self::Offset { delta, .. } => current + delta,
            Self::Constant { value, .. } => value,
            Self::Negate { .. } => -current,
        };

        row.with_feature(index, value)
    }
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scale { feature, factor } => write!(f, "scale:{feature}:{factor}"),
            Self::Offset { feature, delta } => write!(f, "offset:{feature}:{delta}"),
            Self::Constant { feature, value } => write!(f, "constant:{feature}:{value}"),
            Self::Negate { feature } => write!(f, "negate:{feature}"),
        }
    }
}

impl FromStr for Perturbation {
    type Err = String;

    /// Parses `scale:F:X`, `offset:F:X`, `constant:F:X` or `negate:F`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid perturbation {s:?}, expected kind:feature[:value]");

        let mut parts = s.trim().split(':');
        let kind = parts.next().unwrap_or_default();
        let feature: usize = parts
            .next()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(invalid)?;
        if feature >= FEATURE_COUNT {
            return Err(format!(
                "feature index {feature} is out of range (0..{FEATURE_COUNT})"
            ));
        }

        let value = parts.next().map(str::parse::<f32>);
        if parts.next().is_some() {
            return Err(invalid());
        }

        let value = match value {
            Some(Ok(value)) if value.is_finite() => Some(value),
            Some(_) => return Err(invalid()),
            None => None,
        };

        match (kind, value) {
            ("scale", Some(factor)) => Ok(Self::Scale { feature, factor }),
            ("offset", Some(delta)) => Ok(Self::Offset { feature, delta }),
            ("constant", Some(value)) => Ok(Self::Constant { feature, value }),
            ("negate", None) => Ok(Self::Negate { feature }),
            _ => Err(invalid()),
        }
    }
}

/// Parses a labelled dataset: a header line, then the class label followed
/// by the features on each line. Blank lines are skipped.
///
/// # Errors
///
/// Returns `InvalidFeatureRow` for the first bad line.
pub fn parse_rows(text: &str) -> Result<Vec<FeatureRow>> {
    text.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let features = line.split_once(',').map_or("", |(_, rest)| rest);
            features.parse::<FeatureRow>().map_err(MonitorError::from)
        })
        .collect()
}

/// Reads a labelled dataset from disk.
///
/// # Errors
///
/// Returns `LocalIo` if the file cannot be read, or `InvalidFeatureRow`.
pub async fn load_rows(path: &Path) -> Result<Vec<FeatureRow>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(local_io(path))?;
    let rows = parse_rows(&text)?;
    info!(path = %path.display(), rows = rows.len(), "Loaded traffic rows");
    Ok(rows)
}

/// How much traffic to send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficPlan {
    pub count: usize,
    pub delay: Duration,
    pub perturbation: Option<Perturbation>,
}

/// Outcome of a traffic run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficSummary {
    pub sent: usize,
    /// Requests per predicted class, indexed by label
    pub per_class: Vec<usize>,
}

/// Sends `plan.count` requests, cycling through `rows`, one at a time.
///
/// # Errors
///
/// Returns `NotFound` for an empty row set, `InvalidFeatureRow` if the
/// perturbation cannot be applied, or the first failed request's error.
pub async fn generate(
    api: &dyn SageMakerApi,
    endpoint_name: &str,
    rows: &[FeatureRow],
    plan: &TrafficPlan,
) -> Result<TrafficSummary> {
    if rows.is_empty() && plan.count > 0 {
        return Err(MonitorError::NotFound("rows to send".to_string()));
    }

    let mut summary = TrafficSummary::default();
    info!(
        endpoint = endpoint_name,
        count = plan.count,
        delay_ms = plan.delay.as_millis(),
        perturbation = plan.perturbation.map(|p| p.to_string()),
        "Sending traffic"
    );

    for (i, row) in rows.iter().cycle().take(plan.count).enumerate() {
        let row = match plan.perturbation {
            Some(perturbation) => perturbation.apply(row.clone())?,
            None => row.clone(),
        };

        let label = inference::predict(api, endpoint_name, &row).await?;
        debug!(request = i, label, "Classified");
        if let Ok(slot) = usize::try_from(label) {
            if summary.per_class.len() <= slot {
                summary.per_class.resize(slot + 1, 0);
            }
            summary.per_class[slot] += 1;
        }
        summary.sent += 1;

        if i + 1 < plan.count && !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }
    }

    info!(sent = summary.sent, "Traffic finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: f32) -> FeatureRow {
        FeatureRow::new(vec![value; FEATURE_COUNT]).unwrap()
    }

    #[test]
    fn test_parse_perturbations() {
        assert_eq!(
            "scale:3:2.5".parse::<Perturbation>().unwrap(),
            Perturbation::Scale {
                feature: 3,
                factor: 2.5
            }
        );
        assert_eq!(
            "negate:0".parse::<Perturbation>().unwrap(),
            Perturbation::Negate { feature: 0 }
        );
        assert!("negate:0:1".parse::<Perturbation>().is_err());
        assert!("scale:3".parse::<Perturbation>().is_err());
        assert!("scale:78:2".parse::<Perturbation>().is_err());
        assert!("rotate:1:2".parse::<Perturbation>().is_err());
        assert!("offset:1:nan".parse::<Perturbation>().is_err());
    }

    #[test]
    fn test_apply() {
        let scaled = Perturbation::Scale {
            feature: 1,
            factor: 4.0,
        }
        .apply(row(2.0))
        .unwrap();
        assert_eq!(scaled.values()[1], 8.0);
        assert_eq!(scaled.values()[0], 2.0);

        let negated = Perturbation::Negate { feature: 77 }.apply(row(2.0)).unwrap();
        assert_eq!(negated.values()[77], -2.0);

        let constant = Perturbation::Constant {
            feature: 5,
            value: 0.0,
        }
        .apply(row(2.0))
        .unwrap();
        assert_eq!(constant.values()[5], 0.0);
    }

    #[test]
    fn test_display_round_trips() {
        let perturbation = Perturbation::Offset {
            feature: 10,
            delta: -1.5,
        };
        assert_eq!(
            perturbation.to_string().parse::<Perturbation>().unwrap(),
            perturbation
        );
    }

    #[test]
    fn test_parse_rows_skips_header_and_label() {
        let features = vec!["1"; FEATURE_COUNT].join(",");
        let text = format!("label,{}\n4,{features}\n\n0,{features}\n", "f,".repeat(77) + "f");

        let rows = parse_rows(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_parse_rows_rejects_short_line() {
        let err = parse_rows("header\n1,2,3\n").unwrap_err();
        assert!(matches!(err, MonitorError::InvalidFeatureRow(_)));
    }
}
