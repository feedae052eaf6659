//! Feature rows sent to the traffic classifier.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Number of flow features the classifier expects per request.
pub const FEATURE_COUNT: usize = 78;

/// Content type used for inference requests and captured inputs.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Errors produced when building or parsing a feature row.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeatureRowError {
    #[error("expected {expected} features, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("feature {index} is not a number: {value:?}")]
    NotANumber { index: usize, value: String },

    #[error("feature {index} is not finite")]
    NonFinite { index: usize },

    #[error("feature index {index} is out of range")]
    IndexOutOfRange { index: usize },
}

/// One network flow described by exactly [`FEATURE_COUNT`] finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<f32>,
}

impl FeatureRow {
    /// Creates a row, checking length and finiteness.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not have [`FEATURE_COUNT`] values or
    /// contains NaN/infinite values.
    pub fn new(values: Vec<f32>) -> Result<Self, FeatureRowError> {
        if values.len() != FEATURE_COUNT {
            return Err(FeatureRowError::WrongLength {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(FeatureRowError::NonFinite { index });
        }

        Ok(Self { values })
    }

    /// Returns the feature values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns the row with one feature replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the value is not finite.
    pub fn with_feature(mut self, index: usize, value: f32) -> Result<Self, FeatureRowError> {
        if !value.is_finite() {
            return Err(FeatureRowError::NonFinite { index });
        }

        let slot = self
            .values
            .get_mut(index)
            .ok_or(FeatureRowError::IndexOutOfRange { index })?;
        *slot = value;

        Ok(self)
    }

    /// Serializes the row as a single comma-separated line.
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FeatureRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromStr for FeatureRow {
    type Err = FeatureRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .trim()
            .split(',')
            .enumerate()
            .map(|(index, raw)| {
                let raw = raw.trim();
                raw.parse::<f32>().map_err(|_| FeatureRowError::NotANumber {
                    index,
                    value: raw.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_line() -> String {
        (0..FEATURE_COUNT)
            .map(|i| format!("{}.5", i))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_parse_row() {
        let row: FeatureRow = sample_line().parse().unwrap();
        assert_eq!(row.values().len(), FEATURE_COUNT);
        assert!((row.values()[3] - 3.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_csv_line_is_single_line() {
        let row: FeatureRow = sample_line().parse().unwrap();
        let line = row.to_csv_line();
        assert!(!line.contains('\n'));
        assert_eq!(line.split(',').count(), FEATURE_COUNT);
        assert_eq!(line.parse::<FeatureRow>().unwrap(), row);
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            "1,2,3".parse::<FeatureRow>(),
            Err(FeatureRowError::WrongLength {
                expected: FEATURE_COUNT,
                actual: 3
            })
        );
    }

    #[test]
    fn test_not_a_number() {
        let mut line = sample_line();
        line.push_str(",abc");
        let mut parts: Vec<&str> = line.split(',').collect();
        parts.remove(0);
        let err = parts.join(",").parse::<FeatureRow>().unwrap_err();
        assert!(matches!(err, FeatureRowError::NotANumber { index: 77, .. }));
    }

    #[test]
    fn test_rejects_nan() {
        let mut values = vec![0.0; FEATURE_COUNT];
        values[10] = f32::NAN;
        assert_eq!(
            FeatureRow::new(values),
            Err(FeatureRowError::NonFinite { index: 10 })
        );
    }

    #[test]
    fn test_with_feature() {
        let row = FeatureRow::new(vec![1.0; FEATURE_COUNT]).unwrap();
        let row = row.with_feature(5, -2.0).unwrap();
        assert!((row.values()[5] + 2.0).abs() < f32::EPSILON);
        assert!(row.clone().with_feature(FEATURE_COUNT, 1.0).is_err());
    }
}
