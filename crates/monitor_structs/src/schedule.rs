//! Monitoring schedules, their executions and schedule expressions.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schedule status as reported by the platform.
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
pub enum ScheduleStatus {
    Pending,
    Failed,
    Scheduled,
    Stopped,
}

/// Local view of a schedule's lifecycle.
///
/// `create` moves `Absent`/`Deleted` to `Active` and `delete` moves `Active`
/// to `Deleted`. There is no in-place edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum ScheduleLifecycle {
    Absent,
    Active,
    Deleted,
}

/// Status of one monitoring execution.
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
pub enum ExecutionStatus {
    Pending,
    Completed,
    CompletedWithViolations,
    InProgress,
    Failed,
    Stopping,
    Stopped,
}

impl ExecutionStatus {
    /// True when the execution wrote report artifacts.
    #[must_use]
    pub const fn has_report(self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithViolations)
    }
}

/// One run of a monitoring schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringExecution {
    pub schedule_name: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub processing_job_arn: Option<String>,
    pub failure_reason: Option<String>,
}

/// A schedule as described by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSchedule {
    pub name: String,
    pub arn: String,
    pub status: ScheduleStatus,
    pub endpoint_name: Option<String>,
    pub schedule_expression: Option<String>,
    pub creation_time: DateTime<Utc>,
    pub last_execution: Option<MonitoringExecution>,
    pub failure_reason: Option<String>,
}

/// Errors produced by schedule expressions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("hour must be within 0..=23, got {0}")]
    InvalidHour(u8),

    #[error("hour interval must be within 1..=23, got {0}")]
    InvalidInterval(u8),

    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron { expression: String, reason: String },
}

/// When a monitoring schedule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleExpression {
    /// At the top of every hour
    Hourly,

    /// Once a day at `hour` UTC
    Daily { hour: u8 },

    /// Every `interval` hours starting at `starting_hour` UTC
    EveryHours { interval: u8, starting_hour: u8 },

    /// A raw `cron(...)` expression
    Custom(String),
}

impl ScheduleExpression {
    /// Renders the platform cron expression.
    ///
    /// # Errors
    ///
    /// Returns an error if an hour or interval is out of range, or if a custom
    /// expression is not a six-field `cron(...)` with `?` in one day field.
    pub fn to_cron(&self) -> Result<String, ScheduleError> {
        match self {
            Self::Hourly => Ok("cron(0 * ? * * *)".to_string()),
            Self::Daily { hour } => {
                check_hour(*hour)?;
                Ok(format!("cron(0 {hour} ? * * *)"))
            }
            Self::EveryHours {
                interval,
                starting_hour,
            } => {
                if !(1..=23).contains(interval) {
                    return Err(ScheduleError::InvalidInterval(*interval));
                }
                check_hour(*starting_hour)?;
                Ok(format!("cron(0 {starting_hour}/{interval} ? * * *)"))
            }
            Self::Custom(expression) => {
                validate_cron(expression)?;
                Ok(expression.trim().to_string())
            }
        }
    }
}

const fn check_hour(hour: u8) -> Result<(), ScheduleError> {
    if hour > 23 {
        return Err(ScheduleError::InvalidHour(hour));
    }
    Ok(())
}

fn validate_cron(expression: &str) -> Result<(), ScheduleError> {
    let invalid = |reason: &str| ScheduleError::InvalidCron {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    let inner = expression
        .trim()
        .strip_prefix("cron(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| invalid("must be written as cron(...)"))?;

    let fields: Vec<&str> = inner.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(invalid("expected 6 fields"));
    }

    // Day-of-month and day-of-week cannot both be set.
    if fields[2] != "?" && fields[4] != "?" {
        return Err(invalid("one of day-of-month or day-of-week must be '?'"));
    }

    Ok(())
}

impl fmt::Display for ScheduleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hourly => f.write_str("hourly"),
            Self::Daily { hour } => write!(f, "daily:{hour}"),
            Self::EveryHours {
                interval,
                starting_hour,
            } => write!(f, "every:{interval}@{starting_hour}"),
            Self::Custom(expression) => f.write_str(expression),
        }
    }
}

impl FromStr for ScheduleExpression {
    type Err = ScheduleError;

    /// Parses `hourly`, `daily:H`, `every:N`, `every:N@S` or `cron(...)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ScheduleError::InvalidCron {
            expression: s.to_string(),
            reason: "expected hourly, daily:H, every:N[@S] or cron(...)".to_string(),
        };
        let number = |raw: &str| raw.parse::<u8>().map_err(|_| invalid());

        let expression = if s.eq_ignore_ascii_case("hourly") {
            Self::Hourly
        } else if let Some(hour) = s.strip_prefix("daily:") {
            Self::Daily { hour: number(hour)? }
        } else if let Some(rest) = s.strip_prefix("every:") {
            let (interval, starting_hour) = rest.split_once('@').unwrap_or((rest, "0"));
            Self::EveryHours {
                interval: number(interval)?,
                starting_hour: number(starting_hour)?,
            }
        } else if s.starts_with("cron(") {
            Self::Custom(s.to_string())
        } else {
            return Err(invalid());
        };

        expression.to_cron()?;
        Ok(expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly() {
        assert_eq!(
            ScheduleExpression::Hourly.to_cron().unwrap(),
            "cron(0 * ? * * *)"
        );
    }

    #[test]
    fn test_daily() {
        assert_eq!(
            ScheduleExpression::Daily { hour: 6 }.to_cron().unwrap(),
            "cron(0 6 ? * * *)"
        );
        assert_eq!(
            ScheduleExpression::Daily { hour: 24 }.to_cron(),
            Err(ScheduleError::InvalidHour(24))
        );
    }

    #[test]
    fn test_every_hours() {
        let expression = ScheduleExpression::EveryHours {
            interval: 6,
            starting_hour: 2,
        };
        assert_eq!(expression.to_cron().unwrap(), "cron(0 2/6 ? * * *)");

        let zero = ScheduleExpression::EveryHours {
            interval: 0,
            starting_hour: 0,
        };
        assert_eq!(zero.to_cron(), Err(ScheduleError::InvalidInterval(0)));
    }

    #[test]
    fn test_custom_cron_validation() {
        assert!(
            ScheduleExpression::Custom("cron(0 12 ? * MON-FRI *)".into())
                .to_cron()
                .is_ok()
        );
        assert!(
            ScheduleExpression::Custom("0 * * * *".into())
                .to_cron()
                .is_err()
        );
        assert!(
            ScheduleExpression::Custom("cron(0 * * * *)".into())
                .to_cron()
                .is_err()
        );
        assert!(
            ScheduleExpression::Custom("cron(0 12 1 * MON *)".into())
                .to_cron()
                .is_err()
        );
    }

    #[test]
    fn test_parse_expressions() {
        assert_eq!(
            "hourly".parse::<ScheduleExpression>().unwrap(),
            ScheduleExpression::Hourly
        );
        assert_eq!(
            "daily:3".parse::<ScheduleExpression>().unwrap(),
            ScheduleExpression::Daily { hour: 3 }
        );
        assert_eq!(
            "every:4@1".parse::<ScheduleExpression>().unwrap(),
            ScheduleExpression::EveryHours {
                interval: 4,
                starting_hour: 1
            }
        );
        assert_eq!(
            "every:12".parse::<ScheduleExpression>().unwrap(),
            ScheduleExpression::EveryHours {
                interval: 12,
                starting_hour: 0
            }
        );
        assert!("weekly".parse::<ScheduleExpression>().is_err());
        assert!("daily:30".parse::<ScheduleExpression>().is_err());
    }

    #[test]
    fn test_execution_status() {
        assert!(ExecutionStatus::CompletedWithViolations.has_report());
        assert!(!ExecutionStatus::Failed.has_report());
    }
}
