mod common;

use common::{BUCKET, FakePlatform};
use model_monitor::MonitorError;
use model_monitor::polling::PollPolicy;
use model_monitor::schedule::{ScheduleManager, ScheduleRequest};
use monitor_structs::{
    ExecutionStatus, InstanceSpec, S3Uri, ScheduleExpression, ScheduleLifecycle,
};

const SCHEDULE: &str = "traffic-monitor";

fn request(expression: ScheduleExpression) -> ScheduleRequest {
    ScheduleRequest {
        endpoint_name: "traffic-ep".to_string(),
        statistics: S3Uri::new(BUCKET, "baselining/results/statistics.json"),
        constraints: S3Uri::new(BUCKET, "baselining/results/constraints.json"),
        output: S3Uri::new(BUCKET, "reports"),
        expression,
        image: "analyzer:latest".to_string(),
        instance: InstanceSpec::default(),
        role_arn: "arn:aws:iam::123456789012:role/monitor".to_string(),
        publish_metrics: false,
        record_preprocessor: None,
        post_analytics_processor: None,
        max_runtime_seconds: None,
    }
}

#[tokio::test]
async fn test_describe_before_create_is_none() {
    let platform = FakePlatform::new();
    let schedule = ScheduleManager::new(&platform, SCHEDULE);

    assert!(schedule.describe().await.unwrap().is_none());
    assert_eq!(schedule.lifecycle(), ScheduleLifecycle::Absent);
}

#[tokio::test]
async fn test_create_then_delete() {
    let platform = FakePlatform::new();
    let mut schedule = ScheduleManager::new(&platform, SCHEDULE);

    let arn = schedule
        .create(&request(ScheduleExpression::Hourly))
        .await
        .unwrap();
    assert!(arn.ends_with(SCHEDULE));
    assert_eq!(schedule.lifecycle(), ScheduleLifecycle::Active);

    let described = schedule.describe().await.unwrap().unwrap();
    assert_eq!(described.endpoint_name.as_deref(), Some("traffic-ep"));
    assert_eq!(
        described.schedule_expression.as_deref(),
        Some("cron(0 * ? * * *)")
    );

    schedule.delete().await.unwrap();
    assert_eq!(schedule.lifecycle(), ScheduleLifecycle::Deleted);
    schedule
        .wait_deleted(PollPolicy::immediate(1))
        .await
        .unwrap();

    // A deleted schedule can be created again.
    schedule
        .create(&request(ScheduleExpression::Daily { hour: 6 }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_while_active_is_rejected() {
    let platform = FakePlatform::new();
    let mut schedule = ScheduleManager::new(&platform, SCHEDULE);
    schedule
        .create(&request(ScheduleExpression::Hourly))
        .await
        .unwrap();

    let result = schedule.create(&request(ScheduleExpression::Hourly)).await;
    assert!(matches!(result, Err(MonitorError::InvalidTransition(_))));

    let mut attached = ScheduleManager::attach(&platform, SCHEDULE).await.unwrap();
    assert_eq!(attached.lifecycle(), ScheduleLifecycle::Active);
    let result = attached.create(&request(ScheduleExpression::Hourly)).await;
    assert!(matches!(result, Err(MonitorError::InvalidTransition(_))));
    assert_eq!(
        platform
            .calls()
            .iter()
            .filter(|call| **call == "CreateMonitoringSchedule")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_delete_requires_active_schedule() {
    let platform = FakePlatform::new();
    let mut schedule = ScheduleManager::attach(&platform, SCHEDULE).await.unwrap();

    let result = schedule.delete().await;
    assert!(matches!(result, Err(MonitorError::InvalidTransition(_))));
    assert!(!platform.calls().contains(&"DeleteMonitoringSchedule"));
}

#[tokio::test]
async fn test_bad_expression_makes_no_call() {
    let platform = FakePlatform::new();
    let mut schedule = ScheduleManager::new(&platform, SCHEDULE);

    let result = schedule
        .create(&request(ScheduleExpression::EveryHours {
            interval: 0,
            starting_hour: 0,
        }))
        .await;

    assert!(matches!(result, Err(MonitorError::InvalidSchedule(_))));
    assert_eq!(schedule.lifecycle(), ScheduleLifecycle::Absent);
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_executions_newest_first() {
    let platform = FakePlatform::new();
    platform.add_execution(SCHEDULE, "job-a", ExecutionStatus::Completed, 1);
    platform.add_execution(SCHEDULE, "job-c", ExecutionStatus::Failed, 3);
    platform.add_execution(SCHEDULE, "job-b", ExecutionStatus::CompletedWithViolations, 2);
    platform.add_execution("other-schedule", "job-x", ExecutionStatus::Completed, 4);

    let schedule = ScheduleManager::new(&platform, SCHEDULE);
    let executions = schedule.list_executions().await.unwrap();

    let hours: Vec<_> = executions
        .iter()
        .map(|e| e.scheduled_time.format("%H").to_string())
        .collect();
    assert_eq!(hours, vec!["03", "02", "01"]);
}
