mod common;

use common::{FakePlatform, TrainingJob};
use model_monitor::MonitorError;
use model_monitor::locator;
use monitor_structs::TrainingJobStatus;

#[tokio::test]
async fn test_latest_completed_wins() {
    let platform = FakePlatform::with_training_jobs(vec![
        TrainingJob::new("traffic-classifier-a", TrainingJobStatus::Completed, 1),
        TrainingJob::new("traffic-classifier-b", TrainingJobStatus::Completed, 3),
        TrainingJob::new("traffic-classifier-c", TrainingJobStatus::Completed, 2),
    ]);

    let job = locator::latest_completed(&platform, "traffic-classifier")
        .await
        .unwrap();

    assert_eq!(job.name, "traffic-classifier-b");
    assert_eq!(
        job.artifact.to_string(),
        "s3://monitor-bucket/training/traffic-classifier-b/output/model.tar.gz"
    );
}

#[tokio::test]
async fn test_unfinished_jobs_are_skipped() {
    let platform = FakePlatform::with_training_jobs(vec![
        TrainingJob::new("traffic-classifier-done", TrainingJobStatus::Completed, 1),
        TrainingJob::new("traffic-classifier-running", TrainingJobStatus::InProgress, 5),
        TrainingJob::new("traffic-classifier-broken", TrainingJobStatus::Failed, 6),
    ]);

    let job = locator::latest_completed(&platform, "traffic-classifier")
        .await
        .unwrap();

    assert_eq!(job.name, "traffic-classifier-done");
    assert_eq!(job.status, TrainingJobStatus::Completed);
}

#[tokio::test]
async fn test_no_completed_job_is_not_found() {
    let platform = FakePlatform::with_training_jobs(vec![TrainingJob::new(
        "traffic-classifier-running",
        TrainingJobStatus::InProgress,
        1,
    )]);

    let result = locator::latest_completed(&platform, "traffic-classifier").await;
    assert!(matches!(result, Err(MonitorError::NotFound(_))));

    let empty = FakePlatform::new();
    let result = locator::latest_completed(&empty, "traffic-classifier").await;
    assert!(matches!(result, Err(MonitorError::NotFound(_))));
    assert_eq!(empty.calls(), vec!["ListTrainingJobs"]);
}
