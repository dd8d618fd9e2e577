//! End-to-end development runs over the reference pipeline.

use std::sync::Arc;

use crate::in_memory_scheduling::helpers::{
    ScriptedWorker, StubDeployer, reference_registry, scheduler,
};
use atelier::project::{
    domain::{PipelineTemplate, ProjectPhase, TaskStatus},
    ports::DeployError,
    services::{DeploymentOutcome, DevelopmentPipeline},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_project_is_deployed() {
    let deployer = Arc::new(StubDeployer::succeeding());
    let pipeline = DevelopmentPipeline::new(
        Arc::new(scheduler(reference_registry([]))),
        deployer.clone(),
    );

    let report = pipeline
        .develop("Todo API", "Build a REST API for todo items")
        .await
        .expect("development run should succeed");

    assert!(report.completed);
    assert_eq!(report.status.phase, ProjectPhase::Completed);
    assert_eq!(report.status.task_summary.completed, 6);
    assert!(report.status.progress_percentage >= 100.0);
    assert!(
        matches!(&report.deployment, DeploymentOutcome::Deployed(record) if record.environment == "staging"),
        "unexpected deployment outcome: {:?}",
        report.deployment
    );
    assert_eq!(deployer.calls(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stalled_project_skips_deployment() {
    let deployer = Arc::new(StubDeployer::succeeding());
    let pipeline = DevelopmentPipeline::new(
        Arc::new(scheduler(reference_registry([(
            PipelineTemplate::QA_ENGINEER,
            ScriptedWorker::Failing("test run crashed".to_owned()),
        )]))),
        deployer.clone(),
    );

    let report = pipeline
        .develop("Todo API", "Build a REST API for todo items")
        .await
        .expect("development run should succeed");

    assert!(!report.completed);
    assert_eq!(report.deployment, DeploymentOutcome::Skipped);
    assert_eq!(deployer.calls(), 0);
    assert_eq!(report.status.task_summary.completed, 3);
    assert_eq!(report.status.task_summary.failed, 1);
    assert_eq!(report.status.task_summary.blocked, 2);
    assert_eq!(report.status.phase, ProjectPhase::Deployment);

    let project = pipeline
        .scheduler()
        .project(report.project_id)
        .await
        .expect("project should exist");
    let failed: Vec<(&str, Option<&str>)> = project
        .tasks()
        .iter()
        .filter(|task| task.status() == TaskStatus::Failed)
        .map(|task| (task.name(), task.error()))
        .collect();
    assert_eq!(failed, vec![("Write Tests", Some("test run crashed"))]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deployment_failure_is_reported_not_raised() {
    let deployer = Arc::new(StubDeployer::failing(DeployError::Provider(
        "quota exceeded".to_owned(),
    )));
    let pipeline = DevelopmentPipeline::new(
        Arc::new(scheduler(reference_registry([]))),
        deployer.clone(),
    );

    let report = pipeline
        .develop("Todo API", "Build a REST API for todo items")
        .await
        .expect("development run should succeed");

    assert!(report.completed);
    assert_eq!(
        report.deployment,
        DeploymentOutcome::Failed(DeployError::Provider("quota exceeded".to_owned()))
    );
    assert_eq!(deployer.calls(), 1);
}
