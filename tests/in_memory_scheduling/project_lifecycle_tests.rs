//! Project lifecycle tests: restarts, materialised files and concurrency.

use std::sync::Arc;
use std::time::Duration;

use crate::in_memory_scheduling::helpers::{
    CountingWorker, REFERENCE_ROLES, ScriptedWorker, counting_registry, reference_registry,
    scheduler, scheduler_over,
};
use atelier::artifact::{
    adapters::fs::CapStdFileSink,
    domain::{ArtifactPath, ArtifactType},
    services::{Materializer, project_dir_name},
};
use async_trait::async_trait;
use atelier::config::AtelierConfig;
use atelier::project::{
    adapters::fs::DirectoryDocumentStore,
    domain::{PipelineTemplate, ProjectPhase, RoleName, TaskStatus},
    ports::{WorkContext, WorkRequest, WorkResult, Worker, WorkerError},
};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;

#[fixture]
fn temp_root() -> (TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path");
    (temp, root)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn coordination_resumes_after_restart(temp_root: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = temp_root;
    let state_dir = root.join("state");

    let project_id = {
        let store = DirectoryDocumentStore::open(&state_dir).expect("open store");
        let first = scheduler_over(Arc::new(store), reference_registry([]));
        let id = first
            .create_project("Todo API", "Build a todo service")
            .await
            .expect("create project");
        first.plan_project(id).await.expect("plan project");
        first.execute_ready(id).await.expect("first batch");
        id
    };

    let store = DirectoryDocumentStore::open(&state_dir).expect("reopen store");
    let second = scheduler_over(Arc::new(store), reference_registry([]));
    let before = second
        .project_status(project_id)
        .await
        .expect("status after restart");
    assert_eq!(before.task_summary.completed, 1);
    assert_eq!(before.phase, ProjectPhase::Design);

    let completed = second.coordinate(project_id).await.expect("coordinate");

    assert!(completed);
    let after = second
        .project_status(project_id)
        .await
        .expect("final status");
    assert_eq!(after.phase, ProjectPhase::Completed);
    assert_eq!(after.task_summary.completed, 6);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn generated_files_land_below_the_project_directory(temp_root: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = temp_root;
    let sink = Arc::new(CapStdFileSink::open(&root.join("projects")).expect("open sink"));
    let registry = reference_registry([
        (
            PipelineTemplate::BACKEND_DEVELOPER,
            ScriptedWorker::Payload(json!({
                "response": "Here is the service.\n\n**src/main.py**\n```python\nprint('hi')\n```\n",
            })),
        ),
        (
            PipelineTemplate::QA_ENGINEER,
            ScriptedWorker::Payload(json!({
                "files": {"tests/test_main.py": "def test_main():\n    assert True\n"},
            })),
        ),
    ]);
    let scheduler = scheduler(registry).with_materializer(Arc::new(Materializer::new(sink.clone())));
    let project_id = scheduler
        .create_project("Todo API", "Build a todo service")
        .await
        .expect("create project");
    scheduler.plan_project(project_id).await.expect("plan project");

    assert!(scheduler.coordinate(project_id).await.expect("coordinate"));

    let project_dir = Utf8PathBuf::from(project_dir_name(project_id, "Todo API"));
    assert_eq!(
        sink.read_to_string(&project_dir.join("src/main.py"))
            .expect("main module written"),
        "print('hi')"
    );
    assert!(sink.exists(&project_dir.join("tests/test_main.py")));

    let project = scheduler.project(project_id).await.expect("project");
    let types: Vec<(&str, ArtifactType)> = project
        .artifacts()
        .iter()
        .map(|artifact| (artifact.path().as_str(), artifact.artifact_type()))
        .collect();
    assert_eq!(
        types,
        vec![
            ("src/main.py", ArtifactType::Code),
            ("tests/test_main.py", ArtifactType::Test),
        ]
    );
    let main = project
        .artifacts()
        .get(&ArtifactPath::new("src/main.py").expect("valid path"))
        .expect("main artifact recorded");
    assert_eq!(main.version(), 1);

    scheduler
        .delete_project(project_id)
        .await
        .expect("delete project");
    assert!(!sink.exists(&project_dir));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn projects_coordinate_independently() {
    let scheduler = Arc::new(scheduler(reference_registry([])));
    let mut ids = Vec::new();
    for name in ["Alpha", "Beta"] {
        let id = scheduler
            .create_project(name, "independent work")
            .await
            .expect("create project");
        scheduler.plan_project(id).await.expect("plan project");
        ids.push(id);
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let shared = Arc::clone(&scheduler);
            tokio::spawn(async move { shared.coordinate(id).await })
        })
        .collect();

    for handle in handles {
        let completed = handle
            .await
            .expect("task should not panic")
            .expect("coordinate should succeed");
        assert!(completed);
    }
    for id in ids {
        let status = scheduler.project_status(id).await.expect("status");
        assert_eq!(status.phase, ProjectPhase::Completed);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_coordination_runs_each_task_once() {
    let worker = Arc::new(CountingWorker::default());
    let scheduler = Arc::new(scheduler(counting_registry(&worker)));
    let id = scheduler
        .create_project("Shared", "two callers, one project")
        .await
        .expect("create project");
    scheduler.plan_project(id).await.expect("plan project");

    let first = {
        let shared = Arc::clone(&scheduler);
        tokio::spawn(async move { shared.coordinate(id).await })
    };
    let second = {
        let shared = Arc::clone(&scheduler);
        tokio::spawn(async move { shared.coordinate(id).await })
    };
    let (first, second) = tokio::join!(first, second);

    for outcome in [first, second] {
        let completed = outcome
            .expect("task should not panic")
            .expect("coordinate should succeed");
        assert!(completed);
    }
    assert_eq!(worker.calls(), REFERENCE_ROLES.len());
    let status = scheduler.project_status(id).await.expect("status");
    assert_eq!(status.task_summary.completed, REFERENCE_ROLES.len());
}

struct SleepingWorker;

#[async_trait]
impl Worker for SleepingWorker {
    async fn execute(
        &self,
        _request: &WorkRequest,
        _context: &WorkContext,
    ) -> Result<WorkResult, WorkerError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(WorkResult::success(json!({"response": "too late"})))
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_scheduler_uses_directories_and_timeout(temp_root: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = temp_root;
    let config = AtelierConfig {
        output_dir: root.join("projects"),
        state_dir: root.join("state"),
        task_timeout_secs: 0,
        ..AtelierConfig::default()
    };
    let registry = reference_registry([(
        PipelineTemplate::PRODUCT_MANAGER,
        ScriptedWorker::Payload(json!({"files": {"REQUIREMENTS.md": "# Todo"}})),
    )])
    .with_worker(
        RoleName::new(PipelineTemplate::ARCHITECT).expect("valid role"),
        Arc::new(SleepingWorker),
    );
    let scheduler = config
        .scheduler(
            Arc::new(registry),
            PipelineTemplate::reference().expect("reference template"),
        )
        .expect("scheduler builds");
    let project_id = scheduler
        .create_project("Todo API", "Build a todo service")
        .await
        .expect("create project");
    let tasks = scheduler.plan_project(project_id).await.expect("plan project");

    assert!(!scheduler.coordinate(project_id).await.expect("coordinate"));

    let project_dir = project_dir_name(project_id, "Todo API");
    assert!(
        config
            .output_dir
            .join(&project_dir)
            .join("REQUIREMENTS.md")
            .is_file()
    );
    assert!(
        config
            .state_dir
            .join(format!("{project_id}.json"))
            .is_file()
    );
    let project = scheduler.project(project_id).await.expect("project");
    let design = tasks
        .get(1)
        .and_then(|task| project.task(task.id()))
        .expect("design task planned");
    assert_eq!(design.status(), TaskStatus::Failed);
    assert!(design.error().unwrap_or_default().contains("timed out"));
}
