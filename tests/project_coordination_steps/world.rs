//! Shared world state for project coordination BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atelier::artifact::{adapters::memory::InMemoryFileSink, services::Materializer};
use atelier::project::{
    adapters::memory::InMemoryDocumentStore,
    domain::{PipelineTemplate, ProjectId, RoleName, TaskId},
    ports::{WorkContext, WorkRequest, WorkResult, Worker, WorkerError, WorkerRegistry},
    services::Scheduler,
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};

/// Scheduler type used by the BDD world.
pub type TestScheduler = Scheduler<InMemoryDocumentStore, DefaultClock>;

/// Worker replying with a fixed payload, or echoing the task name.
pub struct CannedWorker {
    payload: Option<Value>,
}

impl CannedWorker {
    /// Creates a worker echoing the task name.
    pub const fn echo() -> Self {
        Self { payload: None }
    }

    /// Creates a worker replying with `payload`.
    pub const fn replying(payload: Value) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}

#[async_trait]
impl Worker for CannedWorker {
    async fn execute(
        &self,
        request: &WorkRequest,
        _context: &WorkContext,
    ) -> Result<WorkResult, WorkerError> {
        let payload = self
            .payload
            .clone()
            .unwrap_or_else(|| json!({"response": format!("{} done", request.task_name)}));
        Ok(WorkResult::success(payload))
    }
}

/// Scenario world for project coordination behaviour tests.
pub struct ProjectWorld {
    pub registry: WorkerRegistry,
    pub sink: Arc<InMemoryFileSink>,
    pub scheduler: Option<TestScheduler>,
    pub project_id: Option<ProjectId>,
    pub project_name: String,
    pub task_ids: HashMap<String, TaskId>,
    pub last_coordination: Option<bool>,
}

impl ProjectWorld {
    /// Creates a world with no workers and no project.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: WorkerRegistry::new(),
            sink: Arc::new(InMemoryFileSink::new()),
            scheduler: None,
            project_id: None,
            project_name: "Scenario Project".to_owned(),
            task_ids: HashMap::new(),
            last_coordination: None,
        }
    }

    /// Registers `worker` for the role named `role`.
    pub fn register(&mut self, role: &str, worker: CannedWorker) -> Result<(), eyre::Report> {
        let role_name = RoleName::new(role)?;
        self.registry.register(role_name, Arc::new(worker));
        Ok(())
    }

    /// Builds the scheduler from the workers registered so far.
    pub fn start_scheduler(&mut self) -> &TestScheduler {
        let materializer = Arc::new(Materializer::new(self.sink.clone()));
        self.scheduler.insert(
            Scheduler::new(
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(self.registry.clone()),
                Arc::new(DefaultClock),
                PipelineTemplate::new(Vec::new()),
            )
            .with_materializer(materializer),
        )
    }

    /// Returns the running scheduler and project.
    pub fn active(&self) -> Result<(&TestScheduler, ProjectId), eyre::Report> {
        let scheduler = self
            .scheduler
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing scheduler in scenario world"))?;
        let project_id = self
            .project_id
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))?;
        Ok((scheduler, project_id))
    }

    /// Looks up a task created by a given step.
    pub fn task_id(&self, name: &str) -> Result<TaskId, eyre::Report> {
        self.task_ids
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown task {name} in scenario world"))
    }
}

impl Default for ProjectWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ProjectWorld {
    ProjectWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
