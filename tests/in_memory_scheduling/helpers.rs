//! Shared fixtures for scheduler integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use atelier::project::{
    adapters::memory::InMemoryDocumentStore,
    domain::{PipelineTemplate, ProjectState, RoleName},
    ports::{
        DeployError, Deployer, DeploymentRecord, DocumentStore, WorkContext, WorkRequest,
        WorkResult, Worker, WorkerError, WorkerRegistry,
    },
    services::Scheduler,
};
use mockable::{Clock, DefaultClock};
use serde_json::{Value, json};

/// Scheduler type backed by the in-memory store.
pub type TestScheduler = Scheduler<InMemoryDocumentStore, DefaultClock>;

/// Every role of the reference pipeline, in stage order.
pub const REFERENCE_ROLES: [&str; 6] = [
    PipelineTemplate::PRODUCT_MANAGER,
    PipelineTemplate::ARCHITECT,
    PipelineTemplate::BACKEND_DEVELOPER,
    PipelineTemplate::QA_ENGINEER,
    PipelineTemplate::DEVOPS_ENGINEER,
    PipelineTemplate::DOCUMENTATION_WRITER,
];

/// Worker answering every request with a fixed or echoed payload.
pub enum ScriptedWorker {
    /// Replies `{"response": "<task name> finished"}`.
    Echo,
    /// Replies with the given payload.
    Payload(Value),
    /// Reports an error result with the given message.
    Failing(String),
}

#[async_trait]
impl Worker for ScriptedWorker {
    async fn execute(
        &self,
        request: &WorkRequest,
        _context: &WorkContext,
    ) -> Result<WorkResult, WorkerError> {
        Ok(match self {
            Self::Echo => {
                WorkResult::success(json!({"response": format!("{} finished", request.task_name)}))
            }
            Self::Payload(payload) => WorkResult::success(payload.clone()),
            Self::Failing(message) => WorkResult::error(message.clone()),
        })
    }
}

/// Echo worker counting how often it was invoked.
#[derive(Default)]
pub struct CountingWorker {
    calls: AtomicUsize,
}

impl CountingWorker {
    /// Returns how often [`Worker::execute`] ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for CountingWorker {
    async fn execute(
        &self,
        request: &WorkRequest,
        context: &WorkContext,
    ) -> Result<WorkResult, WorkerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        ScriptedWorker::Echo.execute(request, context).await
    }
}

/// Builds a registry sharing one counting worker across every reference
/// role.
pub fn counting_registry(worker: &Arc<CountingWorker>) -> WorkerRegistry {
    REFERENCE_ROLES
        .into_iter()
        .fold(WorkerRegistry::new(), |registry, role| {
            registry.with_worker(
                RoleName::new(role).expect("valid role"),
                Arc::<CountingWorker>::clone(worker),
            )
        })
}

/// Builds a registry with an echo worker for every reference role, then
/// applies `overrides`.
pub fn reference_registry(
    overrides: impl IntoIterator<Item = (&'static str, ScriptedWorker)>,
) -> WorkerRegistry {
    let echoes = REFERENCE_ROLES
        .into_iter()
        .map(|role| (role, ScriptedWorker::Echo));
    echoes
        .chain(overrides)
        .fold(WorkerRegistry::new(), |registry, (role, worker)| {
            registry.with_worker(RoleName::new(role).expect("valid role"), Arc::new(worker))
        })
}

/// Builds a scheduler over `store` planning with the reference template.
pub fn scheduler_over<S: DocumentStore>(
    store: Arc<S>,
    registry: WorkerRegistry,
) -> Scheduler<S, DefaultClock> {
    Scheduler::new(
        store,
        Arc::new(registry),
        Arc::new(DefaultClock),
        PipelineTemplate::reference().expect("reference template"),
    )
}

/// Builds an in-memory scheduler planning with the reference template.
pub fn scheduler(registry: WorkerRegistry) -> TestScheduler {
    scheduler_over(Arc::new(InMemoryDocumentStore::new()), registry)
}

/// Deployer returning a canned outcome and counting its invocations.
pub struct StubDeployer {
    failure: Option<DeployError>,
    calls: AtomicUsize,
}

impl StubDeployer {
    /// Creates a deployer that always succeeds.
    pub const fn succeeding() -> Self {
        Self {
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a deployer that always fails with `error`.
    pub const fn failing(error: DeployError) -> Self {
        Self {
            failure: Some(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns how often [`Deployer::deploy`] ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Deployer for StubDeployer {
    async fn deploy(&self, project: &ProjectState) -> Result<DeploymentRecord, DeployError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(DeploymentRecord {
                environment: "staging".to_owned(),
                provider: "local".to_owned(),
                url: Some(format!("http://localhost/{}", project.id().short())),
                deployed_at: DefaultClock.utc(),
            }),
        }
    }
}
