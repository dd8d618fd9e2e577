//! Dependency-graph scheduler driving projects through their task graph.

use crate::artifact::{
    ports::FileSinkError,
    services::{ArtifactExtractor, MaterializationReport, Materializer},
};
use crate::project::{
    domain::{
        NewTask, PipelineTemplate, ProjectDomainError, ProjectId, ProjectState, ProjectStatus,
        RoleName, Task, TaskId, TaskStatus,
    },
    ports::{DocumentStore, WorkContext, WorkRequest, Worker, WorkerRegistry},
    services::repository::{ProjectRepository, ProjectStoreError},
};
use mockable::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by scheduler operations.
///
/// Worker failures are not errors: they are recorded on the task.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    /// No project exists with the given identifier.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The task graph rejected the operation.
    #[error(transparent)]
    Domain(#[from] ProjectDomainError),

    /// Saving or loading the project snapshot failed.
    #[error(transparent)]
    Store(#[from] ProjectStoreError),

    /// Writing or removing materialised files failed.
    #[error(transparent)]
    Sink(#[from] FileSinkError),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Record of one task dispatched by [`Scheduler::execute_ready`].
#[derive(Debug, Clone)]
pub struct TaskExecution {
    /// Task that ran.
    pub task_id: TaskId,
    /// Name of the task.
    pub task_name: String,
    /// Role the task was dispatched to.
    pub role: RoleName,
    /// Status the task ended in.
    pub status: TaskStatus,
    /// Failure reason for failed tasks.
    pub error: Option<String>,
    /// Files materialised from the task output, when a materializer is
    /// configured and the output named any files.
    pub materialization: Option<MaterializationReport>,
}

impl TaskExecution {
    /// Returns `true` when the task completed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

#[derive(Debug, Clone)]
struct ArtifactStage {
    extractor: ArtifactExtractor,
    materializer: Arc<Materializer>,
}

type ProjectLocks = Mutex<HashMap<ProjectId, Arc<tokio::sync::Mutex<()>>>>;

/// Computes ready tasks, dispatches them to workers and advances projects.
///
/// Tasks run one at a time. Operations that modify a project are serialised
/// per project; different projects proceed independently.
pub struct Scheduler<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    repository: ProjectRepository<S>,
    workers: Arc<WorkerRegistry>,
    clock: Arc<C>,
    template: PipelineTemplate,
    task_timeout: Duration,
    artifacts: Option<ArtifactStage>,
    locks: ProjectLocks,
}

impl<S, C> Scheduler<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    /// Worker time limit used unless [`Scheduler::with_task_timeout`] is
    /// called.
    pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

    /// Creates a scheduler planning projects from `template`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        workers: Arc<WorkerRegistry>,
        clock: Arc<C>,
        template: PipelineTemplate,
    ) -> Self {
        Self {
            repository: ProjectRepository::new(store),
            workers,
            clock,
            template,
            task_timeout: Self::DEFAULT_TASK_TIMEOUT,
            artifacts: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Bounds every worker invocation by `timeout`.
    #[must_use]
    pub const fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Materialises the files named in successful task outputs.
    #[must_use]
    pub fn with_materializer(mut self, materializer: Arc<Materializer>) -> Self {
        self.artifacts = Some(ArtifactStage {
            extractor: ArtifactExtractor::new(),
            materializer,
        });
        self
    }

    /// Returns the template used by [`Scheduler::plan_project`].
    #[must_use]
    pub const fn template(&self) -> &PipelineTemplate {
        &self.template
    }

    /// Creates and saves an empty project in the requirements phase.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] when the snapshot cannot be saved.
    pub async fn create_project(
        &self,
        name: impl Into<String>,
        raw_requirements: impl Into<String>,
    ) -> SchedulerResult<ProjectId> {
        let project = ProjectState::new(name, raw_requirements, &*self.clock);
        self.repository.save(&project).await?;
        tracing::info!(
            project_id = %project.id(),
            project_name = project.name(),
            "created project"
        );
        Ok(project.id())
    }

    /// Adds one linear task chain built from the pipeline template.
    ///
    /// Planning an already planned project appends a second chain.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when the project is unknown, the tasks
    /// are rejected or the snapshot cannot be saved.
    pub async fn plan_project(&self, project_id: ProjectId) -> SchedulerResult<Vec<Task>> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock_owned().await;
        let mut project = self.require(project_id).await?;

        let tasks = project.add_tasks(self.template.instantiate(), &*self.clock)?;
        project.refresh_phase();
        self.repository.save(&project).await?;
        tracing::info!(
            project_id = %project_id,
            tasks = tasks.len(),
            "planned project"
        );
        Ok(tasks)
    }

    /// Inserts one task into a project.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Domain`] for duplicate identifiers,
    /// self-dependencies and dependency cycles.
    pub async fn add_task(&self, project_id: ProjectId, task: NewTask) -> SchedulerResult<Task> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock_owned().await;
        let mut project = self.require(project_id).await?;

        let added = project.add_task(task, &*self.clock)?;
        self.repository.save(&project).await?;
        tracing::debug!(
            project_id = %project_id,
            task_id = %added.id(),
            task_name = added.name(),
            "added task"
        );
        Ok(added)
    }

    /// Moves one task to `status`, subject to the task state machine.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Domain`] for unknown tasks and transitions
    /// the state machine forbids.
    pub async fn update_task_status(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        status: TaskStatus,
    ) -> SchedulerResult<Task> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock_owned().await;
        let mut project = self.require(project_id).await?;

        let updated = project
            .transition_task(task_id, status, &*self.clock)?
            .clone();
        self.repository.save(&project).await?;
        Ok(updated)
    }

    /// Returns pending tasks whose dependencies are all completed, in
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ProjectNotFound`] for unknown projects.
    pub async fn ready_tasks(&self, project_id: ProjectId) -> SchedulerResult<Vec<Task>> {
        let project = self.require(project_id).await?;
        Ok(project.ready_tasks().into_iter().cloned().collect())
    }

    /// Runs every currently ready task once.
    ///
    /// A task whose role has no worker, whose worker reports an error or
    /// whose worker times out is marked failed; the batch carries on.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when the project is unknown or a snapshot
    /// cannot be saved.
    pub async fn execute_ready(
        &self,
        project_id: ProjectId,
    ) -> SchedulerResult<Vec<TaskExecution>> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock_owned().await;
        let mut project = self.require(project_id).await?;
        self.run_batch(&mut project).await
    }

    /// Runs batches until no task is ready.
    ///
    /// Returns `true` and marks the project completed when every task ended
    /// completed or failed. Otherwise the pending tasks downstream of a
    /// failure are marked blocked and `false` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when the project is unknown or a snapshot
    /// cannot be saved.
    pub async fn coordinate(&self, project_id: ProjectId) -> SchedulerResult<bool> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock_owned().await;
        let mut project = self.require(project_id).await?;

        let mut batches = 0_usize;
        while !project.ready_tasks().is_empty() {
            self.run_batch(&mut project).await?;
            batches += 1;
        }

        if project.finish() {
            self.repository.save(&project).await?;
            tracing::info!(project_id = %project_id, batches, "project completed");
            return Ok(true);
        }

        let blocked = project.block_unreachable(&*self.clock);
        self.repository.save(&project).await?;
        tracing::warn!(
            project_id = %project_id,
            batches,
            blocked = blocked.len(),
            "project stalled"
        );
        Ok(false)
    }

    /// Summarises task progress for a project.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ProjectNotFound`] for unknown projects.
    pub async fn project_status(&self, project_id: ProjectId) -> SchedulerResult<ProjectStatus> {
        Ok(self.require(project_id).await?.status())
    }

    /// Loads the current snapshot of a project.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ProjectNotFound`] for unknown projects.
    pub async fn project(&self, project_id: ProjectId) -> SchedulerResult<ProjectState> {
        self.require(project_id).await
    }

    /// Deletes a project together with its materialised files.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when the project is unknown or either
    /// removal fails.
    pub async fn delete_project(&self, project_id: ProjectId) -> SchedulerResult<()> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock_owned().await;
        let project = self.require(project_id).await?;

        if let Some(stage) = &self.artifacts {
            let removed = stage
                .materializer
                .remove_project_dir(project_id, project.name())
                .await?;
            tracing::debug!(project_id = %project_id, removed, "removed project files");
        }
        self.repository.delete(project_id).await?;
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&project_id);
        tracing::info!(project_id = %project_id, "deleted project");
        Ok(())
    }

    fn project_lock(&self, project_id: ProjectId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(project_id).or_default())
    }

    async fn require(&self, project_id: ProjectId) -> SchedulerResult<ProjectState> {
        self.repository
            .load(project_id)
            .await?
            .ok_or(SchedulerError::ProjectNotFound(project_id))
    }

    async fn run_batch(&self, project: &mut ProjectState) -> SchedulerResult<Vec<TaskExecution>> {
        let ready: Vec<TaskId> = project.ready_tasks().iter().map(|task| task.id()).collect();
        let mut executions = Vec::with_capacity(ready.len());

        for task_id in ready {
            let task = project
                .transition_task(task_id, TaskStatus::InProgress, &*self.clock)?
                .clone();
            self.repository.save(project).await?;

            let outcome = match self.workers.get(task.role()) {
                Some(worker) => self.dispatch(worker.as_ref(), project, &task).await,
                None => Err(format!("no worker registered for role {}", task.role())),
            };

            let execution = match outcome {
                Ok(payload) => self.record_success(project, &task, payload).await?,
                Err(reason) => {
                    tracing::warn!(
                        project_id = %project.id(),
                        task_id = %task_id,
                        task_name = task.name(),
                        error = %reason,
                        "task failed"
                    );
                    project.fail_task(task_id, reason.clone(), &*self.clock)?;
                    TaskExecution {
                        task_id,
                        task_name: task.name().to_owned(),
                        role: task.role().clone(),
                        status: TaskStatus::Failed,
                        error: Some(reason),
                        materialization: None,
                    }
                }
            };
            self.repository.save(project).await?;
            executions.push(execution);
        }

        project.refresh_phase();
        self.repository.save(project).await?;
        Ok(executions)
    }

    async fn dispatch(
        &self,
        worker: &dyn Worker,
        project: &ProjectState,
        task: &Task,
    ) -> Result<Option<Value>, String> {
        let request = WorkRequest {
            task_id: task.id(),
            task_name: task.name().to_owned(),
            description: task.description().to_owned(),
            role: task.role().clone(),
        };
        let context = WorkContext {
            project_name: project.name().to_owned(),
            requirements: project.requirements().clone(),
            architecture: project.architecture().clone(),
            dependency_outputs: project.dependency_outputs(task),
        };
        tracing::debug!(
            project_id = %project.id(),
            task_id = %task.id(),
            role = %task.role(),
            "dispatching task"
        );

        match tokio::time::timeout(self.task_timeout, worker.execute(&request, &context)).await {
            Err(_elapsed) => Err(format!(
                "worker timed out after {}ms",
                self.task_timeout.as_millis()
            )),
            Ok(Err(err)) => Err(err.to_string()),
            Ok(Ok(result)) if result.is_success() => Ok(result.payload),
            Ok(Ok(result)) => Err(result
                .error
                .unwrap_or_else(|| "worker reported an error".to_owned())),
        }
    }

    async fn record_success(
        &self,
        project: &mut ProjectState,
        task: &Task,
        payload: Option<Value>,
    ) -> SchedulerResult<TaskExecution> {
        let files = match (&self.artifacts, &payload) {
            (Some(stage), Some(output)) => Some(stage.extractor.parse_worker_output(output))
                .filter(|files| !files.is_empty())
                .map(|files| (stage, files)),
            _ => None,
        };
        let materialization = match files {
            Some((stage, extracted)) => Some(
                stage
                    .materializer
                    .materialize_project(project, extracted, &*self.clock)
                    .await?,
            ),
            None => None,
        };

        project.complete_task(task.id(), payload, &*self.clock)?;
        tracing::info!(
            project_id = %project.id(),
            task_id = %task.id(),
            task_name = task.name(),
            "task completed"
        );
        Ok(TaskExecution {
            task_id: task.id(),
            task_name: task.name().to_owned(),
            role: task.role().clone(),
            status: TaskStatus::Completed,
            error: None,
            materialization,
        })
    }
}

impl<S, C> std::fmt::Debug for Scheduler<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("workers", &self.workers)
            .field("template", &self.template)
            .field("task_timeout", &self.task_timeout)
            .finish_non_exhaustive()
    }
}
