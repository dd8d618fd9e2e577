//! Project aggregate root.

use super::{
    NewTask, ProjectDomainError, ProjectId, ProjectPhase, ProjectStatus, StatusCounts, Task,
    TaskGraph, TaskId, TaskStatus, progress_percentage,
};
use crate::artifact::domain::ArtifactCatalog;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Shared record of one project: its requirements, task graph and
/// artifacts.
///
/// The serialised form is the project snapshot persisted by the project
/// repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    project_id: ProjectId,
    project_name: String,
    requirements: Map<String, Value>,
    #[serde(default)]
    architecture: Map<String, Value>,
    phase: ProjectPhase,
    tasks: TaskGraph,
    #[serde(default)]
    artifacts: ArtifactCatalog,
    #[serde(default)]
    quality_metrics: Map<String, Value>,
    created_at: DateTime<Utc>,
}

impl ProjectState {
    /// Key under which the raw requirement text is stored.
    pub const RAW_REQUIREMENTS_KEY: &'static str = "raw";

    /// Creates a project in the requirements phase with no tasks.
    #[must_use]
    pub fn new(
        project_name: impl Into<String>,
        raw_requirements: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let mut requirements = Map::new();
        requirements.insert(
            Self::RAW_REQUIREMENTS_KEY.to_owned(),
            Value::String(raw_requirements.into()),
        );
        Self {
            project_id: ProjectId::new(),
            project_name: project_name.into(),
            requirements,
            architecture: Map::new(),
            phase: ProjectPhase::Requirements,
            tasks: TaskGraph::new(),
            artifacts: ArtifactCatalog::new(),
            quality_metrics: Map::new(),
            created_at: clock.utc(),
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.project_name
    }

    /// Returns the structured requirements.
    #[must_use]
    pub const fn requirements(&self) -> &Map<String, Value> {
        &self.requirements
    }

    /// Returns the raw requirement text the project was created with.
    #[must_use]
    pub fn raw_requirements(&self) -> Option<&str> {
        self.requirements
            .get(Self::RAW_REQUIREMENTS_KEY)
            .and_then(Value::as_str)
    }

    /// Returns the architecture notes.
    #[must_use]
    pub const fn architecture(&self) -> &Map<String, Value> {
        &self.architecture
    }

    /// Replaces the architecture notes.
    pub fn set_architecture(&mut self, architecture: Map<String, Value>) {
        self.architecture = architecture;
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> ProjectPhase {
        self.phase
    }

    /// Returns the task graph.
    #[must_use]
    pub const fn tasks(&self) -> &TaskGraph {
        &self.tasks
    }

    /// Returns one task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Returns the artifact catalogue.
    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactCatalog {
        &self.artifacts
    }

    /// Returns the artifact catalogue for upserts.
    pub const fn artifacts_mut(&mut self) -> &mut ArtifactCatalog {
        &mut self.artifacts
    }

    /// Returns the quality metrics.
    #[must_use]
    pub const fn quality_metrics(&self) -> &Map<String, Value> {
        &self.quality_metrics
    }

    /// Merges metrics into the quality metrics, replacing existing keys.
    pub fn update_quality_metrics(&mut self, metrics: Map<String, Value>) {
        self.quality_metrics.extend(metrics);
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Adds one task to the graph.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError`] when the task is invalid, duplicates an
    /// existing identifier or closes a dependency cycle.
    pub fn add_task(
        &mut self,
        spec: NewTask,
        clock: &impl Clock,
    ) -> Result<Task, ProjectDomainError> {
        let task = Task::new(spec, clock)?;
        self.tasks.insert(task.clone())?;
        Ok(task)
    }

    /// Adds several tasks atomically.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; no task is added on error.
    pub fn add_tasks(
        &mut self,
        specs: impl IntoIterator<Item = NewTask>,
        clock: &impl Clock,
    ) -> Result<Vec<Task>, ProjectDomainError> {
        let tasks = specs
            .into_iter()
            .map(|spec| Task::new(spec, clock))
            .collect::<Result<Vec<_>, _>>()?;
        self.tasks.insert_all(tasks.iter().cloned())?;
        Ok(tasks)
    }

    /// Returns pending tasks whose dependencies are all completed.
    #[must_use]
    pub fn ready_tasks(&self) -> Vec<&Task> {
        self.tasks.ready().collect()
    }

    /// Moves a task to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::TaskNotFound`] or
    /// [`ProjectDomainError::InvalidStateTransition`].
    pub fn transition_task(
        &mut self,
        id: TaskId,
        status: TaskStatus,
        clock: &impl Clock,
    ) -> Result<&Task, ProjectDomainError> {
        let task = self.task_mut(id)?;
        task.transition_to(status, clock)?;
        Ok(task)
    }

    /// Completes an in-progress task with the worker payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::TaskNotFound`] or
    /// [`ProjectDomainError::InvalidStateTransition`].
    pub fn complete_task(
        &mut self,
        id: TaskId,
        output: Option<Value>,
        clock: &impl Clock,
    ) -> Result<&Task, ProjectDomainError> {
        let task = self.task_mut(id)?;
        task.complete(output, clock)?;
        Ok(task)
    }

    /// Fails an in-progress task.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::TaskNotFound`] or
    /// [`ProjectDomainError::InvalidStateTransition`].
    pub fn fail_task(
        &mut self,
        id: TaskId,
        error: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<&Task, ProjectDomainError> {
        let task = self.task_mut(id)?;
        task.fail(error, clock)?;
        Ok(task)
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, ProjectDomainError> {
        self.tasks
            .get_mut(id)
            .ok_or(ProjectDomainError::TaskNotFound(id))
    }

    /// Outputs of the completed dependencies of `task`, keyed by task name.
    #[must_use]
    pub fn dependency_outputs(&self, task: &Task) -> BTreeMap<String, Value> {
        task.dependencies()
            .iter()
            .filter_map(|dependency| self.tasks.get(*dependency))
            .filter(|dependency| dependency.status() == TaskStatus::Completed)
            .filter_map(|dependency| {
                dependency
                    .output()
                    .map(|output| (dependency.name().to_owned(), output.clone()))
            })
            .collect()
    }

    /// Marks every pending task downstream of a failure as blocked.
    ///
    /// Returns the identifiers of the tasks that changed.
    pub fn block_unreachable(&mut self, clock: &impl Clock) -> Vec<TaskId> {
        let mut blocked = Vec::new();
        loop {
            let doomed = self.tasks.doomed();
            if doomed.is_empty() {
                return blocked;
            }
            for id in doomed {
                if let Some(task) = self.tasks.get_mut(id)
                    && task.transition_to(TaskStatus::Blocked, clock).is_ok()
                {
                    blocked.push(id);
                }
            }
        }
    }

    /// Returns `true` when every task is completed or failed.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.tasks.iter().all(|task| task.status().is_terminal())
    }

    /// Advances the phase to the earliest phase that still has unsettled
    /// work. The phase never moves backwards and never reaches
    /// [`ProjectPhase::Completed`] through this method.
    pub fn refresh_phase(&mut self) {
        let earliest_open = self
            .tasks
            .iter()
            .filter(|task| !task.status().is_terminal())
            .map(Task::phase)
            .min();
        if let Some(open) = earliest_open {
            self.phase = self.phase.max(open.min(ProjectPhase::Deployment));
        }
    }

    /// Marks the project completed when every task has settled.
    ///
    /// Returns `true` when the project is (now) completed.
    pub fn finish(&mut self) -> bool {
        if self.tasks.is_empty() || !self.is_settled() {
            return false;
        }
        self.phase = ProjectPhase::Completed;
        true
    }

    /// Summarises task progress.
    #[must_use]
    pub fn status(&self) -> ProjectStatus {
        let counts = StatusCounts::tally(&self.tasks);
        ProjectStatus {
            project_id: self.project_id,
            project_name: self.project_name.clone(),
            phase: self.phase,
            task_summary: counts,
            total_tasks: counts.total(),
            progress_percentage: progress_percentage(&counts),
        }
    }
}
