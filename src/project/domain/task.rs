//! Task entity and task lifecycle types.

use super::{ParseStatusError, ProjectDomainError, ProjectPhase, RoleName, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting for its dependencies or for dispatch.
    Pending,
    /// Task has been handed to a worker.
    InProgress,
    /// Task can never become ready because a dependency failed.
    Blocked,
    /// Task awaits a human gate. Never assigned automatically.
    InReview,
    /// Task finished successfully.
    Completed,
    /// Task finished unsuccessfully.
    Failed,
}

impl TaskStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::InProgress,
        Self::Blocked,
        Self::InReview,
        Self::Completed,
        Self::Failed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::InReview => "in_review",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` when no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns `true` when the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::InProgress | Self::Blocked)
                | (Self::InProgress, Self::Completed | Self::Failed | Self::InReview)
                | (Self::InReview, Self::InProgress | Self::Completed | Self::Failed)
                | (Self::Blocked, Self::Pending)
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "in_review" => Ok(Self::InReview),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter object describing a task to insert into a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    id: TaskId,
    name: String,
    description: String,
    role: RoleName,
    phase: ProjectPhase,
    dependencies: BTreeSet<TaskId>,
}

impl NewTask {
    /// Creates a task description with a fresh identifier and no
    /// dependencies.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        role: RoleName,
        phase: ProjectPhase,
    ) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            description: description.into(),
            role,
            phase,
            dependencies: BTreeSet::new(),
        }
    }

    /// Uses a caller-chosen identifier.
    #[must_use]
    pub const fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Sets the tasks this task depends on.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Returns the identifier the task will be created with.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }
}

/// A unit of work owned by exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    description: String,
    #[serde(rename = "assigned_to")]
    role: RoleName,
    phase: ProjectPhase,
    status: TaskStatus,
    dependencies: BTreeSet<TaskId>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    output: Option<Value>,
    error: Option<String>,
}

impl Task {
    /// Creates a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyTaskName`] when the name is blank
    /// and [`ProjectDomainError::SelfDependency`] when the task lists its own
    /// identifier as a dependency.
    pub fn new(spec: NewTask, clock: &impl Clock) -> Result<Self, ProjectDomainError> {
        let NewTask {
            id,
            name,
            description,
            role,
            phase,
            dependencies,
        } = spec;

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyTaskName);
        }
        if dependencies.contains(&id) {
            return Err(ProjectDomainError::SelfDependency(id));
        }

        Ok(Self {
            id,
            name: trimmed.to_owned(),
            description,
            role,
            phase,
            status: TaskStatus::Pending,
            dependencies,
            created_at: clock.utc(),
            completed_at: None,
            output: None,
            error: None,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the task description handed to the worker.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the role the task is assigned to.
    #[must_use]
    pub const fn role(&self) -> &RoleName {
        &self.role
    }

    /// Returns the project phase this task belongs to.
    #[must_use]
    pub const fn phase(&self) -> ProjectPhase {
        self.phase
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the identifiers of the tasks this task depends on.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeSet<TaskId> {
        &self.dependencies
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task settled, if it has.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the worker payload recorded on completion.
    #[must_use]
    pub const fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    /// Returns the failure recorded on the task.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Moves the task to `target` if the state machine permits it.
    ///
    /// Entering a terminal status stamps `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidStateTransition`] when the
    /// transition is not permitted. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), ProjectDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(ProjectDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        if target.is_terminal() {
            self.completed_at = Some(clock.utc());
        }
        Ok(())
    }

    /// Completes the task with the worker payload.
    ///
    /// A JSON `null` payload is recorded as no output, matching how the
    /// snapshot reads it back.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidStateTransition`] unless the task
    /// is in progress or in review.
    pub fn complete(
        &mut self,
        output: Option<Value>,
        clock: &impl Clock,
    ) -> Result<(), ProjectDomainError> {
        self.transition_to(TaskStatus::Completed, clock)?;
        self.output = output.filter(|value| !value.is_null());
        self.error = None;
        Ok(())
    }

    /// Fails the task, recording the reason.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidStateTransition`] unless the task
    /// is in progress or in review.
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ProjectDomainError> {
        self.transition_to(TaskStatus::Failed, clock)?;
        self.error = Some(error.into());
        Ok(())
    }
}
