//! Error types for project domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating project domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The role name is empty or contains whitespace.
    #[error("invalid role name '{0}'")]
    InvalidRoleName(String),

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// A task with the same identifier already belongs to the project.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A task lists itself as a dependency.
    #[error("task {0} depends on itself")]
    SelfDependency(TaskId),

    /// Inserting the task would close a dependency cycle.
    #[error("dependency cycle through tasks: {}", format_ids(.0))]
    DependencyCycle(Vec<TaskId>),

    /// The task does not belong to the project.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The requested state transition is not permitted.
    #[error("invalid state transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// The task being transitioned.
        task_id: TaskId,
        /// The current task status.
        from: TaskStatus,
        /// The requested task status.
        to: TaskStatus,
    },
}

fn format_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error returned while parsing task statuses or project phases.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown value: {0}")]
pub struct ParseStatusError(pub String);
