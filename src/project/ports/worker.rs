//! Worker port and the role-keyed worker registry.

use crate::project::domain::{RoleName, TaskId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Description of the task a worker is asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRequest {
    /// Identifier of the task being executed.
    pub task_id: TaskId,
    /// Task name, e.g. `Design Architecture`.
    pub task_name: String,
    /// Instruction text for the worker.
    pub description: String,
    /// Role the task is assigned to.
    pub role: RoleName,
}

/// Project information handed to a worker alongside the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkContext {
    /// Name of the project.
    pub project_name: String,
    /// Structured project requirements.
    pub requirements: Map<String, Value>,
    /// Architecture notes recorded on the project.
    pub architecture: Map<String, Value>,
    /// Outputs of completed dependencies, keyed by dependency task name.
    pub dependency_outputs: BTreeMap<String, Value>,
}

/// Outcome status reported by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// The work succeeded.
    Success,
    /// The worker reported a failure.
    Error,
}

/// Result returned by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    /// Outcome status.
    pub status: WorkStatus,
    /// Worker-defined payload; only the artifact extractor interprets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Failure description when `status` is [`WorkStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkResult {
    /// Creates a successful result carrying `payload`.
    #[must_use]
    pub const fn success(payload: Value) -> Self {
        Self {
            status: WorkStatus::Success,
            payload: Some(payload),
            error: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: WorkStatus::Error,
            payload: None,
            error: Some(message.into()),
        }
    }

    /// Returns `true` when the worker reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == WorkStatus::Success
    }
}

/// Errors raised by a worker instead of returning a result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker could not complete the request.
    #[error("worker failed: {0}")]
    Failed(String),

    /// The worker gave up because it was cancelled.
    #[error("worker cancelled")]
    Cancelled,
}

/// A capability that performs the work of one role.
///
/// Dropping the returned future cancels the invocation; implementations must
/// tolerate being dropped at any await point.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Performs `request` with the given project `context`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] when the worker fails outright. Expected
    /// failures may instead be reported as a [`WorkResult`] with
    /// [`WorkStatus::Error`].
    async fn execute(
        &self,
        request: &WorkRequest,
        context: &WorkContext,
    ) -> Result<WorkResult, WorkerError>;
}

/// Workers keyed by the role they perform.
///
/// Built by the caller and injected into the scheduler.
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: HashMap<RoleName, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `worker` for `role`, returning the worker it replaces.
    pub fn register(
        &mut self,
        role: RoleName,
        worker: Arc<dyn Worker>,
    ) -> Option<Arc<dyn Worker>> {
        tracing::debug!(role = %role, "registered worker");
        self.workers.insert(role, worker)
    }

    /// Registers `worker` for `role`, builder style.
    #[must_use]
    pub fn with_worker(mut self, role: RoleName, worker: Arc<dyn Worker>) -> Self {
        self.register(role, worker);
        self
    }

    /// Returns the worker registered for `role`.
    #[must_use]
    pub fn get(&self, role: &RoleName) -> Option<Arc<dyn Worker>> {
        self.workers.get(role).cloned()
    }

    /// Returns `true` when a worker is registered for `role`.
    #[must_use]
    pub fn contains(&self, role: &RoleName) -> bool {
        self.workers.contains_key(role)
    }

    /// Returns the registered roles, sorted.
    #[must_use]
    pub fn roles(&self) -> Vec<RoleName> {
        let mut roles: Vec<RoleName> = self.workers.keys().cloned().collect();
        roles.sort();
        roles
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("roles", &self.roles())
            .finish()
    }
}
