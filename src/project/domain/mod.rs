//! Domain model for project scheduling.
//!
//! A project owns a dependency graph of tasks. The domain enforces the task
//! state machine and the graph invariants (unique identifiers, no cycles) and
//! projects aggregate task status onto a coarse project phase. Worker
//! dispatch and persistence stay outside the domain boundary.

mod error;
mod graph;
mod ids;
mod phase;
mod pipeline;
mod state;
mod status;
mod task;

pub use error::{ParseStatusError, ProjectDomainError};
pub use graph::TaskGraph;
pub use ids::{ProjectId, RoleName, TaskId};
pub use phase::ProjectPhase;
pub use pipeline::{PipelineStage, PipelineTemplate};
pub use state::ProjectState;
pub use status::{ProjectStatus, StatusCounts, progress_percentage};
pub use task::{NewTask, Task, TaskStatus};
