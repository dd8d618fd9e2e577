//! Service layer for project scheduling.

pub mod pipeline;
pub mod repository;
pub mod scheduler;

pub use pipeline::{DeploymentOutcome, DevelopmentPipeline, DevelopmentReport};
pub use repository::{ProjectRepository, ProjectStoreError, ProjectStoreResult};
pub use scheduler::{Scheduler, SchedulerError, SchedulerResult, TaskExecution};
