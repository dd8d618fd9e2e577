//! Port contracts for project scheduling.
//!
//! Ports define infrastructure-agnostic interfaces used by project
//! services: persistence, the workers that perform tasks, and deployment.

pub mod deployer;
pub mod store;
pub mod worker;

pub use deployer::{DeployError, Deployer, DeploymentRecord};
pub use store::{DocumentStore, DocumentStoreError, DocumentStoreResult};
pub use worker::{
    WorkContext, WorkRequest, WorkResult, WorkStatus, Worker, WorkerError, WorkerRegistry,
};
