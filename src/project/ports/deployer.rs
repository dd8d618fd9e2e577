//! Deployment port invoked once a project has settled.

use crate::project::domain::ProjectState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where and how a project was deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Target environment, e.g. `staging`.
    pub environment: String,
    /// Hosting provider that received the deployment.
    pub provider: String,
    /// Public address of the deployed project, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When the deployment finished.
    pub deployed_at: DateTime<Utc>,
}

/// Errors returned by deployers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeployError {
    /// The project is not in a deployable state.
    #[error("project is not deployable: {0}")]
    NotDeployable(String),

    /// The provider rejected or failed the deployment.
    #[error("deployment failed: {0}")]
    Provider(String),
}

/// Deploys a settled project.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploys `project`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError`] when the deployment does not happen.
    async fn deploy(&self, project: &ProjectState) -> Result<DeploymentRecord, DeployError>;
}
