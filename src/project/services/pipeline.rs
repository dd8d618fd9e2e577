//! End-to-end development run: create, plan, coordinate, deploy.

use crate::project::{
    domain::{ProjectId, ProjectStatus},
    ports::{DeployError, Deployer, DeploymentRecord, DocumentStore},
    services::scheduler::{Scheduler, SchedulerResult},
};
use mockable::Clock;
use std::sync::Arc;

/// What happened to the deployment step of a development run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    /// Scheduling did not complete, so nothing was deployed.
    Skipped,
    /// The project was deployed.
    Deployed(DeploymentRecord),
    /// The deployer was invoked and failed. The failure is not retried.
    Failed(DeployError),
}

/// Result of [`DevelopmentPipeline::develop`].
#[derive(Debug, Clone, PartialEq)]
pub struct DevelopmentReport {
    /// Project created for the run.
    pub project_id: ProjectId,
    /// Whether every task settled and the project completed.
    pub completed: bool,
    /// Task progress after coordination.
    pub status: ProjectStatus,
    /// Deployment step result.
    pub deployment: DeploymentOutcome,
}

/// Drives a project from raw requirements to deployment.
pub struct DevelopmentPipeline<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    scheduler: Arc<Scheduler<S, C>>,
    deployer: Arc<dyn Deployer>,
}

impl<S, C> DevelopmentPipeline<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    /// Creates a pipeline running on `scheduler` and deploying with
    /// `deployer`.
    #[must_use]
    pub fn new(scheduler: Arc<Scheduler<S, C>>, deployer: Arc<dyn Deployer>) -> Self {
        Self {
            scheduler,
            deployer,
        }
    }

    /// Returns the scheduler the pipeline runs on.
    #[must_use]
    pub const fn scheduler(&self) -> &Arc<Scheduler<S, C>> {
        &self.scheduler
    }

    /// Creates a project, plans it, coordinates it and deploys it when
    /// every task settled.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`](crate::project::services::SchedulerError)
    /// when scheduling itself fails. Task and deployment failures are
    /// reported in the [`DevelopmentReport`].
    pub async fn develop(
        &self,
        name: &str,
        requirements: &str,
    ) -> SchedulerResult<DevelopmentReport> {
        let project_id = self.scheduler.create_project(name, requirements).await?;
        self.scheduler.plan_project(project_id).await?;
        let completed = self.scheduler.coordinate(project_id).await?;

        let deployment = if completed {
            let project = self.scheduler.project(project_id).await?;
            match self.deployer.deploy(&project).await {
                Ok(record) => {
                    tracing::info!(
                        project_id = %project_id,
                        environment = %record.environment,
                        provider = %record.provider,
                        "project deployed"
                    );
                    DeploymentOutcome::Deployed(record)
                }
                Err(err) => {
                    tracing::warn!(project_id = %project_id, error = %err, "deployment failed");
                    DeploymentOutcome::Failed(err)
                }
            }
        } else {
            tracing::info!(project_id = %project_id, "skipping deployment of stalled project");
            DeploymentOutcome::Skipped
        };

        let status = self.scheduler.project_status(project_id).await?;
        Ok(DevelopmentReport {
            project_id,
            completed,
            status,
            deployment,
        })
    }
}

impl<S, C> std::fmt::Debug for DevelopmentPipeline<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevelopmentPipeline")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
