//! Pipeline templates used to plan projects.

use super::{NewTask, ProjectDomainError, ProjectPhase, RoleName, TaskId};

/// One stage of a pipeline: a task name, the role that performs it and the
/// project phase it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    name: String,
    description: String,
    role: RoleName,
    phase: ProjectPhase,
}

impl PipelineStage {
    /// Creates a stage.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        role: RoleName,
        phase: ProjectPhase,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            role,
            phase,
        }
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instruction text handed to the worker.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the role performing the stage.
    #[must_use]
    pub const fn role(&self) -> &RoleName {
        &self.role
    }

    /// Returns the phase the stage belongs to.
    #[must_use]
    pub const fn phase(&self) -> ProjectPhase {
        self.phase
    }
}

/// Ordered list of stages instantiated as a linear task chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTemplate {
    stages: Vec<PipelineStage>,
}

impl PipelineTemplate {
    /// Role that analyses requirements.
    pub const PRODUCT_MANAGER: &'static str = "ProductManager";
    /// Role that designs the architecture.
    pub const ARCHITECT: &'static str = "Architect";
    /// Role that implements the backend.
    pub const BACKEND_DEVELOPER: &'static str = "BackendDeveloper";
    /// Role that writes tests.
    pub const QA_ENGINEER: &'static str = "QAEngineer";
    /// Role that prepares deployment.
    pub const DEVOPS_ENGINEER: &'static str = "DevOpsEngineer";
    /// Role that writes end-user documentation.
    pub const DOCUMENTATION_WRITER: &'static str = "DocumentationWriter";

    /// Creates a template from explicit stages.
    #[must_use]
    pub const fn new(stages: Vec<PipelineStage>) -> Self {
        Self { stages }
    }

    /// Returns the six-stage software delivery pipeline.
    ///
    /// # Errors
    ///
    /// Never fails in practice; role names are validated like any other.
    pub fn reference() -> Result<Self, ProjectDomainError> {
        let stages = vec![
            PipelineStage::new(
                "Analyze Requirements",
                "Convert natural language requirements to structured specifications",
                RoleName::new(Self::PRODUCT_MANAGER)?,
                ProjectPhase::Requirements,
            ),
            PipelineStage::new(
                "Design Architecture",
                "Create system architecture and technical design",
                RoleName::new(Self::ARCHITECT)?,
                ProjectPhase::Design,
            ),
            PipelineStage::new(
                "Implement Backend",
                "Develop backend APIs and business logic",
                RoleName::new(Self::BACKEND_DEVELOPER)?,
                ProjectPhase::Implementation,
            ),
            PipelineStage::new(
                "Write Tests",
                "Create unit and integration tests",
                RoleName::new(Self::QA_ENGINEER)?,
                ProjectPhase::Testing,
            ),
            PipelineStage::new(
                "Prepare Deployment",
                "Set up CI/CD and deployment configuration",
                RoleName::new(Self::DEVOPS_ENGINEER)?,
                ProjectPhase::Deployment,
            ),
            PipelineStage::new(
                "Write Documentation",
                "Produce end-user documentation for the delivered application",
                RoleName::new(Self::DOCUMENTATION_WRITER)?,
                ProjectPhase::Deployment,
            ),
        ];
        Ok(Self::new(stages))
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` when the template has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Builds one task per stage, each depending on the one before it.
    #[must_use]
    pub fn instantiate(&self) -> Vec<NewTask> {
        let mut previous: Option<TaskId> = None;
        self.stages
            .iter()
            .map(|stage| {
                let task = NewTask::new(
                    stage.name.clone(),
                    stage.description.clone(),
                    stage.role.clone(),
                    stage.phase,
                )
                .with_dependencies(previous);
                previous = Some(task.id());
                task
            })
            .collect()
    }
}
