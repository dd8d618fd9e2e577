//! Then steps for project coordination BDD scenarios.

use super::world::{ProjectWorld, run_async};
use atelier::artifact::{domain::ArtifactPath, services::project_dir_name};
use atelier::project::domain::{ProjectPhase, TaskStatus};
use eyre::WrapErr;
use rstest_bdd_macros::then;

fn parse_status(status: &str) -> Result<TaskStatus, eyre::Report> {
    TaskStatus::try_from(status).map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))
}

#[then("no task is ready")]
fn no_task_ready(world: &ProjectWorld) -> Result<(), eyre::Report> {
    let (scheduler, project_id) = world.active()?;
    let ready = run_async(scheduler.ready_tasks(project_id)).wrap_err("list ready tasks")?;
    if !ready.is_empty() {
        return Err(eyre::eyre!("expected no ready tasks, found {}", ready.len()));
    }
    Ok(())
}

#[then("coordinating the project reports a stall")]
fn coordinating_reports_stall(world: &ProjectWorld) -> Result<(), eyre::Report> {
    let (scheduler, project_id) = world.active()?;
    let completed = run_async(scheduler.coordinate(project_id)).wrap_err("coordinate project")?;
    if completed {
        return Err(eyre::eyre!("expected coordination to stall"));
    }
    Ok(())
}

#[then("coordination completed the project")]
fn coordination_completed(world: &ProjectWorld) -> Result<(), eyre::Report> {
    match world.last_coordination {
        Some(true) => Ok(()),
        other => Err(eyre::eyre!("expected completed coordination, got {other:?}")),
    }
}

#[then("coordination stalled")]
fn coordination_stalled(world: &ProjectWorld) -> Result<(), eyre::Report> {
    match world.last_coordination {
        Some(false) => Ok(()),
        other => Err(eyre::eyre!("expected stalled coordination, got {other:?}")),
    }
}

#[then(r#"task "{name}" is "{status}""#)]
fn task_has_status(world: &ProjectWorld, name: String, status: String) -> Result<(), eyre::Report> {
    let expected = parse_status(&status)?;
    let task_id = world.task_id(&name)?;
    let (scheduler, project_id) = world.active()?;
    let project = run_async(scheduler.project(project_id)).wrap_err("load project")?;
    let actual = project.tasks().status_of(task_id);
    if actual != Some(expected) {
        return Err(eyre::eyre!("expected task {name} to be {expected}, found {actual:?}"));
    }
    Ok(())
}

#[then(r#"every task is "{status}""#)]
fn every_task_has_status(world: &ProjectWorld, status: String) -> Result<(), eyre::Report> {
    let expected = parse_status(&status)?;
    let (scheduler, project_id) = world.active()?;
    let project = run_async(scheduler.project(project_id)).wrap_err("load project")?;
    if let Some(task) = project.tasks().iter().find(|task| task.status() != expected) {
        return Err(eyre::eyre!(
            "expected every task to be {expected}, {} is {}",
            task.name(),
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"the project phase is "{phase}""#)]
fn project_phase_is(world: &ProjectWorld, phase: String) -> Result<(), eyre::Report> {
    let expected = ProjectPhase::try_from(phase.as_str())
        .map_err(|err| eyre::eyre!("invalid phase in scenario: {err}"))?;
    let (scheduler, project_id) = world.active()?;
    let status = run_async(scheduler.project_status(project_id)).wrap_err("project status")?;
    if status.phase != expected {
        return Err(eyre::eyre!(
            "expected phase {expected}, found {}",
            status.phase
        ));
    }
    Ok(())
}

#[then(r#"the project file "{path}" contains "{content}""#)]
fn project_file_contains(
    world: &ProjectWorld,
    path: String,
    content: String,
) -> Result<(), eyre::Report> {
    let (_, project_id) = world.active()?;
    let project_dir = project_dir_name(project_id, &world.project_name);
    let written = world.sink.read(&project_dir, &path);
    if written.as_deref() != Some(content.as_str()) {
        return Err(eyre::eyre!(
            "expected {path} to contain {content:?}, found {written:?}"
        ));
    }
    Ok(())
}

#[then(r#"the project records artifact "{path}" at version {version:u32}"#)]
fn project_records_artifact(
    world: &ProjectWorld,
    path: String,
    version: u32,
) -> Result<(), eyre::Report> {
    let (scheduler, project_id) = world.active()?;
    let project = run_async(scheduler.project(project_id)).wrap_err("load project")?;
    let artifact_path = ArtifactPath::new(path.as_str())?;
    let recorded = project
        .artifacts()
        .get(&artifact_path)
        .map(|artifact| artifact.version());
    if recorded != Some(version) {
        return Err(eyre::eyre!(
            "expected {path} at version {version}, found {recorded:?}"
        ));
    }
    Ok(())
}
