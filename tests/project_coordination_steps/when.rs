//! When steps for project coordination BDD scenarios.

use super::world::{ProjectWorld, run_async};
use atelier::project::domain::TaskStatus;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"task "{name}" is started"#)]
fn task_started(world: &mut ProjectWorld, name: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&name)?;
    let (scheduler, project_id) = world.active()?;
    run_async(scheduler.update_task_status(project_id, task_id, TaskStatus::InProgress))
        .wrap_err("start task")?;
    Ok(())
}

#[when(r#"task "{name}" is marked "{status}""#)]
fn task_marked(world: &mut ProjectWorld, name: String, status: String) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task_id = world.task_id(&name)?;
    let (scheduler, project_id) = world.active()?;
    run_async(scheduler.update_task_status(project_id, task_id, target))
        .wrap_err("update task status")?;
    Ok(())
}

#[when("the project is coordinated")]
fn project_coordinated(world: &mut ProjectWorld) -> Result<(), eyre::Report> {
    let (scheduler, project_id) = world.active()?;
    let completed = run_async(scheduler.coordinate(project_id)).wrap_err("coordinate project")?;
    world.last_coordination = Some(completed);
    Ok(())
}
