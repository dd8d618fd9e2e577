//! Given steps for project coordination BDD scenarios.

use super::world::{CannedWorker, ProjectWorld, run_async};
use atelier::project::domain::{NewTask, ProjectPhase, RoleName};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use serde_json::json;

#[given(r#"echoing workers for roles "{first}", "{second}" and "{third}""#)]
fn echoing_workers(
    world: &mut ProjectWorld,
    first: String,
    second: String,
    third: String,
) -> Result<(), eyre::Report> {
    for role in [first, second, third] {
        world.register(&role, CannedWorker::echo())?;
    }
    Ok(())
}

#[given(r#"no worker for role "{role}""#)]
fn no_worker_for_role(world: &mut ProjectWorld, role: String) -> Result<(), eyre::Report> {
    let role_name = RoleName::new(role)?;
    let mut registry = atelier::project::ports::WorkerRegistry::new();
    for existing in world.registry.roles() {
        if existing != role_name
            && let Some(worker) = world.registry.get(&existing)
        {
            registry.register(existing, worker);
        }
    }
    world.registry = registry;
    Ok(())
}

#[given(r#"the worker for role "{role}" writes "{path}" containing "{content}""#)]
fn worker_writes_file(
    world: &mut ProjectWorld,
    role: String,
    path: String,
    content: String,
) -> Result<(), eyre::Report> {
    let response = format!("**{path}**\n```\n{content}\n```\n");
    world.register(&role, CannedWorker::replying(json!({ "response": response })))
}

#[given(r#"a project with chained tasks "{first}", "{second}" and "{third}""#)]
fn chained_project(
    world: &mut ProjectWorld,
    first: String,
    second: String,
    third: String,
) -> Result<(), eyre::Report> {
    let project_name = world.project_name.clone();
    let scheduler = world.start_scheduler();
    let project_id = run_async(scheduler.create_project(project_name, "scenario requirements"))
        .wrap_err("create project for coordination scenario")?;

    let mut created = Vec::new();
    let mut previous = None;
    for name in [first, second, third] {
        let task = NewTask::new(
            name.clone(),
            format!("perform {name}"),
            RoleName::new(name.clone())?,
            ProjectPhase::Implementation,
        )
        .with_dependencies(previous);
        let added = run_async(scheduler.add_task(project_id, task))
            .wrap_err("add chained task in scenario setup")?;
        previous = Some(added.id());
        created.push((name, added.id()));
    }

    world.project_id = Some(project_id);
    world.task_ids.extend(created);
    Ok(())
}
