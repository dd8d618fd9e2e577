//! Insertion-ordered task dependency graph.
//!
//! Tasks are stored in the order they were added; readiness and status
//! listings follow that order. Dependencies may name tasks that have not been
//! inserted yet. Such a dependency is never satisfied until the task appears.

use super::{ProjectDomainError, Task, TaskId, TaskStatus};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Tasks of one project keyed by identifier, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
}

impl TaskGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when the graph holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Returns the task with the given identifier.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.index.get(&id).and_then(|position| self.tasks.get(*position))
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.index
            .get(&id)
            .and_then(|position| self.tasks.get_mut(*position))
    }

    /// Returns the status of a task, or `None` when it does not exist.
    #[must_use]
    pub fn status_of(&self, id: TaskId) -> Option<TaskStatus> {
        self.get(id).map(Task::status)
    }

    /// Adds a task.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::DuplicateTask`] when the identifier is
    /// taken and [`ProjectDomainError::DependencyCycle`] when the task would
    /// close a cycle with tasks already in the graph. The graph is unchanged
    /// on error.
    pub fn insert(&mut self, task: Task) -> Result<(), ProjectDomainError> {
        self.insert_all(std::iter::once(task))
    }

    /// Adds several tasks atomically.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; no task is added on error.
    pub fn insert_all(
        &mut self,
        tasks: impl IntoIterator<Item = Task>,
    ) -> Result<(), ProjectDomainError> {
        let mut candidate = self.clone();
        for task in tasks {
            candidate.push_unchecked(task)?;
        }
        if let Some(cycle) = candidate.find_cycle() {
            return Err(ProjectDomainError::DependencyCycle(cycle));
        }
        *self = candidate;
        Ok(())
    }

    fn push_unchecked(&mut self, task: Task) -> Result<(), ProjectDomainError> {
        let id = task.id();
        if self.index.contains_key(&id) {
            return Err(ProjectDomainError::DuplicateTask(id));
        }
        if task.dependencies().contains(&id) {
            return Err(ProjectDomainError::SelfDependency(id));
        }
        self.index.insert(id, self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Returns the tasks left on a dependency cycle, if any.
    ///
    /// Runs Kahn's algorithm over edges between existing tasks; dependencies
    /// on missing tasks are ignored because they cannot form a cycle until
    /// the task is inserted.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        let mut in_degree: HashMap<TaskId, usize> = HashMap::with_capacity(self.tasks.len());
        let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();

        for task in &self.tasks {
            let known = task
                .dependencies()
                .iter()
                .filter(|dependency| self.index.contains_key(dependency));
            let mut degree = 0;
            for dependency in known {
                degree += 1;
                dependents.entry(*dependency).or_default().push(task.id());
            }
            in_degree.insert(task.id(), degree);
        }

        let mut queue: VecDeque<TaskId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        while let Some(id) = queue.pop_front() {
            in_degree.remove(&id);
            for dependent in dependents.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if in_degree.is_empty() {
            return None;
        }
        let cycle = self
            .tasks
            .iter()
            .map(Task::id)
            .filter(|id| in_degree.contains_key(id))
            .collect();
        Some(cycle)
    }

    /// Returns `true` when every dependency of `task` exists and is
    /// completed.
    #[must_use]
    pub fn dependencies_satisfied(&self, task: &Task) -> bool {
        task.dependencies()
            .iter()
            .all(|dependency| self.status_of(*dependency) == Some(TaskStatus::Completed))
    }

    /// Returns pending tasks whose dependencies are all completed, in
    /// insertion order.
    pub fn ready(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(|task| task.status() == TaskStatus::Pending)
            .filter(|task| self.dependencies_satisfied(task))
    }

    /// Returns pending tasks that depend on a failed or blocked task.
    ///
    /// Applied repeatedly, this reaches every transitive dependent of a
    /// failure.
    #[must_use]
    pub fn doomed(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|task| task.status() == TaskStatus::Pending)
            .filter(|task| {
                task.dependencies().iter().any(|dependency| {
                    matches!(
                        self.status_of(*dependency),
                        Some(TaskStatus::Failed | TaskStatus::Blocked)
                    )
                })
            })
            .map(Task::id)
            .collect()
    }
}

impl PartialEq for TaskGraph {
    fn eq(&self, other: &Self) -> bool {
        self.tasks == other.tasks
    }
}

impl Eq for TaskGraph {}

impl Serialize for TaskGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tasks.len()))?;
        for task in &self.tasks {
            map.serialize_entry(&task.id(), task)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TaskGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TaskGraphVisitor)
    }
}

struct TaskGraphVisitor;

impl<'de> Visitor<'de> for TaskGraphVisitor {
    type Value = TaskGraph;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of task identifiers to tasks")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut graph = TaskGraph::new();
        while let Some((key, task)) = access.next_entry::<TaskId, Task>()? {
            if key != task.id() {
                return Err(serde::de::Error::custom(format!(
                    "task keyed as {key} carries identifier {}",
                    task.id()
                )));
            }
            graph.push_unchecked(task).map_err(serde::de::Error::custom)?;
        }
        if let Some(cycle) = graph.find_cycle() {
            return Err(serde::de::Error::custom(
                ProjectDomainError::DependencyCycle(cycle),
            ));
        }
        Ok(graph)
    }
}
