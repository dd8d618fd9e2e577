//! Dependency-graph scheduling of project tasks.
//!
//! A project owns a graph of tasks, each assigned to a role. The
//! [`services::Scheduler`] repeatedly dispatches the tasks whose
//! dependencies have completed to the worker registered for their role,
//! records the results and advances the project phase until nothing is left
//! to run. Snapshots of the whole project are kept in a key-addressable
//! document store.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
