//! Atelier: dependency-graph scheduling of multi-role software projects.
//!
//! A project is planned as a graph of tasks, each assigned to a role. The
//! scheduler dispatches ready tasks to the worker registered for their role
//! and records the results. Worker output that names files is parsed into a
//! file set, written below a per-project directory and tracked as versioned
//! artifacts.
//!
//! # Architecture
//!
//! Atelier follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (filesystem, in-memory)
//!
//! # Modules
//!
//! - [`project`]: Task graphs, scheduling and end-to-end development runs
//! - [`artifact`]: File extraction from worker output and materialisation
//! - [`config`]: Runtime configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod artifact;
pub mod config;
pub mod project;
pub mod telemetry;
