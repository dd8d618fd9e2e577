//! Step definitions for project coordination scenarios.

mod given;
mod then;
mod when;
pub mod world;
