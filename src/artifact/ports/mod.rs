//! Port contracts for artifact materialisation.
//!
//! Ports define infrastructure-agnostic interfaces used by artifact
//! services.

pub mod sink;

pub use sink::{FileSink, FileSinkError, FileSinkResult};
