//! Adapter implementations for artifact ports.

pub mod fs;
pub mod memory;
