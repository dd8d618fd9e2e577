//! Adapter implementations of the project ports.

pub mod fs;
pub mod memory;
