//! Filesystem adapters.

mod sink;

pub use sink::CapStdFileSink;
