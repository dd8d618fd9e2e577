//! In-memory adapters for tests.

mod sink;

pub use sink::InMemoryFileSink;
