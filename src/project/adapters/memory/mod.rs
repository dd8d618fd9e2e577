//! In-memory adapters for project persistence.

mod store;

pub use store::InMemoryDocumentStore;
