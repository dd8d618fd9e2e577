//! Filesystem adapters for project persistence.

mod store;

pub use store::DirectoryDocumentStore;
