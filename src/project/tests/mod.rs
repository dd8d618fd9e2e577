//! Unit tests for project scheduling.
