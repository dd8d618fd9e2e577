//! Unit tests for artifact extraction and materialisation.
