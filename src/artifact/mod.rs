//! Artifact extraction and materialisation.
//!
//! Workers return loosely structured text; this module recovers the files it
//! announces, writes them below a per-project directory and keeps a
//! versioned record of every path. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Extraction and materialisation services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
