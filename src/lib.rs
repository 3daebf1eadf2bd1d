//! cwldep: dependency manager for Common Workflow Language documents
//!
//! This crate resolves the `dep:Dependencies` hints of a workflow document
//! into checksum-verified local artifacts, recorded in a lockfile next to
//! the document. Core error and path utilities live in `cwldep-core` and
//! are re-exported here.

pub use cwldep_core::{CwldepError, CwldepResult};

/// Core module re-exported from cwldep-core.
pub mod core {
    pub use cwldep_core::core::*;
    pub use cwldep_core::*;

    /// Path module re-exported from cwldep-core.
    pub mod path {
        pub use cwldep_core::core::path::*;
    }
}

/// Configuration management.
pub mod config;

/// Dependency injection infrastructure.
pub mod di;

/// Workflow documents: dependency hints, reference scanning, editing.
pub mod document;

/// Lockfile model and reconciliation.
pub mod lock;

/// Artifact checksums, verification, fetching, and extraction.
pub mod package;

/// Version-control sources.
pub mod vcs;

/// Dependency resolution.
pub mod resolver;

/// One install/update/check/clean pass over a root document.
pub mod project;
