//! Core utilities shared by the cwldep binary and library: the error type
//! and path helpers for lockfile keys.

pub mod core;

pub use crate::core::{CwldepError, CwldepResult};
