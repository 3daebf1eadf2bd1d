//! Integration tests module
//!
//! This module contains all integration tests for cwldep CLI commands.

pub mod add;
pub mod check;
pub mod clean;
pub mod common;
pub mod install;
