pub mod lockfile;
pub mod manager;

pub use lockfile::{LockEntry, Lockfile, VerifiedSet};
pub use manager::{LockManager, Reconciliation};
