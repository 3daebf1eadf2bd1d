//! Git repository dependencies

pub mod git;
pub mod repository;

pub use git::GitCli;
pub use repository::RepositoryInstaller;
