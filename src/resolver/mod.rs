pub mod dependency_resolver;
pub mod fetch_kind;
pub mod run;

pub use dependency_resolver::DependencyResolver;
pub use fetch_kind::FetchKind;
pub use run::{EntryError, Operation, ResolutionRun};
