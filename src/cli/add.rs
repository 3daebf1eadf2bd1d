use cwldep::core::CwldepResult;
use cwldep::document::{add_dependency, DependencyDeclaration};
use cwldep::project::SyncReport;
use cwldep::resolver::Operation;
use std::path::PathBuf;

pub async fn run(
    document: PathBuf,
    upstream: String,
    version: Option<String>,
    install_to: Option<String>,
) -> CwldepResult<SyncReport> {
    let mut declaration = DependencyDeclaration::new(upstream);
    declaration.version = version;
    declaration.install_to = install_to;

    add_dependency(&document, &declaration)?;
    println!("✓ Added {} to {}", declaration.upstream, document.display());

    super::sync::run(document, Operation::Install).await
}
