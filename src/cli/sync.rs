use cwldep::core::{CwldepError, CwldepResult};
use cwldep::di::ServiceContainer;
use cwldep::project::{Project, SyncReport};
use cwldep::resolver::Operation;
use std::env;
use std::path::PathBuf;

/// Run one operation over `document`, with dependencies placed under the
/// current directory
pub async fn run(document: PathBuf, operation: Operation) -> CwldepResult<SyncReport> {
    let current_dir = env::current_dir()
        .map_err(|e| CwldepError::Path(format!("Failed to get current directory: {}", e)))?;

    if !document.is_file() {
        return Err(CwldepError::Document(format!(
            "Document not found: {}",
            document.display()
        )));
    }

    let container = ServiceContainer::new()?;
    let project = Project::new(current_dir, document);
    let report = project.sync(&container, operation).await?;

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &SyncReport) {
    for key in &report.removed {
        println!("  Removed: {}", key);
    }
    for (key, reason) in &report.failed_removals {
        println!("  ❌ Failed to remove {}: {}", key, reason);
    }
    for entry in &report.errors {
        println!("  ❌ {}: {}", entry.upstream, entry.error);
    }

    if report.operation.is_check() {
        for key in &report.needs_install {
            println!("  Needs install: {}", key);
        }
        for key in &report.changed {
            println!("  Upstream changed: {}", key);
        }
        if report.needs_install.is_empty() && report.changed.is_empty() {
            println!("✓ All dependencies up to date");
        } else {
            println!(
                "{} dependency(s) need install, {} changed upstream",
                report.needs_install.len(),
                report.changed.len()
            );
        }
        return;
    }

    if report.is_success() {
        println!("✓ {} complete", report.operation);
    } else {
        println!(
            "❌ {} finished with {} error(s)",
            report.operation,
            report.errors.len() + report.failed_removals.len()
        );
    }
    println!("  {} dependency(s) locked", report.lockfile.len());
    if report.lockfile_written {
        println!("  Lockfile: {}", report.lockfile_path.display());
    }
}
