//! Reference scanning
//!
//! Finds the files a CWL document needs alongside it. `$import` and `run`
//! name sub-documents that are themselves scanned; `$include`, `$schemas`
//! and `location` name plain files.

use reqwest::Url;
use serde_yaml::Value;
use tracing::debug;

/// Fields whose string value is a sub-document to scan recursively
pub const DOCUMENT_FIELDS: &[&str] = &["$import", "run"];

/// Fields whose value names a plain file
pub const FILE_FIELDS: &[&str] = &["$include", "$schemas", "location"];

/// References found in a single document, in document order
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FoundReferences {
    pub documents: Vec<String>,
    pub files: Vec<String>,
}

/// Walk a document and collect its raw (unresolved) references
pub fn collect_references(content: &Value) -> FoundReferences {
    let mut found = FoundReferences::default();
    walk(content, &mut found);
    found
}

fn walk(value: &Value, found: &mut FoundReferences) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = key.as_str().unwrap_or_default();
                if DOCUMENT_FIELDS.contains(&key) {
                    match child {
                        Value::String(s) if is_reference(s) => found.documents.push(s.clone()),
                        // inline process under `run`
                        other => walk(other, found),
                    }
                } else if FILE_FIELDS.contains(&key) {
                    match child {
                        Value::String(s) if is_reference(s) => found.files.push(s.clone()),
                        Value::Sequence(items) => {
                            for item in items {
                                if let Value::String(s) = item {
                                    if is_reference(s) {
                                        found.files.push(s.clone());
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                } else {
                    walk(child, found);
                }
            }
        }
        Value::Sequence(items) => {
            for item in items {
                walk(item, found);
            }
        }
        _ => {}
    }
}

/// Local fragments, blank nodes and expressions are not files
fn is_reference(value: &str) -> bool {
    !(value.is_empty()
        || value.starts_with('#')
        || value.starts_with("_:")
        || value.contains("$(")
        || value.contains("${"))
}

/// Resolve `reference` against `base`, dropping any fragment
pub fn resolve_reference(base: &str, reference: &str) -> Option<String> {
    let base = match Url::parse(base) {
        Ok(url) => url,
        Err(e) => {
            debug!("Cannot resolve {} against {}: {}", reference, base, e);
            return None;
        }
    };
    match base.join(reference) {
        Ok(mut url) => {
            url.set_fragment(None);
            Some(url.to_string())
        }
        Err(e) => {
            debug!("Cannot resolve {} against {}: {}", reference, base, e);
            None
        }
    }
}
