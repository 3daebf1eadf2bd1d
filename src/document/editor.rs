//! Adding dependency declarations to a workflow document

use super::{
    expand_namespace, namespaces_of, DependencyDeclaration, CWLDEP_NAMESPACE,
    DEPENDENCIES_CLASS,
};
use crate::core::{CwldepError, CwldepResult};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Add (or update) a dependency in the `Dependencies` hint of every
/// `Workflow` in the document at `path`.
///
/// An existing declaration with the same upstream is updated in place.
/// Otherwise it is appended to an existing hint, or a new
/// `dep:Dependencies` hint is created. The `dep` namespace is registered
/// and the document is rewritten atomically.
pub fn add_dependency(path: &Path, declaration: &DependencyDeclaration) -> CwldepResult<()> {
    let text = fs::read_to_string(path)?;
    let mut document: Value = serde_yaml::from_str(&text)
        .map_err(|e| CwldepError::Document(format!("Failed to parse {}: {}", path.display(), e)))?;

    let mut namespaces = namespaces_of(&document);
    namespaces.insert("dep".into(), CWLDEP_NAMESPACE.into());

    let mut edited = 0;
    visit_workflows(&mut document, &mut |workflow| {
        add_to_hints(workflow, &namespaces, declaration);
        edited += 1;
    });
    if edited == 0 {
        // A bare tool still gets the hint at its root
        if document.get("class").is_some() {
            if let Value::Mapping(root) = &mut document {
                add_to_hints(root, &namespaces, declaration);
                edited += 1;
            }
        }
    }
    if edited == 0 {
        return Err(CwldepError::Document(format!(
            "No Workflow found in {}",
            path.display()
        )));
    }

    let root = document
        .as_mapping_mut()
        .ok_or_else(|| CwldepError::Document(format!("{} is not a mapping", path.display())))?;
    root.insert("$namespaces".into(), Value::Mapping(namespaces));
    root.remove("id");

    let output = serde_yaml::to_string(&document)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CwldepError::Path(format!("Invalid document path: {}", path.display())))?;
    let temp = path.with_file_name(format!("_{}_", file_name));
    fs::write(&temp, output)?;
    fs::rename(&temp, path)?;

    info!("Added {} to {}", declaration.upstream, path.display());
    Ok(())
}

fn visit_workflows(value: &mut Value, f: &mut dyn FnMut(&mut Mapping)) {
    match value {
        Value::Mapping(map) => {
            if map.get("class").and_then(|c| c.as_str()) == Some("Workflow") {
                f(map);
            }
            for (_, child) in map.iter_mut() {
                visit_workflows(child, f);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                visit_workflows(item, f);
            }
        }
        _ => {}
    }
}

fn declaration_value(declaration: &DependencyDeclaration) -> Mapping {
    let mut obj = Mapping::new();
    obj.insert("upstream".into(), declaration.upstream.clone().into());
    if let Some(version) = &declaration.version {
        obj.insert("version".into(), version.clone().into());
    }
    if let Some(install_to) = &declaration.install_to {
        obj.insert("installTo".into(), install_to.clone().into());
    }
    obj
}

/// Update the matching declaration or append a new one. Returns false when
/// `hint` has no usable `dependencies` list.
fn merge_into_hint(hint: &mut Value, declaration: &DependencyDeclaration) -> bool {
    let Some(list) = hint
        .get_mut("dependencies")
        .and_then(|d| d.as_sequence_mut())
    else {
        return false;
    };
    let obj = declaration_value(declaration);
    for existing in list.iter_mut() {
        if existing.get("upstream").and_then(|u| u.as_str()) == Some(declaration.upstream.as_str()) {
            if let Value::Mapping(map) = existing {
                for (k, v) in obj {
                    map.insert(k, v);
                }
            }
            return true;
        }
    }
    list.push(Value::Mapping(obj));
    true
}

fn new_hint_body(declaration: &DependencyDeclaration) -> Mapping {
    let mut body = Mapping::new();
    body.insert(
        "dependencies".into(),
        Value::Sequence(vec![Value::Mapping(declaration_value(declaration))]),
    );
    body
}

fn add_to_hints(workflow: &mut Mapping, namespaces: &Mapping, declaration: &DependencyDeclaration) {
    let hints = workflow
        .entry("hints".into())
        .or_insert_with(|| Value::Mapping(Mapping::new()));

    match hints {
        Value::Sequence(items) => {
            for item in items.iter_mut() {
                let class = item
                    .get("class")
                    .and_then(|c| c.as_str())
                    .map(|c| expand_namespace(namespaces, c));
                if class.as_deref() == Some(DEPENDENCIES_CLASS) && merge_into_hint(item, declaration) {
                    return;
                }
            }
            let mut hint = Mapping::new();
            hint.insert("class".into(), "dep:Dependencies".into());
            for (k, v) in new_hint_body(declaration) {
                hint.insert(k, v);
            }
            items.push(Value::Mapping(hint));
        }
        Value::Mapping(map) => {
            for (key, body) in map.iter_mut() {
                let class = expand_namespace(namespaces, key.as_str().unwrap_or_default());
                if class == DEPENDENCIES_CLASS && merge_into_hint(body, declaration) {
                    return;
                }
            }
            map.insert(
                "dep:Dependencies".into(),
                Value::Mapping(new_hint_body(declaration)),
            );
        }
        other => {
            let mut map = Mapping::new();
            map.insert(
                "dep:Dependencies".into(),
                Value::Mapping(new_hint_body(declaration)),
            );
            *other = Value::Mapping(map);
        }
    }
}
