//! YAML/JSON document loader

use super::scan::{collect_references, resolve_reference};
use super::{
    expand_namespace, namespaces_of, DependencyTree, Document, DEPENDENCIES_CLASS,
};
use crate::core::{CwldepError, CwldepResult};
use crate::di::{ConfigProvider, DocumentLoader};
use crate::package::http::build_http_client;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_yaml::Value;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use tracing::debug;

/// Loads CWL documents from disk or over HTTP
pub struct YamlDocumentLoader {
    client: Client,
}

impl YamlDocumentLoader {
    pub fn new(config: &dyn ConfigProvider) -> CwldepResult<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    async fn fetch_text(&self, url: &str) -> CwldepResult<String> {
        debug!("Loading document {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CwldepError::fetch(url, e))?;
        if !response.status().is_success() {
            return Err(CwldepError::fetch(url, format!("HTTP {}", response.status())));
        }
        response.text().await.map_err(|e| CwldepError::fetch(url, e))
    }
}

/// URI for a local document path (absolute `file://` URL)
pub fn file_uri(path: &Path) -> CwldepResult<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| CwldepError::Path(format!("Invalid document path: {}", absolute.display())))
}

#[async_trait]
impl DocumentLoader for YamlDocumentLoader {
    async fn load(&self, location: &str) -> CwldepResult<Document> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let text = self.fetch_text(location).await?;
            return self.parse(location, &text);
        }

        let path = match location.strip_prefix("file://") {
            Some(_) => Url::parse(location)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| CwldepError::Path(format!("Invalid file URL: {}", location)))?,
            None => Path::new(location).to_path_buf(),
        };
        let text = std::fs::read_to_string(&path).map_err(|e| {
            CwldepError::Document(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.parse(&file_uri(&path)?, &text)
    }

    fn parse(&self, uri: &str, text: &str) -> CwldepResult<Document> {
        // JSON documents parse as YAML too
        let content: Value = serde_yaml::from_str(text)
            .map_err(|e| CwldepError::Document(format!("Failed to parse {}: {}", uri, e)))?;
        Ok(Document {
            uri: uri.to_string(),
            content,
        })
    }

    fn dependencies(&self, document: &Document) -> CwldepResult<Vec<DependencyTree>> {
        let namespaces = namespaces_of(&document.content);
        let mut trees = Vec::new();
        find_dependency_hints(&document.content, &namespaces, &mut trees)?;
        Ok(trees)
    }

    async fn scan_references(&self, document: &Document) -> CwldepResult<Vec<String>> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(strip_fragment(&document.uri));

        let mut references = Vec::new();
        let mut queue: VecDeque<Document> = VecDeque::new();
        queue.push_back(document.clone());

        while let Some(current) = queue.pop_front() {
            let found = collect_references(&current.content);

            for file in found.files {
                let Some(url) = resolve_reference(&current.uri, &file) else {
                    continue;
                };
                if seen.insert(url.clone()) {
                    references.push(url);
                }
            }

            for import in found.documents {
                let Some(url) = resolve_reference(&current.uri, &import) else {
                    continue;
                };
                if !seen.insert(url.clone()) {
                    continue;
                }
                references.push(url.clone());
                queue.push_back(self.load(&url).await?);
            }
        }

        Ok(references)
    }
}

/// Collect every `Dependencies` hint, in list form (`class:` key) or map
/// form (class as the key inside `hints`/`requirements`).
fn find_dependency_hints(
    value: &Value,
    namespaces: &serde_yaml::Mapping,
    out: &mut Vec<DependencyTree>,
) -> CwldepResult<()> {
    match value {
        Value::Mapping(map) => {
            let class = map
                .get("class")
                .and_then(|c| c.as_str())
                .map(|c| expand_namespace(namespaces, c));
            if class.as_deref() == Some(DEPENDENCIES_CLASS) {
                out.push(parse_tree(value)?);
                return Ok(());
            }

            for (key, child) in map {
                let key = key.as_str().unwrap_or_default();
                if key == "hints" || key == "requirements" {
                    if let Value::Mapping(entries) = child {
                        for (class_key, body) in entries {
                            let expanded =
                                expand_namespace(namespaces, class_key.as_str().unwrap_or_default());
                            if expanded == DEPENDENCIES_CLASS {
                                out.push(parse_tree(body)?);
                            } else {
                                find_dependency_hints(body, namespaces, out)?;
                            }
                        }
                        continue;
                    }
                }
                find_dependency_hints(child, namespaces, out)?;
            }
        }
        Value::Sequence(items) => {
            for item in items {
                find_dependency_hints(item, namespaces, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_tree(value: &Value) -> CwldepResult<DependencyTree> {
    serde_yaml::from_value(value.clone())
        .map_err(|e| CwldepError::Document(format!("Invalid Dependencies hint: {}", e)))
}

fn strip_fragment(uri: &str) -> String {
    uri.split('#').next().unwrap_or(uri).to_string()
}
