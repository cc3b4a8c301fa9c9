//! Serialization of generated OpenAPI documents to YAML or JSON.
//!
//! Besides the one-shot functions, [`DocumentCache`] lets a long-running host generate its
//! document on first request and serve the same text afterwards.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::OnceCell;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use openapi_introspect::introspect::IntrospectionSession;
/// use openapi_introspect::metadata::TypeCatalog;
/// use openapi_introspect::openapi_builder::OpenApiBuilder;
/// use openapi_introspect::serializer::serialize_yaml;
///
/// let catalog = TypeCatalog::new();
/// let generated = OpenApiBuilder::new().build(IntrospectionSession::new(&catalog));
/// let yaml = serialize_yaml(&generated.document).unwrap();
/// assert!(yaml.contains("openapi: 3.1.0"));
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Generates a document at most once and keeps its serialized forms.
///
/// Concurrent first requests block until one generation finishes. A failed generation
/// leaves the cache empty so a later call can retry.
#[derive(Debug, Default)]
pub struct DocumentCache {
    document: OnceCell<OpenApiDocument>,
    yaml: OnceCell<String>,
    json: OnceCell<String>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached document, running `generate` if there is none yet
    pub fn document<F>(&self, generate: F) -> Result<&OpenApiDocument>
    where
        F: FnOnce() -> Result<OpenApiDocument>,
    {
        self.document.get_or_try_init(|| {
            debug!("Generating OpenAPI document for cache");
            generate()
        })
    }

    pub fn yaml<F>(&self, generate: F) -> Result<&str>
    where
        F: FnOnce() -> Result<OpenApiDocument>,
    {
        self.yaml
            .get_or_try_init(|| serialize_yaml(self.document(generate)?))
            .map(String::as_str)
    }

    pub fn json<F>(&self, generate: F) -> Result<&str>
    where
        F: FnOnce() -> Result<OpenApiDocument>,
    {
        self.json
            .get_or_try_init(|| serialize_json(self.document(generate)?))
            .map(String::as_str)
    }

    pub fn is_generated(&self) -> bool {
        self.document.get().is_some()
    }
}
