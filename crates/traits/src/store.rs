//! TemplateStore trait for abstracting template content access.
//!
//! The engine reads template bytes through this trait without being tied to
//! where the persistence layer keeps them.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Extension used when an uploaded file name carries none.
pub const DEFAULT_EXTENSION: &str = "pdf";

/// Error type for template store operations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Template source not found: {0}")]
    NotFound(String),

    #[error("Failed to read template '{reference}': {message}")]
    ReadFailed { reference: String, message: String },

    #[error("Failed to store template '{file_name}': {message}")]
    WriteFailed { file_name: String, message: String },

    #[error("File content cannot be empty")]
    EmptyContent,
}

/// A fresh reference for an upload that keeps the extension of `original`.
///
/// Two uploads under the same file name never share a reference.
pub fn stored_template_name(original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION);
    format!("{}.{}", Uuid::new_v4(), extension)
}

/// Shared template content (reference-counted bytes).
pub type SharedTemplateData = Arc<Vec<u8>>;

/// A source of raw template content.
///
/// Templates are immutable once stored, so a store can serve concurrent
/// readers of the same reference without coordination.
pub trait TemplateStore: Send + Sync + Debug {
    /// Load the raw bytes behind a template reference.
    fn load(&self, reference: &str) -> Result<SharedTemplateData, StoreError>;

    /// Persist new template content and return the reference to load it by.
    ///
    /// Implementations must reject empty content with [`StoreError::EmptyContent`].
    fn save(&self, content: &[u8], file_name: &str) -> Result<String, StoreError>;

    /// Check if a reference resolves to stored content.
    fn exists(&self, reference: &str) -> bool;

    /// Returns a human-readable name for this store (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory template store.
///
/// `save` stores content under a generated `<uuid>.<ext>` reference like the
/// filesystem store does. `add` is the explicit-key path for callers that
/// manage template identity themselves.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: std::sync::RwLock<std::collections::HashMap<String, SharedTemplateData>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add content under an explicit reference, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the internal lock is poisoned.
    pub fn add(&self, reference: impl Into<String>, content: impl Into<Vec<u8>>) -> Result<(), StoreError> {
        let reference = reference.into();
        let mut templates = self.templates.write().map_err(|_| StoreError::WriteFailed {
            file_name: reference.clone(),
            message: "template store lock poisoned".to_string(),
        })?;
        templates.insert(reference, Arc::new(content.into()));
        Ok(())
    }

    /// Get the number of templates in the store.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.templates.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Returns `true` if the lock is poisoned (safe default).
    pub fn is_empty(&self) -> bool {
        self.templates.read().map(|t| t.is_empty()).unwrap_or(true)
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn load(&self, reference: &str) -> Result<SharedTemplateData, StoreError> {
        let templates = self.templates.read().map_err(|_| StoreError::ReadFailed {
            reference: reference.to_string(),
            message: "template store lock poisoned".to_string(),
        })?;
        templates
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    fn save(&self, content: &[u8], file_name: &str) -> Result<String, StoreError> {
        if content.is_empty() {
            return Err(StoreError::EmptyContent);
        }
        let reference = stored_template_name(file_name);
        self.add(reference.clone(), content)?;
        Ok(reference)
    }

    fn exists(&self, reference: &str) -> bool {
        self.templates
            .read()
            .map(|t| t.contains_key(reference))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryTemplateStore"
    }
}
