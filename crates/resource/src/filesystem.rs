//! Filesystem-backed template store.
//!
//! Uploaded templates are written under a single upload directory with
//! generated names, so callers never choose the on-disk path.
//!
//! # Security
//!
//! References are validated to stay within the upload directory, which blocks
//! traversal such as `../../../etc/passwd`.

use log::debug;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use stencil_traits::{SharedTemplateData, StoreError, TemplateStore, stored_template_name};

/// A template store rooted at an upload directory.
///
/// The directory is created on the first save if it does not exist yet.
#[derive(Debug, Clone)]
pub struct FilesystemTemplateStore {
    base_path: PathBuf,
}

impl FilesystemTemplateStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self { base_path: base_path.as_ref().to_path_buf() }
    }

    /// Returns the upload directory.
    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a reference inside the upload directory.
    ///
    /// Returns `None` if the reference would escape it.
    fn resolve_path_safe(&self, reference: &str) -> Option<PathBuf> {
        if reference.is_empty() || Path::new(reference).is_absolute() {
            return None;
        }

        let full_path = self.base_path.join(reference);

        if let (Ok(canonical), Ok(base)) = (full_path.canonicalize(), self.base_path.canonicalize()) {
            return canonical.starts_with(&base).then_some(canonical);
        }

        // Not on disk yet: fall back to a component check.
        if Path::new(reference)
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return None;
        }

        Some(full_path)
    }
}

impl TemplateStore for FilesystemTemplateStore {
    fn load(&self, reference: &str) -> Result<SharedTemplateData, StoreError> {
        let full_path = self
            .resolve_path_safe(reference)
            .ok_or_else(|| StoreError::NotFound(format!("{} (path traversal blocked)", reference)))?;

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(reference.to_string())
            } else {
                StoreError::ReadFailed { reference: reference.to_string(), message: e.to_string() }
            }
        })
    }

    fn save(&self, content: &[u8], file_name: &str) -> Result<String, StoreError> {
        if content.is_empty() {
            return Err(StoreError::EmptyContent);
        }

        std::fs::create_dir_all(&self.base_path).map_err(|e| StoreError::WriteFailed {
            file_name: file_name.to_string(),
            message: format!("cannot create {}: {}", self.base_path.display(), e),
        })?;

        let stored = stored_template_name(file_name);
        let target = self.base_path.join(&stored);
        std::fs::write(&target, content).map_err(|e| StoreError::WriteFailed {
            file_name: file_name.to_string(),
            message: e.to_string(),
        })?;

        debug!("Stored '{}' as {} ({} bytes)", file_name, target.display(), content.len());
        Ok(stored)
    }

    fn exists(&self, reference: &str) -> bool {
        self.resolve_path_safe(reference).map(|p| p.is_file()).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "FilesystemTemplateStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FilesystemTemplateStore::new(dir.path());

        let reference = store.save(b"<p>{{name}}</p>", "greeting.html").unwrap();
        assert!(reference.ends_with(".html"));
        assert_ne!(reference, "greeting.html");

        let data = store.load(&reference).unwrap();
        assert_eq!(&*data, b"<p>{{name}}</p>");
        assert!(store.exists(&reference));
    }

    #[test]
    fn test_save_creates_upload_directory() {
        let dir = tempdir().unwrap();
        let uploads = dir.path().join("nested").join("uploads");
        let store = FilesystemTemplateStore::new(&uploads);

        let reference = store.save(b"%PDF-1.5", "form.pdf").unwrap();
        assert!(uploads.join(&reference).is_file());
    }

    #[test]
    fn test_save_without_extension_defaults_to_pdf() {
        let dir = tempdir().unwrap();
        let store = FilesystemTemplateStore::new(dir.path());

        let reference = store.save(b"data", "upload").unwrap();
        assert!(reference.ends_with(".pdf"));
    }

    #[test]
    fn test_save_generates_distinct_names() {
        let dir = tempdir().unwrap();
        let store = FilesystemTemplateStore::new(dir.path());

        let first = store.save(b"a", "same.html").unwrap();
        let second = store.save(b"b", "same.html").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_save_rejects_empty_content() {
        let dir = tempdir().unwrap();
        let store = FilesystemTemplateStore::new(dir.path());

        assert!(matches!(store.save(b"", "empty.html"), Err(StoreError::EmptyContent)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_load_not_found() {
        let dir = tempdir().unwrap();
        let store = FilesystemTemplateStore::new(dir.path());

        let result = store.load("nonexistent.html");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_blocks_path_traversal() {
        let dir = tempdir().unwrap();
        let store = FilesystemTemplateStore::new(dir.path().join("uploads"));
        fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        assert!(store.load("../secret.txt").is_err());
        assert!(!store.exists("../secret.txt"));
        assert!(!store.exists("foo/../../secret.txt"));
    }

    #[test]
    fn test_blocks_absolute_paths() {
        let dir = tempdir().unwrap();
        let store = FilesystemTemplateStore::new(dir.path());

        assert!(store.load("/etc/passwd").is_err());
        assert!(!store.exists("/etc/passwd"));
    }

    #[test]
    fn test_directories_do_not_exist_as_templates() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let store = FilesystemTemplateStore::new(dir.path());

        assert!(!store.exists("sub"));
        assert!(!store.exists(""));
    }
}
