use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stencil_render_lopdf::PageSettings;

/// Runtime settings for template registration and generation.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```json
/// { "uploadDir": "/var/lib/stencil", "strict": true, "page": { "size": "Letter" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StencilConfig {
    /// Directory uploaded templates are written to.
    pub upload_dir: PathBuf,
    /// Fail renders on malformed loops and scalar loop values instead of recording diagnostics.
    pub strict: bool,
    /// Upper bound for one generation call, in milliseconds. `0` disables the limit.
    pub generation_timeout_ms: u64,
    /// Page geometry for markup conversion.
    pub page: PageSettings,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            strict: false,
            generation_timeout_ms: 30_000,
            page: PageSettings::default(),
        }
    }
}

impl StencilConfig {
    /// Reads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, GenerationError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects page settings that leave no room for content.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.page.font_size <= 0.0 {
            return Err(GenerationError::Config("page.fontSize must be positive".to_string()));
        }
        if self.page.margins < 0.0 || self.page.margins * 2.0 >= self.page.width().min(self.page.height()) {
            return Err(GenerationError::Config(format!(
                "page.margins of {} leave no printable area",
                self.page.margins
            )));
        }
        Ok(())
    }

    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_generation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.generation_timeout_ms = timeout_ms;
        self
    }

    pub fn with_page(mut self, page: PageSettings) -> Self {
        self.page = page;
        self
    }

    /// The generation limit, or `None` when disabled.
    pub fn generation_timeout(&self) -> Option<Duration> {
        (self.generation_timeout_ms > 0).then(|| Duration::from_millis(self.generation_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use stencil_render_lopdf::PageSize;

    #[test]
    fn test_defaults() {
        let config = StencilConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert!(!config.strict);
        assert_eq!(config.generation_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            StencilConfig::from_json_str(r#"{ "strict": true, "page": { "size": "Letter" } }"#).unwrap();
        assert!(config.strict);
        assert_eq!(config.page.size, PageSize::Letter);
        assert_eq!(config.page.margins, PageSettings::default().margins);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let config = StencilConfig::default().with_generation_timeout_ms(0);
        assert_eq!(config.generation_timeout(), None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "uploadDir": "/tmp/templates", "generationTimeoutMs": 500 }}"#).unwrap();
        let config = StencilConfig::from_file(file.path()).unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/templates"));
        assert_eq!(config.generation_timeout_ms, 500);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = StencilConfig::from_file("/nonexistent/stencil.json").unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[test]
    fn test_invalid_margins_rejected() {
        let err = StencilConfig::from_json_str(r#"{ "page": { "margins": 400 } }"#).unwrap_err();
        assert!(err.to_string().contains("margins"));
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let err = StencilConfig::from_json_str("{ strict: ").unwrap_err();
        assert!(matches!(err, GenerationError::Json(_)));
    }
}
