// src/service.rs
//! The application-facing facade: register templates, analyze them and
//! generate documents, optionally under a time limit.

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use stencil_core::{
    AnalysisResult, Diagnostic, DocumentGenerator, GenerationError, GenerationOutput, GenerationRequest,
    StencilConfig, TemplateKind, TemplateRecord, TemplateStore,
};
use stencil_resource::FilesystemTemplateStore;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A finished PDF ready to hand to a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    /// `generated-<unix millis>.pdf`
    pub file_name: String,
    pub content_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedDocument {
    fn from_output(output: GenerationOutput) -> Self {
        Self {
            file_name: format!("generated-{}.pdf", Utc::now().timestamp_millis()),
            content_type: PDF_CONTENT_TYPE,
            bytes: output.bytes,
            diagnostics: output.diagnostics,
        }
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), GenerationError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TemplateService {
    generator: DocumentGenerator,
    config: StencilConfig,
}

impl TemplateService {
    /// A service storing templates under `config.upload_dir`.
    pub fn new(config: StencilConfig) -> Self {
        let store: Arc<dyn TemplateStore> = Arc::new(FilesystemTemplateStore::new(&config.upload_dir));
        Self::with_store(store, config)
    }

    pub fn with_store(store: Arc<dyn TemplateStore>, config: StencilConfig) -> Self {
        let generator = DocumentGenerator::from_config(store, &config);
        Self { generator, config }
    }

    /// Wraps an already assembled generator, for example one with a custom toolkit.
    pub fn from_generator(generator: DocumentGenerator, config: StencilConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &StencilConfig {
        &self.config
    }

    pub fn generator(&self) -> &DocumentGenerator {
        &self.generator
    }

    /// Stores uploaded template bytes and returns the record describing them.
    ///
    /// Without an explicit `kind` the kind is inferred from the file extension.
    pub fn register_template(
        &self,
        content: &[u8],
        file_name: &str,
        kind: Option<TemplateKind>,
    ) -> Result<TemplateRecord, GenerationError> {
        let kind = match kind {
            Some(kind) => kind,
            None => {
                let extension = Path::new(file_name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or_default();
                TemplateKind::from_extension(extension)?
            }
        };
        let source_ref = self.generator.store().save(content, file_name)?;
        let record = TemplateRecord::new(file_name, kind, source_ref);
        info!("Registered {} template '{}' as {}.", record.kind, record.name, record.source_ref);
        Ok(record)
    }

    pub fn analyze(&self, template: &TemplateRecord) -> Result<AnalysisResult, GenerationError> {
        self.generator.analyze(template)
    }

    /// Generates on the calling thread, without a time limit.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDocument, GenerationError> {
        self.generator.generate(request).map(GeneratedDocument::from_output)
    }

    /// Generates on the blocking pool and gives up after the configured
    /// `generationTimeoutMs`. The abandoned conversion still runs to completion
    /// in the background; its result is dropped.
    pub async fn generate_with_timeout(
        &self,
        request: GenerationRequest,
    ) -> Result<GeneratedDocument, GenerationError> {
        let generator = self.generator.clone();
        let task = tokio::task::spawn_blocking(move || generator.generate(&request));

        let joined = match self.config.generation_timeout() {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Generation exceeded {} ms; abandoning it.", self.config.generation_timeout_ms);
                    return Err(GenerationError::Timeout(self.config.generation_timeout_ms));
                }
            },
            None => task.await,
        };

        let output = joined.map_err(|e| GenerationError::Aborted(e.to_string()))??;
        Ok(GeneratedDocument::from_output(output))
    }
}
