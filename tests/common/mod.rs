#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_assertions;

use lopdf::Document as LopdfDocument;
use std::sync::Arc;
use stencil::{
    DataPayload, GeneratedDocument, GenerationError, GenerationRequest, InMemoryTemplateStore, StencilConfig,
    TemplateKind, TemplateRecord, TemplateService,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    /// Create a GeneratedPdf from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    /// Decrypt and load password-protected PDF bytes
    pub fn from_encrypted(bytes: Vec<u8>, password: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem_with_password(&bytes, password)?;
        Ok(Self { bytes, doc })
    }

    /// Get the number of pages in the PDF
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Shown text of every page, one line per text operation.
    pub fn text(&self) -> String {
        pdf_assertions::shown_text(&self.doc)
    }

    /// Save PDF to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

/// A service over an in-memory store with default settings.
pub fn memory_service() -> TemplateService {
    memory_service_with(StencilConfig::default())
}

pub fn memory_service_with(config: StencilConfig) -> TemplateService {
    TemplateService::with_store(Arc::new(InMemoryTemplateStore::new()), config)
}

/// Registers `content` as a template and generates it against `data`.
pub fn generate(
    service: &TemplateService,
    content: &[u8],
    kind: TemplateKind,
    data: serde_json::Value,
    password: Option<&str>,
) -> Result<GeneratedDocument, GenerationError> {
    let file_name = match kind {
        TemplateKind::Markup => "template.html",
        TemplateKind::FormPdf => "template.pdf",
    };
    let record: TemplateRecord = service.register_template(content, file_name, Some(kind))?;
    let mut request = GenerationRequest::new(record, DataPayload::from_json(data)?);
    if let Some(password) = password {
        request = request.with_password(password);
    }
    service.generate(&request)
}

/// Generates a markup template with default settings and loads the result.
pub fn generate_markup_pdf(
    markup: &str,
    data: serde_json::Value,
) -> Result<(GeneratedPdf, GeneratedDocument), Box<dyn std::error::Error>> {
    let document = generate(&memory_service(), markup.as_bytes(), TemplateKind::Markup, data, None)?;
    let pdf = GeneratedPdf::from_bytes(document.bytes.clone())?;
    Ok((pdf, document))
}
