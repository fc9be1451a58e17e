// src/generator.rs
//! Turns a template plus a data payload into PDF bytes.
//!
//! The template kind selects one of two strategies:
//!
//! - **Markup conversion**: the template text goes through the substitution
//!   engine and the result is converted to a new PDF.
//! - **Form fill**: the template is an existing PDF whose AcroForm fields are
//!   set from the payload.
//!
//! Both strategies hand the encryption settings to the toolkit when the output
//! document is set up, so a protected result is never written unencrypted.

use crate::config::StencilConfig;
use crate::error::GenerationError;
use crate::toolkit::LopdfToolkit;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use stencil_template_core::{RenderOptions, SubstitutionEngine, TemplateAnalyzer};
use stencil_traits::{EncryptionOptions, PdfToolkit, SharedTemplateData, TemplateStore};
use stencil_types::{
    AnalysisResult, DataPayload, Diagnostic, GenerationRequest, TemplateKind, TemplateRecord,
};

/// The bytes of a generated PDF and the non-fatal conditions met on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOutput {
    pub bytes: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct DocumentGenerator {
    store: Arc<dyn TemplateStore>,
    toolkit: Arc<dyn PdfToolkit>,
    engine: SubstitutionEngine,
    analyzer: TemplateAnalyzer,
}

impl DocumentGenerator {
    pub fn new(store: Arc<dyn TemplateStore>, toolkit: Arc<dyn PdfToolkit>) -> Self {
        Self {
            store,
            toolkit,
            engine: SubstitutionEngine::default(),
            analyzer: TemplateAnalyzer::new(),
        }
    }

    /// A generator using the lopdf toolkit with the configured page settings
    /// and substitution mode.
    pub fn from_config(store: Arc<dyn TemplateStore>, config: &StencilConfig) -> Self {
        Self::new(store, Arc::new(LopdfToolkit::new(config.page)))
            .with_render_options(RenderOptions { strict: config.strict })
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.engine = SubstitutionEngine::new(options);
        self
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    pub fn toolkit(&self) -> &Arc<dyn PdfToolkit> {
        &self.toolkit
    }

    pub fn render_options(&self) -> RenderOptions {
        self.engine.options()
    }

    /// Generates the PDF for `request`.
    ///
    /// # Errors
    ///
    /// - `EncryptionConfigInvalid` when a password is given but cannot be used
    /// - `SourceUnavailable` when the template bytes cannot be loaded
    /// - `Template` for strict-mode render failures
    /// - `Toolkit` when conversion, form parsing or serialization fails
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        let start = Instant::now();
        let template = &request.template;

        // Checked before any work so a bad password never costs a conversion.
        let encryption = request
            .effective_password()
            .map(EncryptionOptions::from_password)
            .transpose()?;
        let source = self.load_source(template)?;

        let output = match template.kind {
            TemplateKind::Markup => {
                info!(
                    "Template '{}': selecting markup conversion strategy{}.",
                    template.name,
                    if encryption.is_some() { " with encryption" } else { "" }
                );
                self.generate_markup(&source, &request.data, encryption.as_ref())?
            }
            TemplateKind::FormPdf => {
                info!(
                    "Template '{}': selecting form fill strategy{}.",
                    template.name,
                    if encryption.is_some() { " with encryption" } else { "" }
                );
                self.generate_form(&source, &request.data, encryption)?
            }
        };

        info!(
            "Template '{}': generated {} bytes with {} diagnostic(s) in {:.2?}.",
            template.name,
            output.bytes.len(),
            output.diagnostics.len(),
            start.elapsed()
        );
        Ok(output)
    }

    fn load_source(&self, template: &TemplateRecord) -> Result<SharedTemplateData, GenerationError> {
        debug!("Loading template '{}' from {} store.", template.source_ref, self.store.name());
        Ok(self.store.load(&template.source_ref)?)
    }

    fn generate_markup(
        &self,
        source: &[u8],
        data: &DataPayload,
        encryption: Option<&EncryptionOptions>,
    ) -> Result<GenerationOutput, GenerationError> {
        let content = decode_markup(source);
        let rendered = self.engine.render(&content, data)?;
        let bytes = self.toolkit.convert_markup_to_pdf(&rendered.output, encryption)?;
        Ok(GenerationOutput { bytes, diagnostics: rendered.diagnostics })
    }

    fn generate_form(
        &self,
        source: &[u8],
        data: &DataPayload,
        encryption: Option<EncryptionOptions>,
    ) -> Result<GenerationOutput, GenerationError> {
        let mut form = self.toolkit.open_form_document(source, encryption)?;
        let mut diagnostics = Vec::new();

        for (name, value) in data.iter() {
            let text = value.display_string().unwrap_or_default();
            if form.set_field_value(name, &text)? {
                debug!("Filled form field '{}'.", name);
            } else {
                let diagnostic = Diagnostic::UnknownFormField { name: name.clone() };
                warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
            }
        }

        let bytes = form.serialize()?;
        Ok(GenerationOutput { bytes, diagnostics })
    }

    /// Reports the variables and loops a stored template needs, with sample data.
    ///
    /// Markup templates are scanned for markers; form templates report their
    /// field names as variables.
    pub fn analyze(&self, template: &TemplateRecord) -> Result<AnalysisResult, GenerationError> {
        let source = self.load_source(template)?;
        self.analyze_source(template.kind, &source)
    }

    pub fn analyze_source(&self, kind: TemplateKind, source: &[u8]) -> Result<AnalysisResult, GenerationError> {
        let result = match kind {
            TemplateKind::Markup => self.analyzer.analyze(&decode_markup(source)),
            TemplateKind::FormPdf => {
                let form = self.toolkit.open_form_document(source, None)?;
                self.analyzer.analyze_fields(form.field_names())
            }
        };
        debug!(
            "Analyzed {} template: {} variable(s), {} loop(s).",
            kind,
            result.variables.len(),
            result.loops.len()
        );
        Ok(result)
    }
}

/// Template text is UTF-8; stray invalid bytes are replaced rather than failing the call.
fn decode_markup(source: &[u8]) -> String {
    match std::str::from_utf8(source) {
        Ok(text) => text.to_string(),
        Err(e) => {
            warn!("Template is not valid UTF-8 ({}); invalid bytes replaced.", e);
            String::from_utf8_lossy(source).into_owned()
        }
    }
}
