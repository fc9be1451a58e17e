//! The lopdf-backed implementation of [`PdfToolkit`].
//!
//! Markup conversion goes through `stencil-render-lopdf`, form handling and
//! encryption through `stencil-pdf-composer`. Both paths produce an unsaved
//! `lopdf::Document` that is encrypted (when asked) and then serialized.

use lopdf::Document;
use stencil_pdf_composer::{ComposerError, FormDocument, encrypt_document};
use stencil_render_lopdf::{MarkupConverter, PageSettings, RenderError, save_document};
use stencil_traits::{EncryptionOptions, FormHandle, PdfToolkit, ToolkitError};

fn conversion_error(e: RenderError) -> ToolkitError {
    ToolkitError::Conversion(e.to_string())
}

fn composer_error(e: ComposerError) -> ToolkitError {
    match e {
        ComposerError::Encryption(msg) => ToolkitError::Encryption(msg),
        other => ToolkitError::InvalidDocument(other.to_string()),
    }
}

/// Applies `encryption` and writes the document out.
fn finish_document(mut doc: Document, encryption: Option<&EncryptionOptions>) -> Result<Vec<u8>, ToolkitError> {
    if let Some(options) = encryption {
        encrypt_document(&mut doc, options).map_err(composer_error)?;
    }
    save_document(&mut doc).map_err(|e| ToolkitError::Serialize(e.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct LopdfToolkit {
    converter: MarkupConverter,
}

impl LopdfToolkit {
    pub fn new(settings: PageSettings) -> Self {
        Self { converter: MarkupConverter::new(settings) }
    }
}

impl PdfToolkit for LopdfToolkit {
    fn convert_markup_to_pdf(
        &self,
        markup: &str,
        encryption: Option<&EncryptionOptions>,
    ) -> Result<Vec<u8>, ToolkitError> {
        let doc = self.converter.convert(markup).map_err(conversion_error)?;
        finish_document(doc, encryption)
    }

    fn open_form_document(
        &self,
        source: &[u8],
        encryption: Option<EncryptionOptions>,
    ) -> Result<Box<dyn FormHandle>, ToolkitError> {
        let form = FormDocument::load(source).map_err(composer_error)?;
        if !form.has_form() {
            log::warn!("Template PDF has no interactive form; it will be copied unchanged.");
        }
        Ok(Box::new(LopdfFormHandle { form, encryption }))
    }

    fn name(&self) -> &'static str {
        "lopdf"
    }
}

/// An open form whose output encryption was fixed when it was opened.
#[derive(Debug)]
struct LopdfFormHandle {
    form: FormDocument,
    encryption: Option<EncryptionOptions>,
}

impl FormHandle for LopdfFormHandle {
    fn field_names(&self) -> Vec<String> {
        self.form.field_names()
    }

    fn set_field_value(&mut self, name: &str, value: &str) -> Result<bool, ToolkitError> {
        self.form.set_field_value(name, value).map_err(composer_error)
    }

    fn serialize(self: Box<Self>) -> Result<Vec<u8>, ToolkitError> {
        let LopdfFormHandle { form, encryption } = *self;
        finish_document(form.into_document(), encryption.as_ref())
    }
}
