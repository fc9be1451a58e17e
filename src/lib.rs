//! # stencil
//!
//! Turns stored templates plus a JSON-shaped data payload into PDF documents.
//!
//! Two template kinds are supported:
//!
//! - **Markup**: HTML with `{{name}}` placeholders and `{{#items}}...{{/items}}`
//!   loop sections, rendered and converted into a new PDF
//! - **Form PDF**: an existing PDF whose AcroForm fields are filled from the payload
//!
//! Either output can be protected with a password (AES-128, printing only).
//!
//! ```no_run
//! use stencil::{DataPayload, GenerationRequest, StencilConfig, TemplateService};
//!
//! # fn main() -> Result<(), stencil::GenerationError> {
//! let service = TemplateService::new(StencilConfig::default());
//! let template = service.register_template(b"<h1>Hello {{name}}</h1>", "greeting.html", None)?;
//! let data = DataPayload::new().with("name", "Ann");
//! let document = service.generate(&GenerationRequest::new(template, data))?;
//! document.write_to(&document.file_name)?;
//! # Ok(())
//! # }
//! ```

pub mod service;

pub use service::{GeneratedDocument, PDF_CONTENT_TYPE, TemplateService};

pub use stencil_core::{
    AnalysisResult, DataPayload, Diagnostic, DocumentGenerator, EncryptionOptions, GenerationError,
    GenerationOutput, GenerationRequest, InMemoryTemplateStore, LopdfToolkit, PageSettings, PageSize,
    PdfToolkit, StencilConfig, TemplateKind, TemplateRecord, TemplateStore,
};
pub use stencil_pdf_composer::{FieldKind, FormDocument, FormField};
pub use stencil_resource::FilesystemTemplateStore;
pub use stencil_template_core::{RenderOptions, Rendered, SubstitutionEngine, TemplateAnalyzer, TemplateError};
pub use stencil_traits::{FormHandle, StoreError, ToolkitError};
pub use stencil_types::{DataValue, LoopItem, ScalarValue};
