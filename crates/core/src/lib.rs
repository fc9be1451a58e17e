//! # stencil-core
//!
//! Document generation for stencil templates.
//!
//! - **generator**: selects the markup or form-fill strategy and runs it
//! - **toolkit**: the lopdf-backed [`PdfToolkit`] (conversion, forms, encryption)
//! - **config**: runtime settings loadable from JSON
//! - **error**: the fatal error taxonomy of a generation call
//!
//! Template bytes come through a [`TemplateStore`] and PDF work goes through a
//! [`PdfToolkit`], so both can be swapped without touching the strategies.

// Re-export foundation crates
pub use stencil_traits as traits;
pub use stencil_types as types;

pub use stencil_template_core as template;

pub mod config;
pub mod error;
pub mod generator;
pub mod toolkit;

pub use config::StencilConfig;
pub use error::GenerationError;
pub use generator::{DocumentGenerator, GenerationOutput};
pub use toolkit::LopdfToolkit;

pub use stencil_render_lopdf::{PageSettings, PageSize};
pub use traits::{EncryptionOptions, InMemoryTemplateStore, PdfToolkit, TemplateStore};
pub use types::{AnalysisResult, DataPayload, Diagnostic, GenerationRequest, TemplateKind, TemplateRecord};
