// src/error.rs
//! Defines the error types for generation and analysis calls.

use stencil_template_core::TemplateError;
use stencil_traits::{StoreError, ToolkitError};
use stencil_types::{PayloadError, TemplateKindError};
use thiserror::Error;

/// The fatal conditions of a generation or analysis call.
///
/// Non-fatal conditions never show up here; they are collected as
/// [`stencil_types::Diagnostic`]s next to the result.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Template source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Template upload failed: {0}")]
    StoreWrite(String),
    #[error("Unknown template kind: {0}")]
    UnknownTemplateKind(String),
    #[error("Invalid encryption configuration: {0}")]
    EncryptionConfigInvalid(String),
    #[error("Template rendering error: {0}")]
    Template(#[from] TemplateError),
    #[error("PDF toolkit error: {0}")]
    Toolkit(String),
    #[error("Generation timed out after {0} ms")]
    Timeout(u64),
    #[error("Generation task aborted: {0}")]
    Aborted(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for GenerationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmptyContent => GenerationError::Config(e.to_string()),
            StoreError::WriteFailed { .. } => GenerationError::StoreWrite(e.to_string()),
            other => GenerationError::SourceUnavailable(other.to_string()),
        }
    }
}

impl From<ToolkitError> for GenerationError {
    fn from(e: ToolkitError) -> Self {
        match e {
            ToolkitError::Encryption(msg) => GenerationError::EncryptionConfigInvalid(msg),
            other => GenerationError::Toolkit(other.to_string()),
        }
    }
}

impl From<TemplateKindError> for GenerationError {
    fn from(e: TemplateKindError) -> Self {
        GenerationError::UnknownTemplateKind(e.0)
    }
}

impl From<PayloadError> for GenerationError {
    fn from(e: PayloadError) -> Self {
        match e {
            PayloadError::Json(inner) => GenerationError::Json(inner),
            other => GenerationError::Config(other.to_string()),
        }
    }
}
