//! PDF post-processing utilities for generated and template documents.
//!
//! This crate provides low-level PDF manipulation using lopdf:
//! - AcroForm field discovery by fully-qualified name
//! - Field value writing for text, choice and button fields
//! - Standard security handler encryption (AES-128)

mod encryption;
mod error;
mod form;

pub use encryption::{encrypt_document, ensure_file_id};
pub use error::ComposerError;
pub use form::{FieldKind, FormDocument, FormField, decode_text_string};
