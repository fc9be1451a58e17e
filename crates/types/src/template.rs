use crate::payload::DataPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown template kind: '{0}'")]
pub struct TemplateKindError(pub String);

/// Selects which generation strategy a template goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    /// An HTML skeleton converted to a new PDF after substitution.
    #[serde(alias = "HTML", alias = "markup")]
    Markup,
    /// An existing PDF whose AcroForm fields are populated.
    #[serde(alias = "PDF", alias = "form-pdf")]
    FormPdf,
}

impl TemplateKind {
    /// Infers the kind from a file extension (without the leading dot).
    pub fn from_extension(extension: &str) -> Result<Self, TemplateKindError> {
        match extension.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" => Ok(TemplateKind::Markup),
            "pdf" => Ok(TemplateKind::FormPdf),
            _ => Err(TemplateKindError(format!(".{}", extension))),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = TemplateKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "markup" => Ok(TemplateKind::Markup),
            "pdf" | "form-pdf" | "formpdf" | "form" => Ok(TemplateKind::FormPdf),
            _ => Err(TemplateKindError(s.to_string())),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Markup => f.write_str("markup"),
            TemplateKind::FormPdf => f.write_str("form-pdf"),
        }
    }
}

/// Metadata for a stored template. Persistence belongs to the caller; the
/// engine only reads `kind` and resolves `source_ref` through a template store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: Uuid,
    pub name: String,
    pub kind: TemplateKind,
    /// Store-specific reference to the raw template bytes (a path for filesystem stores).
    pub source_ref: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateRecord {
    pub fn new(name: impl Into<String>, kind: TemplateKind, source_ref: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            source_ref: source_ref.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One generation call: template, data and an optional password.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template: TemplateRecord,
    pub data: DataPayload,
    pub password: Option<String>,
}

impl GenerationRequest {
    pub fn new(template: TemplateRecord, data: DataPayload) -> Self {
        Self { template, data, password: None }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// The password, if one was supplied and is non-empty.
    pub fn effective_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}
