//! PdfToolkit trait: the PDF construction primitives the generator delegates to.
//!
//! A toolkit converts markup into a new PDF and opens existing PDFs as
//! editable forms. Encryption is a writer-level property: it is handed to the
//! toolkit when the output document is set up, never applied afterwards.

use std::fmt::Debug;
use thiserror::Error;

/// Error type for toolkit operations.
#[derive(Error, Debug, Clone)]
pub enum ToolkitError {
    #[error("Markup conversion failed: {0}")]
    Conversion(String),

    #[error("Invalid PDF document: {0}")]
    InvalidDocument(String),

    #[error("Encryption setup failed: {0}")]
    Encryption(String),

    #[error("Failed to serialize PDF: {0}")]
    Serialize(String),
}

/// Owner-granted permissions for an encrypted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub print: bool,
    pub modify: bool,
    pub copy: bool,
    pub annotate: bool,
}

impl Permissions {
    pub fn print_only() -> Self {
        Self { print: true, modify: false, copy: false, annotate: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionAlgorithm {
    #[default]
    Aes128,
}

/// Standard-security encryption settings for an output document.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionOptions {
    pub user_password: Vec<u8>,
    pub owner_password: Vec<u8>,
    pub permissions: Permissions,
    pub algorithm: EncryptionAlgorithm,
}

impl EncryptionOptions {
    /// Longest password the standard security handler uses without truncation.
    pub const MAX_PASSWORD_LEN: usize = 32;

    /// Builds the options used for every protected document: the same value as
    /// user and owner password, printing allowed, everything else denied, AES-128.
    ///
    /// # Errors
    ///
    /// Returns `ToolkitError::Encryption` unless the password is 1 to 32
    /// printable ASCII characters.
    pub fn from_password(password: &str) -> Result<Self, ToolkitError> {
        if password.is_empty() || password.len() > Self::MAX_PASSWORD_LEN {
            return Err(ToolkitError::Encryption(format!(
                "password must be between 1 and {} characters",
                Self::MAX_PASSWORD_LEN
            )));
        }
        if !password.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            return Err(ToolkitError::Encryption(
                "password must contain printable ASCII characters only".to_string(),
            ));
        }
        Ok(Self {
            user_password: password.as_bytes().to_vec(),
            owner_password: password.as_bytes().to_vec(),
            permissions: Permissions::print_only(),
            algorithm: EncryptionAlgorithm::Aes128,
        })
    }
}

// Passwords stay out of logs.
impl Debug for EncryptionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionOptions")
            .field("user_password", &"<redacted>")
            .field("owner_password", &"<redacted>")
            .field("permissions", &self.permissions)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// An open, editable form document.
pub trait FormHandle: Send {
    /// Fully-qualified names of every terminal field in the form.
    fn field_names(&self) -> Vec<String>;

    /// Sets a field's value. Returns `Ok(false)` when no field has that name.
    fn set_field_value(&mut self, name: &str, value: &str) -> Result<bool, ToolkitError>;

    /// Finalizes the document (applying the encryption chosen at open time) and
    /// returns its bytes.
    fn serialize(self: Box<Self>) -> Result<Vec<u8>, ToolkitError>;
}

/// The PDF construction primitives used by the document generator.
pub trait PdfToolkit: Send + Sync + Debug {
    /// Converts a markup string into a complete PDF.
    fn convert_markup_to_pdf(
        &self,
        markup: &str,
        encryption: Option<&EncryptionOptions>,
    ) -> Result<Vec<u8>, ToolkitError>;

    /// Opens an existing PDF as a form whose output will carry `encryption`.
    fn open_form_document(
        &self,
        source: &[u8],
        encryption: Option<EncryptionOptions>,
    ) -> Result<Box<dyn FormHandle>, ToolkitError>;

    /// Returns a human-readable name for this toolkit (for logging/debugging).
    fn name(&self) -> &'static str;
}
