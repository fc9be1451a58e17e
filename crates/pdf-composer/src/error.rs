use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Unsupported form document: {0}")]
    UnsupportedForm(String),

    #[error("{0}")]
    Other(String),
}
