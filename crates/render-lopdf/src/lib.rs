//! Markup to PDF conversion using lopdf.
//!
//! HTML is reduced to blocks of styled text, wrapped and paginated with the
//! metrics of the standard Type1 fonts, and written as an unencrypted lopdf
//! `Document`. Callers that need encryption apply it to the returned document
//! before saving.

mod converter;
mod error;
pub mod fonts;
pub mod layout;
pub mod markup;
mod writer;

pub use converter::{MarkupConverter, save_document};
pub use error::RenderError;
pub use layout::{PageSettings, PageSize};
pub use writer::write_document;
