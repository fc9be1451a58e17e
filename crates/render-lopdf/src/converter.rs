use crate::error::RenderError;
use crate::layout::{PageSettings, layout_blocks};
use crate::markup::parse_markup;
use crate::writer::write_document;
use lopdf::Document;
use log::debug;

/// Converts markup into a paginated PDF document.
#[derive(Debug, Clone, Default)]
pub struct MarkupConverter {
    settings: PageSettings,
}

impl MarkupConverter {
    pub fn new(settings: PageSettings) -> Self {
        Self { settings }
    }

    /// Parses, lays out and writes `markup`. The document is returned unsaved
    /// so callers can post-process it (for example to encrypt it).
    pub fn convert(&self, markup: &str) -> Result<Document, RenderError> {
        let parsed = parse_markup(markup)?;
        let pages = layout_blocks(&parsed.blocks, &self.settings);
        debug!(
            "Converted markup: {} block(s) on {} page(s)",
            parsed.blocks.len(),
            pages.len()
        );
        write_document(&pages, &self.settings, parsed.title.as_deref())
    }

    pub fn convert_to_bytes(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
        let mut doc = self.convert(markup)?;
        save_document(&mut doc)
    }
}

/// Serializes a document into memory.
pub fn save_document(doc: &mut Document) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(buffer)
}
