use lopdf::{Document as LopdfDocument, Object};
use stencil::FormDocument;
use stencil_pdf_composer::decode_text_string;

/// Collect the strings shown by `Tj` operators, page by page
pub fn shown_text(doc: &LopdfDocument) -> String {
    let mut text = String::new();
    for (_page_num, page_id) in doc.get_pages() {
        let Ok(content) = doc.get_and_decode_page_content(page_id) else {
            continue;
        };
        for operation in content.operations.iter().filter(|op| op.operator == "Tj") {
            if let Some(Object::String(bytes, _)) = operation.operands.first() {
                text.push_str(&String::from_utf8_lossy(bytes));
                text.push('\n');
            }
        }
    }
    text
}

/// Whether `needle` occurs anywhere in the raw file
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// The value of a form field, decoded as text (names for buttons)
pub fn field_value(doc: &LopdfDocument, name: &str) -> Option<String> {
    let form = FormDocument::from_document(doc.clone()).ok()?;
    let field = form.field(name)?;
    let value = doc.get_object(field.id).ok()?.as_dict().ok()?.get(b"V").ok()?;
    match value {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// The `AS` entry of the first widget of a button field
pub fn appearance_state(doc: &LopdfDocument, name: &str) -> Option<String> {
    let form = FormDocument::from_document(doc.clone()).ok()?;
    let widget = *form.field(name)?.widgets.first()?;
    let state = doc.get_object(widget).ok()?.as_dict().ok()?.get(b"AS").ok()?.as_name().ok()?;
    Some(String::from_utf8_lossy(state).into_owned())
}

/// Whether the AcroForm asks viewers to rebuild field appearances
pub fn needs_appearances(doc: &LopdfDocument) -> bool {
    let Ok(catalog) = doc.catalog() else {
        return false;
    };
    let acroform = match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => doc.get_object(*id).and_then(Object::as_dict),
        Ok(other) => other.as_dict(),
        Err(e) => Err(e),
    };
    acroform
        .and_then(|form| form.get(b"NeedAppearances"))
        .and_then(Object::as_bool)
        .unwrap_or(false)
}
